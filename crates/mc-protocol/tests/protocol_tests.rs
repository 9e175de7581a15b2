//! Protocol layer tests: JSON-RPC serialization, error codes, method names.

#[cfg(test)]
mod tests {
    use mc_protocol::methods::is_known_method;
    use mc_protocol::*;
    use serde_json::json;

    // ─────────────────────────────────────────────────────────────────────
    // RequestId
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn request_id_number_serialization() {
        let id = RequestId::Number(42);
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, json!(42));
    }

    #[test]
    fn request_id_string_deserialization() {
        let id: RequestId = serde_json::from_value(json!("req-1")).unwrap();
        assert_eq!(id, RequestId::String("req-1".into()));
    }

    // ─────────────────────────────────────────────────────────────────────
    // McRequest
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn request_without_params() {
        let json = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "messageCenter/state"
        });
        let req: McRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.method, Methods::MESSAGE_CENTER_STATE);
        assert!(req.params.is_none());
        assert!(req.is_valid());
    }

    #[test]
    fn request_invalid_version() {
        let req = McRequest {
            jsonrpc: "1.0".into(),
            id: Some(RequestId::Number(1)),
            method: "messageCenter/show".into(),
            params: None,
        };
        assert!(!req.is_valid());
    }

    #[test]
    fn request_empty_method_invalid() {
        let req = McRequest {
            jsonrpc: "2.0".into(),
            id: Some(RequestId::Number(1)),
            method: "".into(),
            params: None,
        };
        assert!(!req.is_valid());
    }

    #[test]
    fn request_without_id_is_a_notification() {
        let req: McRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "messageCenter/show"})).unwrap();
        assert!(req.id.is_none());
        assert!(req.is_valid());

        let wire = serde_json::to_value(&req).unwrap();
        assert!(wire.get("id").is_none());
    }

    #[test]
    fn request_deserialized_from_wire_format() {
        let wire = r#"{"jsonrpc":"2.0","id":7,"method":"messageCenter/add","params":{"groupId":"default","content":"Pod restarted"}}"#;
        let req: McRequest = serde_json::from_str(wire).unwrap();
        assert_eq!(req.method, Methods::MESSAGE_CENTER_ADD);
        assert_eq!(req.params.as_ref().unwrap()["groupId"], "default");
    }

    // ─────────────────────────────────────────────────────────────────────
    // McResponse
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn success_response_serialization() {
        let resp = McResponse::success(RequestId::Number(1), json!({"changed": true}));
        assert!(resp.is_success());
        assert!(!resp.is_error());

        let parsed = serde_json::to_value(&resp).unwrap();
        assert_eq!(parsed["jsonrpc"], "2.0");
        assert_eq!(parsed["id"], 1);
        assert_eq!(parsed["result"]["changed"], true);
        assert!(parsed.get("error").is_none());
    }

    #[test]
    fn error_response_serialization() {
        let resp = McResponse::error(
            Some(RequestId::Number(5)),
            McError::method_not_found("messageCenter/explode"),
        );
        assert!(resp.is_error());

        let parsed = serde_json::to_value(&resp).unwrap();
        assert_eq!(parsed["id"], 5);
        assert_eq!(parsed["error"]["code"], -32601);
        assert!(parsed["error"]["message"].as_str().unwrap().contains("messageCenter/explode"));
    }

    #[test]
    fn error_response_null_id() {
        let resp = McResponse::error(None, McError::parse_error("bad json"));
        let parsed = serde_json::to_value(&resp).unwrap();
        assert!(parsed["id"].is_null());
        assert_eq!(parsed["error"]["code"], -32700);
    }

    #[test]
    fn response_untagged_deserialization_picks_variant() {
        let ok: McResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": "a", "result": 42
        })).unwrap();
        assert!(ok.is_success());

        let err: McResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": null, "error": {"code": -32600, "message": "nope"}
        })).unwrap();
        assert!(err.is_error());
    }

    // ─────────────────────────────────────────────────────────────────────
    // McNotification
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn notification_serialization() {
        let notif = McNotification::new(
            Notifications::MESSAGE_CENTER_DID_CHANGE,
            Some(json!({"state": {"hidden": true}})),
        );
        let parsed = serde_json::to_value(&notif).unwrap();
        assert_eq!(parsed["jsonrpc"], "2.0");
        assert_eq!(parsed["method"], "messageCenter/didChange");
        assert!(parsed.get("id").is_none());
    }

    #[test]
    fn notification_without_params() {
        let notif = McNotification::new(Notifications::SERVER_CONNECTED, None);
        let parsed = serde_json::to_value(&notif).unwrap();
        assert!(parsed.get("params").is_none());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Error codes
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn error_code_values() {
        assert_eq!(McErrorCode::ParseError.code(), -32700);
        assert_eq!(McErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(McErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(McErrorCode::InvalidParams.code(), -32602);
        assert_eq!(McErrorCode::InternalError.code(), -32603);
        assert_eq!(McErrorCode::ServerError.code(), -32000);
        assert_eq!(McErrorCode::ServerNotInitialized.code(), -32001);
        assert_eq!(McErrorCode::ServerShuttingDown.code(), -32002);
        assert_eq!(McErrorCode::Custom(-42).code(), -42);
    }

    #[test]
    fn error_code_roundtrip() {
        assert_eq!(McErrorCode::from_code(-32700), McErrorCode::ParseError);
        assert_eq!(McErrorCode::from_code(-32601), McErrorCode::MethodNotFound);
        assert_eq!(McErrorCode::from_code(-32002), McErrorCode::ServerShuttingDown);
        assert_eq!(McErrorCode::from_code(-99999), McErrorCode::Custom(-99999));
    }

    #[test]
    fn error_with_data() {
        let e = McError::invalid_params("missing groupId")
            .with_data(json!({"field": "groupId"}));
        assert_eq!(e.code, -32602);
        assert_eq!(e.data.as_ref().unwrap()["field"], "groupId");
        assert_eq!(e.error_code(), McErrorCode::InvalidParams);
    }

    #[test]
    fn error_display() {
        let s = format!("{}", McError::parse_error("bad"));
        assert!(s.contains("-32700"));
        assert!(s.contains("bad"));
    }

    #[test]
    fn error_serialization_omits_empty_data() {
        let json = serde_json::to_value(McError::server_error("oops")).unwrap();
        assert_eq!(json["code"], -32000);
        assert_eq!(json["message"], "oops");
        assert!(json.get("data").is_none());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Method validation
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn known_methods() {
        assert!(is_known_method(Methods::MESSAGE_CENTER_ADD));
        assert!(is_known_method(Methods::MESSAGE_CENTER_CLEAR_GROUP));
        assert!(is_known_method(Methods::MESSAGE_CENTER_NOTIFY));
        assert!(is_known_method(Methods::SESSION_START));
    }

    #[test]
    fn unknown_methods() {
        assert!(!is_known_method(""));
        assert!(!is_known_method("file/read"));
        // checked by namespace prefix only
        assert!(is_known_method("messageCenter/nonexistent"));
    }
}
