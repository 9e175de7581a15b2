//! Request middleware.
//!
//! Each middleware sees a request before it is routed and may rewrite its
//! params or refuse it; after a successful call it sees the result. The
//! chain runs middleware by ascending priority, ties in insertion order.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tracing::debug;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Verdict of a middleware's `before` hook.
pub struct MiddlewareResult {
    pub allowed: bool,
    /// Params to pass on; `None` keeps what the previous step passed.
    pub params: Option<Value>,
    /// Reason shown to the caller when refused.
    pub feedback: Option<String>,
}

impl MiddlewareResult {
    pub fn allow(params: Option<Value>) -> Self {
        Self { allowed: true, params, feedback: None }
    }

    pub fn block(feedback: impl Into<String>) -> Self {
        Self { allowed: false, params: None, feedback: Some(feedback.into()) }
    }
}

pub trait Middleware: Send + Sync {
    fn before(&self, method: &str, params: Option<Value>) -> impl Future<Output = MiddlewareResult> + Send;

    fn after(&self, _method: &str, _params: &Value, _result: &Value) -> impl Future<Output = ()> + Send {
        async {}
    }

    fn name(&self) -> &str;

    /// Lower runs first.
    fn priority(&self) -> i32 {
        0
    }
}

/// Boxed-future view of [`Middleware`] so the chain can hold trait objects.
trait ErasedMiddleware: Send + Sync {
    fn before<'a>(&'a self, method: &'a str, params: Option<Value>) -> BoxFuture<'a, MiddlewareResult>;
    fn after<'a>(&'a self, method: &'a str, params: &'a Value, result: &'a Value) -> BoxFuture<'a, ()>;
    fn name(&self) -> &str;
    fn priority(&self) -> i32;
}

impl<M: Middleware> ErasedMiddleware for M {
    fn before<'a>(&'a self, method: &'a str, params: Option<Value>) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(Middleware::before(self, method, params))
    }

    fn after<'a>(&'a self, method: &'a str, params: &'a Value, result: &'a Value) -> BoxFuture<'a, ()> {
        Box::pin(Middleware::after(self, method, params, result))
    }

    fn name(&self) -> &str {
        Middleware::name(self)
    }

    fn priority(&self) -> i32 {
        Middleware::priority(self)
    }
}

#[derive(Default)]
pub struct MiddlewareChain {
    steps: Vec<Box<dyn ErasedMiddleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        let priority = Middleware::priority(&middleware);
        let at = self.steps.partition_point(|m| m.priority() <= priority);
        self.steps.insert(at, Box::new(middleware));
    }

    /// Run every `before` hook; stops at the first refusal.
    pub async fn run_before(&self, method: &str, mut params: Option<Value>) -> MiddlewareResult {
        for step in &self.steps {
            let verdict = step.before(method, params.clone()).await;
            if !verdict.allowed {
                return verdict;
            }
            if verdict.params.is_some() {
                params = verdict.params;
            }
        }
        MiddlewareResult::allow(params)
    }

    pub async fn run_after(&self, method: &str, params: &Value, result: &Value) {
        for step in &self.steps {
            step.after(method, params, result).await;
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|m| m.name()).collect()
    }
}

/// Logs every request and every successful result at debug level.
pub struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    async fn before(&self, method: &str, params: Option<Value>) -> MiddlewareResult {
        debug!(method, has_params = params.is_some(), "request");
        MiddlewareResult::allow(params)
    }

    async fn after(&self, method: &str, _params: &Value, result: &Value) {
        if let Some(changed) = result.get("changed").and_then(Value::as_bool) {
            debug!(method, changed, "request handled");
        } else {
            debug!(method, "request handled");
        }
    }

    fn name(&self) -> &str {
        "request-log"
    }

    fn priority(&self) -> i32 {
        -100
    }
}
