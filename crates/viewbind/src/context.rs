//! Per-request context processing.
//!
//! Context processors contribute values to a request-scoped namespace before
//! rendering: asset lists, the signed-in user, feature flags — anything that
//! should reach every template without each handler passing it explicitly.
//!
//! The flow per request:
//!
//! ```text
//! middleware (from ctx_proc)
//!   → get-or-create the request's ViewContext
//!   → run each processor in list order against it
//!   → leave it stashed in RequestLocals
//! render
//!   → engine callback merges the stash under the handler's explicit vars
//! ```
//!
//! Processors run sequentially and share one mutable namespace per request;
//! later processors observe earlier writes, and the last writer of a key
//! wins. A namespace is never shared across requests. Processors are trusted
//! application code: a panic propagates to the host framework's error
//! pathway instead of being caught here.
//!
//! # Single-Threaded Design
//!
//! Requests are handled to completion on the calling thread, so processors
//! are stored as `Rc` and don't require `Send + Sync` bounds.

use std::rc::Rc;

/// The request-scoped key→value namespace contributed by processors.
pub type ViewContext = serde_json::Map<String, serde_json::Value>;

/// A context processor: mutates the request's shared namespace.
///
/// The first parameter is the host framework's request type; this crate
/// never inspects it, it only threads it through.
pub type ContextProcessor<R> = Rc<dyn Fn(&R, &mut ViewContext)>;

/// Per-request storage the host framework carries between middleware and
/// render (the place `res.locals`-style data lives).
#[derive(Debug, Default, Clone)]
pub struct RequestLocals {
    /// The processor-contributed namespace, once any processor has run.
    pub view_ctx: Option<ViewContext>,
}

impl RequestLocals {
    /// Creates empty locals for a fresh request.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builds the per-request middleware that runs the given processors.
///
/// The middleware never short-circuits; after it runs, the host continues
/// its chain unconditionally.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use viewbind::{ctx_proc, ContextProcessor, RequestLocals};
///
/// struct Request;
///
/// let assets: ContextProcessor<Request> = Rc::new(|_req, ctx| {
///     ctx.insert("scripts".into(), serde_json::json!(["index.js"]));
/// });
///
/// let middleware = ctx_proc(vec![assets]);
/// let mut locals = RequestLocals::new();
/// middleware(&Request, &mut locals);
/// assert!(locals.view_ctx.unwrap().contains_key("scripts"));
/// ```
pub fn ctx_proc<R>(processors: Vec<ContextProcessor<R>>) -> impl Fn(&R, &mut RequestLocals) {
    move |req, locals| {
        let ctx = locals.view_ctx.get_or_insert_with(ViewContext::new);
        for processor in &processors {
            processor(req, ctx);
        }
    }
}
