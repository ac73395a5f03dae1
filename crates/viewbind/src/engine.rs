//! View-engine registration.
//!
//! Wires the shared environment's render function into each application
//! under its view-engine extension. Applications that never configured an
//! extension get [`DEFAULT_EXT`], persisted on the app so later lookups see
//! the same value.

use std::path::Path;
use std::rc::Rc;

use log::debug;

use crate::app::AppRef;
use crate::context::ViewContext;
use crate::environment::Environment;
use crate::error::ViewError;

/// Extension applied to applications that never set one.
pub const DEFAULT_EXT: &str = "html";

/// One render invocation as the host framework hands it to the engine
/// callback.
#[derive(Debug, Clone)]
pub struct EngineCall {
    /// Requested view name, possibly without an extension.
    pub name: String,
    /// The invoking application's view-engine extension (no leading dot).
    pub ext: String,
    /// Explicit per-call render context.
    pub vars: ViewContext,
    /// Request-scoped namespace stashed by the context middleware, if any.
    pub view_ctx: Option<ViewContext>,
}

/// The render callback installed on an application.
pub type EngineFn = Rc<dyn Fn(&EngineCall) -> Result<String, ViewError>>;

/// Derives the template name for a call: used verbatim when the name already
/// carries an extension, otherwise the app's configured extension is
/// appended.
fn template_name(call: &EngineCall) -> String {
    if Path::new(&call.name).extension().is_some() {
        call.name.clone()
    } else {
        format!("{}.{}", call.name, call.ext)
    }
}

/// Builds the render callback bound to one shared environment.
///
/// Merge rule: the stashed request context goes in first, then the explicit
/// vars — explicit keys win on conflict. The environment's result (text or
/// error) is forwarded unchanged.
pub(crate) fn make_engine(env: &Environment) -> EngineFn {
    let env = env.clone();
    Rc::new(move |call: &EngineCall| {
        let name = template_name(call);

        let merged = match &call.view_ctx {
            Some(stash) => {
                let mut merged = stash.clone();
                for (key, value) in &call.vars {
                    merged.insert(key.clone(), value.clone());
                }
                merged
            }
            None => call.vars.clone(),
        };

        env.render(&name, &merged)
    })
}

/// Binds every application to the environment: defaults and persists the
/// extension where needed, then installs the render callback under it.
pub(crate) fn install_engines(apps: &[AppRef], env: &Environment) {
    for app in apps {
        let mut app = app.borrow_mut();
        let ext = match app.view_ext() {
            Some(ext) => ext,
            None => {
                app.set_view_ext(DEFAULT_EXT);
                DEFAULT_EXT.to_string()
            }
        };
        debug!("installing view engine under extension {:?}", ext);
        app.install_engine(&ext, make_engine(env));
    }
}
