//! # Viewbind - Shared View Engine for Composed Applications
//!
//! Viewbind binds the MiniJinja template engine to a host web framework so
//! that multiple independently configured sub-applications share one
//! rendering environment while each contributes its own template roots,
//! filters, globals, and per-request context data.
//!
//! It provides:
//!
//! - Multi-root template resolution with deterministic precedence across
//!   composed applications
//! - One shared, built-once environment with user filters and globals
//! - Per-request context processors merged into every render
//! - Two registration lifecycles: a one-shot API and a deferred API where
//!   sub-apps register before configuration exists
//!
//! This crate is framework-agnostic at its core: any type implementing the
//! [`Application`] capability set can be bound.
//!
//! ## Core Concepts
//!
//! - [`bind`]: the one-shot entry point, apps in, [`Views`] handle out
//! - [`Environment`]: the shared engine handle (`render` / `add_filter` /
//!   `add_global`)
//! - [`Config`]: escaping, whitespace, delimiters, loader behavior, filters,
//!   globals
//! - [`ctx_proc`]: per-request middleware running context processors
//! - [`Registry`] / [`Setup`]: deferred and immediate registration facades
//!   behind [`RegistrationFacade`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use viewbind::{app_ref, bind, BasicApp, Config};
//!
//! let app = app_ref(BasicApp::new(vec!["./templates".into()]));
//! let sub = app_ref(BasicApp::new(vec!["./subapp/templates".into()]));
//!
//! let views = bind(
//!     vec![app.clone(), sub],
//!     Config::new().autoescape(true).global("site", serde_json::json!("mysite")),
//! )?;
//!
//! // Per-request: res.render("index") in the host framework ends up here.
//! let html = app.borrow().render("index", Default::default(), &Default::default())?;
//! ```
//!
//! ## Template Resolution
//!
//! A view named `"foo"` resolves to `"foo.<ext>"` where `<ext>` is the
//! application's view-engine extension (defaulted to `"html"` at
//! registration when unset); names that already carry an extension are used
//! verbatim. Roots are searched in aggregate order — with [`bind`], the
//! first registered application's roots shadow later ones.
//!
//! ## Request Context
//!
//! ```rust,ignore
//! let views = bind(vec![app.clone()], Config::new())?;
//! let middleware = views.ctx_proc(vec![Rc::new(|_req, ctx| {
//!     ctx.insert("scripts".into(), serde_json::json!(["index.js"]));
//! })]);
//! // Host runs `middleware(&req, &mut locals)` per request, then renders
//! // with those locals; explicit render vars win over processor keys.
//! ```

mod app;
mod config;
mod context;
mod engine;
mod environment;
mod error;
mod facade;
mod future;
mod registry;
mod setup;

pub use app::{app_ref, AppRef, Application, BasicApp};
pub use config::{Config, FilterFn, LoaderFactory, TagDelimiters};
pub use context::{ctx_proc, ContextProcessor, RequestLocals, ViewContext};
pub use engine::{EngineCall, EngineFn, DEFAULT_EXT};
pub use environment::Environment;
pub use error::ViewError;
pub use facade::RegistrationFacade;
pub use future::Deferred;
pub use registry::Registry;
pub use setup::Setup;

// The loader surface, re-exported for integrations that inject their own.
pub use viewbind_loader::{FsLoader, LoadError, LoaderOptions, TemplateLoader, WatchLoader};

use std::path::PathBuf;

/// Handle returned by [`bind`]: the shared environment plus the middleware
/// factory.
#[derive(Debug, Clone)]
pub struct Views {
    /// The shared rendering environment.
    pub env: Environment,
}

impl Views {
    /// Builds per-request middleware over the given context processors.
    ///
    /// See [`ctx_proc`]; this is the same factory, hung off the handle for
    /// call sites that hold one.
    pub fn ctx_proc<R>(
        &self,
        processors: Vec<ContextProcessor<R>>,
    ) -> impl Fn(&R, &mut RequestLocals) {
        context::ctx_proc(processors)
    }
}

/// Binds one or more applications to a freshly built shared environment.
///
/// Template roots aggregate in application order: the first application's
/// roots are searched first, each application's own list order preserved.
/// Every application gets the environment's render callback installed under
/// its view-engine extension (defaulted to [`DEFAULT_EXT`] when unset).
///
/// # Errors
///
/// [`ViewError::NoApplications`] when `apps` is empty — raised before
/// anything is built, so nothing is left partially initialized. Loader and
/// configuration failures propagate from the build.
///
/// # Example
///
/// ```rust,ignore
/// let views = bind(vec![root.clone(), sub.clone()], Config::new())?;
/// views.env.add_global("version", serde_json::json!("1.0.0"));
/// ```
pub fn bind(apps: Vec<AppRef>, config: Config) -> Result<Views, ViewError> {
    if apps.is_empty() {
        return Err(ViewError::NoApplications);
    }

    let dirs: Vec<PathBuf> = apps
        .iter()
        .flat_map(|app| app.borrow().template_dirs())
        .collect();
    let env = environment::build_environment(dirs, &config)?;
    engine::install_engines(&apps, &env);

    Ok(Views { env })
}
