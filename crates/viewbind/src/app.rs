//! The host-application capability set.
//!
//! Any framework adapter that can report its template roots, hold a
//! view-engine extension, and dispatch renders through an installed callback
//! can be bound. The trait replaces duck typing with an explicit contract;
//! [`BasicApp`] is the reference implementation, sufficient for tests and
//! for frameworks whose native application type is wrapped rather than
//! implemented directly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::context::{RequestLocals, ViewContext};
use crate::engine::{EngineCall, EngineFn};
use crate::error::ViewError;

/// Shared, mutable handle to a bound application.
///
/// Registration mutates the app (defaulting its extension, installing the
/// render callback), so apps are held behind `Rc<RefCell<..>>`. Handle
/// identity is also what duplicate-registration detection keys on.
pub type AppRef = Rc<RefCell<dyn Application>>;

/// Wraps a concrete application in an [`AppRef`].
pub fn app_ref<A: Application + 'static>(app: A) -> AppRef {
    Rc::new(RefCell::new(app))
}

/// Capabilities a consuming application must expose.
pub trait Application {
    /// The template root directories this application contributes, in its
    /// own precedence order.
    fn template_dirs(&self) -> Vec<PathBuf>;

    /// The configured view-engine extension, if one was set explicitly.
    fn view_ext(&self) -> Option<String>;

    /// Persists the view-engine extension on the application.
    fn set_view_ext(&mut self, ext: &str);

    /// Installs a render callback under the given extension key.
    fn install_engine(&mut self, ext: &str, engine: EngineFn);

    /// Renders a view through the installed callback.
    ///
    /// `name` may omit the extension; the callback appends the configured
    /// one. `locals` carries the request-scoped stash left by the context
    /// middleware.
    fn render(
        &self,
        name: &str,
        vars: ViewContext,
        locals: &RequestLocals,
    ) -> Result<String, ViewError>;
}

/// A minimal application: template roots, an optional extension, and an
/// engine table.
///
/// # Example
///
/// ```rust,ignore
/// use viewbind::{app_ref, bind, BasicApp, Config};
///
/// let app = app_ref(BasicApp::new(vec!["./templates".into()]));
/// let views = bind(vec![app.clone()], Config::new())?;
/// let html = app.borrow().render("index", Default::default(), &Default::default())?;
/// ```
#[derive(Default)]
pub struct BasicApp {
    dirs: Vec<PathBuf>,
    view_ext: Option<String>,
    engines: HashMap<String, EngineFn>,
}

impl BasicApp {
    /// Creates an application contributing the given template roots.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            view_ext: None,
            engines: HashMap::new(),
        }
    }

    /// Sets the view-engine extension up front, like a host app configured
    /// before registration.
    pub fn with_view_ext(mut self, ext: &str) -> Self {
        self.view_ext = Some(ext.to_string());
        self
    }

    /// Appends another template root (lowest priority within this app).
    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }
}

impl Application for BasicApp {
    fn template_dirs(&self) -> Vec<PathBuf> {
        self.dirs.clone()
    }

    fn view_ext(&self) -> Option<String> {
        self.view_ext.clone()
    }

    fn set_view_ext(&mut self, ext: &str) {
        self.view_ext = Some(ext.to_string());
    }

    fn install_engine(&mut self, ext: &str, engine: EngineFn) {
        self.engines.insert(ext.to_string(), engine);
    }

    fn render(
        &self,
        name: &str,
        vars: ViewContext,
        locals: &RequestLocals,
    ) -> Result<String, ViewError> {
        let ext = self
            .view_ext
            .clone()
            .ok_or_else(|| ViewError::NoEngine("<unset>".into()))?;
        let engine = self
            .engines
            .get(&ext)
            .ok_or_else(|| ViewError::NoEngine(ext.clone()))?;

        engine(&EngineCall {
            name: name.to_string(),
            ext,
            vars,
            view_ctx: locals.view_ctx.clone(),
        })
    }
}

impl std::fmt::Debug for BasicApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicApp")
            .field("dirs", &self.dirs)
            .field("view_ext", &self.view_ext)
            .field("engines", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}
