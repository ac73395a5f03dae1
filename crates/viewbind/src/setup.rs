//! Immediate registration facade (legacy lifecycle).
//!
//! [`Setup`] is the strict, non-reentrant sibling of
//! [`Registry`](crate::Registry): applications are collected inline with
//! [`Setup::use_app`], [`Setup::setup`] builds the environment once and
//! returns it directly, and a second `setup` call is a usage error — there
//! is no re-setup and no pending-future machinery.
//!
//! Path precedence matches the deferred variant for the root app (its roots
//! are searched first); apps collected via `use_app` keep their
//! first-registered-first-searched order among themselves.

use std::path::PathBuf;
use std::rc::Rc;

use crate::app::AppRef;
use crate::config::Config;
use crate::engine::install_engines;
use crate::environment::{build_environment, Environment};
use crate::error::ViewError;
use crate::facade::RegistrationFacade;

/// One-shot registration facade.
#[derive(Default)]
pub struct Setup {
    apps: Vec<AppRef>,
    env: Option<Environment>,
}

impl Setup {
    /// Creates an empty facade.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built environment, once `setup` has run.
    pub fn env(&self) -> Option<Environment> {
        self.env.clone()
    }

    /// Collects an application ahead of the build.
    ///
    /// # Errors
    ///
    /// [`ViewError::AlreadyInitialized`] after `setup` has run;
    /// [`ViewError::DuplicateApp`] for an app handle collected twice.
    pub fn use_app(&mut self, app: AppRef) -> Result<(), ViewError> {
        if self.env.is_some() {
            return Err(ViewError::AlreadyInitialized);
        }
        if self.apps.iter().any(|a| Rc::ptr_eq(a, &app)) {
            return Err(ViewError::DuplicateApp);
        }
        self.apps.push(app);
        Ok(())
    }

    /// Builds the environment inline and binds every collected application.
    ///
    /// A supplied `root_app` is placed ahead of previously collected apps,
    /// so its template roots are searched first.
    ///
    /// # Errors
    ///
    /// [`ViewError::AlreadyInitialized`] on a second call — the first
    /// environment stays in place. Build failures propagate and leave the
    /// collected apps available for a corrected retry.
    pub fn setup(
        &mut self,
        config: Config,
        root_app: Option<AppRef>,
    ) -> Result<Environment, ViewError> {
        if self.env.is_some() {
            return Err(ViewError::AlreadyInitialized);
        }
        if let Some(root) = root_app {
            if self.apps.iter().any(|a| Rc::ptr_eq(a, &root)) {
                return Err(ViewError::DuplicateApp);
            }
            self.apps.insert(0, root);
        }

        let dirs: Vec<PathBuf> = self
            .apps
            .iter()
            .flat_map(|app| app.borrow().template_dirs())
            .collect();
        let env = build_environment(dirs, &config)?;
        install_engines(&self.apps, &env);

        self.env = Some(env.clone());
        Ok(env)
    }
}

impl RegistrationFacade for Setup {
    type Ticket = Environment;

    fn register(&mut self, app: Option<AppRef>) -> Result<(), ViewError> {
        match app {
            Some(app) => self.use_app(app),
            None => Ok(()),
        }
    }

    fn setup(
        &mut self,
        config: Config,
        root_app: Option<AppRef>,
    ) -> Result<Self::Ticket, ViewError> {
        Setup::setup(self, config, root_app)
    }
}

impl std::fmt::Debug for Setup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setup")
            .field("apps", &self.apps.len())
            .field("ready", &self.env.is_some())
            .finish()
    }
}
