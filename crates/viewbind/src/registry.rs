//! Deferred registration facade.
//!
//! [`Registry`] lets sub-applications register before anyone decides the
//! environment's configuration. Each registration enqueues the app's template
//! roots and hands back a [`Deferred`] ticket; a later [`Registry::setup`]
//! call builds the environment once and fans it out to every ticket in
//! enqueue order.
//!
//! Lifecycle per cycle: PENDING → READY, one-way. `setup` clears the pending
//! set, so registering again afterwards starts a fresh cycle whose next
//! `setup` builds a new environment (the previous one is discarded, not
//! reused).
//!
//! # Path precedence
//!
//! Registration order is reversed for search order: each newly registered
//! application's roots are prepended ahead of previously pending ones, and
//! `setup`'s own root app is folded in last of all — so the most recently
//! configured root application's templates win. Within a single
//! application, its own root list order is preserved. This mirrors the
//! historical behavior of the deferred API and differs deliberately from
//! [`crate::bind`], which searches in registration order.

use std::path::PathBuf;
use std::rc::Rc;

use log::debug;

use crate::app::AppRef;
use crate::config::Config;
use crate::engine::install_engines;
use crate::environment::{build_environment, Environment};
use crate::error::ViewError;
use crate::facade::RegistrationFacade;
use crate::future::Deferred;

#[derive(Default)]
struct PendingSet {
    apps: Vec<AppRef>,
    dirs: Vec<PathBuf>,
    waiters: Vec<Deferred<Environment>>,
}

/// Deferred registration facade with an explicit lifecycle.
///
/// A process typically keeps one of these, but nothing here is global state;
/// independent registries are fully isolated.
///
/// # Example
///
/// ```rust,ignore
/// use viewbind::{Config, Registry};
///
/// let mut registry = Registry::new();
///
/// // Sub-app registers early, gets a ticket for the eventual environment.
/// let ticket = registry.register(Some(sub_app.clone()))?;
/// ticket.then(|env| env.add_filter("snake", snake_filter()));
///
/// // The root app decides configuration and triggers the build.
/// registry.setup(Config::new().autoescape(true), Some(root_app))?;
/// ```
#[derive(Default)]
pub struct Registry {
    pending: PendingSet,
    current: Option<Environment>,
}

impl Registry {
    /// Creates an empty registry in the pending state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The environment from the most recent `setup`, if one has run.
    pub fn env(&self) -> Option<Environment> {
        self.current.clone()
    }

    /// True once `setup` has built an environment in the current lifetime.
    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    /// Enqueues an application (and/or a waiter) for the next `setup`.
    ///
    /// The app's template roots are prepended ahead of previously pending
    /// ones. The returned ticket resolves with the environment the next
    /// `setup` builds.
    ///
    /// # Errors
    ///
    /// [`ViewError::DuplicateApp`] if the same app handle is already pending
    /// in this cycle; the pending set is left untouched.
    pub fn register(&mut self, app: Option<AppRef>) -> Result<Deferred<Environment>, ViewError> {
        if let Some(app) = app {
            self.enqueue_app(app)?;
        }
        let ticket = Deferred::new();
        self.pending.waiters.push(ticket.clone());
        Ok(ticket)
    }

    /// Builds the environment over the pending set and fans it out.
    ///
    /// If `root_app` is given it is folded into the pending set first, with
    /// the same precedence rule as [`register`](Self::register) — its roots
    /// end up searched before everything registered earlier. Then: build,
    /// install engines on every pending app, resolve every enqueued ticket
    /// in enqueue order, clear the pending set, transition to ready.
    ///
    /// # Errors
    ///
    /// Build failures propagate and leave the pending set intact (including
    /// a just-folded root app), so the caller decides recovery. Nothing is
    /// partially initialized: no engines are installed and no tickets fire.
    pub fn setup(
        &mut self,
        config: Config,
        root_app: Option<AppRef>,
    ) -> Result<Deferred<Environment>, ViewError> {
        if let Some(root) = root_app {
            self.enqueue_app(root)?;
        }

        let env = build_environment(self.pending.dirs.clone(), &config)?;
        install_engines(&self.pending.apps, &env);

        let pending = std::mem::take(&mut self.pending);
        self.current = Some(env.clone());
        debug!(
            "environment ready; resolving {} waiter(s) for {} app(s)",
            pending.waiters.len(),
            pending.apps.len()
        );
        for waiter in pending.waiters {
            waiter.resolve(env.clone());
        }

        Ok(Deferred::resolved(env))
    }

    /// A ticket for the current environment.
    ///
    /// Resolved immediately when ready (same environment instance, no
    /// rebuild); enqueued for the next `setup` while pending.
    pub fn ready(&mut self) -> Deferred<Environment> {
        match &self.current {
            Some(env) => Deferred::resolved(env.clone()),
            None => {
                let ticket = Deferred::new();
                self.pending.waiters.push(ticket.clone());
                ticket
            }
        }
    }

    fn enqueue_app(&mut self, app: AppRef) -> Result<(), ViewError> {
        if self.pending.apps.iter().any(|a| Rc::ptr_eq(a, &app)) {
            return Err(ViewError::DuplicateApp);
        }

        // Most recently registered app's roots take search priority; the
        // app's own list order is preserved.
        let mut dirs = app.borrow().template_dirs();
        dirs.append(&mut self.pending.dirs);
        self.pending.dirs = dirs;
        self.pending.apps.push(app);
        Ok(())
    }
}

impl RegistrationFacade for Registry {
    type Ticket = Deferred<Environment>;

    fn register(&mut self, app: Option<AppRef>) -> Result<(), ViewError> {
        Registry::register(self, app).map(|_| ())
    }

    fn setup(
        &mut self,
        config: Config,
        root_app: Option<AppRef>,
    ) -> Result<Self::Ticket, ViewError> {
        Registry::setup(self, config, root_app)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("pending_apps", &self.pending.apps.len())
            .field("pending_dirs", &self.pending.dirs)
            .field("pending_waiters", &self.pending.waiters.len())
            .field("ready", &self.current.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{app_ref, BasicApp};
    use crate::context::{RequestLocals, ViewContext};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn render(app: &AppRef, name: &str) -> Result<String, ViewError> {
        app.borrow()
            .render(name, ViewContext::new(), &RequestLocals::new())
    }

    #[test]
    fn register_then_setup_resolves_tickets_in_enqueue_order() {
        let t = fixture(&[("index.html", "root:index")]);
        let app = app_ref(BasicApp::new(vec![t.path().to_path_buf()]));

        let mut registry = Registry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = registry.register(Some(app.clone())).unwrap();
        let sink = Rc::clone(&order);
        first.then(move |_| sink.borrow_mut().push(1));

        let second = registry.register(None).unwrap();
        let sink = Rc::clone(&order);
        second.then(move |_| sink.borrow_mut().push(2));

        assert!(!registry.is_ready());
        registry.setup(Config::new(), None).unwrap();

        assert_eq!(*order.borrow(), vec![1, 2]);
        assert!(registry.is_ready());
        assert_eq!(render(&app, "index").unwrap(), "root:index");
    }

    #[test]
    fn all_waiters_receive_the_same_environment_instance() {
        let t = fixture(&[("index.html", "x")]);
        let app = app_ref(BasicApp::new(vec![t.path().to_path_buf()]));

        let mut registry = Registry::new();
        let a = registry.register(Some(app)).unwrap();
        let b = registry.register(None).unwrap();
        let ticket = registry.setup(Config::new(), None).unwrap();

        let env_a = a.get().unwrap();
        let env_b = b.get().unwrap();
        assert!(env_a.ptr_eq(&env_b));
        assert!(env_a.ptr_eq(&ticket.get().unwrap()));
        // ready() after the build hands back the same instance, no rebuild.
        let mut registry = registry;
        assert!(env_a.ptr_eq(&registry.ready().get().unwrap()));
    }

    #[test]
    fn setup_root_app_roots_are_searched_first() {
        let early = fixture(&[("page.html", "from early")]);
        let root = fixture(&[("page.html", "from root")]);

        let sub = app_ref(BasicApp::new(vec![early.path().to_path_buf()]));
        let root_app = app_ref(BasicApp::new(vec![root.path().to_path_buf()]));

        let mut registry = Registry::new();
        registry.register(Some(sub.clone())).unwrap();
        registry.setup(Config::new(), Some(root_app)).unwrap();

        assert_eq!(render(&sub, "page").unwrap(), "from root");
    }

    #[test]
    fn later_registrations_outrank_earlier_ones() {
        let a = fixture(&[("page.html", "from a")]);
        let b = fixture(&[("page.html", "from b")]);

        let app_a = app_ref(BasicApp::new(vec![a.path().to_path_buf()]));
        let app_b = app_ref(BasicApp::new(vec![b.path().to_path_buf()]));

        let mut registry = Registry::new();
        registry.register(Some(app_a.clone())).unwrap();
        registry.register(Some(app_b)).unwrap();
        registry.setup(Config::new(), None).unwrap();

        assert_eq!(render(&app_a, "page").unwrap(), "from b");
    }

    #[test]
    fn an_apps_own_dir_order_is_preserved() {
        let one = fixture(&[("page.html", "one")]);
        let two = fixture(&[("page.html", "two")]);

        let app = app_ref(BasicApp::new(vec![
            one.path().to_path_buf(),
            two.path().to_path_buf(),
        ]));

        let mut registry = Registry::new();
        registry.register(Some(app.clone())).unwrap();
        registry.setup(Config::new(), None).unwrap();

        assert_eq!(render(&app, "page").unwrap(), "one");
    }

    #[test]
    fn duplicate_registration_is_rejected_and_pending_is_unchanged() {
        let t = fixture(&[("index.html", "x")]);
        let app = app_ref(BasicApp::new(vec![t.path().to_path_buf()]));

        let mut registry = Registry::new();
        registry.register(Some(app.clone())).unwrap();
        let before = format!("{:?}", registry);

        let err = registry.register(Some(app.clone())).unwrap_err();
        assert!(matches!(err, ViewError::DuplicateApp));
        assert_eq!(format!("{:?}", registry), before);

        // Setup still works over the original pending set.
        registry.setup(Config::new(), None).unwrap();
        assert_eq!(render(&app, "index").unwrap(), "x");
    }

    #[test]
    fn duplicate_root_app_in_setup_is_rejected() {
        let t = fixture(&[("index.html", "x")]);
        let app = app_ref(BasicApp::new(vec![t.path().to_path_buf()]));

        let mut registry = Registry::new();
        registry.register(Some(app.clone())).unwrap();
        assert!(matches!(
            registry.setup(Config::new(), Some(app)),
            Err(ViewError::DuplicateApp)
        ));
    }

    #[test]
    fn failed_setup_leaves_the_pending_set_for_retry() {
        let mut registry = Registry::new();
        let ticket = registry.register(None).unwrap();

        // No apps, no roots: the build fails and nothing fires.
        assert!(registry.setup(Config::new(), None).is_err());
        assert!(!registry.is_ready());
        assert!(!ticket.is_resolved());

        let t = fixture(&[("index.html", "x")]);
        let app = app_ref(BasicApp::new(vec![t.path().to_path_buf()]));
        registry.setup(Config::new(), Some(app)).unwrap();
        assert!(ticket.is_resolved());
    }

    #[test]
    fn a_new_cycle_discards_the_previous_environment() {
        let t1 = fixture(&[("index.html", "first cycle")]);
        let t2 = fixture(&[("index.html", "second cycle")]);

        let app1 = app_ref(BasicApp::new(vec![t1.path().to_path_buf()]));
        let app2 = app_ref(BasicApp::new(vec![t2.path().to_path_buf()]));

        let mut registry = Registry::new();
        registry.register(Some(app1)).unwrap();
        let first_env = registry.setup(Config::new(), None).unwrap().get().unwrap();

        registry.register(Some(app2.clone())).unwrap();
        let second_env = registry.setup(Config::new(), None).unwrap().get().unwrap();

        assert!(!first_env.ptr_eq(&second_env));
        assert!(registry.env().unwrap().ptr_eq(&second_env));
        assert_eq!(render(&app2, "index").unwrap(), "second cycle");
    }

    #[test]
    fn ready_while_pending_waits_for_the_next_setup() {
        let t = fixture(&[("index.html", "x")]);
        let app = app_ref(BasicApp::new(vec![t.path().to_path_buf()]));

        let mut registry = Registry::new();
        let ticket = registry.ready();
        assert!(!ticket.is_resolved());

        registry.setup(Config::new(), Some(app)).unwrap();
        assert!(ticket.is_resolved());
    }

    #[test]
    fn register_ticket_lets_a_sub_app_extend_the_environment() {
        let t = fixture(&[("f.html", "{{ value|shout }}")]);
        let app = app_ref(BasicApp::new(vec![t.path().to_path_buf()]));

        let mut registry = Registry::new();
        let ticket = registry.register(Some(app.clone())).unwrap();
        ticket.then(|env| {
            env.add_filter(
                "shout",
                std::sync::Arc::new(|v, _| {
                    Ok(minijinja::Value::from(format!("{}!", v)))
                }),
            );
        });

        registry
            .setup(Config::new().autoescape(false), None)
            .unwrap();

        let mut vars = ViewContext::new();
        vars.insert("value".into(), serde_json::json!("hey"));
        let out = app
            .borrow()
            .render("f", vars, &RequestLocals::new())
            .unwrap();
        assert_eq!(out, "hey!");
    }
}
