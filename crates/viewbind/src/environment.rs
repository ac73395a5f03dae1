//! The shared rendering environment.
//!
//! One [`Environment`] is built per registration cycle and shared by every
//! bound application. The handle is a cheap clone; identity of the underlying
//! environment is handle identity ([`Environment::ptr_eq`]), which is what
//! "all waiters receive the same environment" means in practice.
//!
//! Filters and globals may be added after the build, but only during the
//! setup phase — never concurrently with in-flight renders. That is a caller
//! contract, not something enforced at runtime.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use log::debug;
use minijinja::syntax::SyntaxConfig;
use minijinja::value::Rest;
use minijinja::{AutoEscape, UndefinedBehavior, Value};
use serde::Serialize;
use viewbind_loader::{FsLoader, TemplateLoader, WatchLoader};

use crate::config::{Config, FilterFn};
use crate::error::ViewError;

struct EnvironmentInner {
    engine: RefCell<minijinja::Environment<'static>>,
    loader: Arc<dyn TemplateLoader>,
}

/// Handle to the shared rendering environment.
///
/// Owns the engine's compiled-template state, the filter and global tables,
/// and the loader. Effectively immutable once setup finishes; renders borrow
/// it read-only.
#[derive(Clone)]
pub struct Environment {
    inner: Rc<EnvironmentInner>,
}

impl Environment {
    /// Renders a template by name with the given context.
    ///
    /// The context is anything serializable; maps render as the template's
    /// top-level namespace.
    ///
    /// # Errors
    ///
    /// [`ViewError::TemplateNotFound`] when no root contains the name;
    /// [`ViewError::Template`] for syntax or render-time failures. A failed
    /// render never produces partial output.
    pub fn render<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String, ViewError> {
        if self.inner.loader.needs_reload() {
            debug!("loader reported stale templates; clearing compiled cache");
            self.inner.engine.borrow_mut().clear_templates();
        }

        let engine = self.inner.engine.borrow();
        let template = engine.get_template(name)?;
        Ok(template.render(Value::from_serialize(ctx))?)
    }

    /// Installs a filter, replacing any prior filter with the same name.
    pub fn add_filter(&self, name: impl Into<String>, filter: FilterFn) {
        self.inner
            .engine
            .borrow_mut()
            .add_filter(name.into(), move |value: Value, rest: Rest<Value>| {
                filter(value, &rest.0)
            });
    }

    /// Installs a global value, replacing any prior global with the same name.
    pub fn add_global(&self, name: impl Into<String>, value: serde_json::Value) {
        self.inner
            .engine
            .borrow_mut()
            .add_global(name.into(), Value::from_serialize(&value));
    }

    /// The ordered template roots the environment searches.
    pub fn template_roots(&self) -> Vec<PathBuf> {
        self.inner.loader.roots().to_vec()
    }

    /// Returns true when both handles refer to the same built environment.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("roots", &self.inner.loader.roots())
            .finish()
    }
}

/// Builds the shared environment over the aggregated template roots.
///
/// Root order is taken as given — aggregation and precedence are the
/// facades' business. Construction fails if the loader cannot be built (no
/// roots, or a root that is not a directory) or if the delimiter override is
/// invalid; failures propagate without retry.
pub(crate) fn build_environment(
    dirs: Vec<PathBuf>,
    config: &Config,
) -> Result<Environment, ViewError> {
    let opts = config.loader_options();
    let loader: Arc<dyn TemplateLoader> = match &config.loader {
        Some(factory) => factory(dirs, opts)?,
        None if opts.watch || opts.no_cache => Arc::new(WatchLoader::new(dirs, opts)?),
        None => Arc::new(FsLoader::new(dirs)?),
    };
    debug!(
        "building environment over {} template root(s)",
        loader.roots().len()
    );

    let mut engine = minijinja::Environment::new();

    let source = Arc::clone(&loader);
    engine.set_loader(move |name| {
        source.load(name).map_err(|err| {
            minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
        })
    });

    if let Some(on) = config.autoescape {
        let escape = if on { AutoEscape::Html } else { AutoEscape::None };
        engine.set_auto_escape_callback(move |_| escape);
    }
    if let Some(on) = config.throw_on_undefined {
        engine.set_undefined_behavior(if on {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
    }
    if let Some(on) = config.trim_blocks {
        engine.set_trim_blocks(on);
    }
    if let Some(on) = config.lstrip_blocks {
        engine.set_lstrip_blocks(on);
    }
    if let Some(tags) = &config.tags {
        let syntax = SyntaxConfig::builder()
            .block_delimiters(tags.block.0.clone(), tags.block.1.clone())
            .variable_delimiters(tags.variable.0.clone(), tags.variable.1.clone())
            .comment_delimiters(tags.comment.0.clone(), tags.comment.1.clone())
            .build()?;
        engine.set_syntax(syntax);
    }

    let env = Environment {
        inner: Rc::new(EnvironmentInner {
            engine: RefCell::new(engine),
            loader,
        }),
    };

    // Insertion order; a repeated name overwrites the earlier entry.
    for (name, filter) in &config.filters {
        env.add_filter(name.clone(), Arc::clone(filter));
    }
    for (name, value) in &config.globals {
        env.add_global(name.clone(), value.clone());
    }

    Ok(env)
}
