//! Environment configuration.
//!
//! [`Config`] carries everything the environment builder consumes: engine
//! flags, delimiter overrides, loader behavior, and the user's filters and
//! globals. Engine flags are `Option`s — `None` leaves the engine's own
//! default untouched, mirroring a configuration record where absent keys are
//! simply not applied.

use std::path::PathBuf;
use std::sync::Arc;

use minijinja::Value;
use viewbind_loader::{LoadError, LoaderOptions, TemplateLoader};

/// A user-supplied template filter.
///
/// Filters receive the piped value and any extra call arguments, and either
/// produce a value or fail the render. The `Arc` makes a filter table cheap
/// to build up front and hand to the environment at setup time.
pub type FilterFn = Arc<dyn Fn(Value, &[Value]) -> Result<Value, minijinja::Error> + Send + Sync>;

/// Alternate loader constructor, invoked with the aggregated template roots.
///
/// Lets an integration substitute its own [`TemplateLoader`] strategy while
/// the binding keeps ownership of root aggregation and ordering.
pub type LoaderFactory =
    Box<dyn Fn(Vec<PathBuf>, LoaderOptions) -> Result<Arc<dyn TemplateLoader>, LoadError>>;

/// Custom tag delimiters, each a `(start, end)` pair.
///
/// # Example
///
/// ```rust
/// use viewbind::TagDelimiters;
///
/// let tags = TagDelimiters {
///     block: ("<%".into(), "%>".into()),
///     variable: ("<$".into(), "$>".into()),
///     comment: ("<#".into(), "#>".into()),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDelimiters {
    /// Delimiters for block tags (`{% ... %}` by default).
    pub block: (String, String),
    /// Delimiters for variable interpolation (`{{ ... }}` by default).
    pub variable: (String, String),
    /// Delimiters for comments (`{# ... #}` by default).
    pub comment: (String, String),
}

/// Configuration for one environment build.
///
/// Built in the builder style:
///
/// ```rust
/// use viewbind::Config;
///
/// let config = Config::new()
///     .autoescape(true)
///     .trim_blocks(true)
///     .global("site_name", serde_json::json!("mysite"));
/// ```
#[derive(Default)]
pub struct Config {
    /// HTML-escape interpolated values. `None` keeps the engine default
    /// (escape by template extension).
    pub autoescape: Option<bool>,
    /// Fail renders that touch undefined variables.
    pub throw_on_undefined: Option<bool>,
    /// Remove the first newline after a block tag.
    pub trim_blocks: Option<bool>,
    /// Strip leading whitespace before a block tag.
    pub lstrip_blocks: Option<bool>,
    /// Custom tag delimiters.
    pub tags: Option<TagDelimiters>,
    /// Observe template files and invalidate on change.
    pub watch: bool,
    /// Bypass template caching entirely; re-read on every render.
    pub no_cache: bool,
    /// Filters to install, in insertion order (last write wins per name).
    pub filters: Vec<(String, FilterFn)>,
    /// Globals to install, in insertion order (last write wins per name).
    pub globals: Vec<(String, serde_json::Value)>,
    /// Alternate loader constructor. `None` selects the built-in loaders.
    pub loader: Option<LoaderFactory>,
}

impl Config {
    /// Creates an empty configuration (all engine defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the autoescape flag.
    pub fn autoescape(mut self, on: bool) -> Self {
        self.autoescape = Some(on);
        self
    }

    /// Sets strict-undefined behavior.
    pub fn throw_on_undefined(mut self, on: bool) -> Self {
        self.throw_on_undefined = Some(on);
        self
    }

    /// Sets block-trim behavior.
    pub fn trim_blocks(mut self, on: bool) -> Self {
        self.trim_blocks = Some(on);
        self
    }

    /// Sets leading-whitespace stripping for block tags.
    pub fn lstrip_blocks(mut self, on: bool) -> Self {
        self.lstrip_blocks = Some(on);
        self
    }

    /// Overrides the tag delimiters.
    pub fn tags(mut self, tags: TagDelimiters) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Enables filesystem observation.
    pub fn watch(mut self, on: bool) -> Self {
        self.watch = on;
        self
    }

    /// Disables template caching.
    pub fn no_cache(mut self, on: bool) -> Self {
        self.no_cache = on;
        self
    }

    /// Adds a filter under the given name.
    pub fn filter<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, &[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.filters.push((name.into(), Arc::new(f)));
        self
    }

    /// Adds a global value under the given name.
    pub fn global(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.globals.push((name.into(), value));
        self
    }

    /// Substitutes the loader constructor.
    pub fn loader(mut self, factory: LoaderFactory) -> Self {
        self.loader = Some(factory);
        self
    }

    /// The loader options derived from this configuration.
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            watch: self.watch,
            no_cache: self.no_cache,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("autoescape", &self.autoescape)
            .field("throw_on_undefined", &self.throw_on_undefined)
            .field("trim_blocks", &self.trim_blocks)
            .field("lstrip_blocks", &self.lstrip_blocks)
            .field("tags", &self.tags)
            .field("watch", &self.watch)
            .field("no_cache", &self.no_cache)
            .field(
                "filters",
                &self.filters.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field(
                "globals",
                &self.globals.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("loader", &self.loader.as_ref().map(|_| "<factory>"))
            .finish()
    }
}
