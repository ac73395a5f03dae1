//! The registration contract shared by both lifecycle variants.

use crate::app::AppRef;
use crate::config::Config;
use crate::error::ViewError;

/// Common interface over the two registration lifecycles.
///
/// [`Registry`](crate::Registry) is the deferred variant — `setup` hands out
/// a [`Deferred`](crate::Deferred) ticket and may run again to start a fresh
/// cycle. [`Setup`](crate::Setup) is the immediate, non-reentrant variant —
/// `setup` returns the environment directly and refuses to run twice. Host
/// integrations pick one and program against this trait.
pub trait RegistrationFacade {
    /// What `setup` produces: the environment itself, or a ticket for it.
    type Ticket;

    /// Adds an application to the current cycle (a no-op with `None` where
    /// the variant has nothing else to enqueue).
    fn register(&mut self, app: Option<AppRef>) -> Result<(), ViewError>;

    /// Builds the shared environment over everything registered so far,
    /// folding in `root_app` with highest search priority.
    fn setup(&mut self, config: Config, root_app: Option<AppRef>)
        -> Result<Self::Ticket, ViewError>;
}
