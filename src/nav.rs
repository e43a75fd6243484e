//! Navigation collaborator.
//!
//! The host (router, terminal shell, test double) decides what "going to a
//! route" means. The session core only asks for a destination change or a
//! full reload.

use crate::route::Route;

pub trait Navigator: Send + Sync {
    /// Move the host to `route`.
    fn navigate_to(&self, route: Route);

    /// Tell the host its in-memory view state is stale and must be rebuilt.
    fn force_reload(&self);
}
