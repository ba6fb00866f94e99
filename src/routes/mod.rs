//! Router module index.
//!
//! Routing is split by access level so the authorization boundary is visible
//! in the module layout itself: everything in `admin` sits behind the
//! route-layer admin gate, everything in `public` is anonymous.

/// Anonymous routes: the public JSON API, the login endpoints, health.
/// Handlers must enforce visibility (`is_published` / `is_approved`) at the
/// repository level.
pub mod public;

/// Console routes nested under `/admin`, wrapped by the admin middleware.
pub mod admin;
