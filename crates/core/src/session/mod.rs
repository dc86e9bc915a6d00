//! Session projection derived from identity events.

mod models;
/// Shared session handle.
pub mod projection;

pub use models::{Notice, Route, Session, SessionTransition};
pub use projection::SessionProjection;
