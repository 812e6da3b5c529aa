pub mod assistant;
pub mod auth;
pub mod boards;
pub mod cards;
pub mod chat;
pub mod error;
pub mod extract;
pub mod members;
pub mod middleware;
pub mod router;
pub mod sessions;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use router::router;
