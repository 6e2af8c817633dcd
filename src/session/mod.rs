// Session lifecycle management

pub mod context;
pub mod manager;
pub mod store;

pub use context::SessionContext;
pub use manager::{EndReason, SessionManager};
pub use store::IdentityStore;
