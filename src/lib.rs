//! Support-ticket tracking core: tickets and their activity log, user
//! sessions, and self-expiring notifications, all persisted through one
//! scoped key/value store.

pub mod clock;
pub mod config;
pub mod context;
pub mod db;
pub mod demo;
pub mod error;
pub mod forms;
pub mod models;
pub mod notify;
pub mod session;
pub mod storage;
pub mod tickets;

pub use context::AppContext;
pub use error::{StoreError, StoreResult};
