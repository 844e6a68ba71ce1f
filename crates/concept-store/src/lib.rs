//! User document storage for conceptd.
//!
//! [`UserStore`] is the seam between the HTTP layer and persistence. Every
//! write is one of the [`UserUpdate`] variants.

/// In-memory store.
pub mod memory;
/// The store trait and the file-backed implementation.
#[allow(missing_docs)]
pub mod store;
/// Typed document updates.
pub mod update;

pub use memory::MemoryUserStore;
pub use store::{FileUserStore, UserStore};
pub use update::UserUpdate;
