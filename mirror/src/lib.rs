//! Durable local mirror of a player's remote game history.
//!
//! Three layers compose here: [`cache`] is the persistent local store,
//! [`client`] talks to the remote service with conditional-fetch support,
//! and [`store`] decides when each is consulted and heals the cache when
//! the two disagree.

pub mod cache;
pub mod client;
pub mod error;
pub mod model;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod store;
pub mod traits;

pub use cache::ArchiveCache;
pub use client::{ArchiveClient, ArchiveFetch};
pub use error::MirrorError;
pub use model::{Game, Player, PlayerResult};
pub use store::GameStore;
pub use traits::RemoteArchives;
