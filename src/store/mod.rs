//! Persistence for the three entity collections.
//!
//! Two interchangeable backends implement [`EntityStore`]:
//! - [`LocalStore`]: whole collection as one JSON value in key/value storage,
//!   seeded on first use, ids generated locally.
//! - [`RemoteStore`]: one hosted table per entity; the backend assigns ids,
//!   creation timestamps and ordering.
//!
//! The backend is picked once at construction time; consumers only see the
//! trait.

pub mod local;
pub mod remote;

pub use local::{get_collection, LocalStore};
pub use remote::{RemoteStore, RestClient};

use crate::entities::Entity;
use crate::error::Result;
use async_trait::async_trait;

/// CRUD surface shared by every backend.
///
/// `update` does not return the updated row; callers re-fetch with `get`
/// when they need to observe the result.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Short backend name for logs.
    fn backend_tag(&self) -> &'static str;

    async fn get(&self) -> Result<Vec<E>>;

    async fn add(&self, new: E::New) -> Result<E>;

    /// Replace the fields named in `patch` on the record with `id`.
    /// Unknown ids are not an error.
    async fn update(&self, id: &str, patch: E::Patch) -> Result<()>;

    /// Unknown ids are not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}
