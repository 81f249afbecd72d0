//! Authoritative document stores.
//!
//! [`RemoteStore`] is the CRUD contract the client cache talks to. Every
//! operation returns the store's canonical record, never an echo of the
//! caller's input.

mod file;
mod http;

pub use file::*;
pub use http::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Document, DocumentPatch, NewDocument};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Full collection in store order.
    async fn list(&self) -> Result<Vec<Document>, AppError>;

    async fn get(&self, id: &str) -> Result<Document, AppError>;

    /// Store a new record, assigning its id and timestamps.
    async fn create(&self, data: &NewDocument) -> Result<Document, AppError>;

    /// Merge `patch` over the stored record and return the result.
    async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, AppError>;

    /// Remove a record and return it as it was stored.
    async fn delete(&self, id: &str) -> Result<Document, AppError>;

    /// Liveness check: the store is reachable if `list` succeeds.
    async fn check_connection(&self) -> bool {
        self.list().await.is_ok()
    }

    /// Human-readable location of the store for status output.
    fn describe(&self) -> String;
}
