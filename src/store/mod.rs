use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

pub mod blob;
pub mod document;
#[cfg(test)]
pub mod memory;

pub use blob::{BlobStore, GridFsBlobStore};
pub use document::{DocumentStore, MongoDocumentStore};

pub type Result<T> = std::result::Result<T, Error>;
pub type Documents = Arc<dyn DocumentStore + Send + Sync>;
pub type Blobs = Arc<dyn BlobStore + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid object id: {0:?}")]
    InvalidId(String),
    #[error("blob not found: {0}")]
    BlobNotFound(ObjectId),
    #[error("blob was stored without an object id")]
    MissingBlobId,

    #[error(transparent)]
    _MongoDB(#[from] mongodb::error::Error),
    #[error(transparent)]
    _Io(#[from] std::io::Error),
}

/// Parses the 24-character hex form of a store identifier.
///
/// Malformed input is reported as [`Error::InvalidId`], never as a panic.
pub fn parse_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| Error::InvalidId(raw.to_owned()))
}
