use std::sync::Arc;

use axum::extract::FromRef;

use crate::club::{self, service::ClubServiceImpl};
use crate::integration;
use crate::store::{self, GridFsBlobStore, MongoDocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub club_service: club::Service,
}

impl AppState {
    /// Connects to MongoDB once; the handle lives as long as the returned state.
    pub fn init(cfg: &integration::Config) -> Self {
        let db = cfg.mongo.connect();

        Self::new(
            Arc::new(MongoDocumentStore::new(&db)),
            Arc::new(GridFsBlobStore::new(&db)),
            &cfg.collection,
        )
    }

    pub fn new(documents: store::Documents, blobs: store::Blobs, collection: &str) -> Self {
        Self {
            club_service: Arc::new(ClubServiceImpl::new(documents, blobs, collection)),
        }
    }
}

impl FromRef<AppState> for club::Service {
    fn from_ref(s: &AppState) -> Self {
        s.club_service.clone()
    }
}
