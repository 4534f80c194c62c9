use std::{fmt::Display, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use log::error;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use service::ClubService;

use crate::{state::AppState, store};

mod handler;
pub mod model;
pub mod service;

pub type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn ClubService + Send + Sync>;

/// Text form of a club identifier as handed out to clients.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ObjectId> for Id {
    fn from(oid: ObjectId) -> Self {
        Self(oid.to_hex())
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route(
            "/clubs",
            post(handler::api::create).get(handler::api::find_ids),
        )
        .route("/clubs/{id}", delete(handler::api::delete))
        .route(
            "/clubs/{id}/upload_thumbnail",
            post(handler::api::upload_thumbnail),
        )
        .route("/clubs/{id}/upload_photos", post(handler::api::upload_photos))
        .route("/clubs/{id}/concise_info", get(handler::api::concise_info))
        .route("/clubs/{id}/detail_info", get(handler::api::detail_info))
        .route("/clubs/{id}/thumbnail", get(handler::api::thumbnail))
        .route("/clubs/{id}/photos", get(handler::api::photo_ids))
        .route("/clubs/{id}/photos/{photo_id}", get(handler::api::photo))
        .route("/club/{id}/thumbnail", delete(handler::api::delete_thumbnail))
        .route(
            "/club/{id}/photos/{photo_id}",
            delete(handler::api::delete_photo),
        )
        .with_state(s)
}

/// Client-facing error details.
pub mod detail {
    pub const INSERT_FAILED: &str = "insert failed";
    pub const FIND_FAILED: &str = "find failed";
    pub const UPDATE_FAILED: &str = "update failed";
    pub const DELETE_FAILED: &str = "delete failed";
    pub const INVALID_CLUB_ID: &str = "invalid club id";
    pub const INVALID_PHOTO_ID: &str = "invalid photo id";
    pub const INVALID_REQUEST: &str = "invalid request";
    pub const INTERNAL_ERROR: &str = "internal error";
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid club id: {0:?}")]
    InvalidClubId(String),
    #[error("invalid photo id: {0:?}")]
    InvalidPhotoId(String),
    #[error("club not found: {0}")]
    NotFound(Id),
    #[error("no clubs registered")]
    NoClubs,
    #[error("club {0} has no thumbnail")]
    ThumbnailNotFound(Id),
    #[error("photo {1} not found in club {0}")]
    PhotoNotFound(Id, String),
    #[error("blob {0} is referenced but missing from the blob store")]
    BlobMissing(ObjectId),
    #[error("could not create club")]
    NotCreated,
    #[error("could not update club: {0}")]
    NotUpdated(Id),
    #[error("could not delete club: {0}")]
    NotDeleted(Id),
    #[error("club {id} deleted, {failures} cascade step(s) failed")]
    CascadeIncomplete { id: Id, failures: usize },
    #[error("club name must not be blank")]
    BlankName,
    #[error("no file in multipart field {0:?}")]
    MissingFile(&'static str),

    #[error(transparent)]
    _Json(#[from] JsonRejection),
    #[error(transparent)]
    _MultipartRejection(#[from] MultipartRejection),
    #[error(transparent)]
    _Multipart(#[from] MultipartError),
    #[error(transparent)]
    _Store(#[from] store::Error),
    #[error(transparent)]
    _BsonSer(#[from] mongodb::bson::ser::Error),
    #[error(transparent)]
    _BsonDe(#[from] mongodb::bson::de::Error),
}

impl Error {
    fn status_and_detail(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidClubId(_) => (StatusCode::BAD_REQUEST, detail::INVALID_CLUB_ID),
            Self::InvalidPhotoId(_) => (StatusCode::BAD_REQUEST, detail::INVALID_PHOTO_ID),
            Self::BlankName
            | Self::MissingFile(_)
            | Self::_Json(_)
            | Self::_MultipartRejection(_)
            | Self::_Multipart(_) => {
                (StatusCode::BAD_REQUEST, detail::INVALID_REQUEST)
            }
            Self::NotFound(_)
            | Self::NoClubs
            | Self::ThumbnailNotFound(_)
            | Self::PhotoNotFound(..)
            | Self::BlobMissing(_) => (StatusCode::NOT_FOUND, detail::FIND_FAILED),
            Self::NotCreated => (StatusCode::INTERNAL_SERVER_ERROR, detail::INSERT_FAILED),
            Self::NotUpdated(_) => (StatusCode::INTERNAL_SERVER_ERROR, detail::UPDATE_FAILED),
            Self::NotDeleted(_) | Self::CascadeIncomplete { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, detail::DELETE_FAILED)
            }
            Self::_Store(_) | Self::_BsonSer(_) | Self::_BsonDe(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, detail::INTERNAL_ERROR)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            detail: &'static str,
        }

        error!("{self}");

        let (status, detail) = self.status_and_detail();
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_invalid_ids_to_bad_request() {
        let (status, detail) = Error::InvalidClubId("x".into()).status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail, detail::INVALID_CLUB_ID);

        let (status, detail) = Error::InvalidPhotoId("y".into()).status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail, detail::INVALID_PHOTO_ID);
    }

    #[test]
    fn should_map_absent_resources_to_not_found() {
        let id = Id::from(ObjectId::new());
        for e in [
            Error::NotFound(id.clone()),
            Error::NoClubs,
            Error::ThumbnailNotFound(id.clone()),
            Error::PhotoNotFound(id, "p".into()),
            Error::BlobMissing(ObjectId::new()),
        ] {
            assert_eq!(
                e.status_and_detail(),
                (StatusCode::NOT_FOUND, detail::FIND_FAILED)
            );
        }
    }

    #[test]
    fn should_map_unacknowledged_writes_to_server_error() {
        let id = Id::from(ObjectId::new());
        assert_eq!(
            Error::NotCreated.status_and_detail(),
            (StatusCode::INTERNAL_SERVER_ERROR, detail::INSERT_FAILED)
        );
        assert_eq!(
            Error::NotUpdated(id.clone()).status_and_detail(),
            (StatusCode::INTERNAL_SERVER_ERROR, detail::UPDATE_FAILED)
        );
        assert_eq!(
            Error::CascadeIncomplete { id, failures: 2 }.status_and_detail(),
            (StatusCode::INTERNAL_SERVER_ERROR, detail::DELETE_FAILED)
        );
    }

    #[test]
    fn should_render_id_as_hex() {
        let oid = ObjectId::new();
        let id = Id::from(oid);
        assert_eq!(id.to_string(), oid.to_hex());
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", oid.to_hex()));
    }
}
