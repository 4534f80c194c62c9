use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use mongodb::bson::{self, doc, oid::ObjectId};

use crate::store;

use super::{
    Error, Id,
    model::{Club, ConciseInfo, DetailInfo, NewClub, Upload},
};

/// Lifecycle of club aggregates: the document plus the blobs it references.
///
/// Identifiers arrive in their raw text form and are parsed before any store call is made.
#[async_trait]
pub trait ClubService {
    async fn create(&self, c: NewClub) -> super::Result<Id>;

    async fn upload_thumbnail(&self, id: &str, file: Option<Upload>) -> super::Result<String>;

    async fn upload_photos(&self, id: &str, files: Vec<Upload>) -> super::Result<Vec<String>>;

    async fn find_ids(&self) -> super::Result<Vec<Id>>;

    async fn find_concise_info(&self, id: &str) -> super::Result<ConciseInfo>;

    async fn find_detail_info(&self, id: &str) -> super::Result<DetailInfo>;

    async fn find_thumbnail(&self, id: &str) -> super::Result<Bytes>;

    async fn find_photo_ids(&self, id: &str) -> super::Result<Vec<String>>;

    async fn find_photo(&self, id: &str, photo_id: &str) -> super::Result<Bytes>;

    async fn delete(&self, id: &str) -> super::Result<()>;

    async fn delete_thumbnail(&self, id: &str) -> super::Result<()>;

    async fn delete_photo(&self, id: &str, photo_id: &str) -> super::Result<()>;
}

#[derive(Clone)]
pub struct ClubServiceImpl {
    documents: store::Documents,
    blobs: store::Blobs,
    collection: String,
}

impl ClubServiceImpl {
    pub fn new(
        documents: store::Documents,
        blobs: store::Blobs,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            blobs,
            collection: collection.into(),
        }
    }
}

fn parse_club_id(raw: &str) -> super::Result<ObjectId> {
    store::parse_id(raw).map_err(|_| Error::InvalidClubId(raw.to_owned()))
}

fn parse_photo_id(raw: &str) -> super::Result<ObjectId> {
    store::parse_id(raw).map_err(|_| Error::InvalidPhotoId(raw.to_owned()))
}

fn blob_error(e: store::Error) -> Error {
    match e {
        store::Error::BlobNotFound(id) => Error::BlobMissing(id),
        e => e.into(),
    }
}

impl ClubServiceImpl {
    async fn find_club(&self, oid: ObjectId) -> super::Result<Club> {
        let doc = self
            .documents
            .find_one(&self.collection, doc! { "_id": oid })
            .await?
            .ok_or(Error::NotFound(Id::from(oid)))?;

        bson::from_document(doc).map_err(Error::from)
    }

    async fn set_fields(&self, oid: ObjectId, fields: bson::Document) -> super::Result<()> {
        let updated = self
            .documents
            .update_one(&self.collection, doc! { "_id": oid }, fields)
            .await?;

        if !updated {
            return Err(Error::NotUpdated(Id::from(oid)));
        }

        Ok(())
    }

    async fn fetch_blob(&self, blob_id: &ObjectId) -> super::Result<Bytes> {
        self.blobs.get(blob_id).await.map_err(blob_error)
    }
}

#[async_trait]
impl ClubService for ClubServiceImpl {
    async fn create(&self, c: NewClub) -> super::Result<Id> {
        if c.name.trim().is_empty() {
            return Err(Error::BlankName);
        }

        let doc = bson::to_document(&Club::new(c))?;
        let oid = self
            .documents
            .insert_one(&self.collection, doc)
            .await?
            .ok_or(Error::NotCreated)?;

        debug!("created club {oid}");
        Ok(Id::from(oid))
    }

    async fn upload_thumbnail(&self, id: &str, file: Option<Upload>) -> super::Result<String> {
        let oid = parse_club_id(id)?;
        let file = file.ok_or(Error::MissingFile("thumbnail"))?;
        let club = self.find_club(oid).await?;

        let blob_id = self.blobs.put(file.content, &file.filename).await?;

        if let Some(previous) = club.thumbnail() {
            warn!("club {oid}: thumbnail replaced, previous blob {previous} is left in the store");
        }

        self.set_fields(oid, doc! { "thumbnail_id": blob_id.to_hex() })
            .await?;

        debug!("club {oid}: thumbnail set to {blob_id}");
        Ok(blob_id.to_hex())
    }

    async fn upload_photos(&self, id: &str, files: Vec<Upload>) -> super::Result<Vec<String>> {
        let oid = parse_club_id(id)?;
        if files.is_empty() {
            return Err(Error::MissingFile("photos"));
        }

        // read-append-write of the whole list; concurrent uploads may lose entries
        let mut club = self.find_club(oid).await?;

        let mut uploaded = Vec::with_capacity(files.len());
        for f in files {
            let blob_id = self.blobs.put(f.content, &f.filename).await?.to_hex();
            club.photo_id_list.push(blob_id.clone());
            uploaded.push(blob_id);
        }

        self.set_fields(oid, doc! { "photo_id_list": club.photo_id_list.clone() })
            .await?;

        debug!("club {oid}: {} photo(s) appended", uploaded.len());
        Ok(uploaded)
    }

    async fn find_ids(&self) -> super::Result<Vec<Id>> {
        let docs = self.documents.find(&self.collection, doc! {}).await?;

        if docs.is_empty() {
            return Err(Error::NoClubs);
        }

        let ids = docs
            .iter()
            .filter_map(|d| d.get_object_id("_id").ok())
            .map(Id::from)
            .collect();

        Ok(ids)
    }

    async fn find_concise_info(&self, id: &str) -> super::Result<ConciseInfo> {
        let oid = parse_club_id(id)?;
        self.find_club(oid).await.map(ConciseInfo::from)
    }

    async fn find_detail_info(&self, id: &str) -> super::Result<DetailInfo> {
        let oid = parse_club_id(id)?;
        self.find_club(oid).await.map(DetailInfo::from)
    }

    async fn find_thumbnail(&self, id: &str) -> super::Result<Bytes> {
        let oid = parse_club_id(id)?;
        let club = self.find_club(oid).await?;

        let thumbnail = club
            .thumbnail()
            .ok_or(Error::ThumbnailNotFound(Id::from(oid)))?;
        let blob_id = store::parse_id(thumbnail)?;

        self.fetch_blob(&blob_id).await
    }

    async fn find_photo_ids(&self, id: &str) -> super::Result<Vec<String>> {
        let oid = parse_club_id(id)?;
        self.find_club(oid).await.map(|c| c.photo_id_list)
    }

    async fn find_photo(&self, id: &str, photo_id: &str) -> super::Result<Bytes> {
        let oid = parse_club_id(id)?;
        let photo_oid = parse_photo_id(photo_id)?;
        let club = self.find_club(oid).await?;

        let photo_hex = photo_oid.to_hex();
        if !club.has_photo(&photo_hex) {
            return Err(Error::PhotoNotFound(Id::from(oid), photo_hex));
        }

        self.fetch_blob(&photo_oid).await
    }

    async fn delete(&self, id: &str) -> super::Result<()> {
        let oid = parse_club_id(id)?;
        let club = self.find_club(oid).await?;

        // leaves first, then the document; failed steps are counted, not rolled back
        let mut failures = 0;
        if club.thumbnail().is_some() {
            if let Err(e) = self.delete_thumbnail(id).await {
                warn!("club {oid}: cascade could not delete thumbnail: {e}");
                failures += 1;
            }
        }

        for photo_id in &club.photo_id_list {
            if let Err(e) = self.delete_photo(id, photo_id).await {
                warn!("club {oid}: cascade could not delete photo {photo_id}: {e}");
                failures += 1;
            }
        }

        let deleted = self
            .documents
            .delete_one(&self.collection, doc! { "_id": oid })
            .await?;

        if !deleted {
            return Err(Error::NotDeleted(Id::from(oid)));
        }

        if failures > 0 {
            return Err(Error::CascadeIncomplete {
                id: Id::from(oid),
                failures,
            });
        }

        debug!("deleted club {oid}");
        Ok(())
    }

    async fn delete_thumbnail(&self, id: &str) -> super::Result<()> {
        let oid = parse_club_id(id)?;
        let club = self.find_club(oid).await?;

        let thumbnail = club
            .thumbnail()
            .ok_or(Error::ThumbnailNotFound(Id::from(oid)))?;
        let blob_id = store::parse_id(thumbnail)?;

        self.blobs.delete(&blob_id).await?;
        self.set_fields(oid, doc! { "thumbnail_id": "" }).await?;

        debug!("club {oid}: thumbnail {blob_id} deleted");
        Ok(())
    }

    async fn delete_photo(&self, id: &str, photo_id: &str) -> super::Result<()> {
        let oid = parse_club_id(id)?;
        let photo_oid = parse_photo_id(photo_id)?;
        let mut club = self.find_club(oid).await?;

        let photo_hex = photo_oid.to_hex();
        if club.photo_id_list.is_empty() || !club.has_photo(&photo_hex) {
            return Err(Error::PhotoNotFound(Id::from(oid), photo_hex));
        }

        self.blobs.delete(&photo_oid).await?;
        club.remove_photo(&photo_hex);
        self.set_fields(oid, doc! { "photo_id_list": club.photo_id_list.clone() })
            .await?;

        debug!("club {oid}: photo {photo_hex} deleted");
        Ok(())
    }
}
