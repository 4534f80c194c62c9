use async_trait::async_trait;
use bytes::Bytes;
use futures::io::{AsyncReadExt, AsyncWriteExt};
use log::debug;
use mongodb::{
    Database,
    bson::{Bson, oid::ObjectId},
    error::{ErrorKind, GridFsErrorKind},
    gridfs::GridFsBucket,
};

/// Binary content addressed by store-assigned ids.
#[async_trait]
pub trait BlobStore {
    async fn put(&self, content: Bytes, filename: &str) -> super::Result<ObjectId>;

    /// Fails with [`super::Error::BlobNotFound`] when nothing is stored under `id`.
    async fn get(&self, id: &ObjectId) -> super::Result<Bytes>;

    /// Deleting an absent blob is not an error.
    async fn delete(&self, id: &ObjectId) -> super::Result<()>;
}

pub struct GridFsBlobStore {
    bucket: GridFsBucket,
}

impl GridFsBlobStore {
    pub fn new(db: &Database) -> Self {
        Self {
            bucket: db.gridfs_bucket(None),
        }
    }
}

fn is_file_not_found(e: &mongodb::error::Error) -> bool {
    matches!(
        *e.kind,
        ErrorKind::GridFs(GridFsErrorKind::FileNotFound { .. })
    )
}

#[async_trait]
impl BlobStore for GridFsBlobStore {
    async fn put(&self, content: Bytes, filename: &str) -> super::Result<ObjectId> {
        let mut upload = self.bucket.open_upload_stream(filename).await?;
        upload.write_all(&content).await?;
        upload.close().await?;

        let id = upload
            .id()
            .as_object_id()
            .ok_or(super::Error::MissingBlobId)?;

        debug!("stored blob {id} ({filename}, {} bytes)", content.len());
        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> super::Result<Bytes> {
        let mut download = match self.bucket.open_download_stream(Bson::ObjectId(*id)).await {
            Ok(d) => d,
            Err(e) if is_file_not_found(&e) => return Err(super::Error::BlobNotFound(*id)),
            Err(e) => return Err(e.into()),
        };

        let mut buf = Vec::new();
        download.read_to_end(&mut buf).await?;

        Ok(Bytes::from(buf))
    }

    async fn delete(&self, id: &ObjectId) -> super::Result<()> {
        match self.bucket.delete(Bson::ObjectId(*id)).await {
            Ok(()) => Ok(()),
            Err(e) if is_file_not_found(&e) => {
                debug!("blob {id} already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod test {
    use testcontainers_modules::{mongo::Mongo, testcontainers::runners::AsyncRunner};

    use crate::{integration::db, store};

    use super::*;

    #[tokio::test]
    async fn should_put_and_get() {
        let node = Mongo::default().start().await.unwrap();
        let db = db::Config::test(&node).await.connect();
        let blobs = GridFsBlobStore::new(&db);

        let content = Bytes::from_static(b"\x89PNG\r\n\x1a\nnot really a png");
        let id = blobs.put(content.clone(), "thumb.png").await.unwrap();

        let actual = blobs.get(&id).await.unwrap();

        assert_eq!(actual, content);
    }

    #[tokio::test]
    async fn should_put_empty_content() {
        let node = Mongo::default().start().await.unwrap();
        let db = db::Config::test(&node).await.connect();
        let blobs = GridFsBlobStore::new(&db);

        let id = blobs.put(Bytes::new(), "empty.png").await.unwrap();

        assert!(blobs.get(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_not_get_missing_blob() {
        let node = Mongo::default().start().await.unwrap();
        let db = db::Config::test(&node).await.connect();
        let blobs = GridFsBlobStore::new(&db);

        let missing = ObjectId::new();
        let res = blobs.get(&missing).await;

        assert!(matches!(res, Err(store::Error::BlobNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn should_delete() {
        let node = Mongo::default().start().await.unwrap();
        let db = db::Config::test(&node).await.connect();
        let blobs = GridFsBlobStore::new(&db);

        let id = blobs
            .put(Bytes::from_static(b"photo"), "photo.png")
            .await
            .unwrap();

        blobs.delete(&id).await.unwrap();

        assert!(matches!(
            blobs.get(&id).await,
            Err(store::Error::BlobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_ignore_delete_of_missing_blob() {
        let node = Mongo::default().start().await.unwrap();
        let db = db::Config::test(&node).await.connect();
        let blobs = GridFsBlobStore::new(&db);

        let res = blobs.delete(&ObjectId::new()).await;

        assert!(res.is_ok());
    }
}
