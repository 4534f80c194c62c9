use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Database,
    bson::{Document, doc, oid::ObjectId},
};

/// Collection-addressed document CRUD.
#[async_trait]
pub trait DocumentStore {
    /// Returns `None` when the write was not acknowledged with an inserted id.
    async fn insert_one(&self, collection: &str, doc: Document) -> super::Result<Option<ObjectId>>;

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> super::Result<Option<Document>>;

    async fn find(&self, collection: &str, filter: Document) -> super::Result<Vec<Document>>;

    /// Merges `fields` into the first matching document. Returns whether one matched.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> super::Result<bool>;

    async fn delete_one(&self, collection: &str, filter: Document) -> super::Result<bool>;
}

pub struct MongoDocumentStore {
    db: Database,
}

impl MongoDocumentStore {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    fn col(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection(name)
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn insert_one(&self, collection: &str, doc: Document) -> super::Result<Option<ObjectId>> {
        let res = self.col(collection).insert_one(doc).await?;

        Ok(res.inserted_id.as_object_id())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> super::Result<Option<Document>> {
        self.col(collection)
            .find_one(filter)
            .await
            .map_err(super::Error::from)
    }

    async fn find(&self, collection: &str, filter: Document) -> super::Result<Vec<Document>> {
        let cursor = self.col(collection).find(filter).await?;

        cursor.try_collect().await.map_err(super::Error::from)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> super::Result<bool> {
        let res = self
            .col(collection)
            .update_one(filter, doc! { "$set": fields })
            .await?;

        Ok(res.matched_count > 0)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> super::Result<bool> {
        let res = self.col(collection).delete_one(filter).await?;

        Ok(res.deleted_count > 0)
    }
}
