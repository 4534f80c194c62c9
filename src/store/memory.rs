use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use mongodb::bson::{Document, oid::ObjectId};
use tokio::sync::Mutex;

use super::{BlobStore, DocumentStore};

/// Document and blob store kept in process memory.
///
/// Filters match on top-level field equality, which is all the club service issues.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    blobs: Mutex<HashMap<ObjectId, (String, Bytes)>>,
    calls: AtomicUsize,
    unacknowledged: AtomicBool,
    failing_blob_deletes: AtomicBool,
}

impl MemoryStore {
    /// Number of gateway calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent document write report "not acknowledged".
    pub fn set_unacknowledged(&self, value: bool) {
        self.unacknowledged.store(value, Ordering::SeqCst);
    }

    pub fn set_failing_blob_deletes(&self, value: bool) {
        self.failing_blob_deletes.store(value, Ordering::SeqCst);
    }

    pub async fn blob_count(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn contains_blob(&self, id: &ObjectId) -> bool {
        self.blobs.lock().await.contains_key(id)
    }

    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or_default()
    }

    fn record_call(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        !self.unacknowledged.load(Ordering::SeqCst)
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(k, v)| doc.get(k) == Some(v))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(
        &self,
        collection: &str,
        mut doc: Document,
    ) -> super::Result<Option<ObjectId>> {
        if !self.record_call() {
            return Ok(None);
        }

        let id = ObjectId::new();
        doc.insert("_id", id);
        self.collections
            .lock()
            .await
            .entry(collection.to_owned())
            .or_default()
            .push(doc);

        Ok(Some(id))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> super::Result<Option<Document>> {
        self.record_call();

        let collections = self.collections.lock().await;
        let found = collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, &filter)))
            .cloned();

        Ok(found)
    }

    async fn find(&self, collection: &str, filter: Document) -> super::Result<Vec<Document>> {
        self.record_call();

        let collections = self.collections.lock().await;
        let found = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches(d, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(found)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> super::Result<bool> {
        if !self.record_call() {
            return Ok(false);
        }

        let mut collections = self.collections.lock().await;
        let target = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| matches(d, &filter)));

        match target {
            Some(doc) => {
                for (k, v) in fields {
                    doc.insert(k, v);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> super::Result<bool> {
        if !self.record_call() {
            return Ok(false);
        }

        let mut collections = self.collections.lock().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match docs.iter().position(|d| matches(d, &filter)) {
            Some(pos) => {
                docs.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, content: Bytes, filename: &str) -> super::Result<ObjectId> {
        self.record_call();

        let id = ObjectId::new();
        self.blobs
            .lock()
            .await
            .insert(id, (filename.to_owned(), content));

        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> super::Result<Bytes> {
        self.record_call();

        self.blobs
            .lock()
            .await
            .get(id)
            .map(|(_, content)| content.clone())
            .ok_or(super::Error::BlobNotFound(*id))
    }

    async fn delete(&self, id: &ObjectId) -> super::Result<()> {
        self.record_call();

        if self.failing_blob_deletes.load(Ordering::SeqCst) {
            return Err(super::Error::_Io(std::io::Error::other("blob store unavailable")));
        }

        self.blobs.lock().await.remove(id);
        Ok(())
    }
}
