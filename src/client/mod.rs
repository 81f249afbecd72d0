//! Client-side document cache kept in step with an authoritative store.
//!
//! Mutations go to the store first. The cache only changes after the store
//! call succeeds, and then only with the record the store returned.

use std::sync::Arc;

use crate::codec;
use crate::errors::AppError;
use crate::models::{Document, DocumentPatch, NewDocument};
use crate::query::{self, SortField, SortState};
use crate::store::RemoteStore;

/// Cached view of the document collection.
pub struct DocumentClient {
    store: Arc<dyn RemoteStore>,
    documents: Vec<Document>,
    sort: SortState,
}

impl DocumentClient {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            documents: Vec::new(),
            sort: SortState::default(),
        }
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    /// Cached documents in their current order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn find(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Display number suggested for the next new document.
    pub fn next_number(&self) -> String {
        (self.documents.len() + 1).to_string()
    }

    pub async fn check_connection(&self) -> bool {
        self.store.check_connection().await
    }

    /// Replace the cache with the store's collection. On failure the
    /// previous cache is kept.
    pub async fn load(&mut self) -> Result<&[Document], AppError> {
        match self.store.list().await {
            Ok(documents) => {
                self.documents = documents;
                Ok(self.documents.as_slice())
            }
            Err(e) => {
                tracing::error!("Failed to load documents: {}", e);
                Err(e)
            }
        }
    }

    /// Create a document and append the store's record to the cache.
    pub async fn create(&mut self, data: &NewDocument) -> Result<Document, AppError> {
        match self.store.create(data).await {
            Ok(document) => {
                self.documents.push(document.clone());
                Ok(document)
            }
            Err(e) => {
                tracing::error!("Failed to create document: {}", e);
                Err(e)
            }
        }
    }

    /// Update a document and replace the matching cache entry with the
    /// store's record. If the id is not cached the cache is left as it is
    /// and the store's record is still returned.
    pub async fn update(&mut self, id: &str, patch: &DocumentPatch) -> Result<Document, AppError> {
        let document = match self.store.update(id, patch).await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("Failed to update document {}: {}", id, e);
                return Err(e);
            }
        };

        match self.documents.iter_mut().find(|doc| doc.id == id) {
            Some(cached) => *cached = document.clone(),
            None => tracing::warn!(id, "Updated document is not in the local cache"),
        }
        Ok(document)
    }

    /// Delete a document and drop every cache entry with its id.
    pub async fn delete(&mut self, id: &str) -> Result<Document, AppError> {
        match self.store.delete(id).await {
            Ok(document) => {
                self.documents.retain(|doc| doc.id != id);
                Ok(document)
            }
            Err(e) => {
                tracing::error!("Failed to delete document {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Filtered view of the cache; the cache itself is untouched.
    pub fn search(&self, query: &str) -> Vec<&Document> {
        query::search(&self.documents, query)
    }

    /// Sort the cache in place by `field`, toggling direction when the same
    /// field is selected twice in a row. Returns the new sort state.
    pub fn sort(&mut self, field: SortField) -> SortState {
        self.sort.toggle(field);
        query::sort_documents(&mut self.documents, field, self.sort.direction);
        self.sort
    }

    /// Encode the cache, in its current order, as CSV.
    pub fn export_csv(&self) -> String {
        codec::encode(&self.documents)
    }

    /// Encoded cache wrapped as a downloadable `data:` URI.
    pub fn export_data_uri(&self) -> String {
        codec::to_data_uri(&self.export_csv())
    }

    /// Decode `text` and create each row in order.
    ///
    /// An empty decode result is an [`AppError::Decode`]. Creation stops at
    /// the first failure; rows created before it stay in the store and the
    /// cache. Returns how many documents were created.
    pub async fn import_csv(&mut self, text: &str) -> Result<usize, AppError> {
        let rows = codec::decode(text);
        if rows.is_empty() {
            return Err(AppError::nothing_to_import());
        }

        let total = rows.len();
        for (imported, row) in rows.iter().enumerate() {
            if let Err(e) = self.create(row).await {
                tracing::warn!(imported, total, "Import stopped early");
                return Err(e);
            }
        }

        tracing::info!(total, "Imported documents");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_timestamp;
    use crate::query::SortDirection;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store that can be told to fail, and that stamps its own
    /// values onto every record so tests can tell server output from input.
    #[derive(Default)]
    struct MockStore {
        documents: Mutex<Vec<Document>>,
        fail: AtomicBool,
        fail_after_creates: Mutex<Option<usize>>,
        creates: AtomicUsize,
    }

    impl MockStore {
        fn with(documents: Vec<Document>) -> Self {
            Self {
                documents: Mutex::new(documents),
                ..Default::default()
            }
        }

        fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), AppError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Transport {
                    status: Some(500),
                    message: "simulated failure".to_string(),
                });
            }
            Ok(())
        }

        fn stored(&self) -> Vec<Document> {
            self.documents.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteStore for MockStore {
        async fn list(&self) -> Result<Vec<Document>, AppError> {
            self.check()?;
            Ok(self.stored())
        }

        async fn get(&self, id: &str) -> Result<Document, AppError> {
            self.check()?;
            self.stored()
                .into_iter()
                .find(|d| d.id == id)
                .ok_or_else(|| AppError::document_not_found(id))
        }

        async fn create(&self, data: &NewDocument) -> Result<Document, AppError> {
            self.check()?;
            let n = self.creates.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = *self.fail_after_creates.lock().unwrap() {
                if n >= limit {
                    return Err(AppError::Transport {
                        status: Some(503),
                        message: "quota".to_string(),
                    });
                }
            }
            let mut doc = data.clone().into_document(format!("srv-{}", n), now_timestamp());
            doc.number = format!("{}", n + 100);
            self.documents.lock().unwrap().push(doc.clone());
            Ok(doc)
        }

        async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, AppError> {
            self.check()?;
            let mut docs = self.documents.lock().unwrap();
            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| AppError::document_not_found(id))?;
            patch.apply_to(doc);
            doc.link = "server-canonical".to_string();
            Ok(doc.clone())
        }

        async fn delete(&self, id: &str) -> Result<Document, AppError> {
            self.check()?;
            let mut docs = self.documents.lock().unwrap();
            let index = docs
                .iter()
                .position(|d| d.id == id)
                .ok_or_else(|| AppError::document_not_found(id))?;
            Ok(docs.remove(index))
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }

    fn doc(id: &str, name: &str) -> Document {
        Document {
            id: id.to_string(),
            name: name.to_string(),
            scope: "All".to_string(),
            ..Default::default()
        }
    }

    fn new_doc(name: &str) -> NewDocument {
        NewDocument {
            name: name.to_string(),
            scope: "All".to_string(),
            ..Default::default()
        }
    }

    fn client_with(store: &Arc<MockStore>) -> DocumentClient {
        let store: Arc<dyn RemoteStore> = store.clone();
        DocumentClient::new(store)
    }

    #[tokio::test]
    async fn test_load_replaces_cache() {
        let store = Arc::new(MockStore::with(vec![doc("1", "A"), doc("2", "B")]));
        let mut client = client_with(&store);

        assert_eq!(client.load().await.unwrap().len(), 2);
        assert_eq!(client.next_number(), "3");
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_cache() {
        let store = Arc::new(MockStore::with(vec![doc("1", "A")]));
        let mut client = client_with(&store);
        client.load().await.unwrap();

        store.set_fail(true);
        assert!(client.load().await.is_err());
        assert_eq!(client.documents().len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_cache_unchanged() {
        let store = Arc::new(MockStore::default());
        let mut client = client_with(&store);
        store.set_fail(true);

        let err = client.create(&new_doc("A")).await.unwrap_err();
        assert!(matches!(err, AppError::Transport { status: Some(500), .. }));
        assert!(client.documents().is_empty());
    }

    #[tokio::test]
    async fn test_create_caches_server_record() {
        let store = Arc::new(MockStore::default());
        let mut client = client_with(&store);

        let mut data = new_doc("A");
        data.number = "7".to_string();
        let created = client.create(&data).await.unwrap();

        assert_eq!(created.id, "srv-0");
        assert_eq!(client.documents(), &[created.clone()]);
        assert_eq!(client.documents()[0].number, "100");
    }

    #[tokio::test]
    async fn test_update_replaces_entry_with_server_record() {
        let store = Arc::new(MockStore::with(vec![doc("1", "A"), doc("2", "B")]));
        let mut client = client_with(&store);
        client.load().await.unwrap();

        let patch = DocumentPatch {
            name: Some("A2".to_string()),
            ..Default::default()
        };
        let updated = client.update("1", &patch).await.unwrap();

        assert_eq!(client.find("1"), Some(&updated));
        assert_eq!(client.find("1").unwrap().link, "server-canonical");
        assert_eq!(client.documents()[0].id, "1");
    }

    #[tokio::test]
    async fn test_update_of_uncached_id_leaves_cache_alone() {
        let store = Arc::new(MockStore::with(vec![doc("1", "A"), doc("2", "B")]));
        let mut client = client_with(&store);
        client.load().await.unwrap();
        store.documents.lock().unwrap().push(doc("3", "C"));

        let before = client.documents().to_vec();
        let updated = client.update("3", &DocumentPatch::default()).await.unwrap();

        assert_eq!(updated.id, "3");
        assert_eq!(client.documents(), before.as_slice());
    }

    #[tokio::test]
    async fn test_update_failure_leaves_cache_alone() {
        let store = Arc::new(MockStore::with(vec![doc("1", "A")]));
        let mut client = client_with(&store);
        client.load().await.unwrap();

        let err = client
            .update("missing", &DocumentPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(client.documents()[0].name, "A");
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let store = Arc::new(MockStore::with(vec![doc("1", "A"), doc("2", "B")]));
        let mut client = client_with(&store);
        client.load().await.unwrap();

        client.delete("1").await.unwrap();
        assert_eq!(client.documents().len(), 1);
        assert_eq!(client.documents()[0].id, "2");

        store.set_fail(true);
        assert!(client.delete("2").await.is_err());
        assert_eq!(client.documents().len(), 1);
    }

    #[tokio::test]
    async fn test_sort_toggles_and_reorders_cache() {
        let store = Arc::new(MockStore::with(vec![
            doc("1", "Б"),
            doc("2", "А"),
            doc("3", "В"),
        ]));
        let mut client = client_with(&store);
        client.load().await.unwrap();

        let state = client.sort(SortField::Name);
        assert_eq!(state.direction, SortDirection::Asc);
        let ids: Vec<&str> = client.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);

        let state = client.sort(SortField::Name);
        assert_eq!(state.direction, SortDirection::Desc);
        let ids: Vec<&str> = client.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);

        let state = client.sort(SortField::Code);
        assert_eq!(state.field, Some(SortField::Code));
        assert_eq!(state.direction, SortDirection::Asc);
        assert_eq!(client.sort_state(), state);
    }

    #[tokio::test]
    async fn test_search_does_not_mutate_cache() {
        let store = Arc::new(MockStore::with(vec![doc("1", "Прогресс"), doc("2", "Other")]));
        let mut client = client_with(&store);
        client.load().await.unwrap();

        assert_eq!(client.search("прог").len(), 1);
        assert_eq!(client.search("").len(), 2);
        assert_eq!(client.documents().len(), 2);
    }

    #[tokio::test]
    async fn test_import_creates_each_row() {
        let store = Arc::new(MockStore::default());
        let mut client = client_with(&store);

        let text = "header\n1;01;\"A; first\";c;d;\"s\";l\n\n2;02;\"B\";c;d;\"s\";l\n";
        assert_eq!(client.import_csv(text).await.unwrap(), 2);
        assert_eq!(client.documents().len(), 2);
        assert_eq!(store.stored()[0].name, "A; first");
    }

    #[tokio::test]
    async fn test_import_of_nothing_is_decode_error() {
        let store = Arc::new(MockStore::default());
        let mut client = client_with(&store);

        let err = client.import_csv("header\n1;2;3\n").await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_partial_import_keeps_created_rows() {
        let store = Arc::new(MockStore::default());
        *store.fail_after_creates.lock().unwrap() = Some(2);
        let mut client = client_with(&store);

        let text = "h\n1;;\"A\";;;\"s\";\n2;;\"B\";;;\"s\";\n3;;\"C\";;;\"s\";\n";
        let err = client.import_csv(text).await.unwrap_err();

        assert!(matches!(err, AppError::Transport { status: Some(503), .. }));
        assert_eq!(client.documents().len(), 2);
        assert_eq!(store.stored().len(), 2);
    }

    #[tokio::test]
    async fn test_export_round_trips_through_import() {
        let mut tricky = doc("1", "He said \"hi\"");
        tricky.scope = "North;South".to_string();
        let store = Arc::new(MockStore::with(vec![tricky.clone(), doc("2", "Plain")]));
        let mut client = client_with(&store);
        client.load().await.unwrap();

        let csv = client.export_csv();
        let decoded = codec::decode(&csv);
        assert_eq!(decoded[0], NewDocument::from(&tricky));
        assert_eq!(decoded.len(), 2);

        assert!(client.export_data_uri().starts_with(codec::DATA_URI_PREFIX));
    }
}
