//! Uploaded file metadata in the MongoDB `rawdata` collection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use deepcytes_core::defaults::{DOCUMENT_DATABASE, FILES_COLLECTION};
use deepcytes_core::{
    Error, FileMetadata, FileMetadataRepository, FilePage, NewFileMetadata, Result, ServiceProbe,
};

use crate::config::{redact_uri, MongoConfig};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    original_name: String,
    mime_type: String,
    size: i64,
    uploaded_at: BsonDateTime,
}

impl FileDocument {
    fn into_metadata(self) -> FileMetadata {
        FileMetadata {
            id: self.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            original_name: self.original_name,
            mime_type: self.mime_type,
            size: self.size.max(0) as u64,
            uploaded_at: to_chrono(self.uploaded_at),
        }
    }
}

fn to_chrono(ts: BsonDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts.timestamp_millis()).unwrap_or_default()
}

/// True for driver errors that mean the server could not be reached.
fn is_connection_error(err: &mongodb::error::Error) -> bool {
    matches!(*err.kind, ErrorKind::ServerSelection { .. } | ErrorKind::Io(_))
}

/// MongoDB-backed file metadata store.
///
/// Tracks the last observed connection state so handlers can answer 503
/// without a round trip.
pub struct MongoFileStore {
    client: Client,
    database: Database,
    collection: Collection<FileDocument>,
    connected: AtomicBool,
}

impl MongoFileStore {
    /// Build the driver client. The driver connects lazily, so this only
    /// fails on an unusable connection string.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| Error::Config(format!("invalid MONGO_URI: {}", e)))?;
        options.server_selection_timeout = Some(config.server_selection_timeout);
        options.connect_timeout = Some(config.server_selection_timeout);
        options.app_name = Some("deepcytes-api".to_string());

        let client = Client::with_options(options)
            .map_err(|e| Error::Config(format!("document store client: {}", e)))?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DOCUMENT_DATABASE));
        let collection = database.collection::<FileDocument>(FILES_COLLECTION);

        info!(
            subsystem = "db",
            component = "files",
            uri = %redact_uri(&config.uri),
            database = database.name(),
            "Document store client created"
        );

        Ok(Self {
            client,
            database,
            collection,
            connected: AtomicBool::new(false),
        })
    }

    fn observe<T>(&self, result: mongodb::error::Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.connected.store(true, Ordering::Release);
                Ok(value)
            }
            Err(e) if is_connection_error(&e) => {
                self.connected.store(false, Ordering::Release);
                Err(Error::Unavailable(e.to_string()))
            }
            Err(e) => Err(Error::Document(e.to_string())),
        }
    }

    /// Round-trip `ping` command.
    pub async fn ping(&self) -> Result<()> {
        let result = self.database.run_command(doc! { "ping": 1 }, None).await;
        self.observe(result).map(|_| ())
    }

    /// Shut the driver down, giving up after `deadline`.
    pub async fn close(&self, deadline: Duration) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        tokio::time::timeout(deadline, self.client.clone().shutdown())
            .await
            .map_err(|_| Error::Document("timed out closing the document store".into()))
    }
}

#[async_trait]
impl FileMetadataRepository for MongoFileStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    #[instrument(skip(self, file), fields(subsystem = "db", component = "files", op = "insert", size = file.size))]
    async fn insert(&self, file: NewFileMetadata) -> Result<FileMetadata> {
        let mut document = FileDocument {
            id: None,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size: i64::try_from(file.size).unwrap_or(i64::MAX),
            uploaded_at: BsonDateTime::now(),
        };
        let result = self.collection.insert_one(&document, None).await;
        let inserted = self.observe(result)?;
        document.id = inserted.inserted_id.as_object_id();
        Ok(document.into_metadata())
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "files", op = "list"))]
    async fn list(&self, skip: u64, limit: u64) -> Result<FilePage> {
        let options = FindOptions::builder()
            .sort(doc! { "uploadedAt": -1 })
            .skip(skip)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        let cursor = self.observe(self.collection.find(doc! {}, options).await)?;
        let documents: Vec<FileDocument> = self.observe(cursor.try_collect().await)?;
        let total = self.observe(self.collection.count_documents(doc! {}, None).await)?;

        Ok(FilePage {
            files: documents.into_iter().map(FileDocument::into_metadata).collect(),
            total,
        })
    }
}

#[async_trait]
impl ServiceProbe for MongoFileStore {
    fn service_name(&self) -> &'static str {
        "mongodb"
    }

    async fn probe(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(subsystem = "db", component = "files", "MongoDB health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_field_names() {
        let document = FileDocument {
            id: None,
            original_name: "data.csv".into(),
            mime_type: "text/csv".into(),
            size: 12,
            uploaded_at: BsonDateTime::from_millis(1_700_000_000_000),
        };
        let bson = mongodb::bson::to_document(&document).unwrap();
        assert!(bson.get("_id").is_none());
        assert_eq!(bson.get_str("originalName").unwrap(), "data.csv");
        assert_eq!(bson.get_str("mimeType").unwrap(), "text/csv");
        assert_eq!(bson.get_i64("size").unwrap(), 12);
        assert!(bson.get_datetime("uploadedAt").is_ok());
    }

    #[test]
    fn test_into_metadata() {
        let oid = ObjectId::new();
        let document = FileDocument {
            id: Some(oid),
            original_name: "sheet.xlsx".into(),
            mime_type: "application/vnd.ms-excel".into(),
            size: 2048,
            uploaded_at: BsonDateTime::from_millis(1_700_000_000_123),
        };
        let meta = document.into_metadata();
        assert_eq!(meta.id, oid.to_hex());
        assert_eq!(meta.size, 2048);
        assert_eq!(meta.uploaded_at.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_documents_with_version_key_decode() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "originalName": "a.json",
            "mimeType": "application/json",
            "size": 3_i64,
            "uploadedAt": BsonDateTime::now(),
            "__v": 0,
        };
        let decoded: FileDocument = mongodb::bson::from_document(raw).unwrap();
        assert_eq!(decoded.original_name, "a.json");
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_uri() {
        let err = MongoFileStore::connect(&MongoConfig::new().uri("not-a-uri"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_new_store_reports_disconnected() {
        let store = MongoFileStore::connect(&MongoConfig::default()).await.unwrap();
        assert!(!store.is_connected());
    }
}
