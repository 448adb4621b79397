use std::collections::BTreeMap;

use async_trait::async_trait;

use super::AdapterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn put_object(&self, object: ArchiveObject) -> Result<(), AdapterError>;
}
