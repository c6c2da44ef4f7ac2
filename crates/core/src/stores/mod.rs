pub mod local;
pub mod s3;
pub mod sigv4;

pub use local::LocalDirectoryStore;
pub use s3::{S3Config, S3Store};
pub use sigv4::Credentials;

use crate::traits::ContentStore;
use crate::{ArchivedObject, StoreError};
use async_trait::async_trait;

/// Store selected at startup.
pub enum StoreBackend {
    S3(S3Store),
    Local(LocalDirectoryStore),
}

#[async_trait]
impl ContentStore for StoreBackend {
    async fn put(&self, object: &ArchivedObject) -> Result<String, StoreError> {
        match self {
            Self::S3(store) => store.put(object).await,
            Self::Local(store) => store.put(object).await,
        }
    }
}
