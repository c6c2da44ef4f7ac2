use crate::traits::ContentStore;
use crate::{ArchivedObject, StoreError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Writes objects below a directory, mirroring their keys as relative paths.
#[derive(Debug, Clone)]
pub struct LocalDirectoryStore {
    root: PathBuf,
}

impl LocalDirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StoreError::InvalidConfig(format!(
                "key is not a relative object path: {key}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentStore for LocalDirectoryStore {
    async fn put(&self, object: &ArchivedObject) -> Result<String, StoreError> {
        let path = self.path_for(&object.key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &object.content).await?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DOCX_CONTENT_TYPE;
    use tempfile::tempdir;

    fn object(content: &[u8]) -> ArchivedObject {
        ArchivedObject {
            key: "scraped_data/forbes_com_19-10-2026.docx".to_string(),
            content: content.to_vec(),
            content_type: DOCX_CONTENT_TYPE,
        }
    }

    #[tokio::test]
    async fn put_creates_nested_file_and_overwrites() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = LocalDirectoryStore::new(dir.path());

        store.put(&object(b"first")).await?;
        let location = store.put(&object(b"second")).await?;

        let expected = dir.path().join("scraped_data/forbes_com_19-10-2026.docx");
        assert_eq!(location, expected.display().to_string());
        assert_eq!(std::fs::read(&expected)?, b"second");
        Ok(())
    }

    #[tokio::test]
    async fn keys_cannot_escape_root() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = LocalDirectoryStore::new(dir.path());
        let mut escaping = object(b"x");
        escaping.key = "../outside.docx".to_string();

        assert!(matches!(
            store.put(&escaping).await,
            Err(StoreError::InvalidConfig(_))
        ));
        Ok(())
    }
}
