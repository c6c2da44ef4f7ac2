use crate::document::render_docx;
use crate::error::ArchiveError;
use crate::traits::ContentStore;
use crate::trust::host_of;
use crate::{ArchiveReceipt, ArchivedObject, SummaryDocument, DOCX_CONTENT_TYPE};
use tracing::info;

pub const KEY_PREFIX: &str = "scraped_data";

/// `www.reuters.com` -> `reuters_com`.
pub fn sanitize_domain(host: &str) -> String {
    host.strip_prefix("www.").unwrap_or(host).replace('.', "_")
}

pub fn storage_key(source_url: &str, date: &str) -> Result<String, ArchiveError> {
    let host =
        host_of(source_url).ok_or_else(|| ArchiveError::InvalidSourceUrl(source_url.to_string()))?;
    Ok(format!("{KEY_PREFIX}/{}_{date}.docx", sanitize_domain(&host)))
}

pub struct Archiver<C>
where
    C: ContentStore,
{
    store: C,
}

impl<C> Archiver<C>
where
    C: ContentStore + Send + Sync,
{
    pub fn new(store: C) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub async fn archive(
        &self,
        source_url: &str,
        summary: &str,
        date: &str,
    ) -> Result<ArchiveReceipt, ArchiveError> {
        let key = storage_key(source_url, date)?;
        let content = render_docx(&SummaryDocument {
            source_url: source_url.to_string(),
            extracted_date: date.to_string(),
            body: summary.to_string(),
        })?;

        let object = ArchivedObject {
            key,
            content,
            content_type: DOCX_CONTENT_TYPE,
        };
        let location = self.store.put(&object).await?;
        info!(key = %object.key, location = %location, bytes = object.content.len(), "uploaded document");

        Ok(ArchiveReceipt {
            key: object.key,
            location,
        })
    }
}
