use crate::{
    ArchivedObject, FetchError, PageContent, SearchError, SearchQuery, SearchResult, StoreError,
    SummarizeError,
};
use async_trait::async_trait;

#[async_trait]
pub trait WebSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError>;
}

#[async_trait]
pub trait PageFetcher {
    /// Returns the visible text of `url`. One browser session per call.
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}

#[async_trait]
pub trait Summarizer {
    async fn summarize(&self, keyword: &str, text: &str) -> Result<String, SummarizeError>;
}

#[async_trait]
pub trait ContentStore {
    /// Writes `object` under its key, replacing any previous object. Returns its location.
    async fn put(&self, object: &ArchivedObject) -> Result<String, StoreError>;
}
