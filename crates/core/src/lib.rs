pub mod archiver;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod search;
pub mod stores;
pub mod summarizer;
pub mod traits;
pub mod trust;

pub use archiver::{sanitize_domain, storage_key, Archiver};
pub use document::render_docx;
pub use error::{
    ArchiveError, DocumentError, FetchError, ResearchError, SearchError, StoreError,
    SummarizeError,
};
pub use fetcher::{BrowserOptions, WebDriverFetcher};
pub use models::{
    format_run_date, ArchiveReceipt, ArchivedObject, FailurePolicy, KeywordOutcome,
    KeywordReport, PageContent, ResearchOptions, RunReport, SearchQuery, SearchResult,
    StagePolicy, SummaryDocument, UrlOutcome, UrlStatus, DEFAULT_MAX_RESULTS, DOCX_CONTENT_TYPE,
};
pub use orchestrator::Researcher;
pub use search::DuckDuckGoSearch;
pub use stores::{Credentials, LocalDirectoryStore, S3Config, S3Store, StoreBackend};
pub use summarizer::OpenAiSummarizer;
pub use traits::{ContentStore, PageFetcher, Summarizer, WebSearch};
pub use trust::TrustedSiteSet;
