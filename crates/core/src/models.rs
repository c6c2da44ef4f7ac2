use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Date format used in queries, document bodies and storage keys.
pub const RUN_DATE_FORMAT: &str = "%d-%m-%Y";

pub fn format_run_date(date: NaiveDate) -> String {
    date.format(RUN_DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub keyword: String,
    pub date: String,
    pub max_results: usize,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, date: impl Into<String>, max_results: usize) -> Self {
        Self {
            keyword: keyword.into(),
            date: date.into(),
            max_results,
        }
    }

    pub fn text(&self) -> String {
        format!("{} {}", self.keyword, self.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            snippet: String::new(),
        }
    }
}

/// Visible page text. Empty text means the page is unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent(String);

impl PageContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_usable(&self) -> bool {
        !self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PageContent {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryDocument {
    pub source_url: String,
    pub extracted_date: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedObject {
    pub key: String,
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

/// Where an archived object ended up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub key: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StagePolicy {
    /// Record the failure on the URL and move on.
    #[default]
    Skip,
    /// Stop the run and return the error.
    Abort,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailurePolicy {
    pub search: StagePolicy,
    pub summarize: StagePolicy,
    pub archive: StagePolicy,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            search: StagePolicy::Abort,
            summarize: StagePolicy::Skip,
            archive: StagePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResearchOptions {
    pub max_results: usize,
    pub policy: FailurePolicy,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            policy: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UrlStatus {
    Archived { key: String, location: String },
    EmptyContent,
    FetchFailed { reason: String },
    SummaryFailed { reason: String },
    ArchiveFailed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlOutcome {
    pub url: String,
    #[serde(flatten)]
    pub status: UrlStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordOutcome {
    SearchFailed,
    NoTrustedSources,
    NoRelevantContent,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordReport {
    pub keyword: String,
    pub query: String,
    pub found_urls: Vec<String>,
    pub trusted_urls: Vec<String>,
    pub urls: Vec<UrlOutcome>,
    pub search_error: Option<String>,
}

impl KeywordReport {
    pub fn new(keyword: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            query: query.into(),
            found_urls: Vec::new(),
            trusted_urls: Vec::new(),
            urls: Vec::new(),
            search_error: None,
        }
    }

    pub fn archived_count(&self) -> usize {
        self.urls
            .iter()
            .filter(|outcome| matches!(outcome.status, UrlStatus::Archived { .. }))
            .count()
    }

    pub fn outcome(&self) -> KeywordOutcome {
        if self.search_error.is_some() {
            KeywordOutcome::SearchFailed
        } else if self.trusted_urls.is_empty() {
            KeywordOutcome::NoTrustedSources
        } else if self.archived_count() == 0 {
            KeywordOutcome::NoRelevantContent
        } else {
            KeywordOutcome::Archived
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub date: String,
    pub keywords: Vec<KeywordReport>,
}

impl RunReport {
    pub fn archived_count(&self) -> usize {
        self.keywords.iter().map(KeywordReport::archived_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_text_appends_date_to_keyword() {
        let query = SearchQuery::new("Inflation", "19-10-2026", 10);
        assert_eq!(query.text(), "Inflation 19-10-2026");
    }

    #[test]
    fn run_date_is_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).expect("valid date");
        assert_eq!(format_run_date(date), "07-03-2026");
    }

    #[test]
    fn whitespace_only_page_is_unusable() {
        assert!(!PageContent::empty().is_usable());
        assert!(!PageContent::new(" \n\t").is_usable());
        assert!(PageContent::new("body text").is_usable());
    }

    #[test]
    fn keyword_outcome_follows_report_contents() {
        let mut report = KeywordReport::new("Inflation", "Inflation 19-10-2026");
        assert_eq!(report.outcome(), KeywordOutcome::NoTrustedSources);

        report.trusted_urls.push("https://www.reuters.com/a".to_string());
        report.urls.push(UrlOutcome {
            url: "https://www.reuters.com/a".to_string(),
            status: UrlStatus::EmptyContent,
        });
        assert_eq!(report.outcome(), KeywordOutcome::NoRelevantContent);

        report.urls.push(UrlOutcome {
            url: "https://www.reuters.com/b".to_string(),
            status: UrlStatus::Archived {
                key: "scraped_data/reuters_com_19-10-2026.docx".to_string(),
                location: "s3://bucket/scraped_data/reuters_com_19-10-2026.docx".to_string(),
            },
        });
        assert_eq!(report.outcome(), KeywordOutcome::Archived);
        assert_eq!(report.archived_count(), 1);
    }

    #[test]
    fn default_policy_skips_summaries_and_aborts_on_storage() {
        let policy = FailurePolicy::default();
        assert_eq!(policy.summarize, StagePolicy::Skip);
        assert_eq!(policy.archive, StagePolicy::Abort);
        assert_eq!(policy.search, StagePolicy::Abort);
    }
}
