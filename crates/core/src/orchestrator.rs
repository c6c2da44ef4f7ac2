use crate::archiver::Archiver;
use crate::traits::{ContentStore, PageFetcher, Summarizer, WebSearch};
use crate::{
    format_run_date, KeywordOutcome, KeywordReport, ResearchError, ResearchOptions, RunReport,
    SearchQuery, StagePolicy, TrustedSiteSet, UrlOutcome, UrlStatus,
};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

/// Runs search, trust filtering, fetch, summarize and archive for each keyword in turn.
pub struct Researcher<S, F, M, C>
where
    S: WebSearch,
    F: PageFetcher,
    M: Summarizer,
    C: ContentStore,
{
    search: S,
    fetcher: F,
    summarizer: M,
    archiver: Archiver<C>,
    options: ResearchOptions,
}

impl<S, F, M, C> Researcher<S, F, M, C>
where
    S: WebSearch + Send + Sync,
    F: PageFetcher + Send + Sync,
    M: Summarizer + Send + Sync,
    C: ContentStore + Send + Sync,
{
    pub fn new(search: S, fetcher: F, summarizer: M, store: C) -> Self {
        Self {
            search,
            fetcher,
            summarizer,
            archiver: Archiver::new(store),
            options: ResearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn archiver(&self) -> &Archiver<C> {
        &self.archiver
    }

    /// Runs with today's local date.
    pub async fn run(
        &self,
        keywords: &[String],
        trusted: &TrustedSiteSet,
    ) -> Result<RunReport, ResearchError> {
        self.run_on(Local::now().date_naive(), keywords, trusted)
            .await
    }

    /// Runs with a fixed date shared by every keyword.
    pub async fn run_on(
        &self,
        date: NaiveDate,
        keywords: &[String],
        trusted: &TrustedSiteSet,
    ) -> Result<RunReport, ResearchError> {
        let date = format_run_date(date);
        let mut reports = Vec::with_capacity(keywords.len());

        for keyword in keywords {
            let report = self.research_keyword(keyword, &date, trusted).await?;
            reports.push(report);
        }

        let report = RunReport {
            date,
            keywords: reports,
        };
        info!(
            keywords = report.keywords.len(),
            archived = report.archived_count(),
            "research run finished"
        );
        Ok(report)
    }

    async fn research_keyword(
        &self,
        keyword: &str,
        date: &str,
        trusted: &TrustedSiteSet,
    ) -> Result<KeywordReport, ResearchError> {
        let query = SearchQuery::new(keyword, date, self.options.max_results);
        let mut report = KeywordReport::new(keyword, query.text());
        info!(%keyword, query = %report.query, "searching");

        let results = match self.search.search(&query).await {
            Ok(results) => results,
            Err(source) => match self.options.policy.search {
                StagePolicy::Abort => {
                    return Err(ResearchError::Search {
                        keyword: keyword.to_string(),
                        source,
                    })
                }
                StagePolicy::Skip => {
                    warn!(%keyword, error = %source, "search failed, skipping keyword");
                    report.search_error = Some(source.to_string());
                    return Ok(report);
                }
            },
        };

        report.found_urls = results.into_iter().map(|result| result.url).collect();
        for url in &report.found_urls {
            info!(%keyword, %url, "found url");
        }

        report.trusted_urls = trusted.filter(report.found_urls.iter().map(String::as_str));
        if report.trusted_urls.is_empty() {
            info!(%keyword, "no trusted sources found");
            return Ok(report);
        }
        info!(%keyword, trusted = report.trusted_urls.len(), "trusted results");

        for url in report.trusted_urls.clone() {
            let status = self.process_url(keyword, &url, date).await?;
            report.urls.push(UrlOutcome { url, status });
        }

        if report.outcome() == KeywordOutcome::NoRelevantContent {
            info!(%keyword, "no relevant content found");
        }

        Ok(report)
    }

    async fn process_url(
        &self,
        keyword: &str,
        url: &str,
        date: &str,
    ) -> Result<UrlStatus, ResearchError> {
        let content = match self.fetcher.fetch(url).await {
            Ok(content) if content.is_usable() => content,
            Ok(_) => {
                info!(%url, "page had no text, skipping");
                return Ok(UrlStatus::EmptyContent);
            }
            Err(error) => {
                warn!(%url, %error, "error scraping page, skipping");
                return Ok(UrlStatus::FetchFailed {
                    reason: error.to_string(),
                });
            }
        };

        let summary = match self.summarizer.summarize(keyword, content.as_str()).await {
            Ok(summary) => summary,
            Err(source) => match self.options.policy.summarize {
                StagePolicy::Abort => {
                    return Err(ResearchError::Summarize {
                        keyword: keyword.to_string(),
                        url: url.to_string(),
                        source,
                    })
                }
                StagePolicy::Skip => {
                    warn!(%keyword, %url, error = %source, "summary failed, skipping");
                    return Ok(UrlStatus::SummaryFailed {
                        reason: source.to_string(),
                    });
                }
            },
        };

        match self.archiver.archive(url, &summary, date).await {
            Ok(receipt) => Ok(UrlStatus::Archived {
                key: receipt.key,
                location: receipt.location,
            }),
            Err(source) => match self.options.policy.archive {
                StagePolicy::Abort => Err(ResearchError::Archive {
                    keyword: keyword.to_string(),
                    url: url.to_string(),
                    source,
                }),
                StagePolicy::Skip => {
                    warn!(%keyword, %url, error = %source, "archive failed, skipping");
                    Ok(UrlStatus::ArchiveFailed {
                        reason: source.to_string(),
                    })
                }
            },
        }
    }
}
