use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use keyword_research_core::fetcher::{DEFAULT_SETTLE_DELAY, DEFAULT_USER_AGENT, DEFAULT_WEBDRIVER_URL};
use keyword_research_core::stores::s3::DEFAULT_REGION;
use keyword_research_core::summarizer::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL};
use keyword_research_core::{
    BrowserOptions, Credentials, DuckDuckGoSearch, FailurePolicy, KeywordOutcome,
    LocalDirectoryStore, OpenAiSummarizer, ResearchOptions, Researcher, S3Config, S3Store,
    StagePolicy, StoreBackend, TrustedSiteSet, WebDriverFetcher, DEFAULT_MAX_RESULTS,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_KEYWORDS: [&str; 4] = [
    "Risk Management",
    "Cyber Crimes",
    "Inflation",
    "Geo-political tension",
];

const DEFAULT_TRUSTED_SITES: [&str; 4] =
    ["bloomberg.com", "forbes.com", "reuters.com", "diplomatist.com"];

#[derive(Parser)]
#[command(name = "keyword-research", version)]
struct Cli {
    /// Topic to research. Repeat for several; defaults to the built-in list.
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    /// Domain substring a result host must contain. Repeat for several.
    #[arg(long = "trusted-site")]
    trusted_sites: Vec<String>,

    /// Maximum search results requested per keyword.
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// WebDriver endpoint (chromedriver).
    #[arg(long, env = "WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    webdriver_url: String,

    /// Seconds to wait after navigation before reading the page.
    #[arg(long, default_value_t = DEFAULT_SETTLE_DELAY.as_secs())]
    settle_secs: u64,

    /// User agent for the browser and the search client.
    #[arg(long, env = "RESEARCH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,

    /// Completion model.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Completion token bound.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Write documents below this directory instead of S3.
    #[arg(long, env = "RESEARCH_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// S3 bucket for archived documents.
    #[arg(long, env = "S3_BUCKET_NAME")]
    s3_bucket: Option<String>,

    /// S3 region.
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    s3_region: String,

    /// Path-style endpoint for S3-compatible storage.
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    aws_session_token: Option<String>,

    /// What to do when a search request fails.
    #[arg(long, value_enum, default_value_t = PolicyArg::Abort)]
    on_search_error: PolicyArg,

    /// What to do when a summary request fails.
    #[arg(long, value_enum, default_value_t = PolicyArg::Skip)]
    on_summary_error: PolicyArg,

    /// What to do when a document upload fails.
    #[arg(long, value_enum, default_value_t = PolicyArg::Abort)]
    on_archive_error: PolicyArg,

    /// Print the run report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    report_json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Skip,
    Abort,
}

impl From<PolicyArg> for StagePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Skip => StagePolicy::Skip,
            PolicyArg::Abort => StagePolicy::Abort,
        }
    }
}

impl Cli {
    fn keywords(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            DEFAULT_KEYWORDS.iter().map(|keyword| keyword.to_string()).collect()
        } else {
            self.keywords.clone()
        }
    }

    fn trusted_sites(&self) -> TrustedSiteSet {
        if self.trusted_sites.is_empty() {
            TrustedSiteSet::new(DEFAULT_TRUSTED_SITES)
        } else {
            TrustedSiteSet::new(self.trusted_sites.iter().cloned())
        }
    }

    fn options(&self) -> ResearchOptions {
        ResearchOptions {
            max_results: self.max_results,
            policy: FailurePolicy {
                search: self.on_search_error.into(),
                summarize: self.on_summary_error.into(),
                archive: self.on_archive_error.into(),
            },
        }
    }

    fn store(&self) -> anyhow::Result<StoreBackend> {
        if let Some(dir) = &self.output_dir {
            return Ok(StoreBackend::Local(LocalDirectoryStore::new(dir.clone())));
        }

        let Some(bucket) = self.s3_bucket.clone() else {
            bail!("set S3_BUCKET_NAME (or --s3-bucket), or pass --output-dir to write locally");
        };
        let (Some(access_key_id), Some(secret_access_key)) = (
            self.aws_access_key_id.clone(),
            self.aws_secret_access_key.clone(),
        ) else {
            bail!("AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY are required for S3 uploads");
        };

        let store = S3Store::new(S3Config {
            bucket,
            region: self.s3_region.clone(),
            credentials: Credentials {
                access_key_id,
                secret_access_key,
                session_token: self.aws_session_token.clone(),
            },
            endpoint: self.s3_endpoint.clone(),
        })
        .context("invalid S3 configuration")?;
        Ok(StoreBackend::S3(store))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();

    let keywords = cli.keywords();
    let trusted = cli.trusted_sites();
    if trusted.is_empty() {
        warn!("trusted site list is empty; every keyword will report no trusted sources");
    }

    let search = DuckDuckGoSearch::new(&cli.user_agent).context("failed to build search client")?;
    let fetcher = WebDriverFetcher::new(BrowserOptions {
        webdriver_url: cli.webdriver_url.clone(),
        settle_delay: Duration::from_secs(cli.settle_secs),
        user_agent: cli.user_agent.clone(),
    });
    let summarizer = OpenAiSummarizer::new(
        cli.openai_api_key.clone(),
        cli.openai_base_url.clone(),
        cli.model.clone(),
        cli.max_tokens,
    );
    let store = cli.store()?;

    let researcher =
        Researcher::new(search, fetcher, summarizer, store).with_options(cli.options());
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        keywords = keywords.len(),
        trusted_sites = trusted.sites().len(),
        "keyword-research boot"
    );

    let report = researcher.run(&keywords, &trusted).await?;

    let outcomes = |outcome: KeywordOutcome| {
        report
            .keywords
            .iter()
            .filter(|keyword| keyword.outcome() == outcome)
            .count()
    };
    info!(
        archived = report.archived_count(),
        complete = outcomes(KeywordOutcome::Archived),
        no_trusted_sources = outcomes(KeywordOutcome::NoTrustedSources),
        no_relevant_content = outcomes(KeywordOutcome::NoRelevantContent),
        search_failed = outcomes(KeywordOutcome::SearchFailed),
        "run summary"
    );

    if cli.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} document(s) archived for {} keyword(s) on {}",
            report.archived_count(),
            report.keywords.len(),
            report.date
        );
    }

    Ok(())
}
