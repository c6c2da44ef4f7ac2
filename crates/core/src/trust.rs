use serde::{Deserialize, Serialize};
use url::Url;

/// Domain substrings a result host must contain to be fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustedSiteSet {
    sites: Vec<String>,
}

impl TrustedSiteSet {
    pub fn new<I, S>(sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sites: sites
                .into_iter()
                .map(Into::into)
                .filter(|site: &String| !site.is_empty())
                .collect(),
        }
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Case-sensitive substring match on the host only. Lookalike hosts such as
    /// `reuters.com.example.net` match `reuters.com`.
    pub fn is_trusted(&self, url: &str) -> bool {
        match host_of(url) {
            Some(host) => self.sites.iter().any(|site| host.contains(site.as_str())),
            None => false,
        }
    }

    pub fn filter<'a, I>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        urls.into_iter()
            .filter(|url| self.is_trusted(url))
            .map(str::to_string)
            .collect()
    }
}

pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}
