use super::sigv4::{self, Credentials, SigningRequest};
use crate::traits::ContentStore;
use crate::{ArchivedObject, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use url::Url;

pub const DEFAULT_REGION: &str = "ap-south-1";

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub credentials: Credentials,
    /// Path-style endpoint for S3-compatible services. Virtual-hosted AWS otherwise.
    pub endpoint: Option<String>,
}

pub struct S3Store {
    client: Client,
    config: S3Config,
}

impl S3Store {
    pub fn new(config: S3Config) -> Result<Self, StoreError> {
        if config.bucket.trim().is_empty() {
            return Err(StoreError::InvalidConfig("bucket name is empty".to_string()));
        }
        if config.credentials.access_key_id.is_empty()
            || config.credentials.secret_access_key.is_empty()
        {
            return Err(StoreError::InvalidConfig(
                "access key id and secret access key are required".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn object_url(&self, key: &str) -> Result<Url, StoreError> {
        let encoded_key = sigv4::canonical_uri(key);
        let raw = match &self.config.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.config.bucket,
                encoded_key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, self.config.region, encoded_key
            ),
        };
        Ok(Url::parse(&raw)?)
    }

    async fn put_at(&self, object: &ArchivedObject, at: DateTime<Utc>) -> Result<String, StoreError> {
        let url = self.object_url(&object.key)?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(StoreError::InvalidConfig(format!("endpoint has no host: {url}")))
            }
        };

        let payload_sha256 = sigv4::sha256_hex(&object.content);
        let amz_date = sigv4::amz_date(at);
        let mut headers = vec![
            ("content-type".to_string(), object.content_type.to_string()),
            ("host".to_string(), host),
            ("x-amz-content-sha256".to_string(), payload_sha256.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(token) = &self.config.credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let authorization = sigv4::authorization(
            &SigningRequest {
                method: "PUT",
                canonical_uri: url.path(),
                headers: headers.clone(),
                payload_sha256: &payload_sha256,
            },
            &self.config.credentials,
            &self.config.region,
            "s3",
            at,
        )?;

        let mut request = self
            .client
            .put(url.clone())
            .header("authorization", authorization)
            .body(object.content.clone());
        for (name, value) in headers.into_iter().filter(|(name, _)| name != "host") {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::BackendResponse {
                backend: "s3".to_string(),
                details: format!("{status}: {body}"),
            });
        }

        Ok(format!("s3://{}/{}", self.config.bucket, object.key))
    }
}

#[async_trait]
impl ContentStore for S3Store {
    async fn put(&self, object: &ArchivedObject) -> Result<String, StoreError> {
        self.put_at(object, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DOCX_CONTENT_TYPE;
    use chrono::TimeZone;
    use wiremock::matchers::{body_bytes, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: Option<String>) -> S3Config {
        S3Config {
            bucket: "research-archive".to_string(),
            region: DEFAULT_REGION.to_string(),
            credentials: Credentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: Some("token".to_string()),
            },
            endpoint,
        }
    }

    fn object() -> ArchivedObject {
        ArchivedObject {
            key: "scraped_data/reuters_com_19-10-2026.docx".to_string(),
            content: b"PK-docx".to_vec(),
            content_type: DOCX_CONTENT_TYPE,
        }
    }

    #[test]
    fn virtual_hosted_url_uses_bucket_and_region() {
        let store = S3Store::new(config(None)).expect("store");
        let url = store
            .object_url("scraped_data/reuters_com_19-10-2026.docx")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://research-archive.s3.ap-south-1.amazonaws.com/scraped_data/reuters_com_19-10-2026.docx"
        );
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let mut incomplete = config(None);
        incomplete.credentials.secret_access_key.clear();
        assert!(matches!(
            S3Store::new(incomplete),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn put_sends_signed_object() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/research-archive/scraped_data/reuters_com_19-10-2026.docx"))
            .and(header("content-type", DOCX_CONTENT_TYPE))
            .and(header("x-amz-date", "20261019T083000Z"))
            .and(header("x-amz-security-token", "token"))
            .and(header_exists("authorization"))
            .and(body_bytes(b"PK-docx".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = S3Store::new(config(Some(server.uri()))).expect("store");
        let at = Utc
            .with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
            .single()
            .expect("valid timestamp");
        let location = store.put_at(&object(), at).await.expect("put should succeed");

        assert_eq!(
            location,
            "s3://research-archive/scraped_data/reuters_com_19-10-2026.docx"
        );
        let requests = server.received_requests().await.unwrap_or_default();
        let authorization = requests[0]
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20261019/ap-south-1/s3/aws4_request, SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date;x-amz-security-token"
        ));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("<Error>AccessDenied</Error>"))
            .mount(&server)
            .await;

        let store = S3Store::new(config(Some(server.uri()))).expect("store");
        let result = store.put(&object()).await;

        match result {
            Err(StoreError::BackendResponse { backend, details }) => {
                assert_eq!(backend, "s3");
                assert!(details.contains("AccessDenied"));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
