use super::{parse_feed, BillFeed, FeedBatch, FeedError, SessionPage};
use crate::config::FeedConfig;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// HTTP client for the LEGISinfo JSON bill listing.
#[derive(Debug, Clone)]
pub struct LegisInfoClient {
    http: Client,
    url: String,
}

impl LegisInfoClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("legis-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FeedError::Http {
                url: config.url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `None` on 404 so session probing can stop cleanly.
    async fn get(&self, session: Option<String>) -> Result<Option<FeedBatch>, FeedError> {
        let mut request = self.http.get(&self.url);
        if let Some(session) = &session {
            request = request.query(&[("parlsession", session)]);
        }

        let http_error = |source: reqwest::Error| FeedError::Http {
            url: self.url.clone(),
            source,
        };
        let response = request.send().await.map_err(http_error)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(url = %self.url, session = ?session, "feed listing not found");
            return Ok(None);
        }
        if !status.is_success() {
            warn!(
                url = %self.url,
                session = ?session,
                status = status.as_u16(),
                "feed request rejected"
            );
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_error)?;
        parse_feed(&body).map(Some)
    }
}

impl BillFeed for LegisInfoClient {
    async fn fetch_current(&self) -> Result<FeedBatch, FeedError> {
        match self.get(None).await? {
            Some(batch) => Ok(batch),
            None => Err(FeedError::Status {
                url: self.url.clone(),
                status: StatusCode::NOT_FOUND.as_u16(),
            }),
        }
    }

    async fn fetch_session(&self, parliament: u32, session: u32) -> Result<SessionPage, FeedError> {
        let code = format!("{parliament}-{session}");
        Ok(match self.get(Some(code)).await? {
            Some(batch) => SessionPage::Found(batch),
            None => SessionPage::NotFound,
        })
    }
}
