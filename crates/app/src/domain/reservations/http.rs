//! HTTP adapter for the reservation system's JSON API.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::domain::reservations::{
    client::ReservationClient,
    errors::ReservationError,
    models::{CartSnapshot, ReservationLine, ReservationToken, TransferTarget},
};

const API_KEY_HEADER: &str = "X-Api-Key";

/// Configuration for connecting to the reservation system.
#[derive(Debug, Clone)]
pub struct HttpReservationConfig {
    /// Base address, e.g. `"https://tickets.example.org/api"`.
    pub base_url: String,

    /// Key sent with every request.
    pub api_key: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP client for the reservation system.
#[derive(Debug, Clone)]
pub struct HttpReservationClient {
    config: HttpReservationConfig,
    http: Client,
}

impl HttpReservationClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: HttpReservationConfig) -> Result<Self, ReservationError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ReservationError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|error| ReservationError::InvalidUrl(error.to_string()))?;

        url.path_segments_mut()
            .map_err(|()| ReservationError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response, ReservationError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ReservationError::Unavailable(format!(
                "{action} failed with status {status}: {text}"
            )));
        }

        Err(ReservationError::UnexpectedResponse(format!(
            "{action} failed with status {status}: {text}"
        )))
    }
}

#[async_trait]
impl ReservationClient for HttpReservationClient {
    async fn get_cart_snapshot(
        &self,
        token: &ReservationToken,
    ) -> Result<Option<CartSnapshot>, ReservationError> {
        let url = self.endpoint(&["sessions", token.as_str(), "cart"])?;

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("reservation system has no cart for session");
            return Ok(None);
        }

        let response = Self::ensure_success(response, "cart snapshot").await?;

        Ok(Some(response.json().await?))
    }

    async fn get_expiration(
        &self,
        token: &ReservationToken,
    ) -> Result<Option<Timestamp>, ReservationError> {
        let url = self.endpoint(&["sessions", token.as_str(), "expiration"])?;

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        let response = Self::ensure_success(response, "expiration lookup").await?;

        let parsed: ExpirationResponse = response.json().await?;

        Ok(parsed.expires_at)
    }

    async fn bulk_release(
        &self,
        token: &ReservationToken,
        lines: &[ReservationLine],
    ) -> Result<(), ReservationError> {
        let url = self.endpoint(&["sessions", token.as_str(), "release"])?;

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&serde_json::json!({ "lines": lines }))
            .send()
            .await?;

        Self::ensure_success(response, "bulk release").await?;

        Ok(())
    }

    async fn transfer_session(&self, target: &TransferTarget) -> Result<(), ReservationError> {
        let url = self.endpoint(&["sessions", "transfer"])?;

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&transfer_body(target))
            .send()
            .await?;

        Self::ensure_success(response, "session transfer").await?;

        Ok(())
    }
}

fn transfer_body(target: &TransferTarget) -> serde_json::Value {
    match target {
        TransferTarget::Account(account) => serde_json::json!({ "account": account.to_string() }),
        TransferTarget::Session(token) => serde_json::json!({ "session": token.as_str() }),
    }
}

#[derive(Debug, Deserialize)]
struct ExpirationResponse {
    expires_at: Option<Timestamp>,
}
