//! Wallet REST API adapter.
//!
//! Issues `GET {base}/api/wallet/history?walletName=..&accountName=..&skip=..&take=..`
//! and decodes the body into a `HistoryResponse`. Entry-level leniency lives in
//! the wire types; only a body that is not a history object at all is an error.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::history::api::{HistoryFetchClient, WalletIdentity};
use crate::history::types::HistoryResponse;

const HISTORY_PATH: &str = "/api/wallet/history";

pub struct HttpHistoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpHistoryClient {
    /// Client without a transport timeout of its own.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Client whose requests fail with a transport error after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn history_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), HISTORY_PATH)
    }
}

#[async_trait]
impl HistoryFetchClient for HttpHistoryClient {
    async fn fetch_history(
        &self,
        wallet: &WalletIdentity,
        skip: u32,
        take: u32,
    ) -> Result<HistoryResponse, FetchError> {
        let url = self.history_url();
        log::debug!(
            "[HTTP] GET {} wallet={} account={} skip={} take={}",
            url,
            wallet.wallet_name,
            wallet.account_name,
            skip,
            take
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("walletName", wallet.wallet_name.clone()),
                ("accountName", wallet.account_name.clone()),
                ("skip", skip.to_string()),
                ("take", take.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        log::trace!("[HTTP] <<< {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        decode_body(&body)
    }
}

/// An empty body or JSON `null` is an absent batch, not an error.
pub(crate) fn decode_body(body: &str) -> Result<HistoryResponse, FetchError> {
    if body.trim().is_empty() {
        return Ok(HistoryResponse::default());
    }
    let parsed: Option<HistoryResponse> = serde_json::from_str(body)?;
    Ok(parsed.unwrap_or_default())
}
