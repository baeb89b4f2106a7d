use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};

use trialstream_common::Study;

/// One page of the listing endpoint: a `studies` array and, when more
/// results exist, an opaque continuation token to echo back.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(default)]
    pub studies: Vec<Study>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Seam for the remote listing endpoint so the pagination loop is testable
/// without a network.
#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn fetch_page(&self, page_size: u32, page_token: Option<&str>) -> Result<ListingPage>;
}

pub struct ListingClient {
    http: reqwest::Client,
    base_url: String,
}

impl ListingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl ListingApi for ListingClient {
    async fn fetch_page(&self, page_size: u32, page_token: Option<&str>) -> Result<ListingPage> {
        let page_size = page_size.to_string();
        let mut params = vec![("pageSize", page_size.as_str()), ("format", "json")];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Request failed ({status}): {body}"));
        }

        Ok(response.json().await?)
    }
}

/// Fetch every page the endpoint offers, following the continuation token
/// until it is absent or `max_pages` is reached. A failed page stops the
/// loop and returns whatever was already accumulated — callers must treat a
/// short result as potentially incomplete. Retry, if any, happens at
/// whole-task granularity in the workflow runner, never per page.
pub async fn fetch_all(
    api: &impl ListingApi,
    page_size: u32,
    max_pages: Option<u32>,
) -> Vec<Study> {
    let mut studies = Vec::new();
    let mut page_token: Option<String> = None;
    let mut page = 1u32;

    loop {
        info!(page, "fetching listing page");

        let result = api.fetch_page(page_size, page_token.as_deref()).await;
        let listing = match result {
            Ok(listing) => listing,
            Err(e) => {
                error!(page, error = %e, "listing fetch failed, keeping partial result");
                break;
            }
        };

        if listing.studies.is_empty() {
            break;
        }
        studies.extend(listing.studies);

        match listing.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }

        if let Some(cap) = max_pages {
            if page >= cap {
                info!(cap, "page cap reached, stopping");
                break;
            }
        }
        page += 1;
    }

    info!(total = studies.len(), "fetch complete");
    studies
}
