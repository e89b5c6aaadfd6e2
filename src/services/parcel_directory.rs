// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the habitat-record parcel directory.

use crate::error::CaptureError;
use crate::models::{ParcelFilter, ParcelRecord};
use serde::Deserialize;
use std::time::Duration;

/// The directory never returns more than this many parcels per call.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Bare array or wrapped list, depending on the service version.
#[derive(Deserialize)]
#[serde(untagged)]
enum ParcelPage {
    Bare(Vec<ParcelRecord>),
    Wrapped { parcels: Vec<ParcelRecord> },
}

impl ParcelPage {
    fn into_records(self) -> Vec<ParcelRecord> {
        match self {
            ParcelPage::Bare(records) | ParcelPage::Wrapped { parcels: records } => records,
        }
    }
}

#[derive(Clone)]
pub struct ParcelDirectory {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
    max_pages: u32,
}

impl ParcelDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: MAX_PAGE_SIZE,
            max_pages: 10,
        }
    }

    /// Override paging; the page size is capped at [`MAX_PAGE_SIZE`].
    pub fn with_paging(mut self, page_size: u32, max_pages: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.max_pages = max_pages.max(1);
        self
    }

    /// Fetch all parcels matching `filter`, following pages until a short
    /// page or the page limit.
    pub async fn fetch_parcels(
        &self,
        filter: &ParcelFilter,
    ) -> Result<Vec<ParcelRecord>, CaptureError> {
        let mut all = Vec::new();

        for page in 1..=self.max_pages {
            let records = self.fetch_page(filter, page).await?;
            let count = records.len();
            all.extend(records);

            if count < self.page_size as usize {
                break;
            }
            if page == self.max_pages {
                tracing::warn!(
                    pages = self.max_pages,
                    fetched = all.len(),
                    "Parcel directory page limit reached; list may be truncated"
                );
            }
        }

        tracing::info!(count = all.len(), "Fetched parcels");
        Ok(all)
    }

    async fn fetch_page(
        &self,
        filter: &ParcelFilter,
        page: u32,
    ) -> Result<Vec<ParcelRecord>, CaptureError> {
        let url = format!("{}/parcels", self.base_url);
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", self.page_size.to_string()),
        ];
        if let Some(id) = &filter.exclude_id {
            query.push(("exclude_id", id.clone()));
        }
        if let Some(municipality) = &filter.municipality {
            query.push(("municipality", municipality.clone()));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| CaptureError::ParcelFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaptureError::ParcelFetchFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let page: ParcelPage = response
            .json()
            .await
            .map_err(|e| CaptureError::ParcelFetchFailed(format!("invalid response: {}", e)))?;
        Ok(page.into_records())
    }
}
