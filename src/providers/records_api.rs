use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::record::Record;
use crate::core::source::{RecordQuery, RecordSource};
use crate::providers::util::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS, send_with_retry};

/// Dashboard data API. Serves constituent, fund quota and ETF tables.
pub struct HttpRecordSource {
    base_url: String,
    client: reqwest::Client,
}

/// The API answers with a bare array or wraps it in `data`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RecordsBody {
    List(Vec<Record>),
    Wrapped { data: Vec<Record> },
}

impl RecordsBody {
    fn into_records(self) -> Vec<Record> {
        match self {
            RecordsBody::List(records) => records,
            RecordsBody::Wrapped { data } => data,
        }
    }
}

impl HttpRecordSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mktboard/1.0")
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url_for(&self, query: &RecordQuery) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, query.dataset.path());
        Url::parse_with_params(&raw, query.filters.iter())
            .with_context(|| format!("Invalid data API URL: {raw}"))
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    #[instrument(name = "RecordsFetch", skip(self), fields(dataset = %query.dataset))]
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let url = self.url_for(query)?;
        debug!("Requesting records from {}", url);

        let response = send_with_retry(&self.client, url.as_str(), DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS)
            .await
            .with_context(|| format!("Request error for dataset: {}", query.dataset))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for dataset: {}",
                response.status(),
                query.dataset
            ));
        }

        let text = response.text().await?;
        let body: RecordsBody = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse records for {}: {}", query.dataset, e))?;
        let records = body.into_records();
        debug!(count = records.len(), "Received records");
        Ok(records)
    }
}
