//! Yahoo Chart API Adapter
//!
//! REST implementation of [`HistoryProvider`] on top of
//! `GET /v8/finance/chart/{symbol}?range={period}&interval={interval}`.
//! The endpoint serves one symbol per request, so a bulk request fans out
//! concurrently and the answers are assembled into a single table.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;

use crate::application::ports::{
    BarField, HistoryProvider, HistoryRequest, HistoryTable, ProviderError,
};
use crate::domain::quote::Symbol;
use crate::infrastructure::config::HistorySettings;

/// Browser-like agent; the chart endpoint rejects library defaults.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Value>,
    #[serde(default)]
    volume: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("error"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

// =============================================================================
// Client
// =============================================================================

/// Chart API client.
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    /// Create a client from the history settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &HistorySettings) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the close and volume series for one symbol.
    async fn fetch_symbol(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<QuoteIndicator, ProviderError> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("range", period), ("interval", interval)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("{symbol}: {e}")))?;

        if let Some(error) = body.chart.error {
            return Err(ProviderError::Decode(format!("{symbol}: {error}")));
        }

        body.chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.indicators.quote.into_iter().next())
            .ok_or_else(|| ProviderError::EmptyResult(symbol.to_string()))
    }
}

#[async_trait]
impl HistoryProvider for YahooChartClient {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<HistoryTable, ProviderError> {
        let fetches = request
            .symbols
            .iter()
            .map(|symbol| self.fetch_symbol(symbol, &request.period, &request.interval));
        let results: Vec<(&Symbol, Result<QuoteIndicator, ProviderError>)> =
            request.symbols.iter().zip(join_all(fetches).await).collect();

        let mut table = HistoryTable::new();
        for (symbol, result) in results {
            match result {
                Ok(series) => {
                    tracing::debug!(
                        symbol = %symbol,
                        bars = series.close.len(),
                        "Chart series received"
                    );
                    table.insert_column(symbol, BarField::Close, series.close);
                    table.insert_column(symbol, BarField::Volume, series.volume);
                }
                Err(e) => {
                    tracing::debug!(symbol = %symbol, error = %e, "Chart request failed");
                    table.record_failure(symbol, e.to_string());
                }
            }
        }

        if table.is_empty() {
            let reasons: Vec<String> = table.failures().map(|(s, r)| format!("{s}: {r}")).collect();
            return Err(ProviderError::EmptyResult(reasons.join("; ")));
        }

        Ok(table)
    }
}
