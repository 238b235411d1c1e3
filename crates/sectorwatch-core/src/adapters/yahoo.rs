use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::data_source::{CloseSeriesFuture, HistoryRequest, PriceSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::throttling::Throttle;
use crate::{ClosePoint, CloseSeries, ProviderId, TradingDate};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_PATH: &str = "/v1/test/getcrumb";
const REFERER: &str = "https://finance.yahoo.com/";
const CRUMB_TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// Yahoo Auth Manager - cookie/crumb handshake
// ============================================================================

#[derive(Debug, Clone)]
struct CachedCrumb {
    value: String,
    fetched_at: Instant,
}

/// Caches the crumb token Yahoo expects next to its session cookie.
///
/// The cookie itself lives in the HTTP client's jar; visiting `fc.yahoo.com`
/// sets it, after which `getcrumb` returns a token valid for the session.
#[derive(Debug, Default)]
pub struct YahooAuthManager {
    crumb: Mutex<Option<CachedCrumb>>,
}

impl YahooAuthManager {
    fn lock(&self) -> MutexGuard<'_, Option<CachedCrumb>> {
        self.crumb
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .filter(|crumb| crumb.fetched_at.elapsed() < CRUMB_TTL)
            .map(|crumb| crumb.value.clone())
    }

    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    /// Cached crumb, refreshing it first when missing or stale.
    pub async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        base_url: &str,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        if let Some(crumb) = self.cached() {
            return Ok(crumb);
        }

        let cookie_request = HttpRequest::get(COOKIE_URL)
            .with_header("referer", REFERER)
            .with_timeout_ms(timeout_ms);
        // fc.yahoo.com answers 404 while still setting the cookie.
        http_client.execute(cookie_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch Yahoo cookie: {}", e.message()))
        })?;

        let crumb_request = HttpRequest::get(format!("{base_url}{CRUMB_PATH}"))
            .with_header("referer", REFERER)
            .with_timeout_ms(timeout_ms);
        let response = http_client.execute(crumb_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch Yahoo crumb: {}", e.message()))
        })?;

        let crumb = parse_crumb(&response)?;
        *self.lock() = Some(CachedCrumb {
            value: crumb.clone(),
            fetched_at: Instant::now(),
        });
        tracing::debug!("refreshed yahoo crumb");
        Ok(crumb)
    }
}

fn parse_crumb(response: &HttpResponse) -> Result<String, SourceError> {
    let body = response.body.trim();
    if response.status == 429 || body.to_ascii_lowercase().contains("too many requests") {
        return Err(SourceError::rate_limited(
            "yahoo rate limited while fetching crumb",
        ));
    }
    if !response.is_success() || body.is_empty() || body.contains('<') || body.contains(' ') {
        return Err(SourceError::unavailable(format!(
            "yahoo returned no usable crumb (status {})",
            response.status
        )));
    }
    Ok(body.to_owned())
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Daily closes from Yahoo Finance's v8 chart endpoint.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    auth_manager: Arc<YahooAuthManager>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    throttle: Throttle,
    base_url: String,
    timeout_ms: u64,
    use_crumb: bool,
}

impl std::fmt::Debug for YahooAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooAdapter")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("use_crumb", &self.use_crumb)
            .field("circuit_state", &self.circuit_breaker.state())
            .finish_non_exhaustive()
    }
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            auth_manager: Arc::new(YahooAuthManager::default()),
            circuit_breaker: Arc::new(CircuitBreaker::new(
                ProviderId::Yahoo.as_str(),
                CircuitBreakerConfig::default(),
            )),
            retry: RetryConfig::default(),
            throttle: Throttle::yahoo_default(),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: 10_000,
            use_crumb: true,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Skip the cookie/crumb handshake (the chart endpoint often works without it).
    pub fn without_crumb(mut self) -> Self {
        self.use_crumb = false;
        self
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    async fn fetch_closes(&self, req: &HistoryRequest) -> Result<CloseSeries, SourceError> {
        let mut attempt = 0_u32;
        let mut refreshed_auth = false;

        loop {
            if !self.circuit_breaker.allow_request() {
                return Err(SourceError::unavailable(
                    "yahoo circuit breaker is open; skipping upstream call",
                ));
            }
            self.throttle.acquire().await;

            let request = self.chart_request(req).await?;
            tracing::debug!(symbol = %req.symbol, attempt, "requesting yahoo chart");

            let response = match self.http_client.execute(request).await {
                Ok(response) => response,
                Err(error) => {
                    self.circuit_breaker.record_failure();
                    if attempt < self.retry.max_retries && self.retry.should_retry_error(&error) {
                        self.backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(SourceError::unavailable(format!(
                        "yahoo transport error: {}",
                        error.message()
                    )));
                }
            };

            match response.status {
                status if (200..300).contains(&status) => {
                    self.circuit_breaker.record_success();
                    return parse_chart(req, &response.body);
                }
                401 | 403 | 429 if self.use_crumb && !refreshed_auth => {
                    self.auth_manager.invalidate();
                    refreshed_auth = true;
                    continue;
                }
                404 => {
                    self.circuit_breaker.record_success();
                    return Err(no_data_from_body(req, &response.body));
                }
                429 => {
                    self.circuit_breaker.record_failure();
                    return Err(SourceError::rate_limited(
                        "yahoo rate limited the chart request",
                    ));
                }
                status => {
                    self.circuit_breaker.record_failure();
                    if attempt < self.retry.max_retries && self.retry.should_retry_status(status) {
                        self.backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(SourceError::unavailable(format!(
                        "yahoo returned status {status}"
                    )));
                }
            }
        }
    }

    async fn chart_request(&self, req: &HistoryRequest) -> Result<HttpRequest, SourceError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(req.symbol.as_str())
        );
        let mut request = HttpRequest::get(url)
            .with_query("period1", req.range.start.unix_timestamp().to_string())
            .with_query("period2", req.range.end.unix_timestamp().to_string())
            .with_query("interval", "1d")
            .with_query("events", "history")
            .with_header("referer", REFERER)
            .with_timeout_ms(self.timeout_ms);

        if self.use_crumb {
            let crumb = self
                .auth_manager
                .crumb(self.http_client.as_ref(), &self.base_url, self.timeout_ms)
                .await?;
            request = request.with_query("crumb", crumb);
        }
        Ok(request)
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.retry.delay_for_attempt(attempt);
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying yahoo chart");
        tokio::time::sleep(delay).await;
    }
}

impl PriceSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn daily_closes<'a>(&'a self, req: HistoryRequest) -> CloseSeriesFuture<'a> {
        Box::pin(async move { self.fetch_closes(&req).await })
    }
}

// Yahoo Finance chart response structures

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_chart(req: &HistoryRequest, body: &str) -> Result<CloseSeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(chart_error(req, &error));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::no_data(format!("no chart data for {}", req.symbol)))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();
    // Session timestamps are UTC; shift to exchange time before taking the date.
    let gmtoffset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.iter().zip(closes) {
        let Some(close) = close else {
            continue;
        };
        let date = TradingDate::from_unix_timestamp(ts + gmtoffset)
            .map_err(|e| SourceError::internal(format!("invalid yahoo timestamp: {e}")))?;
        if req.range.contains(date) {
            points.push(ClosePoint { date, close });
        }
    }

    if points.is_empty() {
        return Err(SourceError::no_data(format!(
            "yahoo returned no closes for {} between {} and {}",
            req.symbol, req.range.start, req.range.end
        )));
    }

    Ok(CloseSeries::new(req.symbol.clone(), points))
}

fn chart_error(req: &HistoryRequest, error: &YahooChartError) -> SourceError {
    let description = error.description.as_deref().unwrap_or("no description");
    let message = format!(
        "yahoo chart error for {}: {} ({description})",
        req.symbol, error.code
    );
    if error.code.eq_ignore_ascii_case("Not Found") {
        SourceError::no_data(message)
    } else {
        SourceError::unavailable(message)
    }
}

fn no_data_from_body(req: &HistoryRequest, body: &str) -> SourceError {
    serde_json::from_str::<YahooChartResponse>(body)
        .ok()
        .and_then(|response| response.chart.error)
        .map(|error| SourceError::no_data(chart_error(req, &error).message().to_owned()))
        .unwrap_or_else(|| SourceError::no_data(format!("yahoo has no chart for {}", req.symbol)))
}
