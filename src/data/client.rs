//! HTTP client for the API-Sports family of REST APIs
//!
//! Every endpoint answers with a JSON envelope whose `response` array holds
//! the records. Responses are memoized per (endpoint, parameters) and network
//! requests are spaced by a minimum interval to stay under the rate limit.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use super::cache::{CacheKey, ResponseCache};
use crate::{ApiSettings, CacheConfig, Result, SportsError, API_KEY_ENV};

/// A source of JSON record lists
pub trait JsonSource {
    /// Fetch the records behind `endpoint` for the given query parameters
    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Value>>;
}

impl<S: JsonSource + ?Sized> JsonSource for &S {
    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Value>> {
        (**self).get(endpoint, params)
    }
}

/// Enforces a minimum gap between consecutive requests
pub struct Throttle {
    interval: Duration,
    last: Cell<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval,
            last: Cell::new(None),
        }
    }

    /// Time left before the next request may go out
    pub fn remaining(&self) -> Duration {
        match self.last.get() {
            Some(last) => self.interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Block until the interval has passed, then mark a request as sent
    pub fn wait(&self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            log::debug!("Rate limit: waiting {:?}", remaining);
            std::thread::sleep(remaining);
        }
        self.last.set(Some(Instant::now()));
    }
}

/// Blocking API-Sports client with response memoization
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    cache: RefCell<ResponseCache<Vec<Value>>>,
    throttle: Throttle,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, api_key: &str, ttl: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| SportsError::Config(format!("Invalid API key: {}", e)))?;
        let host = HeaderValue::from_str(settings.host())
            .map_err(|e| SportsError::Config(format!("Invalid API host: {}", e)))?;
        headers.insert("x-apisports-key", key);
        headers.insert("x-rapidapi-host", host);

        let client = reqwest::blocking::Client::builder()
            .user_agent("sportboard/0.1")
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(ApiClient {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cache: RefCell::new(ResponseCache::with_ttl(ttl)),
            throttle: Throttle::new(settings.min_request_interval()),
        })
    }

    /// Build a client from config, reading the key from `APISPORTS_KEY` if needed
    pub fn from_config(settings: &ApiSettings, cache: &CacheConfig) -> Result<Self> {
        let key = settings.resolve_key(API_KEY_ENV)?;
        Self::new(settings, &key, cache.ttl())
    }

    fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Value>> {
        self.throttle.wait();

        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        log::info!("GET {} {:?}", url, params);

        let response = self.client.get(&url).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SportsError::SourceUnavailable {
                endpoint: endpoint.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.text()?;
        let records = extract_response(endpoint, &body)?;
        log::debug!("{} returned {} records", endpoint, records.len());
        Ok(records)
    }
}

impl JsonSource for ApiClient {
    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Value>> {
        let key = CacheKey::new(endpoint, params);
        self.cache
            .borrow_mut()
            .get_or_try_insert_with(key, || self.fetch(endpoint, params))
    }
}

/// Pull the `response` array out of an API-Sports envelope.
///
/// A non-empty `errors` member means the request was rejected even though
/// the status was 200 (bad key, exhausted quota, bad parameter).
pub fn extract_response(endpoint: &str, body: &str) -> Result<Vec<Value>> {
    let envelope: Value = serde_json::from_str(body)?;

    let errors = envelope.get("errors");
    let has_errors = match errors {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(list)) => !list.is_empty(),
        _ => false,
    };
    if has_errors {
        return Err(SportsError::SourceUnavailable {
            endpoint: endpoint.to_string(),
            message: format!("API errors: {}", errors.cloned().unwrap_or(Value::Null)),
        });
    }

    match envelope.get("response") {
        Some(Value::Array(records)) => Ok(records.clone()),
        _ => Err(SportsError::SourceUnavailable {
            endpoint: endpoint.to_string(),
            message: "response array missing from body".to_string(),
        }),
    }
}
