//! Built-in operation providers.
use crate::error::RuntimeError;
use pacer::{Operation, OperationError};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Client, Method, Url};
use std::time::Duration;

const CACHE_BUST_PARAM: &str = "pacer_nonce";
const CACHE_BUST_LEN: usize = 8;

/// Issues one HTTP request per attempt. Any non-2xx status is a failure.
#[derive(Debug, Clone)]
pub struct HttpOperation {
    client: Client,
    method: Method,
    url: Url,
    body: Option<String>,
    cache_bust: bool,
}

impl HttpOperation {
    /// `pool_size` bounds idle connections kept per host; size it like the worker pool.
    pub fn new(method: Method, url: Url, pool_size: usize) -> Result<Self, RuntimeError> {
        let client = Client::builder()
            .pool_max_idle_per_host(pool_size)
            .build()?;
        Ok(Self {
            client,
            method,
            url,
            body: None,
            cache_bust: false,
        })
    }

    pub fn body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// Append a random query parameter to every request so responses cannot be served from a
    /// cache.
    pub fn cache_bust(mut self, cache_bust: bool) -> Self {
        self.cache_bust = cache_bust;
        self
    }

    fn request_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.cache_bust {
            url.query_pairs_mut()
                .append_pair(CACHE_BUST_PARAM, &cache_buster());
        }
        url
    }
}

impl Operation for HttpOperation {
    async fn execute(&self) -> Result<(), OperationError> {
        let mut request = self.client.request(self.method.clone(), self.request_url());
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }

        request
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(OperationError::new)?;
        Ok(())
    }
}

fn cache_buster() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CACHE_BUST_LEN)
        .map(char::from)
        .collect()
}

/// Sleeps for a fixed latency and then fails with the given probability. Exercises the harness
/// without a backend.
#[derive(Debug, Clone)]
pub struct SyntheticOperation {
    latency: Duration,
    failure_rate: f64,
}

impl SyntheticOperation {
    pub fn new(latency: Duration, failure_rate: f64) -> Result<Self, RuntimeError> {
        if !(0. ..=1.).contains(&failure_rate) {
            return Err(RuntimeError::FailureRate(failure_rate));
        }
        Ok(Self {
            latency,
            failure_rate,
        })
    }
}

impl Operation for SyntheticOperation {
    async fn execute(&self) -> Result<(), OperationError> {
        tokio::time::sleep(self.latency).await;
        if rand::thread_rng().gen_bool(self.failure_rate) {
            Err(OperationError::new("synthetic failure"))
        } else {
            Ok(())
        }
    }
}
