//! HTTP client that times and records every request under a tag

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;

use super::record::{RequestRecord, RequestTag};
use crate::error::Result;
use crate::metrics::collector::MetricsCollector;

#[derive(Clone)]
pub struct TaggedClient {
    client: Client,
    collector: MetricsCollector,
}

impl TaggedClient {
    pub fn new(request_timeout: Duration, collector: MetricsCollector) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("fasttech-load-test/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, collector })
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    /// POST `body` as JSON with `Content-Type: application/json` plus any
    /// extra headers.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        tag: RequestTag,
        url: &Url,
        body: &T,
        extra_headers: &[(HeaderName, &'static str)],
    ) -> RequestRecord {
        let payload = match serde_json::to_vec(body) {
            Ok(payload) => payload,
            Err(e) => {
                // Nothing was sent; record it as a failed request
                let record = failed_record(tag, "POST", url, Duration::ZERO, e.to_string());
                self.collector.record_request(&record);
                return record;
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in extra_headers {
            headers.insert(name.clone(), HeaderValue::from_static(*value));
        }

        let request = self.client.post(url.clone()).headers(headers).body(payload);
        self.execute(tag, "POST", url, request).await
    }

    pub async fn get(&self, tag: RequestTag, url: &Url) -> RequestRecord {
        let request = self.client.get(url.clone());
        self.execute(tag, "GET", url, request).await
    }

    async fn execute(
        &self,
        tag: RequestTag,
        method: &'static str,
        url: &Url,
        request: RequestBuilder,
    ) -> RequestRecord {
        let start = Instant::now();

        let record = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.bytes().await {
                    Ok(body) => RequestRecord {
                        tag,
                        method,
                        url: url.to_string(),
                        status,
                        body_len: body.len(),
                        duration: start.elapsed(),
                        error: None,
                    },
                    Err(e) => {
                        tracing::warn!("{} {} [{}]: failed to read body: {}", method, url, tag, e);
                        RequestRecord {
                            status,
                            ..failed_record(tag, method, url, start.elapsed(), e.to_string())
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("{} {} [{}]: {}", method, url, tag, e);
                failed_record(tag, method, url, start.elapsed(), e.to_string())
            }
        };

        tracing::debug!(
            "{} {} [{}] -> {} in {:.1}ms",
            method,
            url,
            tag,
            record.status,
            record.duration_ms()
        );
        self.collector.record_request(&record);
        record
    }
}

fn failed_record(
    tag: RequestTag,
    method: &'static str,
    url: &Url,
    duration: Duration,
    error: String,
) -> RequestRecord {
    RequestRecord {
        tag,
        method,
        url: url.to_string(),
        status: 0,
        body_len: 0,
        duration,
        error: Some(error),
    }
}
