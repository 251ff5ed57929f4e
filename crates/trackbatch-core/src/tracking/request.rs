//! Request body and headers for the tracking endpoint.

use anyhow::{Context, Result};
use serde::Serialize;
use url::Url;

use crate::batch::Batch;
use crate::fingerprint::Fingerprint;

/// Carrier code sent with every number.
const CARRIER_CODE: &str = "100003";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestItem<'a> {
    pub num: &'a str,
    pub fc: &'static str,
    pub sc: u8,
}

/// Body of one batch request. Field order is part of the fingerprint input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRequestBody<'a> {
    pub data: Vec<RequestItem<'a>>,
    pub guid: &'static str,
    #[serde(rename = "timeZoneOffset")]
    pub time_zone_offset: i32,
}

impl<'a> BatchRequestBody<'a> {
    pub fn new(batch: &'a Batch, time_zone_offset: i32) -> Self {
        Self {
            data: batch
                .iter()
                .map(|n| RequestItem {
                    num: n.as_str(),
                    fc: CARRIER_CODE,
                    sc: 0,
                })
                .collect(),
            guid: "",
            time_zone_offset,
        }
    }
}

/// Endpoint URL plus the browser origin headers derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestProfile {
    pub url: String,
    pub origin: String,
    pub referer: String,
}

impl RequestProfile {
    pub fn new(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)
            .with_context(|| format!("invalid endpoint URL: {}", endpoint))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            anyhow::bail!("endpoint must be an http(s) URL with a host: {}", endpoint);
        }
        let origin = url.origin().ascii_serialization();
        Ok(Self {
            url: endpoint.to_string(),
            referer: format!("{}/en", origin),
            origin,
        })
    }

    /// Headers for one attempt; `fingerprint` must be fresh for this attempt.
    pub fn headers(&self, fingerprint: &Fingerprint) -> Vec<(String, String)> {
        let fixed = [
            ("Accept-Language", "ru-RU,ru;q=0.9"),
            (
                "Content-Type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            ),
            ("Origin", self.origin.as_str()),
            ("Referer", self.referer.as_str()),
            ("Sec-Fetch-Dest", "empty"),
            ("Sec-Fetch-Mode", "cors"),
            ("Sec-Fetch-Site", "same-origin"),
            ("User-Agent", USER_AGENT),
            ("X-Requested-With", "XMLHttpRequest"),
        ];
        let mut headers: Vec<(String, String)> = fixed
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        headers.push(("last-event-id".to_string(), fingerprint.token.clone()));
        headers.push((
            "Cookie".to_string(),
            format!("_yq_bid={};", fingerprint.guid),
        ));
        headers
    }
}
