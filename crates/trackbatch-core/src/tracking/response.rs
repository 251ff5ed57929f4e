//! Classification of tracking responses into resolved, partial and unresolved.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::batch::Batch;

/// Substrings the endpoint embeds in a 200 response when it soft-blocks us.
pub const RATE_LIMIT_SENTINELS: [&str; 2] = ["abN", "uIP"];

/// Shipment text meaning the label exists but the carrier has not scanned it.
pub const INFO_SENT_MARKER: &str = "Shipment information sent to FedEx";

/// Shipment with both first milestones, or the "information sent" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub number: String,
    /// "Information received" timestamp (UTC).
    pub info_received: Option<String>,
    /// "Picked up" timestamp (UTC).
    pub picked_up: Option<String>,
    /// Set when resolved through the marker rather than milestones.
    pub note: Option<String>,
}

/// Shipment with only the "information received" milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialTrack {
    pub number: String,
    pub info_received: String,
}

/// Batch split into three disjoint groups covering the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedResult {
    pub resolved: Vec<ResolvedTrack>,
    pub partial: Vec<PartialTrack>,
    pub unresolved: BTreeSet<String>,
}

impl ClassifiedResult {
    pub fn resolved_numbers(&self) -> BTreeSet<&str> {
        self.resolved.iter().map(|t| t.number.as_str()).collect()
    }

    pub fn partial_numbers(&self) -> BTreeSet<&str> {
        self.partial.iter().map(|t| t.number.as_str()).collect()
    }

    /// Total numbers across all three groups.
    pub fn len(&self) -> usize {
        self.resolved.len() + self.partial.len() + self.unresolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A sentinel was found; the payload must not be trusted.
    RateLimited,
    Classified(ClassifiedResult),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("response has no shipments array")]
    MissingShipments,
}

/// Returns true if the serialized payload contains a rate-limit sentinel.
pub fn is_rate_limited(response: &Value) -> bool {
    let text = response.to_string();
    RATE_LIMIT_SENTINELS.iter().any(|s| text.contains(s))
}

/// Splits `batch` according to `response`.
///
/// Only shipments whose number belongs to the batch and has not been matched
/// yet are considered, so the three groups always partition the batch.
pub fn classify(response: &Value, batch: &Batch) -> Result<Verdict, ClassifyError> {
    if is_rate_limited(response) {
        return Ok(Verdict::RateLimited);
    }
    let shipments = response
        .get("shipments")
        .and_then(Value::as_array)
        .ok_or(ClassifyError::MissingShipments)?;

    let mut result = ClassifiedResult {
        unresolved: batch.to_string_set(),
        ..ClassifiedResult::default()
    };

    for shipment in shipments {
        let Some(number) = shipment.get("number").and_then(Value::as_str) else {
            continue;
        };
        if !result.unresolved.contains(number) {
            continue;
        }
        let milestones = shipment
            .pointer("/shipment/milestone")
            .and_then(Value::as_array);
        let info_received = milestone_time(milestones, 0);
        let picked_up = milestone_time(milestones, 1);

        match (info_received, picked_up) {
            (Some(t0), Some(t1)) => result.resolved.push(ResolvedTrack {
                number: number.to_string(),
                info_received: Some(t0),
                picked_up: Some(t1),
                note: None,
            }),
            (Some(t0), None) => result.partial.push(PartialTrack {
                number: number.to_string(),
                info_received: t0,
            }),
            (None, t1) if shipment.to_string().contains(INFO_SENT_MARKER) => {
                result.resolved.push(ResolvedTrack {
                    number: number.to_string(),
                    info_received: None,
                    picked_up: t1,
                    note: Some(INFO_SENT_MARKER.to_string()),
                })
            }
            (None, _) => continue,
        }
        result.unresolved.remove(number);
    }

    Ok(Verdict::Classified(result))
}

/// `time_utc` of milestone `idx` when it is a non-empty string.
fn milestone_time(milestones: Option<&Vec<Value>>, idx: usize) -> Option<String> {
    milestones?
        .get(idx)?
        .get("time_utc")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
