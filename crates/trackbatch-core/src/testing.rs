//! Test doubles shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::control::RunControl;
use crate::retry::FailureKind;
use crate::transport::{TrackRequest, Transport, TransportError, TransportResponse};

type Scripted = Result<TransportResponse, TransportError>;

/// Transport that replays scripted responses and records every request.
/// Once the script is exhausted every call fails with `Unexpected`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<TrackRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Scripted) -> &Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    pub fn push_json(&self, status: u32, body: Value) -> &Self {
        self.push(Ok(json_response(status, &body)))
    }

    pub fn push_failure(&self, kind: FailureKind) -> &Self {
        self.push(Err(TransportError::failed(kind, "scripted")))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TrackRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn post(
        &self,
        request: TrackRequest,
        control: &RunControl,
    ) -> Result<TransportResponse, TransportError> {
        if control.is_cancelled() {
            return Err(TransportError::Aborted);
        }
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(TransportError::failed(FailureKind::Unexpected, "script exhausted")))
    }
}

pub fn json_response(status: u32, body: &Value) -> TransportResponse {
    TransportResponse {
        status,
        body: body.to_string().into_bytes(),
    }
}

/// Shipment JSON with the first two milestone timestamps set as given.
pub fn shipment(number: &str, t0: Option<&str>, t1: Option<&str>) -> Value {
    serde_json::json!({
        "number": number,
        "shipment": {
            "milestone": [
                { "key_stage": "InfoReceived", "time_utc": t0 },
                { "key_stage": "PickedUp", "time_utc": t1 }
            ]
        }
    })
}
