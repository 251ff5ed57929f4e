//! Tracking endpoint protocol: request construction, response
//! classification, and the single-attempt batch client.

mod client;
mod request;
mod response;

pub use client::BatchClient;
pub use request::{BatchRequestBody, RequestItem, RequestProfile};
pub use response::{
    classify, is_rate_limited, ClassifiedResult, ClassifyError, PartialTrack, ResolvedTrack,
    Verdict, INFO_SENT_MARKER, RATE_LIMIT_SENTINELS,
};
