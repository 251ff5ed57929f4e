//! Client-side request fingerprint expected by the tracking endpoint.
//!
//! Every request carries a GUID (sent as the `_yq_bid` cookie) and a token
//! (sent as `last-event-id`). The token is the reversed hash string in hex
//! followed by a six-slot salt. The endpoint recomputes it, so the layout must
//! match byte for byte.
//!
//! Slots are a local array built fresh on every call; nothing is shared
//! between calls or threads.

mod entropy;
mod hash;

pub use entropy::{EntropySource, FixedEntropy, SystemEntropy};
pub use hash::{js_hash, js_hash_hex};

use serde::Serialize;

/// Constant embedded twice in the hash string.
const BUILD_ID: &str = "3445861433";
/// Upper bound for the random `d2` value.
const D2_RANGE: f64 = 48.0;

/// GUID + token pair for one request attempt. Never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// `G-` followed by 16 uppercase hex digits.
    pub guid: String,
    /// Hex of the reversed hash string followed by the salt.
    pub token: String,
}

/// Generates fingerprints from an [`EntropySource`].
#[derive(Debug, Clone, Default)]
pub struct FingerprintGenerator<E = SystemEntropy> {
    entropy: E,
}

impl FingerprintGenerator<SystemEntropy> {
    pub fn system() -> Self {
        Self::new(SystemEntropy)
    }
}

impl<E: EntropySource> FingerprintGenerator<E> {
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    /// UTC offset (positive west) used in both the hash string and the body.
    pub fn utc_offset_minutes(&self) -> i32 {
        self.entropy.utc_offset_minutes()
    }

    /// Fingerprint for a request whose body is `compact_payload` (compact
    /// JSON, exactly as it will be sent).
    pub fn generate(&self, compact_payload: &str) -> Fingerprint {
        let guid = format!("G-{:016X}", self.entropy.guid_bits());

        let mut slots: [String; 6] = Default::default();
        slots[3] = "4".to_string();

        let d2 = (self.entropy.unit_interval() * D2_RANGE).round_ties_even() as u32;
        slots[1] = format!("{:x}", d2);
        slots[2] = slots[1].len().to_string();

        let hash_string = format!(
            "{guid}:false:{BUILD_ID}:{d2}:{}/{:x}/11/true/{}/{BUILD_ID}/a5b6e6b/0",
            d2 * 50,
            self.entropy.now_millis(),
            self.entropy.utc_offset_minutes(),
        );

        // Slot 5 before slot 4.
        slots[5] = js_hash_hex(compact_payload, compact_payload.len() as i32);
        slots[4] = js_hash_hex(&hash_string, d2 as i32);

        let mut token = reversed_code_points_hex(&hash_string);
        for slot in &slots {
            token.push_str(slot);
        }

        Fingerprint { guid, token }
    }

    /// Serializes `payload` to compact JSON and fingerprints it.
    /// Returns the fingerprint together with the exact body to send.
    pub fn generate_for<T: Serialize>(
        &self,
        payload: &T,
    ) -> serde_json::Result<(Fingerprint, String)> {
        let body = serde_json::to_string(payload)?;
        Ok((self.generate(&body), body))
    }
}

/// Lowercase hex of each code point of `s` reversed, unpadded, no separators.
fn reversed_code_points_hex(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for ch in s.chars().rev() {
        out.push_str(&format!("{:x}", ch as u32));
    }
    out
}
