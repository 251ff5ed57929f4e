//! `trackbatch fingerprint` – show what would be sent for a set of numbers.

use anyhow::{Context, Result};
use trackbatch_core::batch::{Batch, MAX_BATCH_SIZE};
use trackbatch_core::fingerprint::FingerprintGenerator;
use trackbatch_core::tracking::BatchRequestBody;

pub fn run_fingerprint(numbers: &[String]) -> Result<()> {
    let batch = Batch::from_raw(numbers);
    if batch.is_empty() {
        anyhow::bail!("no track numbers given");
    }
    if batch.len() > MAX_BATCH_SIZE {
        anyhow::bail!(
            "{} numbers given; a batch holds at most {}",
            batch.len(),
            MAX_BATCH_SIZE
        );
    }

    let generator = FingerprintGenerator::system();
    let body = BatchRequestBody::new(&batch, generator.utc_offset_minutes());
    let (fingerprint, json) = generator
        .generate_for(&body)
        .context("failed to encode request body")?;

    println!("body:  {}", json);
    println!("guid:  {}", fingerprint.guid);
    println!("token: {}", fingerprint.token);
    Ok(())
}
