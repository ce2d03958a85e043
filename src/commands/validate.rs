use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ValidateArgs;
use crate::scoring::{decode_text, validate_raw};

pub fn run(args: ValidateArgs) -> Result<()> {
    let bytes = fs::read(&args.prediction_path).with_context(|| {
        format!(
            "failed to read prediction file: {}",
            args.prediction_path.display()
        )
    })?;

    let result = match decode_text(&bytes) {
        Ok(raw) => validate_raw(raw),
        Err(failure) => failure,
    };
    info!(
        path = %args.prediction_path.display(),
        parsed = result.parsed,
        schema_ok = result.schema_ok,
        schema_valid = result.schema_valid,
        schema_strict = result.schema_strict,
        errors = result.errors.len(),
        "validated prediction"
    );

    let rendered =
        serde_json::to_string_pretty(&result).context("failed to serialize validation result")?;
    println!("{rendered}");

    Ok(())
}
