//! put command - Write results from JSON into a group

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::types::{Location, PathRequirement};
use crate::persist::{persist_results, ArgsRecord, Outcome, PersistOptions, ProvenanceRecorder};
use crate::store::value::Value;

/// Parse `values` and `args`, then persist into `location`.
pub fn put(
    ctx: &Context,
    location: &str,
    values: &str,
    args: &[String],
    overwrite: bool,
) -> Result<()> {
    let target = Location::parse(location, PathRequirement::Required)?;
    let named = parse_values(values)?;

    let mut record = ArgsRecord::new();
    for pair in args {
        record.parse_pair(pair)?;
    }

    let provenance =
        ProvenanceRecorder::from_env().context("Failed to read the working directory")?;
    let options = PersistOptions::new(provenance)
        .overwrite(overwrite || ctx.config.overwrite())
        .policy(ctx.policy);

    match persist_results(&target, &named, &record, None, &options, &ctx.logger)? {
        Outcome::Skipped => {}
        Outcome::Written(report) => {
            if ctx.logger.do_debug() {
                ctx.logger
                    .debug(format!("wrote {}", report.written.join(", ")));
            }
        }
    }
    Ok(())
}

/// Turn a JSON object into named values, one per key.
pub fn parse_values(json: &str) -> Result<Vec<(String, Value)>> {
    let parsed: serde_json::Value =
        serde_json::from_str(json).context("--values is not valid JSON")?;
    let serde_json::Value::Object(map) = parsed else {
        bail!("--values must be a JSON object");
    };

    map.iter()
        .map(|(name, value)| {
            let value = Value::try_from(value)
                .with_context(|| format!("Cannot store '{}'", name))?;
            Ok((name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::value::{NdArray, Scalar};

    #[test]
    fn parses_object() {
        let named = parse_values(r#"{"energy": -1.5, "n": 3, "charges": [0.5, -0.5]}"#).unwrap();
        assert_eq!(
            named,
            vec![
                ("charges".to_string(), Value::Array(NdArray::from_vec(vec![0.5, -0.5]))),
                ("energy".to_string(), Value::Scalar(Scalar::Float(-1.5))),
                ("n".to_string(), Value::Scalar(Scalar::Int(3))),
            ]
        );
    }

    #[test]
    fn rejects_non_objects_and_nulls() {
        assert!(parse_values("[1, 2]").is_err());
        assert!(parse_values("not json").is_err());
        assert!(parse_values(r#"{"x": null}"#).is_err());
    }
}
