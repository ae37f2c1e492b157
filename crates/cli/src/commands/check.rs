use std::path::Path;

use crate::commands::read_rule;
use crate::error::CliError;
use crate::record::rule_digest;
use crate::{OutputFormat, Settings};

pub(crate) fn cmd_check(file: &Path, settings: &Settings) -> Result<(), CliError> {
    let rule = read_rule(file)?;
    match settings.output {
        OutputFormat::Text => {
            if !settings.quiet {
                println!("ok: {}", file.display());
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "file": file.display().to_string(),
                    "valid": true,
                    "rule_digest": rule_digest(&rule),
                })
            );
        }
    }
    Ok(())
}
