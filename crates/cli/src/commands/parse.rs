use std::path::Path;

use crate::commands::{print_json, read_rule};
use crate::error::CliError;
use crate::{OutputFormat, Settings};

/// Print the syntax tree of a rule file.
///
/// Text output is the canonical rule text; JSON output is the full tree.
pub(crate) fn cmd_parse(file: &Path, settings: &Settings) -> Result<(), CliError> {
    let rule = read_rule(file)?;
    match settings.output {
        OutputFormat::Text => println!("{}", rule),
        OutputFormat::Json => {
            let tree = serde_json::to_value(&rule)
                .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }));
            print_json(&tree);
        }
    }
    Ok(())
}
