use std::path::Path;

use crate::commands::{print_json, read_context, read_rule, render_tree};
use crate::error::CliError;
use crate::record::build_record;
use crate::{OutputFormat, Settings};

/// Evaluate one rule file against a context file.
///
/// A rule that evaluates to false is still a successful run: the exit
/// status only reflects whether evaluation could take place.
pub(crate) fn cmd_eval(file: &Path, context: &Path, settings: &Settings) -> Result<(), CliError> {
    let clock = settings.clock()?;
    let rule = read_rule(file)?;
    let ctx = read_context(context)?;

    let decision = canon_eval::evaluate_traced(&rule, &ctx, clock.as_ref());
    tracing::info!(
        file = %file.display(),
        result = decision.outcome.result,
        "rule evaluated"
    );

    match settings.output {
        OutputFormat::Json => print_json(&build_record(&rule, &decision)),
        OutputFormat::Text => {
            let verdict = if decision.outcome.result { "PASS" } else { "FAIL" };
            println!("{}: {}", verdict, file.display());
            if !settings.quiet {
                print!("{}", render_tree(&decision.outcome));
            }
        }
    }
    Ok(())
}
