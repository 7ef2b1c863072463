//! # Validate Subcommand
//!
//! Loads a schema and runs the schema validator over it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::config::CliConfig;
use crate::{load_schema, schema_path, EXIT_INVALID, EXIT_OK};

/// Arguments for `formflow validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file (JSON or YAML). Defaults to the configured default schema.
    pub schema: Option<PathBuf>,

    /// List every question of an accepted schema.
    #[arg(long)]
    pub list: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: &CliConfig) -> Result<u8> {
    let path = schema_path(args.schema.as_deref(), config);
    validate_file(&path, args.list)
}

fn validate_file(path: &Path, list: bool) -> Result<u8> {
    let Some(schema) = load_schema(path)? else {
        return Ok(EXIT_INVALID);
    };
    println!("OK: {} ({} questions)", path.display(), schema.len());
    if list {
        for (index, question) in schema.questions().iter().enumerate() {
            let required = if question.required { " *" } else { "" };
            println!(
                "  {:>2}. {} [{}] {}{required}",
                index + 1,
                question.id,
                question.kind(),
                question.label
            );
        }
    }
    Ok(EXIT_OK)
}
