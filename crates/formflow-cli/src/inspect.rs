//! # Inspection Subcommands
//!
//! Read-only views of what a schema compiles to:
//!
//! - `formflow defaults [SCHEMA]`: the default record as JSON.
//! - `formflow pages [SCHEMA] --page-size N`: the page partition.
//! - `formflow check SCHEMA RECORD [--page N]`: field errors of a record.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use formflow_core::FormSchema;
use formflow_rules::{default_record, CompiledValidator, FieldErrors};
use formflow_state::{page_count, page_questions, PageMode, PageSize};

use crate::config::CliConfig;
use crate::{load_record, load_schema, parse_today, schema_path, today_or_now, EXIT_INVALID, EXIT_OK};

/// Arguments for `formflow defaults`.
#[derive(Args, Debug)]
pub struct DefaultsArgs {
    /// Schema file. Defaults to the configured default schema.
    pub schema: Option<PathBuf>,
}

/// Arguments for `formflow pages`.
#[derive(Args, Debug)]
pub struct PagesArgs {
    /// Schema file. Defaults to the configured default schema.
    pub schema: Option<PathBuf>,

    /// Questions per page (2-6). Defaults to the configured page size.
    #[arg(long)]
    pub page_size: Option<usize>,
}

/// Arguments for `formflow check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema file.
    pub schema: PathBuf,

    /// Data record (JSON object keyed by question id).
    pub record: PathBuf,

    /// Validate only this page (1-based) instead of the whole record.
    #[arg(long)]
    pub page: Option<usize>,

    /// Questions per page when `--page` is given.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Date that `"today"` resolves to (YYYY-MM-DD).
    #[arg(long, value_parser = parse_today)]
    pub today: Option<NaiveDate>,
}

fn multi_step(size: Option<usize>, config: &CliConfig) -> Result<PageMode> {
    let size = size.unwrap_or(config.session.page_size);
    Ok(PageMode::MultiStep(PageSize::new(size)?))
}

/// Execute the defaults subcommand.
pub fn run_defaults(args: &DefaultsArgs, config: &CliConfig) -> Result<u8> {
    let path = schema_path(args.schema.as_deref(), config);
    let Some(schema) = load_schema(&path)? else {
        return Ok(EXIT_INVALID);
    };
    let record = default_record(&schema);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(EXIT_OK)
}

/// Execute the pages subcommand.
pub fn run_pages(args: &PagesArgs, config: &CliConfig) -> Result<u8> {
    let mode = multi_step(args.page_size, config)?;
    let path = schema_path(args.schema.as_deref(), config);
    let Some(schema) = load_schema(&path)? else {
        return Ok(EXIT_INVALID);
    };
    print!("{}", render_pages(&schema, mode));
    Ok(EXIT_OK)
}

/// Text listing of every page and its question ids.
pub fn render_pages(schema: &FormSchema, mode: PageMode) -> String {
    let count = page_count(schema.len(), mode);
    let mut out = format!("{} questions, {count} page(s)\n", schema.len());
    for page in 1..=count {
        let ids: Vec<&str> = page_questions(schema, mode, page)
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        out.push_str(&format!("  Page {page}: {}\n", ids.join(", ")));
    }
    out
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, config: &CliConfig) -> Result<u8> {
    let Some(schema) = load_schema(&args.schema)? else {
        return Ok(EXIT_INVALID);
    };
    let record = load_record(&args.record)?;
    let validator = CompiledValidator::compile(&schema).context("failed to compile validation rules")?;
    let today = today_or_now(args.today);

    let verdict = match args.page {
        Some(page) => {
            let mode = multi_step(args.page_size, config)?;
            let count = page_count(schema.len(), mode);
            if page == 0 || page > count {
                bail!("page {page} does not exist; the schema has {count} page(s)");
            }
            let ids = page_questions(&schema, mode, page).iter().map(|q| &q.id);
            validator.validate_fields(&record, ids, today)
        }
        None => validator.validate_on(&record, today),
    };
    Ok(report(verdict))
}

fn report(verdict: Result<(), FieldErrors>) -> u8 {
    match verdict {
        Ok(()) => {
            println!("OK: record is valid");
            EXIT_OK
        }
        Err(errors) => {
            println!("INVALID: {} field(s)", errors.len());
            println!("{errors}");
            EXIT_INVALID
        }
    }
}
