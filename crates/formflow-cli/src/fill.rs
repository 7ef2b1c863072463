//! # Fill Subcommand
//!
//! Drives a [`FormSession`] non-interactively: answers are applied page by
//! page, each page must pass before the next is entered, and the complete
//! record is submitted to a directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use formflow_core::{DataRecord, QuestionId};
use formflow_state::{
    DirectorySubmissionService, FileSnapshotStore, FixedClock, FormSession, MemorySnapshotStore,
    PagingError, SessionConfig, SessionError, SnapshotStore,
};

use crate::config::CliConfig;
use crate::{load_record, load_schema, parse_today, EXIT_INVALID, EXIT_OK};

/// Arguments for `formflow fill`.
#[derive(Args, Debug)]
pub struct FillArgs {
    /// Schema file.
    pub schema: PathBuf,

    /// Answers (JSON object keyed by question id).
    pub answers: PathBuf,

    /// Fill in multi-step mode with this many questions per page.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Directory submission logs are written to.
    #[arg(long)]
    pub submit_dir: Option<PathBuf>,

    /// Directory of the snapshot store. Answers stored there prefill the
    /// session.
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Date that `"today"` resolves to (YYYY-MM-DD).
    #[arg(long, value_parser = parse_today)]
    pub today: Option<NaiveDate>,
}

fn session_config(args: &FillArgs, config: &CliConfig) -> SessionConfig {
    let mut session = config.session.clone();
    if let Some(size) = args.page_size {
        session.multi_step = true;
        session.page_size = size;
    }
    session
}

/// Execute the fill subcommand.
pub fn run_fill(args: &FillArgs, config: &CliConfig) -> Result<u8> {
    let Some(schema) = load_schema(&args.schema)? else {
        return Ok(EXIT_INVALID);
    };
    let answers = load_record(&args.answers)?;
    for id in answers.keys().filter(|id| schema.question(id.as_str()).is_none()) {
        tracing::warn!(%id, "ignoring answer for unknown question");
    }

    let store: Arc<dyn SnapshotStore> = match args.storage_dir.as_ref().or(config.storage_dir.as_ref()) {
        Some(dir) => Arc::new(FileSnapshotStore::new(dir)),
        None => Arc::new(MemorySnapshotStore::new()),
    };
    let mut session = FormSession::start(schema, &session_config(args, config), store)
        .context("failed to start session")?;
    if let Some(today) = args.today {
        session = session.with_clock(Arc::new(FixedClock(today)));
    }

    loop {
        apply_page(&mut session, &answers)?;
        if session.is_last_page() {
            break;
        }
        match session.next() {
            Ok(page) => println!("  page {} of {} ok", page - 1, session.page_count()),
            Err(SessionError::Paging(PagingError::PageInvalid { page, errors })) => {
                println!("INVALID: page {page} of {}", session.page_count());
                println!("{errors}");
                return Ok(EXIT_INVALID);
            }
            Err(e) => return Err(e).context("failed to advance"),
        }
    }

    let submit_dir = args.submit_dir.as_ref().unwrap_or(&config.submission_dir);
    let service = DirectorySubmissionService::new(submit_dir);
    match session.submit(&service) {
        Ok(receipt) => {
            println!("OK: {}", receipt.message);
            if let Some(id) = receipt.submission_id {
                println!("  submission id: {id}");
            }
            Ok(EXIT_OK)
        }
        Err(SessionError::Paging(PagingError::RecordInvalid { errors })) => {
            println!("INVALID: record");
            println!("{errors}");
            Ok(EXIT_INVALID)
        }
        Err(e) => Err(e).context("submission failed"),
    }
}

fn apply_page(session: &mut FormSession, answers: &DataRecord) -> Result<()> {
    let ids: Vec<QuestionId> = session.current_questions().iter().map(|q| q.id.clone()).collect();
    for id in ids {
        if let Some(value) = answers.get(id.as_str()) {
            if let Some(message) = session.set_value(id.as_str(), value.clone())? {
                tracing::info!(%id, %message, "answer does not pass");
            }
        }
    }
    Ok(())
}
