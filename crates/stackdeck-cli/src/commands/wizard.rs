use anyhow::{Context, Result};
use console::style;
use stackdeck_core::config;
use stackdeck_remote::HttpSink;
use stackdeck_ui::wizard::{self as prompts, Outcome};
use stackdeck_wizard::{FileSink, SelectMode, StackRecord, SubmissionSink, WizardSession};
use std::path::PathBuf;
use std::sync::Arc;

pub struct WizardParams {
    pub catalog: Option<PathBuf>,
    pub single: bool,
    pub edit: bool,
    pub submit_url: Option<String>,
}

pub async fn run(params: WizardParams) -> Result<()> {
    let catalog = Arc::new(super::load_catalog(params.catalog.as_deref())?);
    let mode = if params.single {
        SelectMode::Single
    } else {
        SelectMode::Multi
    };

    let mut session = if params.edit {
        start_from_stored(catalog, mode)?
    } else {
        WizardSession::new(catalog, mode)
    };

    let sink: Box<dyn SubmissionSink> = match params.submit_url.as_deref() {
        Some(url) => Box::new(HttpSink::new(url)?),
        None => Box::new(FileSink::default_location()?),
    };

    loop {
        if prompts::drive(&mut session)? == Outcome::Cancelled {
            println!("Wizard cancelled, nothing was submitted.");
            return Ok(());
        }

        let payload = session.begin_submit()?;
        loop {
            let pb = stackdeck_ui::spinner(&format!("Submitting to {}...", sink.describe()));
            let result = sink.submit(&payload).await;
            pb.finish_and_clear();
            match result {
                Ok(()) => {
                    session.finish_submit(true);
                    println!(
                        "{} {} application(s) submitted to {}",
                        style("Done.").green().bold(),
                        payload.selections.len(),
                        sink.describe()
                    );
                    return Ok(());
                }
                Err(e) => {
                    if prompts::confirm_retry(&e.to_string())? {
                        continue;
                    }
                    // Back to the summary with the selection intact.
                    session.finish_submit(false);
                    break;
                }
            }
        }
    }
}

fn start_from_stored(catalog: Arc<stackdeck_wizard::Catalog>, mode: SelectMode) -> Result<WizardSession> {
    let path = config::stack_path()?;
    let record = StackRecord::load(&path).context("reading stored stack")?;
    let Some(record) = record else {
        println!("No stored stack found, starting from scratch.");
        return Ok(WizardSession::new(catalog, mode));
    };

    let tokens = record.selections();
    let (session, skipped) = WizardSession::hydrate(catalog, mode, Some(&record.community), tokens.as_slice());
    for entry in &skipped {
        println!(
            "{} skipped '{}': {}",
            style("!").yellow().bold(),
            entry.token,
            entry.reason
        );
    }
    println!(
        "Loaded {} application(s) from {}",
        session.selection().apps.len(),
        path.display()
    );
    Ok(session)
}
