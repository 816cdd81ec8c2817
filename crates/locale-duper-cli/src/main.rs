mod commands;
mod logging;
mod progress;
mod summary;

use std::io::{self, Write};
use std::process;

use anyhow::{anyhow, bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, CopyFieldArgs, DuplicateArgs};
use dotenv::dotenv;
use locale_duper_core::field_copy::copy_record_field;
use locale_duper_core::locales::{main_locale, validate_locales};
use locale_duper_core::{
    AbortSignal, AppConfig, ContentApi, DatoClient, DuplicationEngine, DuplicationRequest,
    EngineOptions, RunOutcome,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match locale_duper_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Locales) => run_locales(&config).await,
        Some(Commands::Models { all }) => run_models(&config, all).await,
        Some(Commands::Fields { model }) => run_fields(&config, &model).await,
        Some(Commands::Duplicate(args)) => run_duplicate(&config, args).await,
        Some(Commands::CopyField(args)) => run_copy_field(&config, args).await,
        Some(Commands::PrintConfig) => {
            print_config(&config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        process::exit(1);
    }
}

async fn run_locales(config: &AppConfig) -> anyhow::Result<()> {
    let client = DatoClient::new(config)?;
    let site = client.site().await?;

    println!("Locales of {}:", site.name.bold());
    for (index, locale) in site.locales.iter().enumerate() {
        if index == 0 {
            println!("  {} {}", locale.green(), "(main)".dimmed());
        } else {
            println!("  {}", locale);
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct ModelRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "API key")]
    api_key: &'a str,
    #[tabled(rename = "Name")]
    name: &'a str,
    #[tabled(rename = "Block")]
    block: bool,
}

async fn run_models(config: &AppConfig, all: bool) -> anyhow::Result<()> {
    let client = DatoClient::new(config)?;
    let models = client.list_models().await?;

    let rows: Vec<ModelRow> = models
        .iter()
        .filter(|m| all || !m.modular_block)
        .map(|m| ModelRow {
            id: &m.id,
            api_key: &m.api_key,
            name: &m.name,
            block: m.modular_block,
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

#[derive(Tabled)]
struct FieldRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "API key")]
    api_key: &'a str,
    #[tabled(rename = "Label")]
    label: &'a str,
    #[tabled(rename = "Type")]
    field_type: &'a str,
    #[tabled(rename = "Localized")]
    localized: bool,
    #[tabled(rename = "Copy enabled")]
    copy_enabled: bool,
}

async fn run_fields(config: &AppConfig, model_id: &str) -> anyhow::Result<()> {
    let client = DatoClient::new(config)?;
    let fields = client.list_fields(model_id).await?;

    let rows: Vec<FieldRow> = fields
        .iter()
        .map(|f| FieldRow {
            id: &f.id,
            api_key: &f.api_key,
            label: &f.label,
            field_type: &f.field_type,
            localized: f.localized,
            copy_enabled: locale_duper_core::field_copy::is_enabled(
                &config.field_copy,
                model_id,
                &f.id,
            ),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

async fn run_duplicate(config: &AppConfig, args: DuplicateArgs) -> anyhow::Result<()> {
    let client = DatoClient::new(config)?;
    let site = client.site().await?;

    let source = match args.from {
        Some(locale) => locale,
        None => main_locale(&site.locales)
            .ok_or_else(|| anyhow!("the site has no locales"))?
            .to_string(),
    };
    validate_locales(&source, &args.to, &site.locales)?;

    let models = client.list_models().await?;
    let unknown: Vec<&String> = args
        .models
        .iter()
        .filter(|id| !models.iter().any(|m| &m.id == *id && !m.modular_block))
        .collect();
    if !unknown.is_empty() {
        bail!("unknown or block model IDs: {:?}", unknown);
    }
    let selected: Vec<&str> = models
        .iter()
        .filter(|m| !m.modular_block)
        .filter(|m| args.models.is_empty() || args.models.contains(&m.id))
        .map(|m| m.name.as_str())
        .collect();

    println!(
        "Copying {} into {} for {} models: {}",
        source.green().bold(),
        args.to.yellow().bold(),
        selected.len(),
        selected.join(", ")
    );

    if !args.yes {
        let first = format!(
            "Existing '{}' content will be replaced with '{}' content. Continue?",
            args.to, source
        );
        if !prompt_confirm(&first, Some(false))? {
            println!("Cancelled");
            return Ok(());
        }
        if !prompt_confirm(
            "This cannot be undone. Are you SURE you want to start?",
            Some(false),
        )? {
            println!("Cancelled");
            return Ok(());
        }
    }

    let request = DuplicationRequest {
        source_locale: source,
        target_locale: args.to,
        model_ids: (!args.models.is_empty()).then_some(args.models),
    };

    let abort = AbortSignal::new();
    spawn_abort_on_ctrl_c(abort.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = tokio::spawn(progress::watch_progress(rx));

    let engine = DuplicationEngine::new(client).with_options(EngineOptions::from(config));
    let result = engine.run(&request, &tx, &abort).await;
    drop(tx);

    let stats = watcher.await.context("progress display crashed")?;
    summary::print_summary(&stats, args.show_errors);

    match result? {
        RunOutcome::Completed => info!("Duplication finished"),
        RunOutcome::Aborted => println!(
            "{}",
            "Aborted. Records written before the abort keep their new values.".yellow()
        ),
    }
    Ok(())
}

/// First Ctrl-C asks the engine to stop after the current request, the second exits.
fn spawn_abort_on_ctrl_c(abort: AbortSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Abort requested, finishing the request in flight");
        eprintln!(
            "{}",
            "Stopping after the current record. Press Ctrl-C again to quit immediately.".yellow()
        );
        abort.abort();

        if tokio::signal::ctrl_c().await.is_ok() {
            process::exit(130);
        }
    });
}

async fn run_copy_field(config: &AppConfig, args: CopyFieldArgs) -> anyhow::Result<()> {
    let client = DatoClient::new(config)?;
    let site = client.site().await?;
    validate_locales(&args.from, &args.to, &site.locales)?;

    let updated = copy_record_field(
        &client,
        &config.field_copy,
        &args.record,
        &args.field,
        &args.from,
        &args.to,
    )
    .await?;

    match updated {
        Some(record) => println!(
            "{} Copied {} from {} to {} on record {}",
            "✓".green().bold(),
            args.field.bold(),
            args.from,
            args.to,
            record.id
        ),
        None => println!(
            "Record {} has no '{}' value for {}; nothing to copy",
            args.record, args.from, args.field
        ),
    }
    Ok(())
}

fn print_config(config: &AppConfig) {
    let token = match config.api_token.as_deref() {
        Some(token) => {
            let tail = token.get(token.len().saturating_sub(4)..).unwrap_or("");
            format!("****{tail}")
        }
        None => "(not set)".to_string(),
    };
    println!("api_token: {}", token);
    println!(
        "environment: {}",
        config.environment.as_deref().unwrap_or("(primary)")
    );
    println!("base_url: {}", config.base_url);
    println!("page_size: {}", config.page_size);
    println!("settle_delay_secs: {}", config.settle_delay_secs);
    println!("field_copy: {} rules", config.field_copy.len());
    for rule in &config.field_copy {
        println!("  model {} / field {}", rule.model_id, rule.field_id);
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
