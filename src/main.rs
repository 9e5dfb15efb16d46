// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cascade;
mod cli;
pub mod config;
mod logicmonitor;
mod output;
pub mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use cascade::{CascadeResolver, ResolverOptions};
use cli::repl::{Shell, run_repl, run_script};
use cli::{Args, Command};
use config::Config;
use logicmonitor::{SantabaClient, Transport, health_check};

/// Initialize logging with file output and optional stderr
fn init_logging(verbose: bool, to_stderr: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};
    use tracing_subscriber::fmt::format::FmtSpan;

    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return;
    }

    // Rotate daily or at 10MB, keeping 5 files
    let log_path = log_dir.join("lmcascade.log");
    let condition = RollingConditionBase::new()
        .daily()
        .max_size(10 * 1024 * 1024);

    let file_appender = match RollingFileAppenderBase::new(log_path, condition, 5) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = file_appender.get_non_blocking_appender();
    // The background writer lives as long as the process
    std::mem::forget(guard);

    let filter = if verbose {
        "lmcascade=debug"
    } else {
        "lmcascade=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE);

    if to_stderr && verbose {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (aws-lc-rs); a second install is harmless
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Warning: rustls crypto provider was already installed");
    }

    let args = Args::parse();

    // Always log to ~/.lmcascade/log/lmcascade.log; batch mode with -v also logs to stderr
    let is_batch = args.execute.is_some() || args.file.is_some();
    init_logging(args.verbose, is_batch && args.verbose);

    if let Some(cmd) = &args.command {
        match cmd {
            Command::Interactive => run_interactive(&args).await?,
            Command::Check => run_check(&args).await?,
            Command::Configure { .. } => configure(cmd)?,
        }
        return Ok(());
    }

    if is_batch {
        run_batch(&args).await?;
        return Ok(());
    }

    run_interactive(&args).await
}

/// Saved config with command-line overrides applied
fn effective_config(args: &Args) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(company) = &args.company {
        config.settings.path = company.clone();
    }
    if args.no_autocomplete {
        config.features.autocomplete = false;
    }
    if let Some(delay) = args.listing_delay_ms {
        config.listing_delay_ms = delay;
    }
    Ok(config)
}

fn build_shell(args: &Args, progress: progress::ProgressHandle) -> Result<(Shell, String)> {
    let config = effective_config(args)?;
    config.settings.validate()?;

    let client = SantabaClient::new(&config.settings)?;
    let transport: Arc<dyn Transport> = Arc::new(client);
    let options = ResolverOptions::from_config(&config);
    info!(
        company = %config.settings.path,
        autocomplete = options.autocomplete,
        regex = options.regex_enabled,
        host_variable = options.host_variable,
        "Starting session"
    );

    let resolver = CascadeResolver::new(Arc::clone(&transport), options).with_progress(progress);
    let shell = Shell::new(resolver, transport, args.output.clone(), args.no_headers);
    Ok((shell, config.settings.path))
}

async fn run_check(args: &Args) -> Result<()> {
    let config = effective_config(args)?;
    config.settings.validate()?;
    let client = SantabaClient::new(&config.settings)?;

    match health_check(&client).await {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Health check failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn configure(cmd: &Command) -> Result<()> {
    let Command::Configure {
        company,
        bearer,
        bearer_token,
        access_id,
        access_key,
        skip_tls_verify,
        regex,
        host_variable,
    } = cmd
    else {
        return Ok(());
    };

    // Start from the file alone so environment secrets are not persisted
    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;

    if let Some(company) = company {
        config.settings.path = company.clone();
    }
    if *bearer {
        config.settings.is_bearer_enabled = true;
        config.settings.is_lmv1_enabled = false;
        if let Some(token) = bearer_token {
            config.settings.bearer_token = Some(token.clone());
        }
    }
    if let Some(id) = access_id {
        config.settings.is_lmv1_enabled = true;
        config.settings.is_bearer_enabled = false;
        config.settings.access_id = id.clone();
        if let Some(key) = access_key {
            config.settings.access_key = Some(key.clone());
        }
    }
    if let Some(skip) = skip_tls_verify {
        config.settings.skip_tls_verify = *skip;
    }
    if let Some(enabled) = regex {
        config.features.regex_instance_selection = *enabled;
    }
    if let Some(enabled) = host_variable {
        config.features.host_variable = *enabled;
    }

    config.save_to(&path)?;
    println!("Saved {}", path.display());

    // Secrets may still come from the environment at run time
    let mut check = config.clone();
    check.settings.apply_env();
    if let Err(e) = check.settings.validate() {
        println!("Warning: {}", e);
    }
    Ok(())
}

async fn run_batch(args: &Args) -> Result<()> {
    let lines: Vec<String> = if let Some(execute) = &args.execute {
        execute.split(';').map(String::from).collect()
    } else if let Some(file) = &args.file {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file))?
            .lines()
            .map(String::from)
            .collect()
    } else {
        return Ok(());
    };

    let lines: Vec<String> = lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let (mut shell, _) = build_shell(args, progress::create_progress_handle())?;
    match run_script(&mut shell, &lines).await {
        Ok(outputs) => {
            for output in outputs {
                println!("{}", output);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error executing command: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run_interactive(args: &Args) -> Result<()> {
    let progress = progress::create_progress_handle();
    let (shell, company) = build_shell(args, Arc::clone(&progress))?;
    run_repl(shell, progress, &company).await
}
