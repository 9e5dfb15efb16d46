// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "lmcascade")]
#[command(author, version, about = "Resolve LogicMonitor resource selections interactively")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Execute shell commands directly (separated by ';')
    #[arg(short, long)]
    pub execute: Option<String>,

    /// Execute shell commands from a file
    #[arg(short, long)]
    pub file: Option<String>,

    /// Company (account) name, overrides the saved config
    #[arg(short, long, value_name = "COMPANY")]
    pub company: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Omit column headers in output
    #[arg(long)]
    pub no_headers: bool,

    /// Use full listings instead of autocomplete search
    #[arg(long)]
    pub no_autocomplete: bool,

    /// Minimum latency before each listing request, in milliseconds
    #[arg(long, value_name = "MS")]
    pub listing_delay_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start interactive REPL mode
    Interactive,

    /// Validate settings and test authentication
    Check,

    /// Save connection settings to ~/.lmcascade/config.json
    Configure {
        /// Company (account) name
        #[arg(long)]
        company: Option<String>,

        /// Use bearer token authentication (token from LM_BEARER_TOKEN or --bearer-token)
        #[arg(long, conflicts_with = "access_id")]
        bearer: bool,

        #[arg(long, requires = "bearer")]
        bearer_token: Option<String>,

        /// Use LMv1 authentication with this access id
        #[arg(long)]
        access_id: Option<String>,

        #[arg(long, requires = "access_id")]
        access_key: Option<String>,

        /// Accept invalid TLS certificates
        #[arg(long)]
        skip_tls_verify: Option<bool>,

        /// Enable or disable regex instance selection
        #[arg(long)]
        regex: Option<bool>,

        /// Enable or disable host variable interpolation
        #[arg(long)]
        host_variable: Option<bool>,
    },
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
