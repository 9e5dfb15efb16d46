// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Shell command parsing
//!
//! One line maps to one resolver operation. Picks refer to the option list
//! last shown for the level, numbered from 1; anything that is not a number
//! is taken as typed-in text.

use anyhow::{Context, Result, anyhow, bail};

use crate::cascade::{InstanceMode, ResourceType};

/// Longest `metrics` window: one year
pub const MAX_METRICS_MINUTES: u32 = 60 * 24 * 365;

/// Value given to `group` or `resource`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    /// 1-based position in the option list
    Index(usize),
    /// Typed-in label
    Text(String),
    /// `-` clears the level
    Clear,
}

impl Pick {
    fn parse(arg: &str) -> Self {
        if arg == "-" {
            return Pick::Clear;
        }
        match arg.parse::<usize>() {
            Ok(index) if index > 0 => Pick::Index(index),
            _ => Pick::Text(arg.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Quit,
    Clear,
    Mount,
    /// Current selection state
    State,
    /// Persisted query as JSON
    Json,
    /// Option counts and loading flags per level
    Levels,
    ResourceType(ResourceType),
    Groups(Option<String>),
    Group(Pick),
    Resources(Option<String>),
    Resource(Pick),
    DataSources,
    DataSource(usize),
    Mode(InstanceMode),
    Instances(Option<String>),
    Instance(Vec<usize>),
    Regex(String),
    DataPoints,
    /// Empty means every listed data point
    DataPoint(Vec<usize>),
    /// Host template variables currently set
    Vars,
    SetVar { name: String, value: String },
    UnsetVar(String),
    /// Query after host-variable interpolation
    Effective,
    Metrics { minutes: u32 },
    Check,
}

/// Parse `1,3 4` style index lists
fn parse_indices(args: &str) -> Result<Vec<usize>> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            let index: usize = s
                .parse()
                .with_context(|| format!("Invalid option number: {}", s))?;
            if index == 0 {
                bail!("Option numbers start at 1");
            }
            Ok(index)
        })
        .collect()
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(anyhow!("Usage: {}", usage))
    } else {
        Ok(rest)
    }
}

pub fn parse(line: &str) -> Result<ShellCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "help" | "\\?" => ShellCommand::Help,
        "quit" | "exit" | "\\q" => ShellCommand::Quit,
        "clear" | "\\c" => ShellCommand::Clear,
        "mount" => ShellCommand::Mount,
        "state" | "show" => ShellCommand::State,
        "json" => ShellCommand::Json,
        "levels" => ShellCommand::Levels,
        "type" => {
            let arg = required(rest, "type device|service|both")?;
            let resource_type = ResourceType::parse(arg)
                .with_context(|| format!("Unknown resource type: {}", arg))?;
            ShellCommand::ResourceType(resource_type)
        }
        "groups" => ShellCommand::Groups(optional(rest)),
        "group" => ShellCommand::Group(Pick::parse(required(rest, "group <n>|<text>|-")?)),
        "resources" => ShellCommand::Resources(optional(rest)),
        "resource" => {
            ShellCommand::Resource(Pick::parse(required(rest, "resource <n>|<text>|-")?))
        }
        "datasources" => ShellCommand::DataSources,
        "datasource" => {
            let arg = required(rest, "datasource <n>")?;
            match parse_indices(arg)?.as_slice() {
                [index] => ShellCommand::DataSource(*index),
                _ => bail!("Usage: datasource <n>"),
            }
        }
        "mode" => match required(rest, "mode select|regex")?.to_lowercase().as_str() {
            "select" => ShellCommand::Mode(InstanceMode::Select),
            "regex" => ShellCommand::Mode(InstanceMode::Regex),
            other => bail!("Unknown instance mode: {}", other),
        },
        "instances" => ShellCommand::Instances(optional(rest)),
        "instance" => ShellCommand::Instance(parse_indices(required(rest, "instance <n>[,<n>...]")?)?),
        // An empty pattern is allowed and clears the derived set
        "regex" => ShellCommand::Regex(rest.to_string()),
        "datapoints" => ShellCommand::DataPoints,
        "datapoint" => {
            let arg = required(rest, "datapoint <n>[,<n>...]|all")?;
            if arg.eq_ignore_ascii_case("all") {
                ShellCommand::DataPoint(Vec::new())
            } else {
                ShellCommand::DataPoint(parse_indices(arg)?)
            }
        }
        "var" | "set" if rest.is_empty() => ShellCommand::Vars,
        "var" | "set" => {
            let (name, value) = rest
                .split_once(char::is_whitespace)
                .context("Usage: var <name> <value>")?;
            ShellCommand::SetVar {
                name: name.to_string(),
                value: value.trim().to_string(),
            }
        }
        "unvar" | "unset" => ShellCommand::UnsetVar(required(rest, "unvar <name>")?.to_string()),
        "effective" => ShellCommand::Effective,
        "metrics" => {
            let minutes = if rest.is_empty() {
                60
            } else {
                rest.parse::<u32>()
                    .with_context(|| format!("Invalid number of minutes: {}", rest))?
            };
            if minutes == 0 || minutes > MAX_METRICS_MINUTES {
                bail!(
                    "Minutes must be between 1 and {}",
                    MAX_METRICS_MINUTES
                );
            }
            ShellCommand::Metrics { minutes }
        }
        "check" => ShellCommand::Check,
        "" => bail!("Empty command"),
        other => bail!("Unknown command: {} (type 'help')", other),
    };
    Ok(command)
}
