// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::{Context as _, Result, anyhow, bail};
use console::{Style, style};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::OutputFormat;
use super::command::{self, Pick, ShellCommand};
use crate::cascade::{CascadeResolver, Selection, StaticVariables};
use crate::config;
use crate::logicmonitor::{Transport, health_check};
use crate::output::{self, QueryResult};
use crate::progress::{ProgressHandle, ProgressUpdate, create_spinner};

const COMMANDS: &[&str] = &[
    "help", "quit", "clear", "mount", "state", "json", "levels", "type", "groups", "group",
    "resources", "resource", "datasources", "datasource", "mode", "instances", "instance",
    "regex", "datapoints", "datapoint", "var", "unvar", "effective", "metrics", "check",
];

const ARGUMENTS: &[&str] = &["device", "service", "both", "select", "regex", "all"];

struct ShellHelper;

impl Helper for ShellHelper {}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Validator for ShellHelper {
    fn validate(&self, _ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let word_start = line_to_cursor
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);

        let prefix = line_to_cursor[word_start..].to_lowercase();
        if prefix.is_empty() {
            return Ok((pos, vec![]));
        }

        // Command words first, arguments after
        let candidates = if word_start == 0 { COMMANDS } else { ARGUMENTS };
        let matches = candidates
            .iter()
            .filter(|word| word.starts_with(&prefix))
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();

        Ok((word_start, matches))
    }
}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let word_end = line.find(char::is_whitespace).unwrap_or(line.len());
        let (word, rest) = line.split_at(word_end);
        if COMMANDS.contains(&word.to_lowercase().as_str()) {
            Cow::Owned(format!("\x1b[1;34m{}\x1b[0m{}", word, rest))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Owned(format!("\x1b[1;32m{}\x1b[0m", prompt))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

/// Result of one shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

/// Drives one resolver from shell commands
pub struct Shell {
    resolver: CascadeResolver,
    transport: Arc<dyn Transport>,
    variables: StaticVariables,
    format: OutputFormat,
    no_headers: bool,
}

impl Shell {
    pub fn new(
        resolver: CascadeResolver,
        transport: Arc<dyn Transport>,
        format: OutputFormat,
        no_headers: bool,
    ) -> Self {
        Self {
            resolver,
            transport,
            variables: StaticVariables::new(),
            format,
            no_headers,
        }
    }

    pub fn resolver(&self) -> &CascadeResolver {
        &self.resolver
    }

    fn render(&self, result: QueryResult) -> String {
        result.format(&self.format, self.no_headers)
    }

    fn render_selections(&self, options: Option<&Vec<Selection>>) -> String {
        self.render(output::selections_result(
            options.map(Vec::as_slice).unwrap_or_default(),
        ))
    }

    /// Transport failures recorded while running the last command
    pub fn take_warnings(&mut self) -> Vec<String> {
        self.resolver
            .take_errors()
            .into_iter()
            .map(|(level, err)| format!("Failed to load {} options: {}", level, err))
            .collect()
    }

    pub async fn execute(&mut self, command: ShellCommand) -> Result<Reply> {
        debug!(?command, "Executing shell command");
        let text = match command {
            ShellCommand::Help => help_text(),
            ShellCommand::Quit => return Ok(Reply::Quit),
            ShellCommand::Clear => "\x1B[2J\x1B[1;1H".to_string(),
            ShellCommand::Mount => {
                self.resolver.mount().await;
                self.render(output::levels_result(&self.resolver))
            }
            ShellCommand::State => self.render(output::query_state_result(self.resolver.query())),
            ShellCommand::Json => serde_json::to_string_pretty(self.resolver.query())
                .context("Failed to serialize query")?,
            ShellCommand::Levels => self.render(output::levels_result(&self.resolver)),
            ShellCommand::ResourceType(resource_type) => {
                self.resolver.set_resource_type(resource_type).await;
                self.render_selections(self.resolver.options().groups.as_ref())
            }
            ShellCommand::Groups(search) => {
                if !self.resolver.resolver_options().autocomplete {
                    return Ok(Reply::Output(
                        "Group search needs autocomplete; the group matches everything".to_string(),
                    ));
                }
                match search {
                    Some(text) => self.resolver.search_group(&text).await,
                    None => self.resolver.reload_groups().await,
                }
                self.render_selections(self.resolver.options().groups.as_ref())
            }
            ShellCommand::Group(pick) => {
                let selection = match pick {
                    Pick::Clear => None,
                    Pick::Text(text) => Some(Selection::custom(text)),
                    Pick::Index(index) => Some(nth(
                        self.resolver.options().groups.as_deref(),
                        index,
                        "group",
                    )?),
                };
                if !self.resolver.set_group(selection).await {
                    return Ok(Reply::Output("Group unchanged".to_string()));
                }
                self.render_selections(self.resolver.options().resources.as_ref())
            }
            ShellCommand::Resources(search) => {
                match search {
                    Some(text) => self.resolver.search_resource(&text).await,
                    None => self.resolver.reload_resources().await,
                }
                self.render_selections(self.resolver.options().resources.as_ref())
            }
            ShellCommand::Resource(pick) => {
                let selection = match pick {
                    Pick::Clear => bail!("A resource must be picked or typed in"),
                    Pick::Text(text) => Selection::custom(text),
                    Pick::Index(index) => nth(
                        self.resolver.options().resources.as_deref(),
                        index,
                        "resource",
                    )?,
                };
                if !self.resolver.set_resource(selection).await {
                    return Ok(Reply::Output("Resource unchanged".to_string()));
                }
                self.render(output::data_sources_result(
                    self.resolver
                        .options()
                        .data_sources
                        .as_deref()
                        .unwrap_or_default(),
                ))
            }
            ShellCommand::DataSources => {
                if self.resolver.options().data_sources.is_none() {
                    self.resolver.reload_data_sources().await;
                }
                self.render(output::data_sources_result(
                    self.resolver
                        .options()
                        .data_sources
                        .as_deref()
                        .unwrap_or_default(),
                ))
            }
            ShellCommand::DataSource(index) => {
                let selection = nth(
                    self.resolver.options().data_sources.as_deref(),
                    index,
                    "data source",
                )?;
                self.resolver.set_data_source(selection).await;
                let instances = self.render_selections(self.resolver.options().instances.as_ref());
                let points = self.render(output::data_points_result(
                    self.resolver
                        .options()
                        .data_points
                        .as_deref()
                        .unwrap_or_default(),
                ));
                format!("{}\n\n{}", instances, points)
            }
            ShellCommand::Mode(mode) => {
                self.resolver.set_instance_mode(mode).await?;
                self.instance_summary()
            }
            ShellCommand::Instances(search) => {
                match search {
                    Some(text) => self.resolver.search_instances(&text).await,
                    None => self.resolver.reload_instances().await,
                }
                self.render_selections(self.resolver.options().instances.as_ref())
            }
            ShellCommand::Instance(indices) => {
                let options = self.resolver.options().instances.as_deref();
                let selection = indices
                    .iter()
                    .map(|index| nth(options, *index, "instance"))
                    .collect::<Result<Vec<_>>>()?;
                self.resolver.set_instances(selection)?;
                format!(
                    "{} instance(s) selected",
                    self.resolver.query().instance_selected.len()
                )
            }
            ShellCommand::Regex(pattern) => {
                self.resolver.set_instance_regex(&pattern).await;
                self.instance_summary()
            }
            ShellCommand::DataPoints => {
                if self.resolver.options().data_points.is_none() {
                    self.resolver.reload_data_points().await;
                }
                self.render(output::data_points_result(
                    self.resolver
                        .options()
                        .data_points
                        .as_deref()
                        .unwrap_or_default(),
                ))
            }
            ShellCommand::DataPoint(indices) => {
                let options = self.resolver.options().data_points.as_deref();
                let selection = if indices.is_empty() {
                    options.map(<[_]>::to_vec).unwrap_or_default()
                } else {
                    indices
                        .iter()
                        .map(|index| nth(options, *index, "data point"))
                        .collect::<Result<Vec<_>>>()?
                };
                let fired_before = self.resolver.triggered();
                self.resolver.set_data_points(selection);
                self.trigger_summary(fired_before)
            }
            ShellCommand::SetVar { name, value } => {
                self.variables.set(name.clone(), value.clone());
                format!("{} = {}", name, value)
            }
            ShellCommand::Vars => {
                if self.variables.is_empty() {
                    return Ok(Reply::Output("No variables set".to_string()));
                }
                self.render(output::variables_result(&self.variables))
            }
            ShellCommand::UnsetVar(name) => match self.variables.remove(&name) {
                Some(_) => format!("{} removed", name),
                None => format!("{} is not set", name),
            },
            ShellCommand::Effective => {
                let effective = self.resolver.interpolated_query(&self.variables);
                serde_json::to_string_pretty(effective.as_ref())
                    .context("Failed to serialize query")?
            }
            ShellCommand::Metrics { minutes } => {
                let to = chrono::Utc::now().timestamp();
                let from = to - i64::from(minutes) * 60;
                let request = self.resolver.metrics_request(from, to)?;
                request.request.to_string()
            }
            ShellCommand::Check => health_check(self.transport.as_ref())
                .await
                .map_err(|e| anyhow!(e.message))?
                .to_string(),
        };
        Ok(Reply::Output(text))
    }

    fn instance_summary(&self) -> String {
        let query = self.resolver.query();
        if !query.regex_valid {
            return format!("Invalid regex: {}", query.instance_regex);
        }
        match query.instance_mode {
            crate::cascade::InstanceMode::Select => {
                self.render_selections(self.resolver.options().instances.as_ref())
            }
            crate::cascade::InstanceMode::Regex => {
                self.render(output::selections_result(&query.instance_selected))
            }
        }
    }

    fn trigger_summary(&self, fired_before: usize) -> String {
        let query = self.resolver.query();
        if self.resolver.triggered() > fired_before {
            format!(
                "Metrics query triggered for {} data point(s) (edited at {})",
                query.data_point_selected.len(),
                query.last_query_edited_time_stamp.unwrap_or_default()
            )
        } else {
            "Data point selection is empty, query not triggered".to_string()
        }
    }
}

/// Option `index` (1-based) of a level's list
fn nth<T: Clone>(options: Option<&[T]>, index: usize, what: &str) -> Result<T> {
    let options = options.with_context(|| format!("No {} options loaded", what))?;
    index
        .checked_sub(1)
        .and_then(|i| options.get(i))
        .cloned()
        .with_context(|| {
            format!(
                "No {} option {} ({} available)",
                what,
                index,
                options.len()
            )
        })
}

fn help_text() -> String {
    let help_style = Style::new().cyan();
    let cmd_style = Style::new().yellow();
    let line = |cmd: &str, text: &str| format!("  {}  - {}\n", cmd_style.apply_to(cmd), text);

    let mut out = String::new();
    out.push_str(&format!("{}\n", help_style.apply_to("Selection:")));
    out.push_str(&line("mount", "Initial load (groups and resources)"));
    out.push_str(&line("type device|service|both", "Switch group family, clears everything"));
    out.push_str(&line("groups [text]", "Search groups without committing"));
    out.push_str(&line("group <n>|<text>|-", "Commit a group option, typed-in label, or clear"));
    out.push_str(&line("resources [text]", "Search resources without committing"));
    out.push_str(&line("resource <n>|<text>", "Commit a resource"));
    out.push_str(&line("datasources", "List data sources of the resource"));
    out.push_str(&line("datasource <n>", "Commit a data source"));
    out.push_str(&line("mode select|regex", "Instance selection mode"));
    out.push_str(&line("instances [text]", "Search instances (select mode)"));
    out.push_str(&line("instance <n>[,<n>...]", "Commit instances (select mode)"));
    out.push_str(&line("regex <pattern>", "Derive instances from a pattern (regex mode)"));
    out.push_str(&line("datapoints", "List data points"));
    out.push_str(&line("datapoint <n>[,<n>...]|all", "Commit data points and run the query"));
    out.push('\n');
    out.push_str(&format!("{}\n", help_style.apply_to("Inspection:")));
    out.push_str(&line("state", "Current selections"));
    out.push_str(&line("json", "Persisted query"));
    out.push_str(&line("levels", "Option counts and loading flags"));
    out.push_str(&line("var", "List host template variables"));
    out.push_str(&line("var <name> <value>", "Set a host template variable"));
    out.push_str(&line("unvar <name>", "Remove a host template variable"));
    out.push_str(&line("effective", "Query after host-variable interpolation"));
    out.push_str(&line("metrics [minutes]", "Raw-data request for the selection"));
    out.push_str(&line("check", "Test authentication"));
    out.push('\n');
    out.push_str(&format!("{}\n", help_style.apply_to("Shortcuts:")));
    out.push_str(&line("\\?", "help"));
    out.push_str(&line("\\q", "Quit"));
    out
}

fn print_welcome(company: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "{} {} - LogicMonitor resource selection",
        style("lmcascade").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "{}",
        style("Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>").dim()
    );
    println!(
        "{}",
        style(format!("Connected to {}. Type 'help' for commands, Ctrl+D to exit", company)).dim()
    );
    println!();
}

/// Run one command while a spinner follows the resolver's progress
async fn execute_with_progress(
    shell: &mut Shell,
    progress: &ProgressHandle,
    command: ShellCommand,
) -> Result<Reply> {
    let spinner = create_spinner("Working...");
    let mut progress_rx = progress.subscribe();
    progress.reset();

    let result = {
        let mut handle = Box::pin(shell.execute(command));
        loop {
            tokio::select! {
                biased;
                update = progress_rx.recv() => {
                    match update {
                        Ok(ProgressUpdate::LevelLoading { level, .. }) => {
                            spinner.set_message(format!("Loading {} options...", level));
                        }
                        Ok(ProgressUpdate::LevelLoaded { level, options, .. }) => {
                            spinner.set_message(format!("{}: {} options", level, options));
                        }
                        Ok(ProgressUpdate::CacheHit { .. }) => {
                            spinner.set_message("Using cached instance listing...");
                        }
                        _ => {}
                    }
                }
                result = &mut handle => {
                    break result;
                }
            }
        }
    };

    spinner.finish_and_clear();
    result
}

/// Execute commands in order; the first failure stops the script
pub async fn run_script(shell: &mut Shell, lines: &[String]) -> Result<Vec<String>> {
    let mut outputs = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let command = command::parse(line).with_context(|| format!("line {}: {}", idx + 1, line))?;
        let reply = shell
            .execute(command)
            .await
            .with_context(|| format!("line {}: {}", idx + 1, line))?;
        for warning in shell.take_warnings() {
            outputs.push(format!("Warning: {}", warning));
        }
        match reply {
            Reply::Output(text) => outputs.push(text),
            Reply::Quit => break,
        }
    }
    Ok(outputs)
}

pub async fn run_repl(mut shell: Shell, progress: ProgressHandle, company: &str) -> Result<()> {
    let config = rustyline::Config::builder()
        .auto_add_history(true)
        .max_history_size(1000)?
        .build();

    let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(ShellHelper));

    let history_path = config::base_dir()
        .map(|p| p.join("history"))
        .unwrap_or_else(|_| ".lmcascade_history".into());
    let _ = rl.load_history(&history_path);

    print_welcome(company);

    // Initial load, as a freshly opened query editor would do
    if let Err(e) = execute_with_progress(&mut shell, &progress, ShellCommand::Mount).await {
        println!("{} {}", style("Error:").red().bold(), style(e).red());
    }
    for warning in shell.take_warnings() {
        println!("{} {}", style("Warning:").yellow().bold(), warning);
    }

    loop {
        let prompt = format!("{}> ", style("lmcascade").green().bold());

        match rl.readline(&prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                let command = match command::parse(input) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{} {}", style("Parse error:").red().bold(), style(e).red());
                        continue;
                    }
                };

                let start = Instant::now();
                let reply = execute_with_progress(&mut shell, &progress, command).await;
                for warning in shell.take_warnings() {
                    println!("{} {}", style("Warning:").yellow().bold(), warning);
                }

                match reply {
                    Ok(Reply::Quit) => {
                        println!("{}", style("Goodbye!").dim());
                        break;
                    }
                    Ok(Reply::Output(text)) => {
                        println!("{}", text);
                        println!(
                            "{}",
                            style(format!("({:.2}s)", start.elapsed().as_secs_f64())).dim()
                        );
                    }
                    Err(e) => {
                        println!("{} {}", style("Error:").red().bold(), style(e).red());
                    }
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", style("^C").dim());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", style("Goodbye!").dim());
                break;
            }
            Err(err) => {
                println!("{} {:?}", style("Error:").red().bold(), err);
                break;
            }
        }
    }

    info!(
        triggered = shell.resolver().triggered(),
        "Interactive session finished"
    );
    let _ = rl.save_history(&history_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{InstanceMode, ResolverOptions};
    use crate::logicmonitor::client::mock::MockTransport;
    use crate::logicmonitor::endpoints::RequestKind;
    use serde_json::json;

    fn transport() -> Arc<MockTransport> {
        let transport = MockTransport::new();
        transport.respond(
            RequestKind::ServiceOrDeviceGroup,
            json!({"data": {"total": 1, "items": [{"id": 5, "fullPath": "Servers"}]}}),
        );
        transport.respond(
            RequestKind::AutoCompleteHost,
            json!({"items": ["1:web-01", "2:web-02"]}),
        );
        transport.respond(
            RequestKind::DataSource,
            json!({"data": {"total": 1, "items": [
                {"id": 88, "dataSourceDisplayName": "Interfaces", "dataSourceId": 311}
            ]}}),
        );
        transport.respond(
            RequestKind::AutoCompleteInstance,
            json!({"items": ["10:eth0"]}),
        );
        transport.respond(
            RequestKind::AllInstance,
            json!({"data": {"total": 3, "items": [
                {"id": 10, "name": "web-eth0"},
                {"id": 11, "name": "web-eth1"},
                {"id": 12, "name": "web-lo"}
            ]}}),
        );
        transport.respond(
            RequestKind::DataPoint,
            json!({"data": {"collectInterval": 60, "dataPoints": [
                {"id": 1, "name": "InOctets"}, {"id": 2, "name": "OutOctets"}
            ]}}),
        );
        transport.respond(RequestKind::HealthCheck, json!({"errmsg": "OK"}));
        Arc::new(transport)
    }

    fn shell(transport: &Arc<MockTransport>) -> Shell {
        let resolver = CascadeResolver::new(transport.clone(), ResolverOptions::default());
        Shell::new(resolver, transport.clone(), OutputFormat::Json, false)
    }

    fn script(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[tokio::test]
    async fn test_script_walks_the_cascade() {
        let transport = transport();
        let mut shell = shell(&transport);
        let outputs = run_script(
            &mut shell,
            &script(&[
                "mount",
                "group 1",
                "resource 1",
                "datasource 1",
                "mode regex",
                r"regex eth\d",
                "datapoint all",
            ]),
        )
        .await
        .unwrap();

        let query = shell.resolver().query();
        assert_eq!(query.group_selected, Some(Selection::picked("5", "Servers")));
        assert_eq!(query.host_selected, Some(Selection::picked("1", "web-01")));
        assert_eq!(query.instance_mode, InstanceMode::Regex);
        assert_eq!(query.instance_selected.len(), 2);
        assert_eq!(query.data_point_selected.len(), 2);
        assert_eq!(shell.resolver().triggered(), 1);
        assert!(outputs.last().unwrap().contains("Metrics query triggered"));
    }

    #[tokio::test]
    async fn test_script_stops_at_first_error() {
        let transport = transport();
        let mut shell = shell(&transport);
        let err = run_script(&mut shell, &script(&["mount", "resource 9", "state"]))
            .await
            .unwrap_err();
        let text = format!("{:#}", err);
        assert!(text.contains("line 2"));
        assert!(text.contains("No resource option 9"));
    }

    #[tokio::test]
    async fn test_script_reports_transport_warnings() {
        let transport = transport();
        transport.fail(RequestKind::AutoCompleteHost, "Network Error");
        let mut shell = shell(&transport);
        let outputs = run_script(&mut shell, &script(&["mount"])).await.unwrap();
        assert!(
            outputs
                .iter()
                .any(|o| o.contains("Failed to load resource options: Network Error"))
        );
    }

    #[tokio::test]
    async fn test_quit_ends_script() {
        let transport = transport();
        let mut shell = shell(&transport);
        let outputs = run_script(&mut shell, &script(&["quit", "mount"]))
            .await
            .unwrap();
        assert!(outputs.is_empty());
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn test_group_unchanged_reply() {
        let transport = transport();
        let mut shell = shell(&transport);
        let outputs = run_script(&mut shell, &script(&["mount", "group Linux", "group Linux"]))
            .await
            .unwrap();
        assert_eq!(outputs.last().unwrap(), "Group unchanged");
    }

    #[tokio::test]
    async fn test_effective_query_uses_variable() {
        let transport = transport();
        let mut shell = shell(&transport);
        run_script(&mut shell, &script(&["mount", "resource 1", "var host 9"]))
            .await
            .unwrap();
        let reply = shell.execute(ShellCommand::Effective).await.unwrap();
        let Reply::Output(text) = reply else {
            panic!("expected output");
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["isQueryInterpolated"], true);
        assert_eq!(value["hostSelected"]["value"], "9");
    }

    #[tokio::test]
    async fn test_vars_lists_what_was_set() {
        let transport = transport();
        let mut shell = shell(&transport);
        let outputs = run_script(&mut shell, &script(&["var", "var host 9", "var"]))
            .await
            .unwrap();
        assert_eq!(outputs[0], "No variables set");
        assert!(outputs[2].contains("\"host\""));
        assert!(outputs[2].contains("\"9\""));
    }

    #[tokio::test]
    async fn test_metrics_reports_missing_level() {
        let transport = transport();
        let mut shell = shell(&transport);
        shell.execute(ShellCommand::Mount).await.unwrap();
        let err = shell
            .execute(ShellCommand::Metrics { minutes: 5 })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing resource selection");
    }

    #[tokio::test]
    async fn test_check_command() {
        let transport = transport();
        let mut shell = shell(&transport);
        let reply = shell.execute(ShellCommand::Check).await.unwrap();
        assert_eq!(reply, Reply::Output("Authentication Success".to_string()));
    }

    #[tokio::test]
    async fn test_execute_with_progress_returns_reply() {
        let transport = transport();
        let progress = crate::progress::create_progress_handle();
        let resolver = CascadeResolver::new(transport.clone(), ResolverOptions::default())
            .with_progress(progress.clone());
        let mut shell = Shell::new(resolver, transport.clone(), OutputFormat::Table, false);
        let reply = execute_with_progress(&mut shell, &progress, ShellCommand::Mount)
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Output(text) if text.contains("resource")));
    }

    #[test]
    fn test_nth_bounds() {
        let options = vec![1, 2, 3];
        assert_eq!(nth(Some(&options[..]), 1, "x").unwrap(), 1);
        assert!(nth(Some(&options[..]), 4, "x").is_err());
        assert!(nth::<i32>(None, 1, "x").is_err());
    }

    #[test]
    fn test_completer_words() {
        let helper = ShellHelper;
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, matches) = helper.complete("data", 4, &ctx).unwrap();
        assert_eq!(start, 0);
        let words: Vec<_> = matches.iter().map(|p| p.replacement.as_str()).collect();
        assert!(words.contains(&"datasources"));
        assert!(words.contains(&"datapoint"));

        let (start, matches) = helper.complete("mode re", 7, &ctx).unwrap();
        assert_eq!(start, 5);
        assert_eq!(matches[0].replacement, "regex");
    }
}
