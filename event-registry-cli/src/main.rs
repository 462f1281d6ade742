//! Event Registry CLI Application
//!
//! Command-line front end for the event-registry library. It adds:
//! - Declarative handlers loaded from config.toml
//! - JSON-lines event scripts and `--emit` arguments
//! - A run summary report
//! - A built-in demo of the emitter pattern

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use event_registry::FailurePolicy;
use std::path::PathBuf;
use std::process::ExitCode;

mod callbacks;
mod config;
mod demo;
mod events;
mod report;
mod state;

/// Event Registry - Dispatch events to declaratively configured handlers
#[derive(Parser, Debug)]
#[command(name = "event-registry-cli")]
#[command(about = "Dispatch events to handlers declared in a config file", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON-lines event script (overrides `script` in the config)
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Event to dispatch after the script, as NAME or NAME=JSON (can be repeated)
    #[arg(short, long, value_name = "EVENT")]
    emit: Vec<String>,

    /// Handler failure policy (overrides the config)
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Run the built-in demo
    #[arg(long)]
    demo: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    FailFast,
    Isolate,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FailFast => FailurePolicy::FailFast,
            PolicyArg::Isolate => FailurePolicy::Isolate,
        }
    }
}

fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Event Registry CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using registry library v{}", event_registry::VERSION);

    if args.demo {
        demo::run_demo()?;
        return Ok(ExitCode::SUCCESS);
    }

    if args.config.is_some() || args.script.is_some() || !args.emit.is_empty() {
        run_mode(&args)
    } else {
        // No arguments - show help
        println!("Event Registry - No input specified");
        println!("\nQuick Start:");
        println!("  event-registry-cli --demo");
        println!("  event-registry-cli --config config.toml --script events.jsonl");
        println!("  event-registry-cli --config config.toml --emit 'userClick={{\"target\":\"Button\"}}'");
        println!("\nUse --help for more options");
        Ok(ExitCode::SUCCESS)
    }
}

/// Result of dispatching every scripted and emitted event
struct RunOutcome {
    report: report::RunReport,
    handlers: Vec<state::HandlerStats>,
}

impl RunOutcome {
    /// Process exit status: 1 if a fail-fast dispatch aborted the run
    fn exit_status(&self) -> u8 {
        if self.report.aborted.is_some() {
            1
        } else {
            0
        }
    }
}

/// Run mode: dispatch all events, print the report
fn run_mode(args: &Args) -> Result<ExitCode> {
    let outcome = execute(args)?;

    if !args.quiet {
        print!("{}", outcome.report.view(&outcome.handlers));
    }

    Ok(ExitCode::from(outcome.exit_status()))
}

/// Build the registry from config and dispatch the script, then `--emit` events
fn execute(args: &Args) -> Result<RunOutcome> {
    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let mut registry_config = app_config.registry.clone();
    if let Some(policy) = args.policy {
        registry_config = registry_config.with_failure_policy(policy.into());
    }
    log::debug!("Registry configuration: {:?}", registry_config);

    let (registry, handlers) = callbacks::build_registry(&app_config, registry_config);
    log::info!(
        "Registered {} handler(s) for {} event(s)",
        registry.total_listener_count(),
        registry.event_names().len()
    );

    // --script wins over the config's script
    let mut scripted = Vec::new();
    if let Some(path) = args.script.as_ref().or(app_config.script.as_ref()) {
        scripted = events::load_script(path)
            .with_context(|| format!("Failed to load event script: {:?}", path))?;
    }
    for arg in &args.emit {
        scripted.push(events::parse_emit_arg(arg)?);
    }

    let mut run_report = report::RunReport::start();
    if let Err(err) = events::run_events(&registry, &scripted, &mut run_report) {
        log::error!("Run aborted: {}", report::error_chain(&err));
    }
    run_report.finish();
    log::debug!("Dispatch order: {:?}", run_report.sequence());

    Ok(RunOutcome {
        report: run_report,
        handlers,
    })
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    /// Config with its own script, plus a second script to pass via --script
    fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf) {
        let config_path = dir.join("config.toml");
        fs::write(
            &config_path,
            r#"
script = "config-events.jsonl"

[[handlers]]
event = "userClick"
action = "count"
name = "clicks"

[[handlers]]
event = "save"
action = "fail"
message = "cannot save {payload}"

[[handlers]]
event = "save"
action = "count"
name = "saved"

[[handlers]]
event = "done"
action = "count"
name = "done"
"#,
        )
        .unwrap();

        fs::write(dir.join("config-events.jsonl"), "{\"event\": \"fromConfig\"}\n").unwrap();

        let script_path = dir.join("override.jsonl");
        fs::write(
            &script_path,
            concat!(
                "{\"event\": \"userClick\", \"payload\": {\"target\": \"Button\"}}\n",
                "{\"event\": \"save\", \"payload\": \"notes.txt\"}\n",
                "{\"event\": \"userClick\"}\n",
            ),
        )
        .unwrap();

        (config_path, script_path)
    }

    fn parse_args(extra: &[&str]) -> Args {
        let mut argv = vec!["event-registry-cli"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn calls(outcome: &RunOutcome, label: &str) -> usize {
        outcome
            .handlers
            .iter()
            .find(|stats| stats.label == label)
            .map(|stats| stats.invocations())
            .unwrap()
    }

    #[test]
    fn test_fail_fast_run_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (config_path, script_path) = write_fixtures(dir.path());

        let args = parse_args(&[
            "--config",
            config_path.to_str().unwrap(),
            "--script",
            script_path.to_str().unwrap(),
            "--emit",
            "done",
            "--policy",
            "fail-fast",
        ]);
        let outcome = execute(&args).unwrap();

        assert_eq!(outcome.exit_status(), 1);
        assert_eq!(outcome.report.sequence(), ["userClick", "save"]);
        let (event, message) = outcome.report.aborted.clone().unwrap();
        assert_eq!(event, "save");
        assert!(message.ends_with(": cannot save notes.txt"));
        assert_eq!(calls(&outcome, "saved"), 0);
        assert_eq!(calls(&outcome, "done"), 0);
    }

    #[test]
    fn test_isolate_run_succeeds_with_script_then_emits() {
        let dir = tempfile::tempdir().unwrap();
        let (config_path, script_path) = write_fixtures(dir.path());

        let args = parse_args(&[
            "--config",
            config_path.to_str().unwrap(),
            "--script",
            script_path.to_str().unwrap(),
            "--emit",
            "done",
            "--emit",
            "userClick={\"target\":\"Link\"}",
            "--policy",
            "isolate",
        ]);
        let outcome = execute(&args).unwrap();

        assert_eq!(outcome.exit_status(), 0);
        assert!(outcome.report.aborted.is_none());
        // The --script file replaces the config's script, emits come last
        assert_eq!(
            outcome.report.sequence(),
            ["userClick", "save", "userClick", "done", "userClick"]
        );
        assert_eq!(calls(&outcome, "clicks"), 3);
        assert_eq!(calls(&outcome, "saved"), 1);
        assert_eq!(calls(&outcome, "done"), 1);
    }

    #[test]
    fn test_config_script_used_without_script_flag() {
        let dir = tempfile::tempdir().unwrap();
        let (config_path, _) = write_fixtures(dir.path());

        let args = parse_args(&["--config", config_path.to_str().unwrap(), "--emit", "done"]);
        let outcome = execute(&args).unwrap();

        assert_eq!(outcome.exit_status(), 0);
        assert_eq!(outcome.report.sequence(), ["fromConfig", "done"]);
        assert_eq!(calls(&outcome, "done"), 1);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "event-registry-cli",
            "--config",
            "config.toml",
            "--emit",
            "a",
            "--emit",
            "b=1",
            "--policy",
            "isolate",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("config.toml")));
        assert_eq!(args.emit, vec!["a", "b=1"]);
        assert!(matches!(args.policy, Some(PolicyArg::Isolate)));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_policy_arg_names() {
        let args = Args::try_parse_from(["event-registry-cli", "--policy", "fail-fast"]).unwrap();
        let policy: FailurePolicy = args.policy.unwrap().into();
        assert_eq!(policy, FailurePolicy::FailFast);
    }
}
