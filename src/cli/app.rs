//! Main CLI application

use crate::config::resolve_script_path;
use crate::runner::{run_script, DisabledDependencyPolicy, RunContext, Verbosity};
use anyhow::{bail, Context as _};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// Settings collected from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    /// Build script path given on the command line
    pub script: Option<PathBuf>,

    /// Environment variable holding the build script path
    pub env_var: Option<String>,

    /// Keep going after a failed task
    pub no_stop: bool,

    /// Execution log location
    pub log: Option<PathBuf>,

    /// Working directory for every task
    pub workdir: Option<PathBuf>,

    pub on_disabled_dependency: DisabledDependencyPolicy,

    /// Condition values from `--set KEY=VALUE`
    pub vars: HashMap<String, String>,

    pub verbosity: Verbosity,

    pub color: bool,
}

impl CliOptions {
    /// Build the run context these options describe
    pub fn run_context(&self) -> RunContext {
        let mut ctx = RunContext::new()
            .with_continue_on_failure(self.no_stop)
            .with_disabled_dependency_policy(self.on_disabled_dependency)
            .with_vars(self.vars.clone())
            .with_verbosity(self.verbosity);

        if let Some(log) = &self.log {
            ctx = ctx.with_log_path(log.clone());
        }

        ctx
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("taskrun")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Execute tasks defined in a YAML build script")
        .arg(
            Arg::new("script")
                .value_name("SCRIPT")
                .value_parser(value_parser!(PathBuf))
                .help("YAML file containing the build script definition"),
        )
        .arg(
            Arg::new("env")
                .short('e')
                .long("env")
                .value_name("VAR")
                .help("Environment variable containing the build script path"),
        )
        .arg(
            Arg::new("no-stop")
                .long("no-stop")
                .help("Continue execution even if a task fails")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Execution log file (default: taskrun.log next to the script)"),
        )
        .arg(
            Arg::new("workdir")
                .short('C')
                .long("workdir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Run every task in DIR instead of the script's directory"),
        )
        .arg(
            Arg::new("on-disabled-dependency")
                .long("on-disabled-dependency")
                .value_name("POLICY")
                .value_parser(["warn", "skip", "abort"])
                .default_value("warn")
                .help("What to do with tasks depending on a disabled task"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append)
                .help("Context value consulted by `when` conditions"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print warnings and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print shell completions and exit"),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Parse `KEY=VALUE` pairs
fn parse_vars<'a>(pairs: impl Iterator<Item = &'a String>) -> anyhow::Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid --set value '{}', expected KEY=VALUE", pair);
        };
        if key.is_empty() {
            bail!("invalid --set value '{}', key is empty", pair);
        }
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

/// Collect options from parsed matches
pub fn parse_options(matches: &ArgMatches) -> anyhow::Result<CliOptions> {
    let policy = matches
        .get_one::<String>("on-disabled-dependency")
        .map(|s| s.parse::<DisabledDependencyPolicy>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();

    let vars = match matches.get_many::<String>("set") {
        Some(pairs) => parse_vars(pairs)?,
        None => HashMap::new(),
    };

    Ok(CliOptions {
        script: matches.get_one::<PathBuf>("script").cloned(),
        env_var: matches.get_one::<String>("env").cloned(),
        no_stop: matches.get_flag("no-stop"),
        log: matches.get_one::<PathBuf>("log").cloned(),
        workdir: matches.get_one::<PathBuf>("workdir").cloned(),
        on_disabled_dependency: policy,
        vars,
        verbosity: get_verbosity(matches),
        color: !matches.get_flag("no-color"),
    })
}

/// Run the CLI with the process arguments; returns the exit code
pub fn run() -> anyhow::Result<i32> {
    run_from(std::env::args_os())
}

/// Run the CLI with the given arguments; returns the exit code
pub fn run_from<I, T>(args: I) -> anyhow::Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = build_command();
    let matches = match command.try_get_matches_from_mut(args) {
        Ok(matches) => matches,
        Err(e) => {
            // Help and version land here too, with exit code 0
            e.print()?;
            return Ok(e.exit_code());
        }
    };

    if let Some(shell) = matches.get_one::<Shell>("completions").copied() {
        clap_complete::generate(shell, &mut command, "taskrun", &mut io::stdout());
        return Ok(0);
    }

    let options = parse_options(&matches)?;
    if !options.color {
        colored::control::set_override(false);
    }

    // A missing .env is fine; it only supplies the script variable
    dotenvy::dotenv().ok();

    let path = resolve_script_path(options.script.clone(), options.env_var.as_deref())
        .context("could not locate the build script")?;

    let ctx = options.run_context();
    let report = run_script(&path, &ctx, options.workdir.as_deref())
        .with_context(|| format!("failed to run {}", path.display()))?;

    ctx.print_debug(&format!(
        "{} task(s) completed, exit code {}",
        report.completed.len(),
        report.exit_code
    ));

    Ok(report.exit_code)
}
