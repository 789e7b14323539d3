// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tooldef_cli::commands::{
    LoadedTool, SchemaKind, check_summary, exit_status, host_from_config, load_tool, schema_json,
};
use tooldef_cli::params::collect_supplied;
use tooldef_config::{ConfigWarning, HostConfig, load_config, validate_config};
use tooldef_host::ParameterFile;
use tooldef_manifest::lint_descriptor;
use tooldef_resolve::resolve;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tooldef", version, about = "Check, resolve, and run tool manifests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Host configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a manifest and print a summary.
    Check {
        /// Tool directory or manifest file.
        path: PathBuf,

        /// Print the descriptor as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Resolve parameters and print the JSON parameter document.
    Resolve {
        /// Tool directory or manifest file.
        path: PathBuf,

        #[command(flatten)]
        supply: SupplyArgs,

        /// Write the document here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build, resolve, and invoke a tool.
    Run {
        /// Tool directory or manifest file.
        path: PathBuf,

        #[command(flatten)]
        supply: SupplyArgs,

        /// Directory for the parameter file (overrides the config).
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Do not run the build hook.
        #[arg(long)]
        skip_build: bool,
    },

    /// Print a JSON schema.
    Schema {
        #[arg(long, value_enum, default_value_t = SchemaArg::Descriptor)]
        kind: SchemaArg,
    },
}

#[derive(clap::Args, Debug)]
struct SupplyArgs {
    /// Parameter value as KEY=VALUE. Can be repeated.
    ///
    /// Examples:
    /// --param parameter_2=input.nc
    /// --param parameter_range=0:10:1
    #[arg(long = "param")]
    params: Vec<String>,

    /// JSON object of parameter values; `--param` entries win.
    #[arg(long)]
    params_file: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
enum SchemaArg {
    Descriptor,
    Config,
}

impl From<SchemaArg> for SchemaKind {
    fn from(v: SchemaArg) -> Self {
        match v {
            SchemaArg::Descriptor => SchemaKind::Descriptor,
            SchemaArg::Config => SchemaKind::Config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("load host config")?;
    let warnings = validate_config(&config).context("validate host config")?;

    let level = if cli.debug {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    let filter = EnvFilter::try_new(format!(
        "tooldef={level},tooldef_cli={level},tooldef_manifest={level},tooldef_resolve={level},tooldef_host={level}"
    ))
    .context("build log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    for w in &warnings {
        match w {
            ConfigWarning::MissingOptionalField { .. } => debug!("config: {w}"),
            _ => warn!("config: {w}"),
        }
    }

    match cli.command {
        Commands::Check { path, json } => cmd_check(&path, json),
        Commands::Resolve { path, supply, out } => cmd_resolve(&path, &supply, out.as_deref()),
        Commands::Run {
            path,
            supply,
            work_dir,
            skip_build,
        } => cmd_run(&config, &path, &supply, work_dir, skip_build).await,
        Commands::Schema { kind } => {
            println!("{}", schema_json(kind.into())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_check(path: &Path, json: bool) -> Result<ExitCode> {
    let LoadedTool { descriptor, .. } =
        load_tool(path).with_context(|| format!("check '{}'", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        print!("{}", check_summary(&descriptor, &lint_descriptor(&descriptor)));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_resolve(path: &Path, supply: &SupplyArgs, out: Option<&Path>) -> Result<ExitCode> {
    let tool = load_tool(path).with_context(|| format!("load '{}'", path.display()))?;
    let supplied = collect_supplied(&supply.params, supply.params_file.as_deref())?;
    let set = resolve(&tool.descriptor, &supplied)
        .with_context(|| format!("resolve parameters for '{}'", tool.descriptor.name))?;
    let body = set.to_json_string_pretty()?;

    match out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create '{}'", parent.display()))?;
            }
            std::fs::write(out, format!("{body}\n"))
                .with_context(|| format!("write '{}'", out.display()))?;
            info!(path = %out.display(), "wrote parameter document");
        }
        None => println!("{body}"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_run(
    config: &HostConfig,
    path: &Path,
    supply: &SupplyArgs,
    work_dir: Option<PathBuf>,
    skip_build: bool,
) -> Result<ExitCode> {
    let tool = load_tool(path).with_context(|| format!("load '{}'", path.display()))?;
    let name = tool.descriptor.name.clone();
    let host = host_from_config(config)?;

    let supplied = collect_supplied(&supply.params, supply.params_file.as_deref())?;
    let set = resolve(&tool.descriptor, &supplied)
        .with_context(|| format!("resolve parameters for '{name}'"))?;

    if skip_build {
        info!(tool = %name, "skipping build");
    } else {
        host.build(&tool.descriptor, &tool.dir)
            .await
            .with_context(|| format!("build '{name}'"))?;
    }

    let work_dir = work_dir.unwrap_or_else(|| config.work_dir());
    let file = ParameterFile::write(&set, &work_dir, &name)
        .await
        .context("write parameter file")?;
    let outcome = host
        .invoke(&tool.descriptor, &tool.dir, &file)
        .await
        .with_context(|| format!("run '{name}'"))?;

    print!("{}", outcome.stdout);
    eprint!("{}", outcome.stderr);
    if !outcome.success() {
        warn!(tool = %name, code = ?outcome.exit_code, "tool exited unsuccessfully");
    }
    Ok(ExitCode::from(exit_status(outcome.exit_code)))
}
