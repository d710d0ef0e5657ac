//! marketctl - command-line entry point.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use marketctl::git::GitFetcher;
use marketctl::lockfile::{self, CheckMode};
use marketctl::validate::{validate_plugin, PluginOutcome, ValidationContext, ValidationReport};
use marketctl::vendor::{self, AddRequest};
use marketctl::{index, render, Workspace};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

/// Maintenance tooling for a plugin marketplace repository.
#[derive(Parser)]
#[command(name = "marketctl")]
#[command(about = "Validate, lock and vendor marketplace plugins")]
#[command(version)]
struct Cli {
    /// Repository root (default: git top level, else current directory)
    #[arg(long, global = true, env = "MARKETCTL_ROOT")]
    root: Option<PathBuf>,

    /// Config file applied on top of .market/config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate plugin structure, manifests and skills
    Validate {
        /// Plugin directory relative to the root (default: every plugin)
        plugin_path: Option<PathBuf>,
    },
    /// Regenerate marketplace.lock from the plugin tree
    GenerateLock,
    /// Check marketplace.lock against the plugin tree
    ValidateLock {
        /// Exit with an error when any issue is found
        #[arg(long)]
        strict: bool,
    },
    /// Regenerate the plugins list of the marketplace index
    GenerateIndex,
    /// Vendor a skill from an upstream repository
    AddExternal {
        /// Repository URL (https or ssh)
        repo_url: String,
        /// Path of the skill inside the repository
        path_in_repo: String,
        /// Directory name for the vendored skill (remembered for sync-external)
        #[arg(long)]
        name: Option<String>,
    },
    /// Refresh vendored skills from their upstream repositories
    SyncExternal {
        /// Report available updates without changing anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let root = Workspace::discover_root(cli.root).wrap_err("cannot determine repository root")?;
    let ws = Workspace::open(root, cli.config.as_deref()).wrap_err("failed to load config")?;

    match cli.command {
        Command::Validate { plugin_path } => cmd_validate(&ws, plugin_path),
        Command::GenerateLock => cmd_generate_lock(&ws),
        Command::ValidateLock { strict } => cmd_validate_lock(&ws, strict),
        Command::GenerateIndex => cmd_generate_index(&ws),
        Command::AddExternal {
            repo_url,
            path_in_repo,
            name,
        } => cmd_add_external(&ws, &repo_url, &path_in_repo, name.as_deref()),
        Command::SyncExternal { dry_run } => cmd_sync_external(&ws, dry_run),
    }
}

fn cmd_validate(ws: &Workspace, plugin_path: Option<PathBuf>) -> Result<ExitCode> {
    let targets = ws.validation_targets(plugin_path.as_deref());
    if targets.is_empty() {
        println!("No plugins found to validate.");
        return Ok(ExitCode::SUCCESS);
    }

    render::print_validation_start(targets.len());

    let profile = ws.config.validation_profile();
    let mut ctx = ValidationContext::new(&profile);
    let mut plugins = Vec::with_capacity(targets.len());
    for path in targets {
        let valid = validate_plugin(&path, &mut ctx);
        let sha = ws.external_sha(&path);
        render::print_plugin_outcome(&ws.root, &path, valid, sha.as_deref());
        plugins.push(PluginOutcome { path, valid });
    }

    let report = ValidationReport {
        plugins,
        issues: ctx.issues.into_vec(),
    };
    render::print_validation_summary(&ws.root, &report);

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_generate_lock(ws: &Workspace) -> Result<ExitCode> {
    let lock = lockfile::generate_lock(&ws.root, &ws.config.plugins_dir, Utc::now())
        .wrap_err("lockfile generation failed")?;

    if lock.skills.is_empty() {
        println!("No skills found");
        return Ok(ExitCode::SUCCESS);
    }

    lockfile::write_lock(&ws.config.lock_file, &lock).wrap_err("lockfile generation failed")?;
    render::print_lock_generated(&lock, &ws.config.lock_file, &ws.root);
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate_lock(ws: &Workspace, strict: bool) -> Result<ExitCode> {
    let mode = if strict {
        CheckMode::Strict
    } else {
        CheckMode::Warn
    };

    let lock = lockfile::load_lock(&ws.config.lock_file).wrap_err("lockfile validation failed")?;
    let report = lockfile::reconcile(&lock, &ws.root, &ws.config.plugins_dir)
        .wrap_err("lockfile validation failed")?;

    render::print_lock_report(&report, mode);
    Ok(if report.passes(mode) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_generate_index(ws: &Workspace) -> Result<ExitCode> {
    let build = index::generate_index(
        &ws.root,
        &ws.config.plugins_dir,
        &ws.config.marketplace_file,
    )
    .wrap_err("index generation failed")?;

    render::print_index(&build, &ws.config.marketplace_file, &ws.root);
    Ok(ExitCode::SUCCESS)
}

fn cmd_add_external(
    ws: &Workspace,
    repo_url: &str,
    path_in_repo: &str,
    name: Option<&str>,
) -> Result<ExitCode> {
    let request = AddRequest {
        url: repo_url,
        path_in_repo,
        name,
    };
    let outcome = vendor::add_external(&GitFetcher, &ws.config.external_dir, &request, Utc::now())
        .wrap_err("failed to add external skill")?;

    render::print_added(&outcome, &ws.root);
    Ok(ExitCode::SUCCESS)
}

fn cmd_sync_external(ws: &Workspace, dry_run: bool) -> Result<ExitCode> {
    let report = vendor::sync_external(&GitFetcher, &ws.config.external_dir, dry_run, Utc::now())
        .wrap_err("sync failed")?;

    render::print_sync(&report, &ws.root);
    Ok(ExitCode::SUCCESS)
}
