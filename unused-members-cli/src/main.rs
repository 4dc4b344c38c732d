//! unused-members CLI - finds unused and should-be-private class members in
//! TypeScript projects.
//!
//! Features:
//! - `tsconfig.json` driven file discovery (extends, paths, baseUrl)
//! - Cross-file reference resolution through imports and re-exports
//! - Deterministic sharding for parallel CI jobs (`NUM_SHARDS`/`CURRENT_SHARD`)
//! - Optional write-back: removes unused members, narrows the rest to `private`

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;
use unused_members_core::{
    init_structured_logging, load_config, load_config_file, print_json, print_plain,
    PartialConfig, ScanConfig, Shard, UnusedMembers,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Finds unused and should-be-private class members in TypeScript projects"
)]
pub struct Cli {
    /// Path to the tsconfig.json of the project
    #[arg(long, value_name = "TSCONFIG")]
    project: Option<PathBuf>,

    /// Only analyze this directory or file (relative to the project root)
    #[arg(long)]
    path: Option<String>,

    /// Remove unused members and make internal-only members private
    #[arg(long)]
    fix: bool,

    /// Show what --fix would change without writing anything
    #[arg(long)]
    fix_dry_run: bool,

    /// Skip files whose path matches this regular expression
    #[arg(long, value_name = "REGEX")]
    ignore_file_regex: Option<String>,

    /// Do not report members that could be private
    #[arg(long)]
    ignore_could_be_private: bool,

    /// Do not analyze members that are already private
    #[arg(long)]
    skip_private: bool,

    /// Member names never reported
    #[arg(long, num_args = 1..)]
    ignore_member_names: Option<Vec<String>>,

    /// Members with any of these decorators are never reported
    #[arg(long, num_args = 1..)]
    ignore_decorator_names: Option<Vec<String>>,

    /// Members initialized by calling any of these functions are never reported
    #[arg(long, num_args = 1..)]
    ignore_initializer_names: Option<Vec<String>>,

    /// Configuration file (.toml or JSON) instead of searching for one
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Total number of shards
    #[arg(long, env = "NUM_SHARDS", default_value_t = 1)]
    shards: u32,

    /// 1-based shard handled by this process
    #[arg(long, env = "CURRENT_SHARD", default_value_t = 1)]
    shard: u32,

    /// Do not print per-file progress
    #[arg(long)]
    quiet: bool,
}

impl Cli {
    /// Settings given on the command line; unset flags leave room for the
    /// config file.
    fn partial_config(&self) -> PartialConfig {
        PartialConfig {
            project: self.project.clone(),
            path: self.path.clone(),
            fix: (self.fix || self.fix_dry_run).then_some(true),
            ignore_file_regex: self.ignore_file_regex.clone(),
            ignore_could_be_private: self.ignore_could_be_private.then_some(true),
            ignore_member_names: self.ignore_member_names.clone(),
            ignore_decorator_names: self.ignore_decorator_names.clone(),
            ignore_initializer_names: self.ignore_initializer_names.clone(),
            skip_private: self.skip_private.then_some(true),
        }
    }
}

/// 0 when fixing or clean, 1 when offenders are left in place.
fn exit_code(fixing: bool, offending: usize) -> i32 {
    if fixing || offending == 0 {
        0
    } else {
        1
    }
}

/// Status lines go to stdout, or stderr when stdout carries JSON.
fn status(json: bool, message: &str) {
    if json {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

fn load_file_config(cli: &Cli) -> Result<Option<PartialConfig>> {
    if let Some(path) = &cli.config {
        let config = load_config_file(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        return Ok(Some(config));
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let found = load_config(&cwd).context("Failed to load configuration")?;
    Ok(found.map(|(path, config)| {
        info!(config = %path.display(), "using configuration file");
        config
    }))
}

fn run(cli: Cli) -> Result<i32> {
    let shard = Shard::new(cli.shards, cli.shard).context("Invalid shard settings")?;
    let config = ScanConfig::merge(load_file_config(&cli)?, cli.partial_config());
    let dry_run = cli.fix_dry_run;
    let fixing = config.fix && !dry_run;

    if shard.is_partitioned() {
        status(cli.json, &format!("Shard {}", shard));
    }
    status(cli.json, "Initializing...");

    let builder = UnusedMembers::new(config.clone()).shard(shard);
    let project = builder.load()?;

    let (json, quiet) = (cli.json, cli.quiet);
    let result = builder.analyze_project(project, |progress| {
        if progress.index == 0 {
            status(json, &format!("Checking {} files...", progress.total));
        }
        if !quiet {
            eprint!(
                "\r\x1b[K[{}/{}] {}",
                progress.index + 1,
                progress.total,
                progress.relative_path
            );
            let _ = std::io::stderr().flush();
        }
    })?;
    let checked = result.files_checked();
    if checked == 0 {
        status(json, "Checking 0 files...");
    } else if !quiet {
        eprintln!();
    }

    let count = result.offending_count();
    status(cli.json, &format!("Offending members found: {}", count));
    if cli.json {
        print_json(&result.findings);
    } else {
        print_plain(&result.findings);
    }

    if config.fix && count > 0 {
        status(cli.json, &format!("Fixing {} members...", count));
        let fixed = builder.fix(&result, dry_run)?;
        for err in &fixed.errors {
            eprintln!("  - {}", err);
        }
    }

    status(cli.json, "Done");
    Ok(exit_code(fixing, count))
}

fn main() -> Result<()> {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] unused-members internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
        std::process::exit(2);
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();
    let code = run(cli)?;
    std::process::exit(code);
}
