//! extdep CLI - install externally hosted artifacts into a Maven repository
//!
//! Usage:
//!   extdep resolve                 Fetch, verify and stage every artifact
//!   extdep install                 Resolve, then install into the local repository
//!   extdep deploy                  Install, then publish to the distribution target
//!   extdep checksum <file>         Print the digests of a file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extdep::core::output;
use extdep::engine::{Goal, Orchestrator, Overrides, RunContext, RunReport};
use extdep::helpers::internal::hash;
use extdep::{ProjectConfig, Settings};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "extdep")]
#[command(about = "Fetch, verify and install external artifacts into a Maven repository")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project file declaring the artifacts
    #[arg(short, long, global = true, env = "EXTDEP_CONFIG", default_value = "extdep.toml")]
    config: PathBuf,

    /// Settings file (replaces XDG discovery)
    #[arg(short, long, global = true, env = "EXTDEP_SETTINGS")]
    settings: Option<PathBuf>,

    /// Re-fetch and re-install every artifact
    #[arg(short, long, global = true)]
    force: bool,

    /// Local repository root
    #[arg(long, global = true, env = "EXTDEP_LOCAL_REPOSITORY")]
    local_repository: Option<PathBuf>,

    /// Default staging directory
    #[arg(long, global = true)]
    staging_dir: Option<PathBuf>,

    /// Enable or disable the central lookup for every artifact
    #[arg(long, global = true)]
    central_lookup: Option<bool>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, verify and stage every artifact
    Resolve,

    /// Resolve, then install into the local repository
    Install,

    /// Install, then publish to the distribution target
    Deploy,

    /// Print SHA-1, MD5, SHA-256, SHA-512 and BLAKE3 of a file
    Checksum {
        /// File to hash
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    output::set_verbose(cli.verbose);

    if let Err(e) = run(cli) {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let goal = match cli.command {
        Commands::Checksum { file } => return print_checksums(&file),
        Commands::Resolve => Goal::Resolve,
        Commands::Install => Goal::Install,
        Commands::Deploy => Goal::Deploy,
    };

    let config = ProjectConfig::load(&cli.config)?;
    let mut descriptors = config.descriptors()?;
    let settings = Settings::load(cli.settings.as_deref());
    let overrides = Overrides {
        force: cli.force,
        local_repository: cli.local_repository,
        staging_directory: cli.staging_dir,
        central_lookup: cli.central_lookup,
    };
    let base_dir = project_dir(&cli.config)?;
    let ctx = RunContext::new(&config, settings, &overrides, &base_dir)?;
    output::debug(&format!(
        "staging {}, local repository {}",
        ctx.resolve_path(&ctx.staging_directory).display(),
        ctx.local_repository_path().display()
    ));

    let report = Orchestrator::new(&ctx)?.run(goal, &mut descriptors)?;
    print_summary(&report);
    Ok(())
}

/// Directory containing the project file; relative paths resolve against it.
fn project_dir(config: &Path) -> Result<PathBuf> {
    let dir = match config.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::canonicalize(&dir)
        .with_context(|| format!("Failed to resolve project directory: {}", dir.display()))
}

fn print_checksums(file: &Path) -> Result<()> {
    let hashes = hash::compute_all_hashes(file)
        .with_context(|| format!("Failed to hash {}", file.display()))?;
    println!("sha1:   {}", hashes.sha1);
    println!("md5:    {}", hashes.md5);
    println!("sha256: {}", hashes.sha256);
    println!("sha512: {}", hashes.sha512);
    println!("blake3: {}", hashes.blake3);
    Ok(())
}

fn print_summary(report: &RunReport) {
    if report.warnings.is_empty() {
        output::success(&report.summary());
    } else {
        output::info(&report.summary());
    }
}
