//! gentest CLI - table-driven test scaffolds for Go functions

// Global invariants enforced:
// - stdout carries only the generated scaffold; logs and notices go to stderr
// - Nothing is written to the output sink unless generation succeeded

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use gentest_core::config;
use gentest_core::{GentestError, GoPackage, Locator, MatchMode, NameStyle};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gentest")]
#[command(about = "Generate table-driven test scaffolds for Go functions")]
#[command(version = env!("GENTEST_VERSION"))]
struct Cli {
    /// Enable debug logging (overridden by GENTEST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a test scaffold for one function or method
    #[command(group(ArgGroup::new("locator").required(true).args(["offset", "comment"])))]
    Generate {
        /// Go source file containing the target function
        file: PathBuf,

        /// Byte offset inside the target declaration
        #[arg(long)]
        offset: Option<usize>,

        /// Doc comment marker identifying the target declaration
        #[arg(long)]
        comment: Option<String>,

        /// Span the locator must fall into (overrides config file)
        #[arg(long = "match")]
        match_mode: Option<MatchArg>,

        /// Emit t.Parallel() and t.Cleanup markers
        #[arg(long)]
        parallel: bool,

        /// Join result prefixes in camel case (gotInt instead of gotint)
        #[arg(long)]
        camel_case: bool,

        /// Path to config file (default: auto-discover next to FILE)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the scaffold to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate or inspect a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without generating anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum MatchArg {
    Name,
    Body,
}

impl From<MatchArg> for MatchMode {
    fn from(arg: MatchArg) -> Self {
        match arg {
            MatchArg::Name => MatchMode::Name,
            MatchArg::Body => MatchMode::Body,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Generate {
            file,
            offset,
            comment,
            match_mode,
            parallel,
            camel_case,
            config: config_path,
            output,
        } => {
            let locator = match (offset, comment) {
                (Some(offset), _) => Locator::Offset(offset),
                (None, Some(marker)) => Locator::Comment(marker),
                (None, None) => anyhow::bail!("one of --offset or --comment is required"),
            };

            let scaffold = generate(&file, locator, config_path.as_deref(), |run| {
                // CLI flags override config file values
                if let Some(mode) = match_mode {
                    run.match_mode = mode.into();
                }
                if parallel {
                    run.parallel = true;
                }
                if camel_case {
                    run.naming.style = NameStyle::CamelCase;
                }
            })?;

            match output {
                Some(path) => {
                    std::fs::write(&path, scaffold.as_bytes())
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Scaffold written to: {}", path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout
                        .write_all(scaffold.as_bytes())
                        .and_then(|()| stdout.flush())
                        .context("failed to write scaffold to stdout")?;
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;

                println!("Configuration:");
                if let Some(ref p) = resolved.config_path {
                    println!("  Source: {}", p.display());
                } else {
                    println!("  Source: defaults (no config file found)");
                }
                println!();
                println!("Generation:");
                println!("  parallel: {}", resolved.parallel);
                println!("  match_mode: {}", match_mode_name(resolved.match_mode));
                println!();
                println!("Naming:");
                println!("  result_prefix: {:?}", resolved.naming.result_prefix);
                println!("  name_style: {}", name_style_name(resolved.naming.style));
                println!();
                println!("Package loading:");
                println!("  exclude: {}", resolved.exclude_patterns.join(", "));
            }
        },
    }

    Ok(())
}

/// Load the package around `file`, apply overrides and generate.
fn generate(
    file: &Path,
    locator: Locator,
    config_path: Option<&Path>,
    overrides: impl FnOnce(&mut gentest_core::RunConfig),
) -> anyhow::Result<String> {
    if !file.is_file() {
        anyhow::bail!("Path is not a file: {}", file.display());
    }

    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let resolved =
        config::load_and_resolve(&dir, config_path).context("failed to load configuration")?;
    if let Some(path) = &resolved.config_path {
        tracing::info!(config = %path.display(), "using config");
    }

    let mut run = resolved.run_config(locator);
    overrides(&mut run);

    let package = GoPackage::load(file, &resolved)
        .with_context(|| format!("failed to load Go package for {}", file.display()))?;
    tracing::debug!(
        package = package.name().unwrap_or("<unnamed>"),
        files = package.files().len(),
        "loaded package"
    );

    match gentest_core::generate(&package, &run) {
        Ok(scaffold) => Ok(scaffold),
        Err(GentestError::Render { message, buffer }) => {
            eprintln!("Unformatted output:\n{}", buffer);
            Err(anyhow::anyhow!(message).context("failed to render scaffold"))
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to generate scaffold for {}", file.display()))),
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("GENTEST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn match_mode_name(mode: MatchMode) -> &'static str {
    match mode {
        MatchMode::Name => "name",
        MatchMode::Body => "body",
    }
}

fn name_style_name(style: NameStyle) -> &'static str {
    match style {
        NameStyle::Verbatim => "verbatim",
        NameStyle::CamelCase => "camel_case",
    }
}
