//! cfront CLI
//!
//! Command-line interface for preparing and running C parses.

use anyhow::{Context, Result};
use cfront_core::Config;
use cfront_parser::backend::IncludeTarget;
use cfront_parser::{preamble, PathResolver, Parser as CParser, Target};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfront")]
#[command(author, version, about = "C parser front-end", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse source files into a translation unit
    Parse {
        /// Source files to parse
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: ConfigArgs,

        /// Inline source parsed after the files
        #[arg(long, value_name = "TEXT")]
        source: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the predefined macro text
    Preamble {
        /// Architecture identifier
        #[arg(short, long)]
        arch: Option<String>,

        /// File with custom macro definitions
        #[arg(short, long, value_name = "FILE")]
        defines: Option<PathBuf>,
    },

    /// Print the absolute paths target files resolve to
    Resolve {
        /// Target files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: ConfigArgs,
    },
}

/// Flags layered over the YAML configuration
#[derive(Args)]
struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Include search path (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    includes: Vec<PathBuf>,

    /// Architecture identifier
    #[arg(short, long)]
    arch: Option<String>,

    /// File with custom macro definitions
    #[arg(short, long, value_name = "FILE")]
    defines: Option<PathBuf>,

    /// Resolve includes not found locally against this URL prefix
    #[arg(long, value_name = "URL")]
    web_prefix: Option<String>,

    /// Directory relative paths are resolved against
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,
}

impl ConfigArgs {
    fn into_config(self, files: Vec<PathBuf>) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        config.target_paths.extend(files);
        config.include_paths.extend(self.includes);
        if let Some(arch) = self.arch {
            config.arch = arch;
        }
        if let Some(defines) = self.defines {
            config.custom_defines_path = Some(defines);
        }
        if let Some(prefix) = self.web_prefix {
            config.web_includes_enabled = true;
            config.web_include_prefix = prefix;
        }
        if let Some(dir) = self.work_dir {
            config.work_dir = Some(dir);
        }

        debug!("Effective config: {:?}", config);
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            files,
            options,
            source,
            format,
        } => {
            let mut config = options.into_config(files)?;
            if let Some(source) = source {
                config.source_body = source;
            }
            cmd_parse(config, &format)?;
        }
        Commands::Preamble { arch, defines } => {
            cmd_preamble(arch.as_deref().unwrap_or(""), defines.as_deref())?;
        }
        Commands::Resolve { files, options } => {
            cmd_resolve(options.into_config(files)?)?;
        }
    }

    Ok(())
}

fn cmd_parse(config: Config, format: &str) -> Result<()> {
    let parser = CParser::new(config)?;
    let unit = parser.parse()?;
    let summary = unit.summary();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "text" => {
            println!("Inputs:");
            for input in &summary.inputs {
                println!("  {}", input);
            }
            println!("Functions ({}):", summary.functions.len());
            for name in &summary.functions {
                println!("  {}()", name);
            }
            println!("Structs ({}):", summary.structs.len());
            for name in &summary.structs {
                println!("  struct {}", name);
            }
            println!("Macros: {}", summary.macros);
            println!("Includes ({}):", summary.includes.len());
            for include in &summary.includes {
                let (open, close) = if include.system { ('<', '>') } else { ('"', '"') };
                let target = match &include.target {
                    IncludeTarget::Local(path) => path.display().to_string(),
                    IncludeTarget::Web(url) => url.to_string(),
                    IncludeTarget::Unresolved => "(unresolved)".to_string(),
                };
                println!("  {}{}{} -> {}", open, include.header, close, target);
            }
        }
        other => anyhow::bail!("unknown format: {}", other),
    }

    Ok(())
}

fn cmd_preamble(arch: &str, defines: Option<&Path>) -> Result<()> {
    let target = Target::from_identifier(arch);
    print!("{}", preamble::build(&target, defines)?);
    Ok(())
}

fn cmd_resolve(config: Config) -> Result<()> {
    let resolver = PathResolver::from_config(&config)?;
    for path in resolver.resolve_targets(&config.target_paths)? {
        println!("{}", path.display());
    }
    Ok(())
}
