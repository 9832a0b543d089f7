//! CLI argument parsing for pdfstack.
//!
//! Every flag can also come from a `PDFSTACK_*` environment variable, and
//! `main` loads a `.env` file before parsing, so a deployment can be
//! configured without touching the command line.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use pdfstack::cli::{Cli, Command};
//!
//! let cli = Cli::parse();
//! if let Command::Serve(args) = &cli.command {
//!     println!("Serving on port {}", args.port);
//! }
//! ```

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{CompressionLevel, Config, DEFAULT_OUTPUT_DIR, DEFAULT_PORT};
use crate::error::{Error, Result};

/// Manage an ordered stack of PDF documents and compile it into one file.
#[derive(Parser, Debug)]
#[command(name = "pdfstack")]
#[command(version)]
#[command(about = "Manage an ordered stack of PDFs and compile it into one file", long_about = None)]
pub struct Cli {
    /// Log filter, e.g. "info" or "pdfstack=debug,tower_http=info"
    ///
    /// Overrides RUST_LOG when given.
    #[arg(long, global = true, value_name = "FILTER", env = "PDFSTACK_LOG")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the collection over HTTP
    Serve(ServeArgs),

    /// Compile a saved report without starting a server
    Compile(CompileArgs),
}

/// Settings shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct LibraryArgs {
    /// Directory document names resolve against
    #[arg(long, value_name = "DIR", default_value = ".", env = "PDFSTACK_LIBRARY")]
    pub library: PathBuf,

    /// Directory compiled PDFs are written to
    ///
    /// Never listed as part of the library, even when it lies inside it.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR, env = "PDFSTACK_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Seconds a single compile may take before it is abandoned
    #[arg(long, value_name = "SECS", default_value_t = 120, env = "PDFSTACK_COMPILE_TIMEOUT")]
    pub compile_timeout: u64,

    /// Compression level for compiled output
    ///
    /// - none: No compression
    /// - standard: Compress content streams (default)
    /// - maximum: Also prune unreachable objects
    #[arg(long, value_name = "LEVEL", default_value = "standard", env = "PDFSTACK_COMPRESSION")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Glob a file must match to be listed as available (repeatable)
    #[arg(
        long = "include",
        value_name = "GLOB",
        default_value = "*.pdf",
        env = "PDFSTACK_INCLUDE",
        value_delimiter = ','
    )]
    pub include: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "PDFSTACK_HOST")]
    pub host: IpAddr,

    /// Port to bind
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PDFSTACK_PORT")]
    pub port: u16,

    /// Report to load into the session at startup
    #[arg(long, value_name = "FILE", env = "PDFSTACK_REPORT")]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub library: LibraryArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Report listing the documents and cover options
    #[arg(long, value_name = "FILE")]
    pub report: PathBuf,

    /// Output file name, without directory; generated when omitted
    #[arg(long, value_name = "NAME")]
    pub output_name: Option<String>,

    #[command(flatten)]
    pub library: LibraryArgs,
}

impl LibraryArgs {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if self.compile_timeout == 0 {
            return Err(Error::invalid_config(
                "Compile timeout must be at least one second",
            ));
        }

        config.library_dir = self.library.clone();
        config.output_dir = self.output_dir.clone();
        config.compile_timeout = Duration::from_secs(self.compile_timeout);
        config.compression = CompressionLevel::from_str(&self.compression)?;
        config.include = self
            .include
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Ok(())
    }
}

impl TryFrom<&ServeArgs> for Config {
    type Error = Error;

    fn try_from(args: &ServeArgs) -> Result<Self> {
        let mut config = Config {
            host: args.host,
            port: args.port,
            report: args.report.clone(),
            ..Config::default()
        };
        args.library.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&CompileArgs> for Config {
    type Error = Error;

    fn try_from(args: &CompileArgs) -> Result<Self> {
        let mut config = Config {
            report: Some(args.report.clone()),
            ..Config::default()
        };
        args.library.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}
