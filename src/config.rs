//! Configuration module for pdfstack.
//!
//! This module turns parsed CLI arguments (which may come from flags, the
//! environment or a `.env` file) into a validated configuration for the
//! server and the offline compiler. It also hosts the small value types the
//! configuration is made of:
//! - Output compression level
//! - Page range selection for cover specs
//! - Compile timeouts and library include patterns

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default directory for compiled output, kept apart from the library.
pub const DEFAULT_OUTPUT_DIR: &str = "out";

/// Default bound on a single compile.
pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(120);

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - preserves exact structure.
    None,
    /// Compress content streams.
    #[default]
    Standard,
    /// Compress and prune unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(Error::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Page range specification.
///
/// Supports individual pages and ranges:
/// - "1" - single page
/// - "1-5" - range of pages (inclusive)
/// - "1,3,5" - multiple individual pages
/// - "1-5,10-15" - combination of ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    ranges: Vec<PageRangeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageRangeItem {
    Single(u32),
    Range(u32, u32),
}

impl PageRange {
    /// Parse a page range string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string format is invalid or contains
    /// non-positive page numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfstack::config::PageRange;
    ///
    /// let range = PageRange::parse("1-5,10").unwrap();
    /// assert!(range.contains(3));
    /// assert!(range.contains(10));
    /// assert!(!range.contains(7));
    /// ```
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let mut ranges = Vec::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid page number: {start}"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid page number: {end}"))?;

                if start == 0 || end == 0 {
                    bail!("Page numbers must be positive (1-indexed)");
                }
                if start > end {
                    bail!(
                        "Invalid range {start}-{end}: start page must be less than or equal to end page"
                    );
                }

                ranges.push(PageRangeItem::Range(start, end));
            } else {
                let page: u32 = part
                    .parse()
                    .with_context(|| format!("Invalid page number: {part}"))?;

                if page == 0 {
                    bail!("Page numbers must be positive (1-indexed)");
                }

                ranges.push(PageRangeItem::Single(page));
            }
        }

        if ranges.is_empty() {
            bail!("Page range cannot be empty");
        }

        Ok(Self { ranges })
    }

    /// Check if a 1-indexed page number is included in this range.
    pub fn contains(&self, page: u32) -> bool {
        self.ranges.iter().any(|item| match item {
            PageRangeItem::Single(p) => *p == page,
            PageRangeItem::Range(start, end) => page >= *start && page <= *end,
        })
    }

    /// All selected page numbers up to `max_pages`, sorted.
    ///
    /// Pages past the end of the document are dropped rather than reported.
    pub fn to_pages(&self, max_pages: u32) -> Vec<u32> {
        (1..=max_pages).filter(|p| self.contains(*p)).collect()
    }
}

/// Settings shared by the server and the offline compiler.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub host: IpAddr,

    /// Port to bind the HTTP server to.
    pub port: u16,

    /// Directory relative document identifiers resolve against.
    pub library_dir: PathBuf,

    /// Directory compiled PDFs are written to.
    pub output_dir: PathBuf,

    /// Bound on a single merge engine run.
    pub compile_timeout: Duration,

    /// Compression applied to compiled output.
    pub compression: CompressionLevel,

    /// File name patterns that make a file part of the library.
    pub include: Vec<String>,

    /// Report to preload at startup.
    pub report: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            library_dir: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compile_timeout: DEFAULT_COMPILE_TIMEOUT,
            compression: CompressionLevel::Standard,
            include: vec!["*.pdf".to_string()],
            report: None,
        }
    }
}

impl Config {
    /// Validate the configuration for consistency.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The compile timeout is zero
    /// - No include pattern is given
    /// - The library directory is missing or not a directory
    pub fn validate(&self) -> Result<()> {
        if self.compile_timeout.is_zero() {
            return Err(Error::invalid_config(
                "Compile timeout must be greater than zero",
            ));
        }

        if self.include.is_empty() {
            return Err(Error::invalid_config(
                "At least one library include pattern is required",
            ));
        }

        if !self.library_dir.is_dir() {
            return Err(Error::invalid_config(format!(
                "Library directory does not exist: {}",
                self.library_dir.display()
            )));
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(Error::invalid_config(format!(
                "Output path is not a directory: {}",
                self.output_dir.display()
            )));
        }

        Ok(())
    }

    /// Socket address the server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
