//! Environment-driven CLI configuration.

use clap::Parser;
use serial_test::serial;
use std::time::Duration;

use pdfstack::cli::{Cli, Command};
use pdfstack::config::{CompressionLevel, Config};

use crate::common::library;

const VARS: [&str; 4] = [
    "PDFSTACK_PORT",
    "PDFSTACK_LIBRARY",
    "PDFSTACK_COMPRESSION",
    "PDFSTACK_COMPILE_TIMEOUT",
];

fn clear_vars() {
    for var in VARS {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
#[serial]
fn test_serve_reads_environment() {
    let dir = library(&[]);
    clear_vars();
    // SAFETY: tests touching the environment are serialized.
    unsafe {
        std::env::set_var("PDFSTACK_PORT", "9123");
        std::env::set_var("PDFSTACK_LIBRARY", dir.path());
        std::env::set_var("PDFSTACK_COMPRESSION", "none");
        std::env::set_var("PDFSTACK_COMPILE_TIMEOUT", "9");
    }

    let cli = Cli::try_parse_from(["pdfstack", "serve"]).unwrap();
    clear_vars();

    let Command::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    let config = Config::try_from(&args).unwrap();
    assert_eq!(config.port, 9123);
    assert_eq!(config.library_dir, dir.path());
    assert_eq!(config.compression, CompressionLevel::None);
    assert_eq!(config.compile_timeout, Duration::from_secs(9));
}

#[test]
#[serial]
fn test_flags_override_environment() {
    clear_vars();
    // SAFETY: tests touching the environment are serialized.
    unsafe { std::env::set_var("PDFSTACK_PORT", "9123") };

    let cli = Cli::try_parse_from(["pdfstack", "serve", "--port", "7000"]).unwrap();
    clear_vars();

    let Command::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    assert_eq!(args.port, 7000);
}

#[test]
#[serial]
fn test_missing_library_rejected() {
    clear_vars();
    let dir = library(&[]);
    let missing = dir.path().join("missing");

    let cli = Cli::try_parse_from([
        "pdfstack",
        "serve",
        "--library",
        missing.to_str().unwrap(),
    ])
    .unwrap();
    let Command::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    let err = Config::try_from(&args).unwrap_err();
    assert_eq!(err.exit_code(), 1);
}
