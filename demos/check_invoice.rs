//! Check a UBL invoice file against the ZATCA rounding rules.
//!
//! ```text
//! cargo run --example check_invoice -- invoice.xml [config.json] [--json]
//! ```
//!
//! Set `RUST_LOG=fatoora=debug` to see every rule outcome as it is evaluated.

use std::process::ExitCode;

use fatoora::core::*;
use fatoora::ubl;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut json = false;
    let mut paths = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            paths.push(arg);
        }
    }

    let Some(xml_path) = paths.first() else {
        eprintln!("usage: check_invoice <invoice.xml> [config.json] [--json]");
        return ExitCode::from(2);
    };

    match run(xml_path, paths.get(1).map(String::as_str), json) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(
    xml_path: &str,
    config_path: Option<&str>,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => CheckConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CheckConfig::default(),
    };

    let xml = std::fs::read_to_string(xml_path)?;
    let report = ubl::check_xml(&xml, &config)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }
    Ok(report.is_conforming())
}
