//! DagPort CLI Entry Point
//!
//! Aggregates a translation manifest into a project and renders it, or
//! prints a per-file analysis instead.
//!
//! # Usage
//!
//! ```bash
//! # Render into ./output
//! dagport manifest.yaml
//!
//! # Render somewhere else with a custom layout
//! dagport manifest.yaml --output-dir build --config dagport.yaml
//!
//! # Print the analysis table as CSV
//! dagport manifest.yaml --analyze csv
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use log::{error, info};

use dagport::output::{AnalysisFormat, LogReporter, Renderer};
use dagport::project::load_manifest;
use dagport::{Config, APP_NAME, VERSION};

/// Default output directory when none is specified.
const DEFAULT_OUTPUT_DIR: &str = "output";

/// Command-line options parsed from arguments.
#[derive(Debug)]
struct Options {
    manifest_path: Option<PathBuf>,
    output_dir: PathBuf,
    config_path: Option<PathBuf>,
    analyze: Option<AnalysisFormat>,
    verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            manifest_path: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            config_path: None,
            analyze: None,
            verbose: false,
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

fn print_banner() {
    eprintln!();
    eprintln!("{} v{}", APP_NAME.bold(), VERSION);
    eprintln!("{}", "Workflow Project Aggregator".dimmed());
    eprintln!();
}

fn print_usage() {
    println!("Usage: dagport [OPTIONS] <MANIFEST>");
    println!();
    println!("Arguments:");
    println!("  <MANIFEST>             Path to the translation manifest (YAML)");
    println!();
    println!("Options:");
    println!("  --output-dir PATH      Render into PATH (default: {})", DEFAULT_OUTPUT_DIR);
    println!("  --config PATH          Load layout and merge settings from PATH");
    println!("  --analyze FORMAT       Print an analysis (md, json, csv) instead of rendering");
    println!("  --verbose              Enable debug logging");
    println!("  --help                 Show this help message");
    println!("  --version              Show version information");
    println!();
    println!("Examples:");
    println!("  dagport manifest.yaml");
    println!("  dagport manifest.yaml --output-dir build --config dagport.yaml");
    println!("  dagport manifest.yaml --analyze csv");
}

/// Parses command-line arguments into [`Options`].
fn parse_arguments(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => {
                options.verbose = true;
            }
            "--output-dir" | "-o" => {
                i += 1;
                let value = args.get(i).ok_or("--output-dir requires a path argument")?;
                options.output_dir = PathBuf::from(value);
            }
            "--config" | "-c" => {
                i += 1;
                let value = args.get(i).ok_or("--config requires a path argument")?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--analyze" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or("--analyze requires a format (md, json, csv)")?;
                options.analyze = Some(value.parse().map_err(|e| format!("{}", e))?);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if options.manifest_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                options.manifest_path = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let options = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;
    let Some(manifest_path) = options.manifest_path else {
        print_usage();
        return Err("no manifest given".into());
    };

    setup_logging(options.verbose);
    print_banner();

    let config = match &options.config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let manifest = load_manifest(&manifest_path).map_err(|e| {
        error!("Failed to load manifest: {}", e);
        e
    })?;
    let project = manifest.into_project(&config)?;
    info!("{}", project);

    if let Some(format) = options.analyze {
        println!("{}", project.analyze(format)?);
        return Ok(());
    }

    let summary = Renderer::new(config.render.clone())
        .with_reporter(Arc::new(LogReporter))
        .render(&project, &options.output_dir)?;

    eprintln!();
    eprintln!(
        "{} {} file(s) written to {}",
        "Done:".green().bold(),
        summary.file_count(),
        options.output_dir.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("dagport")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_defaults() {
        let options = parse_arguments(&args(&["manifest.yaml"])).unwrap();
        assert_eq!(options.manifest_path, Some(PathBuf::from("manifest.yaml")));
        assert_eq!(options.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert!(options.analyze.is_none());
        assert!(!options.verbose);
    }

    #[test]
    fn test_all_options() {
        let options = parse_arguments(&args(&[
            "m.yaml",
            "--output-dir",
            "build",
            "--config",
            "c.yaml",
            "--analyze",
            "json",
            "-v",
        ]))
        .unwrap();
        assert_eq!(options.output_dir, PathBuf::from("build"));
        assert_eq!(options.config_path, Some(PathBuf::from("c.yaml")));
        assert_eq!(options.analyze, Some(AnalysisFormat::Json));
        assert!(options.verbose);
    }

    #[test]
    fn test_errors() {
        assert!(parse_arguments(&args(&["--output-dir"])).is_err());
        assert!(parse_arguments(&args(&["m.yaml", "--analyze", "xml"])).is_err());
        assert!(parse_arguments(&args(&["--bogus"])).is_err());
        assert!(parse_arguments(&args(&["a.yaml", "b.yaml"])).is_err());
    }
}
