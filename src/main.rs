//! StepMatrix CLI Entry Point
//!
//! Loads a job definition and prints every step instance it expands to.
//! Nothing is executed.
//!
//! # Usage
//!
//! ```bash
//! # Print the plan as text
//! stepmatrix job.yaml
//!
//! # Print the plan as JSON for a job runner
//! stepmatrix job.yaml --json
//! ```

use std::env;
use std::process::ExitCode;

use log::{error, info};

use stepmatrix::job::{load_job, plan_job, Action, JobPlan};
use stepmatrix::{APP_NAME, VERSION};

/// Default job file used when none is specified.
const DEFAULT_JOB: &str = "job.yaml";

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    job_path: String,
    json: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            job_path: DEFAULT_JOB.to_string(),
            json: false,
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

/// Prints usage information.
fn print_usage() {
    println!("Usage: stepmatrix [OPTIONS] <JOB_FILE>");
    println!();
    println!("Arguments:");
    println!("  <JOB_FILE>   Path to job YAML file (default: {})", DEFAULT_JOB);
    println!();
    println!("Options:");
    println!("  --json       Print the plan as JSON");
    println!("  --verbose    Enable debug logging");
    println!("  --help       Show this help message");
    println!("  --version    Show version information");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_seen = false;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--json" => config.json = true,
            "--verbose" | "-v" => config.verbose = true,
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ if positional_seen => {
                return Err(format!("Unexpected argument: {}", arg));
            }
            _ => {
                config.job_path = arg.clone();
                positional_seen = true;
            }
        }
    }

    Ok(config)
}

/// Prints the plan in a human-readable form.
fn print_plan(plan: &JobPlan) {
    println!("Job '{}': {} instances, {} step runs", plan.job, plan.instance_count(), plan.len());

    for run in &plan.runs {
        println!();
        println!("[{} #{}] {}", run.step, run.index, run.instance);
        match &run.action {
            Action::Shell { command, env } => {
                for assignment in env {
                    println!("  {}", assignment);
                }
                println!("  $ {}", command);
            }
            Action::Query { query, args } => {
                println!("  {}", query);
                for (i, arg) in args.iter().enumerate() {
                    println!("  ${} = {}", i + 1, arg);
                }
            }
        }
    }
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    let job = load_job(&config.job_path).map_err(|e| {
        error!("Failed to load job: {}", e);
        e
    })?;

    let plan = plan_job(&job)?;
    info!("Job '{}' expands to {} step runs", plan.job, plan.len());

    if config.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
