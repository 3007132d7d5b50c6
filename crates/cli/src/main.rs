use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use std::path::PathBuf;
use std::time::Instant;

use osvvm_model::ProjectRef;
use osvvm_tcl::ProFileProcessor;
use tracing_subscriber::EnvFilter;

/// osvvm-pro - parse OSVVM project description scripts
#[derive(Parser)]
#[command(name = "osvvm-pro")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an OSVVM project description
    Project {
        /// Regression file (.pro) to process
        #[arg(long, value_name = "PRO FILE")]
        regression: Option<PathBuf>,

        /// Render the parsed project to <FORMAT>
        #[arg(long, value_name = "FORMAT")]
        render: Option<RenderFormat>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RenderFormat {
    /// Indented text walk of every build
    All,
    /// JSON dump of the project tree
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .init();

    match cli.command {
        Commands::Project { regression, render } => cmd_project(regression, render),
    }
}

fn cmd_project(regression: Option<PathBuf>, render: Option<RenderFormat>) -> Result<()> {
    let term = Term::stderr();

    let Some(regression) = regression else {
        term.write_line(&format!(
            "{} option '--regression=<PRO file>' is missing",
            style("error:").red().bold()
        ))?;
        std::process::exit(3);
    };

    let mut processor = match ProFileProcessor::new() {
        Ok(processor) => processor,
        Err(e) => {
            term.write_line(&format!(
                "{} failed to initialize the Tcl environment: {}",
                style("error:").red().bold(),
                e
            ))?;
            std::process::exit(1);
        }
    };

    term.write_line(&format!(
        "{} Reading regression file {}",
        style("::").cyan().bold(),
        regression.display()
    ))?;

    let started = Instant::now();
    let project = match processor.load_regression_file(&regression) {
        Ok(project) => project,
        Err(e) => {
            term.write_line(&format!(
                "{} failed to process {}: {}",
                style("error:").red().bold(),
                regression.display(),
                e
            ))?;
            std::process::exit(1);
        }
    };
    let duration = started.elapsed();
    tracing::debug!(?duration, "regression file parsed");

    term.write_line(&format!("  Parsing duration: {:.3} s", duration.as_secs_f64()))?;
    term.write_line(&format!(
        "  Builds:           {}",
        project.borrow().builds.len()
    ))?;
    term.write_line(&format!(
        "  Processed files:  {}",
        processor.context().included_files().len()
    ))?;

    if let Some(build) = processor.context().build() {
        term.write_line(&format!(
            "{} script finished with build '{}' still open",
            style("warning:").yellow().bold(),
            build.borrow().name
        ))?;
    }

    match render {
        Some(RenderFormat::All) => render_all(&project),
        Some(RenderFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&*project.borrow())?);
        }
        None => {}
    }

    Ok(())
}

fn render_all(project: &ProjectRef) {
    for build in project.borrow().builds.values() {
        let build = build.borrow();
        println!("Build: {}", build.name);

        for (name, library) in &build.libraries {
            let library = library.borrow();
            println!("  Library: {} ({})", name, library.files.len());
            for file in &library.files {
                println!("    {}", file.borrow().path.display());
            }
        }

        println!("{}", "-".repeat(60));
        for (name, testsuite) in &build.testsuites {
            let testsuite = testsuite.borrow();
            println!("  Testsuite: {} ({})", name, testsuite.testcases.len());
            for testcase in testsuite.testcases.values() {
                println!("    {}", testcase.borrow().name);
            }
        }

        println!("{}", "=".repeat(60));
    }
}
