use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};
use clap::Parser;

use runtap_core::batch::BatchOptions;
use runtap_core::{list, locate, run_batch, Harness, LogSink, RunContext};

#[derive(Parser, Debug)]
#[command(name = "runtap")]
#[command(about = "Run a batch of TAP test programs and summarize the results.", long_about = None)]
struct Cli {
    /// Build directory to search for test programs.
    #[arg(short = 'b', long, value_name = "DIR")]
    build: Option<PathBuf>,

    /// Source directory to search for test programs.
    #[arg(short = 's', long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Take the list of tests to run from this file.
    #[arg(short = 'l', long, value_name = "FILE")]
    list: Option<PathBuf>,

    /// Run a single test and show its complete output.
    #[arg(short = 'o', long)]
    single: bool,

    /// Log all test output to this file; "stdout" and "stderr" bind the
    /// corresponding stream.
    #[arg(short = 'L', long = "log", value_name = "FILE")]
    log: Option<String>,

    /// Open the log file in append mode.
    #[arg(short = 'a', long)]
    append: bool,

    /// Show tests as they execute; repeat for more output.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Mix the children's stderr into the TAP stream.
    #[arg(short = 'e', long)]
    capture_stderr: bool,

    /// Enforce strict TAP unless a pragma turns it off.
    #[arg(short = 'p', long)]
    pedantic: bool,

    /// Write a JSON report of the batch to this file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Test names, resolved against the current, build and source
    /// directories.
    #[arg(value_name = "TEST")]
    tests: Vec<String>,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("runtap: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.list.is_none() && cli.tests.is_empty() {
        bail!("no tests specified (give test names or --list; try --help)");
    }
    if cli.list.is_some() && !cli.tests.is_empty() {
        bail!("--list cannot be combined with test names");
    }
    if cli.single && (cli.list.is_some() || cli.tests.len() != 1) {
        bail!("-o runs exactly one test");
    }

    // Children and the locator both see the source and build roots.
    if let Some(source) = &cli.source {
        std::env::set_var("SOURCE", source);
    }
    if let Some(build) = &cli.build {
        std::env::set_var("BUILD", build);
    }

    if cli.single {
        let path = locate::find_test(&cli.tests[0], cli.source.as_deref(), cli.build.as_deref());
        // Replaces the harness process; only returns on failure.
        let err = Command::new(&path).exec();
        return Err(err).with_context(|| format!("cannot exec {}", path.display()));
    }

    let mut harness = Harness::new(RunContext::new(
        cli.pedantic,
        cli.capture_stderr,
        cli.verbose,
    ));
    if let Some(name) = &cli.log {
        harness.log =
            LogSink::open(name, cli.append).with_context(|| format!("cannot open log file: {name}"))?;
    }

    let tests = match &cli.list {
        Some(list_path) => {
            let shortlist = list_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| list_path.display().to_string());
            println!();
            println!("Running all tests listed in {shortlist}.  If any tests fail, run the failing");
            println!("test program with runtap -o to see more details.");
            println!();
            list::read_test_list(list_path)?
        }
        None => list::build_test_list(&cli.tests),
    };

    let opts = BatchOptions {
        source: cli.source.clone(),
        build: cli.build.clone(),
        report: cli.report.clone(),
    };
    let summary = run_batch(tests, &opts, &mut harness)?;
    Ok(if summary.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
