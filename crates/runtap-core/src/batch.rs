use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use crate::analyze::{analyze, promote_missing};
use crate::interpret::check_line;
use crate::locate;
use crate::reader::LineReader;
use crate::report::{self, BatchReport, TestsetReport};
use crate::summary::{fail_summary, print_totals, Totals};
use crate::supervisor::{self, Spawned};
use crate::testset::{PlanStatus, Testset};
use crate::Harness;

pub struct BatchOptions {
    pub source: Option<PathBuf>,
    pub build: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

pub struct BatchSummary {
    pub ok: bool,
    pub totals: Totals,
}

/// Run a single testset: spawn the child, feed its output through the
/// interpreter until EOF or abort, drain the leftovers so the child never
/// blocks on a full pipe, reap, analyze, and convert missing tests to
/// failures. `name_width` is the column the verbose name is padded to.
pub fn run_testset(ts: &mut Testset, h: &mut Harness, name_width: usize) -> Result<bool> {
    // No pragma state leaks from one testset into the next.
    h.pragmas.reset_all(&mut h.ctx);

    match supervisor::spawn_test(&ts.path, h.ctx.capture_stderr)? {
        Spawned::Failed(status) => {
            // Nothing ran and nothing was read; the stream is empty.
            ts.status = Some(status);
            ts.aborted = true;
        }
        Spawned::Running { mut child, output } => {
            let mut reader = LineReader::new(output);
            while !ts.aborted {
                match reader.next_line(&h.ctx) {
                    Ok(Some(line)) => check_line(&line, ts, h),
                    // Read errors funnel into the analyzer via the reap.
                    Ok(None) | Err(_) => break,
                }
            }
            if ts.plan == PlanStatus::Init {
                ts.aborted = true;
            }
            if h.ctx.verbosity >= 1 {
                print!("{}", ts.file);
                for _ in ts.file.len()..name_width {
                    print!(".");
                }
            } else {
                h.progress.erase(ts);
            }
            while let Ok(Some(_)) = reader.next_line(&h.ctx) {}
            drop(reader);
            ts.status = Some(supervisor::reap(&mut child)?);
        }
    }

    if ts.all_skipped {
        ts.aborted = false;
    }
    let mut ok = analyze(ts);
    if promote_missing(ts) {
        ok = false;
    }
    Ok(ok)
}

/// Run every testset in order, accumulating aggregate counters and the
/// failure list, then print the consolidated summary. Success means no
/// failed tests and no aborted sets.
pub fn run_batch(tests: Vec<Testset>, opts: &BatchOptions, h: &mut Harness) -> Result<BatchSummary> {
    let longest = tests.iter().map(|t| t.file.len()).max().unwrap_or(0);
    // Two dots minimum, rounded up to the next tab stop.
    let mut width = longest + 2;
    if width % 8 != 0 {
        width += 8 - width % 8;
    }

    let start = Instant::now();
    let mut totals = Totals::default();
    let mut failures: Vec<Testset> = Vec::new();
    let mut testset_reports: Vec<TestsetReport> = Vec::new();

    for mut ts in tests {
        print!("{}", ts.file);
        for _ in ts.file.len()..width {
            print!(".");
        }
        if h.ctx.verbosity >= 1 {
            println!();
        }
        if h.progress.is_tty() {
            let _ = std::io::stdout().flush();
        }

        ts.path = locate::find_test(&ts.file, opts.source.as_deref(), opts.build.as_deref());
        let succeeded = run_testset(&mut ts, h, width)?;
        let _ = std::io::stdout().flush();

        totals.aborted += usize::from(ts.aborted);
        totals.total += ts.count + usize::from(ts.all_skipped);
        totals.passed += ts.passed;
        totals.skipped += ts.skipped + usize::from(ts.all_skipped);
        totals.failed += ts.failed;
        totals.files += 1;

        testset_reports.push(TestsetReport::from_testset(&ts));
        if !succeeded {
            failures.push(ts);
        }
    }
    totals.total -= totals.skipped;

    let wall_seconds = start.elapsed().as_secs_f64();
    let (usr, sys) = child_cpu_seconds();

    if !failures.is_empty() {
        fail_summary(&failures);
    }
    print_totals(&totals, wall_seconds, usr, sys);

    let ok = totals.failed == 0 && totals.aborted == 0;
    if let Some(path) = &opts.report {
        let batch_report = BatchReport::new(ok, &totals, wall_seconds, testset_reports);
        report::write_report(path, &batch_report)?;
    }
    Ok(BatchSummary { ok, totals })
}

/// CPU time spent by reaped children, (user, system) seconds.
fn child_cpu_seconds() -> (f64, f64) {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    if unsafe { libc::getrusage(libc::RUSAGE_CHILDREN, &mut usage) } != 0 {
        return (0.0, 0.0);
    }
    (tv_seconds(usage.ru_utime), tv_seconds(usage.ru_stime))
}

fn tv_seconds(tv: libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 * 1e-6
}
