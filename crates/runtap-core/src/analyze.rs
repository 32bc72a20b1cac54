use std::os::unix::process::ExitStatusExt;

use crate::supervisor::{CHILDERR_DUP, CHILDERR_EXEC, CHILDERR_STDERR};
use crate::testset::{PlanStatus, TestStatus, Testset};

/// How the child ended, from the analyzer's point of view.
#[derive(Debug, Clone, Copy)]
pub enum Disposition {
    Clean,
    Exit(i32),
    Signal { signal: i32, core_dumped: bool },
}

/// Reconcile the final testset state with the child's exit disposition.
/// Prints the per-testset summary line (unless a terminal diagnostic was
/// already reported mid-stream) and returns true iff the set succeeded.
pub fn analyze(ts: &mut Testset) -> bool {
    if ts.reported {
        return false;
    }
    if ts.all_skipped {
        match &ts.reason {
            None => println!("skipped"),
            Some(reason) => println!("skipped ({reason})"),
        }
        return true;
    }
    if let Some(status) = ts.status {
        if let Some(code) = status.code() {
            if code != 0 {
                match code {
                    CHILDERR_DUP => println!("ABORTED (can't dup file descriptors)"),
                    CHILDERR_EXEC => println!("ABORTED (execution failed -- not found?)"),
                    CHILDERR_STDERR => println!("ABORTED (can't open /dev/null)"),
                    _ => summarize(ts, Disposition::Exit(code)),
                }
                return false;
            }
        } else if let Some(signal) = status.signal() {
            summarize(
                ts,
                Disposition::Signal {
                    signal,
                    core_dumped: status.core_dumped(),
                },
            );
            return false;
        }
    }
    if ts.plan != PlanStatus::First && ts.plan != PlanStatus::Final {
        println!("ABORTED (no valid test plan)");
        ts.aborted = true;
        return false;
    }
    summarize(ts, Disposition::Clean);
    ts.failed == 0
}

/// Promote every result still `Invalid` below the expected count to a
/// failure. Returns true when any test was missing.
pub fn promote_missing(ts: &mut Testset) -> bool {
    let mut any = false;
    for slot in ts.results.iter_mut().take(ts.count) {
        if *slot == TestStatus::Invalid {
            *slot = TestStatus::Fail;
            ts.failed += 1;
            any = true;
        }
    }
    any
}

/// Emit the one-line summary for a testset.
pub fn summarize(ts: &Testset, disp: Disposition) {
    let mut out = String::new();
    if ts.aborted {
        out.push_str("ABORTED");
        if ts.count > 0 {
            out.push_str(&format!(
                " (passed {}/{})",
                ts.passed,
                ts.count - ts.skipped
            ));
        }
    } else {
        let missing = format_ranges(&ts.results[..ts.count], TestStatus::Invalid, 0);
        let failed = format_ranges(&ts.results[..ts.count], TestStatus::Fail, 0);
        if !missing.is_empty() {
            out.push_str("MISSED ");
            out.push_str(&missing);
        }
        if !failed.is_empty() {
            if !missing.is_empty() {
                out.push_str("; ");
            }
            out.push_str("FAILED ");
            out.push_str(&failed);
        }
        if missing.is_empty() && failed.is_empty() {
            out.push_str(match disp {
                Disposition::Clean => "ok",
                _ => "dubious",
            });
            if ts.skipped == 1 {
                out.push_str(&format!(" (skipped {} test)", ts.skipped));
            } else if ts.skipped > 1 {
                out.push_str(&format!(" (skipped {} tests)", ts.skipped));
            }
        }
    }
    match disp {
        Disposition::Clean => {}
        Disposition::Exit(code) => out.push_str(&format!(" (exit status {code})")),
        Disposition::Signal {
            signal,
            core_dumped,
        } => {
            if core_dumped {
                out.push_str(&format!(" (killed by signal {signal}, core dumped)"));
            } else {
                out.push_str(&format!(" (killed by signal {signal})"));
            }
        }
    }
    println!("{out}");
}

/// Render the positions holding `which` as a comma-separated list of
/// ranges (`3, 5-7`). `limit` > 0 caps the output width; an overflowing
/// tail collapses to `...`.
pub fn format_ranges(results: &[TestStatus], which: TestStatus, limit: usize) -> String {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (i, &r) in results.iter().enumerate() {
        let n = i + 1;
        if r != which {
            continue;
        }
        match ranges.last_mut() {
            Some((_, last)) if *last + 1 == n => *last = n,
            _ => ranges.push((n, n)),
        }
    }

    let mut out = String::new();
    for (first, last) in ranges {
        let piece = if last > first {
            format!("{first}-{last}")
        } else {
            format!("{first}")
        };
        let sep = if out.is_empty() { "" } else { ", " };
        if limit > 0 && out.len() + sep.len() + piece.len() > limit {
            out.push_str(sep);
            out.push_str("...");
            break;
        }
        out.push_str(sep);
        out.push_str(&piece);
    }
    out
}
