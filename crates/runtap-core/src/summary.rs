use crate::analyze::format_ranges;
use crate::testset::{TestStatus, Testset};

/// Aggregate counters accumulated by the batch driver.
#[derive(Debug, Default, Clone)]
pub struct Totals {
    pub files: usize,
    pub total: usize,
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub aborted: usize,
}

const FAIL_HEADER: &str = "\
Failed Set                 Fail/Total (%) Skip Stat  Failing Tests
-------------------------- -------------- ---- ----  ------------------------";

/// Column budget for the failing-test ranges in the table.
const FAIL_RANGE_COLUMNS: usize = 19;

/// Print the table of failed testsets.
pub fn fail_summary(fails: &[Testset]) {
    println!();
    println!("{FAIL_HEADER}");
    for ts in fails {
        let total = ts.count - ts.skipped;
        let pct = if total > 0 {
            ts.failed as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        print!(
            "{:<26.26} {:>4}/{:<4} {:>3.0}% {:>4} ",
            ts.file, ts.failed, total, pct, ts.skipped
        );
        match ts.status.and_then(|s| s.code()) {
            Some(code) => print!("{code:>4}  "),
            None => print!("  --  "),
        }
        if ts.aborted {
            println!("aborted");
            continue;
        }
        println!(
            "{}",
            format_ranges(&ts.results[..ts.count], TestStatus::Fail, FAIL_RANGE_COLUMNS)
        );
    }
}

/// Print the final aggregate summary.
pub fn print_totals(t: &Totals, wall_seconds: f64, usr: f64, sys: f64) {
    println!();
    let mut line = String::new();
    if t.aborted != 0 {
        if t.aborted == 1 {
            line.push_str(&format!("Aborted {} test set", t.aborted));
        } else {
            line.push_str(&format!("Aborted {} test sets", t.aborted));
        }
        line.push_str(&format!(", passed {}/{} tests", t.passed, t.total));
    } else if t.failed == 0 {
        line.push_str("All tests successful");
    } else {
        let okay = if t.total > 0 {
            (t.total - t.failed) as f64 * 100.0 / t.total as f64
        } else {
            0.0
        };
        line.push_str(&format!(
            "Failed {}/{} tests, {:.2}% okay",
            t.failed, t.total, okay
        ));
    }
    if t.skipped == 1 {
        line.push_str(&format!(", {} test skipped", t.skipped));
    } else if t.skipped > 1 {
        line.push_str(&format!(", {} tests skipped", t.skipped));
    }
    println!("{line}.");
    println!(
        "Files={},  Tests={},  {:.2} seconds ({:.2} usr + {:.2} sys = {:.2} CPU)",
        t.files,
        t.total,
        wall_seconds,
        usr,
        sys,
        usr + sys
    );
}
