use std::os::unix::process::ExitStatusExt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::summary::Totals;
use crate::testset::Testset;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Machine-readable record of a whole batch, written when `--report` is
/// given. Unlike the log sink, a report write failure is fatal: the
/// caller asked for the file explicitly.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub schema_version: u32,
    pub ok: bool,
    pub files: usize,
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub aborted: usize,
    pub wall_seconds: f64,
    pub testsets: Vec<TestsetReport>,
}

#[derive(Debug, Serialize)]
pub struct TestsetReport {
    pub file: String,
    pub path: String,
    pub count: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub aborted: bool,
    pub all_skipped: bool,
    pub skip_reason: Option<String>,
    pub exit_status: Option<i32>,
    pub signal: Option<i32>,
}

impl TestsetReport {
    pub fn from_testset(ts: &Testset) -> Self {
        TestsetReport {
            file: ts.file.clone(),
            path: ts.path.display().to_string(),
            count: ts.count,
            passed: ts.passed,
            failed: ts.failed,
            skipped: ts.skipped,
            aborted: ts.aborted,
            all_skipped: ts.all_skipped,
            skip_reason: ts.reason.clone(),
            exit_status: ts.status.and_then(|s| s.code()),
            signal: ts.status.and_then(|s| s.signal()),
        }
    }
}

impl BatchReport {
    pub fn new(ok: bool, totals: &Totals, wall_seconds: f64, testsets: Vec<TestsetReport>) -> Self {
        BatchReport {
            schema_version: REPORT_SCHEMA_VERSION,
            ok,
            files: totals.files,
            tests: totals.total,
            passed: totals.passed,
            failed: totals.failed,
            skipped: totals.skipped,
            aborted: totals.aborted,
            wall_seconds,
            testsets,
        }
    }
}

pub fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let mut json = serde_json::to_string_pretty(report).context("serialize batch report")?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("write report: {}", path.display()))
}
