use std::path::PathBuf;
use std::process::ExitStatus;

/// Outcome recorded for one test number. `Invalid` marks a slot no result
/// line has touched yet; a terminal `Invalid` is a missing test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Invalid,
}

/// Where the plan line stands relative to the results seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// Nothing seen yet.
    Init,
    /// Plan seen before any results.
    First,
    /// At least one result seen, no plan yet.
    Pending,
    /// Plan seen after some results.
    Final,
}

/// Initial capacity of the results table when a stream starts reporting
/// results before its plan.
const INITIAL_RESULTS: usize = 32;

/// Complete parser state for one test executable. Constructed empty by the
/// batch driver, mutated by the interpreter while the child runs, consumed
/// by the analyzer after the child is reaped.
#[derive(Debug)]
pub struct Testset {
    /// Caller-supplied logical name.
    pub file: String,
    /// Resolved executable path.
    pub path: PathBuf,
    pub plan: PlanStatus,
    /// Expected number of tests; grows dynamically under a pending plan.
    pub count: usize,
    /// Last test number observed.
    pub current: usize,
    /// Width of the progress cursor currently on screen.
    pub length: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Result table indexed by test number - 1; length is the allocation.
    pub results: Vec<TestStatus>,
    pub aborted: bool,
    /// A terminal diagnostic was already printed; the analyzer stays quiet.
    pub reported: bool,
    pub all_skipped: bool,
    /// Reason for a whole-set skip.
    pub reason: Option<String>,
    /// 0 until the first line is inspected; defaulted to 12 when the stream
    /// has no `TAP version` header.
    pub tap_version: u32,
    /// Raw child wait status, filled by the supervisor.
    pub status: Option<ExitStatus>,
}

impl Testset {
    pub fn new(file: impl Into<String>) -> Self {
        let file = file.into();
        Testset {
            path: PathBuf::from(&file),
            file,
            plan: PlanStatus::Init,
            count: 0,
            current: 0,
            length: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            results: Vec::new(),
            aborted: false,
            reported: false,
            all_skipped: false,
            reason: None,
            tap_version: 0,
            status: None,
        }
    }

    /// Allocate the results table for a plan of exactly `n` tests.
    pub fn allocate_plan(&mut self, n: usize) {
        debug_assert_eq!(self.plan, PlanStatus::Init);
        self.count = n;
        self.results = vec![TestStatus::Invalid; n];
    }

    /// Make sure slot `n - 1` exists, doubling the allocation (starting at
    /// 32) when it does not. Used on the lazy-plan path.
    pub fn grow_for(&mut self, n: usize) {
        if n > self.count {
            self.count = n;
        }
        if n <= self.results.len() {
            return;
        }
        let mut cap = if self.results.is_empty() {
            INITIAL_RESULTS
        } else {
            self.results.len() * 2
        };
        if cap < n {
            cap = n;
        }
        self.results.resize(cap, TestStatus::Invalid);
    }

    /// Grow the table to exactly `n` slots for a trailing plan.
    pub fn grow_to_plan(&mut self, n: usize) {
        self.count = n;
        if n > self.results.len() {
            self.results.resize(n, TestStatus::Invalid);
        }
    }

    /// Commit an accepted result line: update the slot, the matching
    /// counter, and the current test number.
    pub fn record(&mut self, number: usize, status: TestStatus) {
        match status {
            TestStatus::Pass => self.passed += 1,
            TestStatus::Fail => self.failed += 1,
            TestStatus::Skip => self.skipped += 1,
            TestStatus::Invalid => {}
        }
        self.current = number;
        self.results[number - 1] = status;
    }

    /// Mark the whole set skipped (`1..0 # skip`), wiping any counters.
    pub fn skip_all(&mut self, reason: Option<String>) {
        self.reason = reason;
        self.all_skipped = true;
        self.aborted = true;
        self.count = 0;
        self.passed = 0;
        self.failed = 0;
        self.skipped = 0;
    }

    /// Abort the stream with a diagnostic already printed by the caller.
    pub fn abort_reported(&mut self) {
        self.aborted = true;
        self.reported = true;
    }
}
