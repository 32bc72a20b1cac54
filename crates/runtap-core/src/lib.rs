//! Core of the runtap harness: a TAP stream interpreter driven one line at a
//! time against a per-test state machine, embedded in a child-process
//! supervisor that launches one test program per testset, reads its stdout
//! through a pipe, and classifies the exit disposition.
//!
//! The input protocol is the line-oriented subset of TAP: a plan (`1..N`),
//! results (`ok N` / `not ok N` with optional `# skip` / `# todo`
//! directives), `Bail out!`, `TAP version N` headers, and `pragma`
//! directives (TAP 13+). Anything else is a diagnostic or ignored.

pub mod analyze;
pub mod batch;
pub mod context;
pub mod interpret;
pub mod list;
pub mod locate;
pub mod log;
pub mod pragma;
pub mod progress;
pub mod reader;
pub mod report;
pub mod summary;
pub mod supervisor;
pub mod testset;

pub use batch::{run_batch, run_testset, BatchOptions, BatchSummary};
pub use context::{RunContext, Toggle};
pub use log::LogSink;
pub use pragma::{PragmaOp, PragmaRegistry};
pub use progress::Progress;
pub use testset::{PlanStatus, TestStatus, Testset};

/// Shared harness state threaded through the batch driver, the interpreter
/// and the line reader. Everything runtime-configurable lives here; there
/// are no module-level globals.
pub struct Harness {
    pub ctx: RunContext,
    pub pragmas: PragmaRegistry,
    pub log: LogSink,
    pub progress: Progress,
}

impl Harness {
    pub fn new(ctx: RunContext) -> Self {
        Harness {
            ctx,
            pragmas: PragmaRegistry::default(),
            log: LogSink::Discard,
            progress: Progress::detect(),
        }
    }
}
