use std::io::{self, Write};

use crate::testset::{PlanStatus, Testset};

/// In-place `current/count` meter shown while a testset runs. Only active
/// when stdout is a terminal; the width of whatever is on screen is
/// tracked in `Testset::length` so it can be backspaced away before any
/// other output lands on the line.
pub struct Progress {
    tty: bool,
}

impl Progress {
    pub fn detect() -> Self {
        Progress {
            tty: unsafe { libc::isatty(libc::STDOUT_FILENO) } == 1,
        }
    }

    /// A meter that never draws, for embedding in tests.
    pub fn disabled() -> Self {
        Progress { tty: false }
    }

    pub fn is_tty(&self) -> bool {
        self.tty
    }

    /// Back up over the last drawn counter, if any.
    pub fn erase(&self, ts: &mut Testset) {
        if !self.tty || ts.length == 0 {
            return;
        }
        let mut out = io::stdout();
        for _ in 0..ts.length {
            let _ = out.write_all(b"\x08");
        }
        for _ in 0..ts.length {
            let _ = out.write_all(b" ");
        }
        for _ in 0..ts.length {
            let _ = out.write_all(b"\x08");
        }
        let _ = out.flush();
        ts.length = 0;
    }

    /// Redraw the counter after an accepted result.
    pub fn update(&self, ts: &mut Testset) {
        if !self.tty {
            return;
        }
        self.erase(ts);
        let text = if ts.plan == PlanStatus::Pending {
            format!("{}/?", ts.current)
        } else {
            format!("{}/{}", ts.current, ts.count)
        };
        let mut out = io::stdout();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
        ts.length = text.len();
    }
}
