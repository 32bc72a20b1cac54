/// A boolean knob that remembers the value it was configured with so that a
/// pragma `Reset` can restore it after any number of `On`/`Off` flips.
#[derive(Debug, Clone, Copy)]
pub struct Toggle {
    value: bool,
    default: bool,
}

impl Toggle {
    pub fn new(default: bool) -> Self {
        Toggle {
            value: default,
            default,
        }
    }

    pub fn get(self) -> bool {
        self.value
    }

    pub fn set(&mut self, on: bool) {
        self.value = on;
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }
}

/// Retry budget for non-blocking reads, in one-second sleeps, before the
/// reader gives up and treats the stream as closed.
pub const DEFAULT_BLOCKING_TIME: u32 = 20;

/// Runtime-configurable harness state. CLI options seed the defaults;
/// pragmas may flip the toggles mid-stream.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Enforce strict TAP: lines matching no recognized form abort the set.
    pub strict: Toggle,
    /// Treat the child pipe as blocking (retry reads indefinitely).
    pub readblock: Toggle,
    pub blocking_time: u32,
    pub verbosity: u8,
    pub capture_stderr: bool,
}

impl RunContext {
    pub fn new(strict: bool, capture_stderr: bool, verbosity: u8) -> Self {
        RunContext {
            strict: Toggle::new(strict),
            readblock: Toggle::new(false),
            blocking_time: DEFAULT_BLOCKING_TIME,
            verbosity,
            capture_stderr,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        RunContext::new(false, false, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_reset_restores_configured_default() {
        let mut t = Toggle::new(true);
        t.set(false);
        t.set(true);
        t.set(false);
        assert!(!t.get());
        t.reset();
        assert!(t.get());
    }
}
