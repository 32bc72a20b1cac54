use std::fs::{File, OpenOptions};
use std::io::{self, Write};

/// Sink for the verbatim child output log. Logging is best-effort: write
/// failures are dropped so a full disk cannot take the harness down with
/// it. The special names `stdout` and `stderr` bind the corresponding
/// process stream without ever closing it.
pub enum LogSink {
    Discard,
    Stdout,
    Stderr,
    File(File),
}

impl LogSink {
    pub fn open(name: &str, append: bool) -> io::Result<LogSink> {
        match name {
            "stdout" => Ok(LogSink::Stdout),
            "stderr" => Ok(LogSink::Stderr),
            _ => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(append)
                    .write(true)
                    .truncate(!append)
                    .open(name)?;
                Ok(LogSink::File(file))
            }
        }
    }

    pub fn enabled(&self) -> bool {
        !matches!(self, LogSink::Discard)
    }

    /// Write one line, newline appended.
    pub fn write_line(&mut self, line: &str) {
        match self {
            LogSink::Discard => {}
            LogSink::Stdout => {
                let mut out = io::stdout();
                let _ = writeln!(out, "{line}");
                let _ = out.flush();
            }
            LogSink::Stderr => {
                let mut out = io::stderr();
                let _ = writeln!(out, "{line}");
                let _ = out.flush();
            }
            LogSink::File(file) => {
                let _ = writeln!(file, "{line}");
                let _ = file.flush();
            }
        }
    }
}
