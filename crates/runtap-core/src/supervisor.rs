use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

/// Exit statuses reserved for child-side setup failures, chosen not to
/// collide with plausible test exit codes.
pub const CHILDERR_DUP: i32 = 100;
pub const CHILDERR_EXEC: i32 = 101;
pub const CHILDERR_STDERR: i32 = 102;

/// A spawned test program, or the disposition of one that never ran.
pub enum Spawned {
    /// Child is running; `output` is the non-blocking read end of its
    /// stdout pipe. The caller must drain `output` before reaping.
    Running { child: Child, output: OwnedFd },
    /// The program could not be executed; carries the synthetic exit
    /// status (the reserved exec-failure code) for the analyzer.
    Failed(ExitStatus),
}

/// Launch one test program with stdout connected to a pipe we read from.
/// Stderr is merged into the same pipe under `capture_stderr`, otherwise
/// sent to the null sink. A pipe failure is fatal; an exec failure is a
/// per-testset disposition, not a harness error.
pub fn spawn_test(path: &Path, capture_stderr: bool) -> Result<Spawned> {
    let (read_fd, write_fd) = pipe_pair().context("can't create pipe")?;

    let mut cmd = Command::new(path);
    cmd.stdout(Stdio::from(
        write_fd
            .try_clone()
            .context("can't dup pipe descriptor")?,
    ));
    if capture_stderr {
        cmd.stderr(Stdio::from(write_fd));
    } else {
        cmd.stderr(Stdio::null());
        drop(write_fd);
    }

    match cmd.spawn() {
        Ok(child) => {
            // The Command's Stdio handles are dropped with it, closing the
            // parent's copies of the write end.
            drop(cmd);
            set_nonblocking(&read_fd).context("can't set pipe non-blocking")?;
            Ok(Spawned::Running {
                child,
                output: read_fd,
            })
        }
        Err(_) => Ok(Spawned::Failed(exec_failure_status())),
    }
}

/// Wait for the child and return its raw status. A wait failure is fatal.
pub fn reap(child: &mut Child) -> Result<ExitStatus> {
    child
        .wait()
        .with_context(|| format!("waitpid for {} failed", child.id()))
}

/// The synthetic wait status the analyzer sees when exec itself failed.
pub fn exec_failure_status() -> ExitStatus {
    ExitStatus::from_raw(CHILDERR_EXEC << 8)
}

/// An anonymous pipe as a pair of owned descriptors (read, write), both
/// close-on-exec in the parent.
pub fn pipe_pair() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0i32; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let read_fd = unsafe { OwnedFd::from_raw_fd(fds[0]) };
    let write_fd = unsafe { OwnedFd::from_raw_fd(fds[1]) };
    set_cloexec(&read_fd)?;
    set_cloexec(&write_fd)?;
    Ok((read_fd, write_fd))
}

fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFD) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(raw, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Put a descriptor into non-blocking mode for the line reader.
pub fn set_nonblocking(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(raw, libc::F_SETFL, flags | libc::O_NONBLOCK) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
