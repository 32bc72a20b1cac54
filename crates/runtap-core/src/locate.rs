use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

const SUFFIXES: &[&str] = &["-t", ".t", ""];

/// Find the executable for a test name. Tries the current directory, the
/// build directory, and the source directory, each with the `-t`, `.t`
/// and bare suffixes; the first regular executable file wins. Falls back
/// to the raw name so the failure surfaces as an exec error on the actual
/// path the user asked for.
pub fn find_test(name: &str, source: Option<&Path>, build: Option<&Path>) -> PathBuf {
    let bases: [Option<&Path>; 3] = [Some(Path::new(".")), build, source];
    for suffix in SUFFIXES {
        for base in bases.iter().flatten() {
            let candidate = base.join(format!("{name}{suffix}"));
            if is_valid_test(&candidate) {
                return candidate;
            }
        }
    }
    PathBuf::from(name)
}

/// A valid test is a regular file we may execute.
fn is_valid_test(path: &Path) -> bool {
    let Ok(cpath) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    if unsafe { libc::access(cpath.as_ptr(), libc::X_OK) } != 0 {
        return false;
    }
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    }
}
