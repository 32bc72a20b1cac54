use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use runtap_core::{list, locate};

static TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let pid = std::process::id();
    let n = TMP_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("runtap-locate-{pid}-{n}"));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn touch_executable(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write file");
    let mut perms = fs::metadata(&path).expect("stat").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod");
    path
}

#[test]
fn dash_t_suffix_wins_over_dot_t() {
    let source = make_temp_dir();
    let build = make_temp_dir();
    touch_executable(&build, "foo.t");
    let expected = touch_executable(&source, "foo-t");
    let found = locate::find_test("foo", Some(&source), Some(&build));
    assert_eq!(found, expected);
}

#[test]
fn build_dir_is_searched_before_source() {
    let source = make_temp_dir();
    let build = make_temp_dir();
    touch_executable(&source, "bar-t");
    let expected = touch_executable(&build, "bar-t");
    let found = locate::find_test("bar", Some(&source), Some(&build));
    assert_eq!(found, expected);
}

#[test]
fn bare_name_is_accepted_last() {
    let build = make_temp_dir();
    let expected = touch_executable(&build, "plain");
    let found = locate::find_test("plain", None, Some(&build));
    assert_eq!(found, expected);
}

#[test]
fn non_executable_candidates_are_skipped() {
    let build = make_temp_dir();
    fs::write(build.join("quux-t"), "not runnable").expect("write file");
    let found = locate::find_test("quux", None, Some(&build));
    assert_eq!(found, PathBuf::from("quux"));
}

#[test]
fn unresolvable_name_falls_back_verbatim() {
    let found = locate::find_test("no/such/test", None, None);
    assert_eq!(found, PathBuf::from("no/such/test"));
}

#[test]
fn list_skips_comments_and_blank_lines() {
    let dir = make_temp_dir();
    let path = dir.join("TESTS");
    fs::write(&path, "# header comment\n\nfoo\nbar\n# tail\n").expect("write list");
    let tests = list::read_test_list(&path).expect("read list");
    let names: Vec<&str> = tests.iter().map(|t| t.file.as_str()).collect();
    assert_eq!(names, ["foo", "bar"]);
}

#[test]
fn overlong_list_line_is_an_error() {
    let dir = make_temp_dir();
    let path = dir.join("TESTS");
    let long = "x".repeat(10_000);
    fs::write(&path, format!("ok-name\n{long}\n")).expect("write list");
    let err = list::read_test_list(&path).expect_err("line too long");
    assert!(err.to_string().contains("line too long"));
    assert!(err.to_string().contains(":2"));
}

#[test]
fn missing_list_file_is_an_error() {
    let err = list::read_test_list(Path::new("/nonexistent/TESTS")).expect_err("no file");
    assert!(err.to_string().contains("can't open"));
}
