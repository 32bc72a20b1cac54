use runtap_core::interpret::check_line;
use runtap_core::reader::Line;
use runtap_core::testset::{PlanStatus, TestStatus, Testset};
use runtap_core::{Harness, Progress, RunContext};

/// Feed a literal TAP stream through the interpreter one line at a time,
/// stopping on abort the way the batch driver does.
fn feed_with(input: &str, ctx: RunContext) -> (Testset, Harness) {
    let mut h = Harness::new(ctx);
    h.progress = Progress::disabled();
    let mut ts = Testset::new("stream");
    for line in input.lines() {
        if ts.aborted {
            break;
        }
        check_line(&Line::complete(line), &mut ts, &mut h);
    }
    (ts, h)
}

fn feed(input: &str) -> Testset {
    feed_with(input, RunContext::default()).0
}

#[test]
fn plan_first_then_all_pass() {
    let ts = feed("1..2\nok 1\nok 2\n");
    assert_eq!(ts.plan, PlanStatus::First);
    assert_eq!(ts.passed, 2);
    assert_eq!(ts.failed, 0);
    assert!(!ts.aborted);
    assert_eq!(ts.tap_version, 12);
}

#[test]
fn whole_set_skip_keeps_the_reason() {
    let ts = feed("1..0 # skip no platform\n");
    assert!(ts.all_skipped);
    assert!(ts.aborted);
    assert_eq!(ts.reason.as_deref(), Some("no platform"));
    assert_eq!(ts.count, 0);
}

#[test]
fn whole_set_skip_without_reason() {
    let ts = feed("1..0 # skip\n");
    assert!(ts.all_skipped);
    assert_eq!(ts.reason, None);
}

#[test]
fn lone_plan_of_zero_is_an_invalid_count() {
    let ts = feed("1..0\n");
    assert!(ts.aborted);
    assert!(ts.reported);
    assert!(!ts.all_skipped);
}

#[test]
fn trailing_plan_goes_final() {
    let ts = feed("ok 1\nok 2\n1..2\n");
    assert_eq!(ts.plan, PlanStatus::Final);
    assert_eq!(ts.passed, 2);
    assert!(!ts.aborted);
}

#[test]
fn trailing_plan_may_grow_past_results_seen() {
    let ts = feed("ok 1\n1..3\n");
    assert_eq!(ts.plan, PlanStatus::Final);
    assert_eq!(ts.count, 3);
    assert_eq!(ts.results[1], TestStatus::Invalid);
}

#[test]
fn trailing_plan_below_seen_results_aborts() {
    let ts = feed("ok 1\nok 2\n1..1\n");
    assert!(ts.aborted);
    assert!(ts.reported);
}

#[test]
fn fail_and_skip_directives_are_counted() {
    let ts = feed("1..3\nok 1\nnot ok 2\nok 3 # skip flaky\n");
    assert_eq!((ts.passed, ts.failed, ts.skipped), (1, 1, 1));
    assert_eq!(ts.results[0], TestStatus::Pass);
    assert_eq!(ts.results[1], TestStatus::Fail);
    assert_eq!(ts.results[2], TestStatus::Skip);
}

#[test]
fn skip_directive_is_case_insensitive() {
    let ts = feed("1..1\nok 1 # SKIP windows only\n");
    assert_eq!(ts.skipped, 1);
}

#[test]
fn todo_inverts_only_the_failing_case() {
    let ts = feed("1..2\nnot ok 1 # todo later\nok 2 # todo later\n");
    // A failing todo is tolerated; an unexpected pass is flagged.
    assert_eq!(ts.results[0], TestStatus::Skip);
    assert_eq!(ts.results[1], TestStatus::Fail);
    assert_eq!((ts.skipped, ts.failed), (1, 1));
}

#[test]
fn missing_number_defaults_to_next() {
    let ts = feed("1..2\nok\nok\n");
    assert_eq!(ts.passed, 2);
    assert_eq!(ts.current, 2);
}

#[test]
fn okay_is_not_a_result_line() {
    let ts = feed("1..1\nokay 1\nok 1\n");
    assert_eq!(ts.passed, 1);
    assert!(!ts.aborted);
}

#[test]
fn bail_out_with_reason_is_reported() {
    let ts = feed("1..2\nok 1\nBail out! db down\n");
    assert!(ts.aborted);
    assert!(ts.reported);
    assert_eq!(ts.passed, 1);
}

#[test]
fn bail_out_with_empty_trailer_aborts_silently() {
    let ts = feed("1..1\nBail out!\n");
    assert!(ts.aborted);
    assert!(!ts.reported);
}

#[test]
fn zero_test_number_aborts() {
    let ts = feed("1..2\nok 0\n");
    assert!(ts.aborted);
    assert!(ts.reported);
}

#[test]
fn negative_test_number_aborts() {
    let ts = feed("1..2\nok -1\n");
    assert!(ts.aborted);
}

#[test]
fn number_past_an_upfront_plan_aborts() {
    let ts = feed("1..1\nok 2\n");
    assert!(ts.aborted);
    assert!(ts.reported);
}

#[test]
fn duplicate_number_aborts() {
    let ts = feed("1..2\nok 1\nok 1\n");
    assert!(ts.aborted);
    assert!(ts.reported);
    assert_eq!(ts.passed, 1);
}

#[test]
fn second_plan_aborts() {
    let ts = feed("1..1\nok 1\n1..1\n");
    assert!(ts.aborted);
    assert!(ts.reported);
}

#[test]
fn lazy_results_grow_the_table_geometrically() {
    let ts = feed("ok 1\nok 2\nok 40\n");
    assert_eq!(ts.plan, PlanStatus::Pending);
    assert_eq!(ts.count, 40);
    assert!(ts.results.len() >= 40);
    assert_eq!(ts.passed, 3);
}

#[test]
fn diagnostics_and_noise_are_ignored_by_default() {
    let ts = feed("1..1\n# a comment\nrandom noise\nok 1\n");
    assert_eq!(ts.passed, 1);
    assert!(!ts.aborted);
}

#[test]
fn incomplete_line_is_discarded() {
    let mut h = Harness::new(RunContext::default());
    h.progress = Progress::disabled();
    let mut ts = Testset::new("stream");
    check_line(&Line::complete("1..1"), &mut ts, &mut h);
    check_line(
        &Line {
            text: "ok 1".to_string(),
            complete: false,
        },
        &mut ts,
        &mut h,
    );
    assert_eq!(ts.passed, 0);
    assert!(!ts.aborted);
}

#[test]
fn old_tap_version_header_aborts() {
    let ts = feed("TAP version 12\n1..1\nok 1\n");
    assert!(ts.aborted);
    assert!(ts.reported);
    assert_eq!(ts.passed, 0);
}

#[test]
fn tap_13_header_is_recorded() {
    let ts = feed("TAP version 13\n1..1\nok 1\n");
    assert_eq!(ts.tap_version, 13);
    assert_eq!(ts.passed, 1);
}

#[test]
fn version_header_only_counts_on_the_first_line() {
    // Not the first line: falls through to ordinary-noise handling.
    let ts = feed("1..1\nTAP version 13\nok 1\n");
    assert_eq!(ts.tap_version, 12);
    assert_eq!(ts.passed, 1);
}

#[test]
fn pragma_toggles_strict_under_tap_13() {
    let (ts, h) = feed_with("TAP version 13\npragma +strict\n1..1\nok 1\n", RunContext::default());
    assert!(!ts.aborted);
    assert!(h.ctx.strict.get());
    assert_eq!(ts.passed, 1);
}

#[test]
fn pragma_is_plain_noise_under_tap_12() {
    let (ts, h) = feed_with("pragma +strict\n1..1\nok 1\n", RunContext::default());
    assert!(!h.ctx.strict.get());
    assert!(!ts.aborted);
    assert_eq!(ts.passed, 1);
}

#[test]
fn malformed_pragma_aborts() {
    let ts = feed("TAP version 13\npragma strict\n");
    assert!(ts.aborted);
    assert!(ts.reported);
}

#[test]
fn unknown_pragma_names_are_ignored() {
    let ts = feed("TAP version 13\npragma +frobnicate\n1..1\nok 1\n");
    assert!(!ts.aborted);
    assert_eq!(ts.passed, 1);
}

#[test]
fn pragma_list_applies_every_item() {
    let (_, h) = feed_with(
        "TAP version 13\npragma +strict, +readblock\n1..1\nok 1\n",
        RunContext::default(),
    );
    assert!(h.ctx.strict.get());
    assert!(h.ctx.readblock.get());
}

#[test]
fn strict_mode_rejects_unrecognized_output() {
    let ts = feed_with("1..1\nrandom noise\nok 1\n", RunContext::new(true, false, 0)).0;
    assert!(ts.aborted);
    assert!(ts.reported);
    assert_eq!(ts.passed, 0);
}

#[test]
fn strict_mode_still_allows_blank_lines_and_diagnostics() {
    let ts = feed_with(
        "1..1\n\n# diagnostic\nok 1\n",
        RunContext::new(true, false, 0),
    )
    .0;
    assert!(!ts.aborted);
    assert_eq!(ts.passed, 1);
}

#[test]
fn pragma_can_turn_strict_back_off() {
    let ts = feed_with(
        "TAP version 13\npragma -strict\n1..1\nnoise line\nok 1\n",
        RunContext::new(true, false, 0),
    )
    .0;
    assert!(!ts.aborted);
    assert_eq!(ts.passed, 1);
}

#[test]
fn counters_always_match_the_results_table() {
    let ts = feed("1..5\nok 1\nnot ok 2\nok 3 # skip\nok 4\n");
    let passed = ts.results.iter().filter(|&&r| r == TestStatus::Pass).count();
    let failed = ts.results.iter().filter(|&&r| r == TestStatus::Fail).count();
    let skipped = ts.results.iter().filter(|&&r| r == TestStatus::Skip).count();
    assert_eq!(ts.passed, passed);
    assert_eq!(ts.failed, failed);
    assert_eq!(ts.skipped, skipped);
    // Plan sufficiency: accounted results plus invalid slots cover the plan.
    let invalid = ts.results[..ts.count]
        .iter()
        .filter(|&&r| r == TestStatus::Invalid)
        .count();
    assert_eq!(passed + failed + skipped + invalid, ts.count);
}
