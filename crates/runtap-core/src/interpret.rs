use crate::pragma::{parse_pragma, PragmaLine};
use crate::reader::Line;
use crate::testset::{PlanStatus, TestStatus, Testset};
use crate::Harness;

const BAIL_MARKER: &str = "Bail out!";

/// Drive the testset state machine with one line of child output. The
/// order of checks is significant: bail-out, truncated line, TAP version,
/// pragma, diagnostic, plan, result, then (under strict) anything left.
///
/// Parse errors never propagate; they mark the testset aborted and return.
pub fn check_line(line: &Line, ts: &mut Testset, h: &mut Harness) {
    // Every consumed line goes to the log sink, even ones we ignore.
    h.log.write_line(&line.text);

    if let Some(pos) = line.text.find(BAIL_MARKER) {
        let reason = line.text[pos + BAIL_MARKER.len()..].trim_start();
        if !reason.is_empty() {
            h.progress.erase(ts);
            println!("ABORTED ({reason})");
            ts.reported = true;
        }
        ts.aborted = true;
        return;
    }

    // A line without a newline was truncated by a full buffer; ignore it.
    if !line.complete {
        return;
    }

    let text = line.text.as_str();

    // The first line decides the TAP version: an explicit header, or 12.
    if ts.tap_version == 0 {
        if let Some(rest) = text.strip_prefix("TAP version ") {
            let (version, _) = parse_int_prefix(rest);
            let version = version.unwrap_or(0);
            if version < 13 {
                println!("ABORTED (Invalid TAP version: {version})");
                ts.abort_reported();
            } else {
                ts.tap_version = version as u32;
            }
            return;
        }
        ts.tap_version = 12;
    }

    // Pragma support arrived in TAP 13. Check hooks get a look at every
    // line; a pragma may parse additional in-band instructions.
    if ts.tap_version >= 13 {
        let is_pragma = match parse_pragma(text) {
            PragmaLine::NotPragma => false,
            PragmaLine::Malformed => {
                h.progress.erase(ts);
                println!("ABORTED (invalid pragma)");
                ts.abort_reported();
                return;
            }
            PragmaLine::Items(items) => {
                for (op, name) in items {
                    h.pragmas.dispatch(name, op, &mut h.ctx);
                }
                true
            }
        };
        if h.pragmas.check_line(text, ts, &mut h.ctx) {
            return;
        }
        if is_pragma {
            return;
        }
    }

    if text.trim_start().starts_with('#') {
        if h.ctx.verbosity >= 3 {
            println!("{text}");
        }
        return;
    }

    if text.starts_with("1..") {
        match ts.plan {
            PlanStatus::Init | PlanStatus::Pending => check_plan(text, ts, h),
            PlanStatus::First | PlanStatus::Final => {
                h.progress.erase(ts);
                println!("ABORTED (multiple plans)");
                ts.abort_reported();
            }
        }
        return;
    }

    if check_result(text, ts, h) {
        return;
    }

    if h.ctx.strict.get() && !text.trim().is_empty() {
        h.progress.erase(ts);
        println!("ABORTED (non-TAP output)");
        ts.abort_reported();
    }
}

/// Parse a plan line `1..N`, reached only under `Init` or `Pending`.
fn check_plan(text: &str, ts: &mut Testset, h: &mut Harness) {
    let rest = &text["1..".len()..];
    let (n, after) = parse_int_prefix(rest);
    let n = n.unwrap_or(0);

    // `1..0 # skip <reason>` skips the whole file.
    if n == 0 {
        let after = after.trim_start();
        if let Some(comment) = after.strip_prefix('#') {
            let comment = comment.trim_start();
            if starts_with_ignore_case(comment, "skip") {
                let reason = comment["skip".len()..].trim_start();
                ts.skip_all(if reason.is_empty() {
                    None
                } else {
                    Some(reason.to_string())
                });
                return;
            }
        }
    }
    if n <= 0 {
        println!("ABORTED (invalid test count)");
        ts.abort_reported();
        return;
    }
    let n = n as usize;

    if ts.plan == PlanStatus::Init {
        ts.allocate_plan(n);
        ts.plan = PlanStatus::First;
    } else {
        // A trailing plan must cover every test already seen.
        if n < ts.count {
            h.progress.erase(ts);
            println!("ABORTED (invalid test number {})", ts.count);
            ts.abort_reported();
            return;
        }
        ts.grow_to_plan(n);
        ts.plan = PlanStatus::Final;
    }
}

/// Parse a result line `["not "] "ok" [WS number] [# directive]`. Returns
/// false when the line is not a result line at all.
fn check_result(text: &str, ts: &mut Testset, h: &mut Harness) -> bool {
    let mut status = TestStatus::Pass;
    let mut rest = text;
    if let Some(r) = rest.strip_prefix("not ") {
        status = TestStatus::Fail;
        rest = r;
    }
    let Some(rest) = rest.strip_prefix("ok") else {
        return false;
    };
    // "ok" must be a whole token ("okay ..." is not a result).
    match rest.chars().next() {
        Some(c) if !c.is_whitespace() => return false,
        _ => {}
    }

    let (number, after) = parse_int_prefix(rest);
    let number = number.unwrap_or(ts.current as i64 + 1);
    let planned = matches!(ts.plan, PlanStatus::First | PlanStatus::Final);
    if number <= 0 || (planned && number as usize > ts.count) {
        h.progress.erase(ts);
        println!("ABORTED (invalid test number {number})");
        ts.abort_reported();
        return true;
    }
    let number = number as usize;

    if ts.plan == PlanStatus::Init || ts.plan == PlanStatus::Pending {
        ts.plan = PlanStatus::Pending;
        ts.grow_for(number);
    }

    // Directives override the raw status. A passing test marked `todo`
    // stays a failure: the unexpected pass is flagged, not rewarded.
    let desc = after.trim_start();
    if let Some(pos) = desc.find('#') {
        let directive = desc[pos + 1..].trim_start();
        if starts_with_ignore_case(directive, "skip") {
            status = TestStatus::Skip;
        } else if starts_with_ignore_case(directive, "todo") {
            status = if status == TestStatus::Fail {
                TestStatus::Skip
            } else {
                TestStatus::Fail
            };
        }
    }

    if ts.results[number - 1] != TestStatus::Invalid {
        h.progress.erase(ts);
        println!("ABORTED (duplicate test number {number})");
        ts.abort_reported();
        return true;
    }

    ts.record(number, status);

    if h.ctx.verbosity >= 1 {
        let label = match status {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
            TestStatus::Skip => "SKIP",
            TestStatus::Invalid => "MISSING",
        };
        if desc.is_empty() {
            println!("  {number:3} {label}");
        } else {
            println!("  {number:3} {desc}: {label}");
        }
    } else {
        h.progress.update(ts);
    }
    true
}

/// strtol-flavored integer scan: skip leading whitespace, take an optional
/// sign and a run of digits, and hand back the remainder. `None` when no
/// digits were consumed.
fn parse_int_prefix(s: &str) -> (Option<i64>, &str) {
    let t = s.trim_start();
    let (negative, digits_on) = match t.as_bytes().first().copied() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let end = digits_on
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits_on.len());
    if end == 0 {
        return (None, s);
    }
    let mut value: i64 = 0;
    for b in digits_on[..end].bytes() {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        value = -value;
    }
    (Some(value), &digits_on[end..])
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    let s = s.as_bytes();
    let prefix = prefix.as_bytes();
    s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_prefix_is_strtol_shaped() {
        assert_eq!(parse_int_prefix("  42 rest"), (Some(42), " rest"));
        assert_eq!(parse_int_prefix("-3"), (Some(-3), ""));
        assert_eq!(parse_int_prefix("abc"), (None, "abc"));
        assert_eq!(parse_int_prefix(""), (None, ""));
    }

    #[test]
    fn directive_match_is_case_insensitive_and_byte_safe() {
        assert!(starts_with_ignore_case("SKIP flaky", "skip"));
        assert!(starts_with_ignore_case("ToDo later", "todo"));
        assert!(!starts_with_ignore_case("ski", "skip"));
        // Multi-byte text after a directive prefix must not panic.
        assert!(!starts_with_ignore_case("sk€p", "skip"));
    }
}
