use crate::context::{RunContext, Toggle};
use crate::testset::Testset;

/// The three operations a pragma toggle accepts. `Reset` restores the
/// CLI-configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PragmaOp {
    On,
    Off,
    Reset,
}

/// One registered pragma: a named toggle plus an optional per-line hook
/// that may claim whole input lines before the interpreter sees them.
#[derive(Clone, Copy)]
pub struct PragmaHook {
    pub name: &'static str,
    pub toggle: fn(&mut RunContext, PragmaOp),
    pub check: Option<fn(&str, &mut Testset, &mut RunContext) -> bool>,
}

fn apply(toggle: &mut Toggle, op: PragmaOp) {
    match op {
        PragmaOp::On => toggle.set(true),
        PragmaOp::Off => toggle.set(false),
        PragmaOp::Reset => toggle.reset(),
    }
}

fn toggle_strict(ctx: &mut RunContext, op: PragmaOp) {
    apply(&mut ctx.strict, op);
}

fn toggle_readblock(ctx: &mut RunContext, op: PragmaOp) {
    apply(&mut ctx.readblock, op);
}

const BUILTIN: &[PragmaHook] = &[
    PragmaHook {
        name: "strict",
        toggle: toggle_strict,
        check: None,
    },
    PragmaHook {
        name: "readblock",
        toggle: toggle_readblock,
        check: None,
    },
];

/// Ordered, open-ended table of pragma hooks. New pragmas register here;
/// the interpreter dispatches by name and never hard-codes the set.
pub struct PragmaRegistry {
    hooks: Vec<PragmaHook>,
}

impl Default for PragmaRegistry {
    fn default() -> Self {
        PragmaRegistry {
            hooks: BUILTIN.to_vec(),
        }
    }
}

impl PragmaRegistry {
    pub fn register(&mut self, hook: PragmaHook) {
        self.hooks.push(hook);
    }

    /// Toggle the named pragma. Unknown names are silently ignored; they
    /// may be meaningful to a future harness version.
    pub fn dispatch(&self, name: &str, op: PragmaOp, ctx: &mut RunContext) {
        if let Some(hook) = self.hooks.iter().find(|h| h.name == name) {
            (hook.toggle)(ctx, op);
        }
    }

    /// Offer a line to every check hook in registration order; true when
    /// one of them claimed it.
    pub fn check_line(&self, line: &str, ts: &mut Testset, ctx: &mut RunContext) -> bool {
        for hook in &self.hooks {
            if let Some(check) = hook.check {
                if check(line, ts, ctx) {
                    return true;
                }
            }
        }
        false
    }

    /// Issued by the batch driver at the start of every testset run so
    /// toggles from one test cannot leak into the next.
    pub fn reset_all(&self, ctx: &mut RunContext) {
        for hook in &self.hooks {
            (hook.toggle)(ctx, PragmaOp::Reset);
        }
    }
}

/// Result of scanning a line for the pragma directive form.
#[derive(Debug, PartialEq, Eq)]
pub enum PragmaLine<'a> {
    /// The line is not a pragma directive at all.
    NotPragma,
    /// `pragma ±name[, ±name ...]`, parsed into (operation, name) pairs.
    Items(Vec<(PragmaOp, &'a str)>),
    /// The line starts with the pragma keyword but violates the grammar
    /// (missing sign or empty name); aborts the testset.
    Malformed,
}

/// Parse a `pragma` directive:
///
/// ```text
/// pragma  := "pragma" WS item (WS? "," WS? item)*
/// item    := ("+" | "-") IDENT
/// IDENT   := [A-Za-z0-9_]+
/// ```
pub fn parse_pragma(line: &str) -> PragmaLine<'_> {
    let rest = line.trim_start();
    let Some(rest) = rest.strip_prefix("pragma") else {
        return PragmaLine::NotPragma;
    };
    // "pragma" must be a whole token, not a prefix of something else.
    match rest.chars().next() {
        Some(c) if !c.is_whitespace() => return PragmaLine::NotPragma,
        _ => {}
    }

    let mut rest = rest.trim_start();
    let mut items = Vec::new();
    while !rest.is_empty() {
        let op = match rest.as_bytes()[0] {
            b'+' => PragmaOp::On,
            b'-' => PragmaOp::Off,
            _ => return PragmaLine::Malformed,
        };
        rest = &rest[1..];

        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if end == 0 {
            return PragmaLine::Malformed;
        }
        let (name, tail) = rest.split_at(end);
        items.push((op, name));

        rest = tail.trim_start();
        match rest.strip_prefix(',') {
            Some(tail) => rest = tail.trim_start(),
            None => break,
        }
    }
    PragmaLine::Items(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_item() {
        assert_eq!(
            parse_pragma("pragma +strict"),
            PragmaLine::Items(vec![(PragmaOp::On, "strict")])
        );
    }

    #[test]
    fn parses_comma_list_with_loose_spacing() {
        assert_eq!(
            parse_pragma("pragma +foo, -bar,+baz_2"),
            PragmaLine::Items(vec![
                (PragmaOp::On, "foo"),
                (PragmaOp::Off, "bar"),
                (PragmaOp::On, "baz_2"),
            ])
        );
    }

    #[test]
    fn missing_sign_is_malformed() {
        assert_eq!(parse_pragma("pragma strict"), PragmaLine::Malformed);
    }

    #[test]
    fn empty_name_is_malformed() {
        assert_eq!(parse_pragma("pragma +"), PragmaLine::Malformed);
        assert_eq!(parse_pragma("pragma +,"), PragmaLine::Malformed);
    }

    #[test]
    fn pragma_must_be_a_whole_token() {
        assert_eq!(parse_pragma("pragmatic +foo"), PragmaLine::NotPragma);
        assert_eq!(parse_pragma("ok 1"), PragmaLine::NotPragma);
    }

    #[test]
    fn bare_pragma_has_no_items() {
        assert_eq!(parse_pragma("pragma"), PragmaLine::Items(vec![]));
    }

    #[test]
    fn trailing_junk_after_item_ends_the_list() {
        assert_eq!(
            parse_pragma("pragma +foo bar"),
            PragmaLine::Items(vec![(PragmaOp::On, "foo")])
        );
    }

    #[test]
    fn unknown_names_are_ignored_by_dispatch() {
        let registry = PragmaRegistry::default();
        let mut ctx = RunContext::default();
        registry.dispatch("no_such_pragma", PragmaOp::On, &mut ctx);
        assert!(!ctx.strict.get());
        assert!(!ctx.readblock.get());
    }

    #[test]
    fn reset_all_restores_cli_defaults() {
        let registry = PragmaRegistry::default();
        let mut ctx = RunContext::new(true, false, 0);
        registry.dispatch("strict", PragmaOp::Off, &mut ctx);
        registry.dispatch("readblock", PragmaOp::On, &mut ctx);
        registry.reset_all(&mut ctx);
        assert!(ctx.strict.get());
        assert!(!ctx.readblock.get());
    }
}
