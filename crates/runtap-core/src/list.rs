use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::testset::Testset;

/// Longest accepted line in a test list file.
const MAX_LIST_LINE: usize = 8 * 1024;

/// Read a newline-delimited list of test names, skipping `#` comments and
/// blank lines, producing one testset skeleton per entry. An over-long
/// line is a fatal error naming the file and line number.
pub fn read_test_list(path: &Path) -> Result<Vec<Testset>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("can't open {}", path.display()))?;
    let mut tests = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.len() > MAX_LIST_LINE {
            bail!("{}:{}: line too long", path.display(), idx + 1);
        }
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        tests.push(Testset::new(line));
    }
    Ok(tests)
}

/// Build the testset list straight from command-line names.
pub fn build_test_list(names: &[String]) -> Vec<Testset> {
    names.iter().map(|n| Testset::new(n.as_str())).collect()
}
