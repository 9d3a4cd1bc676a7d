//! Extraction of added code from unified diffs.

use crate::models::Language;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Added content of one file in a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root (the `b/` side)
    pub path: String,

    /// Added lines joined with `\n`
    pub content: String,

    /// Language hint derived from the path
    pub language: Language,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self {
            path,
            content: content.into(),
            language,
        }
    }
}

/// Collect the added lines of every file in a unified diff.
///
/// Only lines starting with `+` (but not the `+++` header) are kept, so the
/// result is the new code introduced by the change. Files without added
/// lines (pure deletions, renames) are skipped.
pub fn parse_unified_diff(diff: &str) -> Vec<ChangedFile> {
    let mut files = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in diff.lines() {
        if let Some(path) = line.strip_prefix("+++ ") {
            flush(&mut files, current.take());
            current = header_path(path).map(|p| (p, Vec::new()));
        } else if line.starts_with("diff --git ") {
            flush(&mut files, current.take());
        } else if let Some(added) = line.strip_prefix('+') {
            if let Some((_, lines)) = current.as_mut() {
                lines.push(added);
            }
        }
    }
    flush(&mut files, current);

    debug!("Extracted {} changed files from diff", files.len());
    files
}

fn header_path(raw: &str) -> Option<String> {
    let raw = raw.split('\t').next().unwrap_or(raw).trim();
    if raw == "/dev/null" {
        return None;
    }
    Some(raw.strip_prefix("b/").unwrap_or(raw).to_string())
}

fn flush(files: &mut Vec<ChangedFile>, current: Option<(String, Vec<&str>)>) {
    if let Some((path, lines)) = current {
        if !lines.is_empty() {
            files.push(ChangedFile::new(path, lines.join("\n")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFF: &str = "\
diff --git a/src/tax.py b/src/tax.py
index 1111111..2222222 100644
--- a/src/tax.py
+++ b/src/tax.py
@@ -1,2 +1,4 @@
 import os
+def compute_tax(amount):
+    return amount * 0.2
 print('x')
diff --git a/old.txt b/old.txt
deleted file mode 100644
--- a/old.txt
+++ /dev/null
@@ -1 +0,0 @@
-gone
diff --git a/web/app.js b/web/app.js
--- a/web/app.js
+++ b/web/app.js
@@ -0,0 +1 @@
+const x = 1;
";

    #[test]
    fn test_extracts_added_lines_per_file() {
        let files = parse_unified_diff(DIFF);
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].path, "src/tax.py");
        assert_eq!(files[0].content, "def compute_tax(amount):\n    return amount * 0.2");
        assert_eq!(files[0].language, Language::Python);

        assert_eq!(files[1].path, "web/app.js");
        assert_eq!(files[1].content, "const x = 1;");
    }

    #[test]
    fn test_empty_diff() {
        assert!(parse_unified_diff("").is_empty());
    }
}
