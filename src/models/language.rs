//! Language hints and the lexical conventions derived from them.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported language hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    #[default]
    Unknown,
}

/// How `#` is treated by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashComments {
    /// `#` always starts a line comment
    Always,
    /// `#` never starts a comment (preprocessor, attributes)
    Never,
    /// `#` starts a comment only when followed by whitespace, `#`, `!` or end of line
    Heuristic,
}

/// How lexical scopes are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeStyle {
    Braces,
    Indentation,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyi" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            "java" | "kt" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "rb" => Language::Ruby,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    /// Parse a user-supplied hint such as `python` or `rs`.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_lowercase().as_str() {
            "rust" => Language::Rust,
            "python" => Language::Python,
            "javascript" => Language::JavaScript,
            "typescript" => Language::TypeScript,
            "go" | "golang" => Language::Go,
            "java" => Language::Java,
            "c" => Language::C,
            "c++" | "cpp" => Language::Cpp,
            "ruby" => Language::Ruby,
            other => Self::from_extension(other),
        }
    }

    /// Whether `//` and `/* */` introduce comments.
    pub fn has_c_comments(&self) -> bool {
        !matches!(self, Language::Python | Language::Ruby)
    }

    /// Treatment of `#`.
    pub fn hash_comments(&self) -> HashComments {
        match self {
            Language::Python | Language::Ruby => HashComments::Always,
            Language::Unknown => HashComments::Heuristic,
            _ => HashComments::Never,
        }
    }

    /// Whether block comments nest.
    pub fn nested_block_comments(&self) -> bool {
        matches!(self, Language::Rust)
    }

    /// Whether `'` delimits strings (as opposed to Rust char/lifetime handling).
    pub fn single_quote_strings(&self) -> bool {
        !matches!(self, Language::Rust)
    }

    /// Whether `"""`/`'''` introduce multi-line strings.
    pub fn triple_quoted_strings(&self) -> bool {
        matches!(self, Language::Python | Language::Unknown)
    }

    /// Whether backticks delimit (multi-line) strings.
    pub fn backtick_strings(&self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::TypeScript | Language::Go | Language::Unknown
        )
    }

    /// Whether `r"..."` / `r#"..."#` raw strings exist.
    pub fn raw_strings(&self) -> bool {
        matches!(self, Language::Rust | Language::Unknown)
    }

    /// Scope delimiting convention.
    pub fn scope_style(&self) -> ScopeStyle {
        match self {
            Language::Python => ScopeStyle::Indentation,
            _ => ScopeStyle::Braces,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Rust => write!(f, "Rust"),
            Language::Python => write!(f, "Python"),
            Language::JavaScript => write!(f, "JavaScript"),
            Language::TypeScript => write!(f, "TypeScript"),
            Language::Go => write!(f, "Go"),
            Language::Java => write!(f, "Java"),
            Language::C => write!(f, "C"),
            Language::Cpp => write!(f, "C++"),
            Language::Ruby => write!(f, "Ruby"),
            Language::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path("src/lib.rs"), Language::Rust);
        assert_eq!(Language::from_path("app/models.py"), Language::Python);
        assert_eq!(Language::from_path("Makefile"), Language::Unknown);
    }

    #[test]
    fn test_conventions() {
        assert_eq!(Language::Python.scope_style(), ScopeStyle::Indentation);
        assert_eq!(Language::Go.scope_style(), ScopeStyle::Braces);
        assert_eq!(Language::C.hash_comments(), HashComments::Never);
        assert!(!Language::Python.has_c_comments());
    }
}
