//! Language keywords, builtins and well-known library names.
//!
//! Identifiers found here carry no proprietary meaning and stay verbatim in
//! the abstracted text so the remote analyzer can still read the program's
//! shape.

use crate::models::Language;
use std::collections::{HashMap, HashSet};

const RUST: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "try",
    // Built-in types
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32",
    "i64", "i128", "isize", "f32", "f64", "String", "Vec", "Option", "Result", "Box", "Rc",
    "Arc", "Cell", "RefCell", "HashMap", "HashSet", "BTreeMap", "BTreeSet", "Some", "None",
    "Ok", "Err",
    // Common methods and macros
    "new", "default", "clone", "into", "from", "unwrap", "expect", "ok", "err", "map",
    "and_then", "or_else", "iter", "collect", "len", "push", "println", "format", "vec",
];

const PYTHON: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "self", "cls",
    // Built-in functions
    "print", "len", "range", "str", "int", "float", "list", "dict", "set", "tuple", "type",
    "isinstance", "hasattr", "getattr", "setattr", "open", "read", "write", "close", "bool",
    "bytes", "enumerate", "zip", "sorted", "min", "max", "sum", "super", "Exception",
    "ValueError", "KeyError", "TypeError",
];

const JAVASCRIPT: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "undefined", "var", "void", "while", "with", "yield",
    "async", "await", "of", "require", "module", "exports",
    // Built-in objects
    "Array", "Object", "String", "Number", "Boolean", "Date", "Math", "JSON", "Promise", "Map",
    "Set", "WeakMap", "WeakSet", "console", "Error", "log", "length",
];

const TYPESCRIPT: &[&str] = &[
    "interface", "type", "enum", "implements", "namespace", "declare", "readonly", "private",
    "protected", "public", "abstract", "as", "any", "unknown", "never", "string", "number",
    "boolean", "keyof",
];

const GO: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var", "nil", "true", "false",
    // Built-in types
    "bool", "byte", "complex64", "complex128", "error", "float32", "float64", "int", "int8",
    "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr",
    // Built-in functions
    "append", "cap", "close", "complex", "copy", "delete", "imag", "len", "make", "new",
    "panic", "print", "println", "real", "recover",
];

const JAVA: &[&str] = &[
    "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "new", "null", "package", "private", "protected", "public", "return", "short", "static",
    "super", "switch", "synchronized", "this", "throw", "throws", "try", "void", "volatile",
    "while", "true", "false", "var", "String", "Object", "List", "Map", "System", "out",
    "println", "Override",
];

const C_FAMILY: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef", "union",
    "unsigned", "void", "volatile", "while", "NULL", "include", "define", "ifdef", "ifndef",
    "endif", "printf", "malloc", "free", "size_t",
];

const CPP: &[&str] = &[
    "class", "namespace", "template", "typename", "public", "private", "protected", "virtual",
    "override", "new", "delete", "this", "using", "nullptr", "true", "false", "bool", "auto",
    "std", "string", "vector", "cout", "endl",
];

const RUBY: &[&str] = &[
    "BEGIN", "END", "alias", "and", "begin", "break", "case", "class", "def", "defined",
    "do", "else", "elsif", "end", "ensure", "false", "for", "if", "in", "module", "next",
    "nil", "not", "or", "redo", "rescue", "retry", "return", "self", "super", "then", "true",
    "undef", "unless", "until", "when", "while", "yield", "puts", "require", "attr_accessor",
];

const COMMON_LIBS: &[&str] = &[
    // Rust crates
    "std", "tokio", "async_std", "reqwest", "serde", "serde_json", "anyhow", "thiserror",
    "tracing", "log", "clap", "chrono", "regex", "lazy_static", "once_cell", "parking_lot",
    "crossbeam",
    // Python packages
    "os", "sys", "json", "re", "datetime", "collections", "itertools", "requests", "numpy",
    "pandas", "flask", "django",
    // JavaScript/Node packages
    "fs", "path", "http", "https", "crypto", "express", "react", "axios", "lodash", "moment",
    // Go packages
    "fmt", "io", "net", "context", "sync",
];

/// Lookup table of identifiers that are public in a given language.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    keywords: HashMap<Language, HashSet<&'static str>>,
    common_libs: HashSet<&'static str>,
    all: HashSet<&'static str>,
}

impl KeywordTable {
    pub fn new() -> Self {
        let mut keywords: HashMap<Language, HashSet<&'static str>> = HashMap::new();
        keywords.insert(Language::Rust, RUST.iter().copied().collect());
        keywords.insert(Language::Python, PYTHON.iter().copied().collect());
        keywords.insert(Language::JavaScript, JAVASCRIPT.iter().copied().collect());
        keywords.insert(
            Language::TypeScript,
            JAVASCRIPT.iter().chain(TYPESCRIPT).copied().collect(),
        );
        keywords.insert(Language::Go, GO.iter().copied().collect());
        keywords.insert(Language::Java, JAVA.iter().copied().collect());
        keywords.insert(Language::C, C_FAMILY.iter().copied().collect());
        keywords.insert(Language::Cpp, C_FAMILY.iter().chain(CPP).copied().collect());
        keywords.insert(Language::Ruby, RUBY.iter().copied().collect());

        let all = keywords.values().flatten().copied().collect();

        Self {
            keywords,
            common_libs: COMMON_LIBS.iter().copied().collect(),
            all,
        }
    }

    /// Whether `word` is a keyword, builtin or well-known library name.
    ///
    /// Without a language hint every table is consulted.
    pub fn is_public(&self, word: &str, language: Language) -> bool {
        if self.common_libs.contains(word) {
            return true;
        }
        match self.keywords.get(&language) {
            Some(table) => table.contains(word),
            None => self.all.contains(word),
        }
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new()
    }
}
