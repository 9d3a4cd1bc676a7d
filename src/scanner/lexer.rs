//! Grammar-free lexer splitting source text into typed spans.
//!
//! Scanning is layered: comments and string/number literals are recognized
//! first by delimiter matching (honoring backslash escapes), and whatever is
//! left is split into identifier-like runs and structural punctuation.
//!
//! The lexer never fails. Unterminated single-line literals extend to the end
//! of the line, unterminated block constructs to the end of the input, and
//! the produced spans always tile the input exactly.

use crate::models::{HashComments, Language, Span, SpanKind};
use regex::Regex;
use std::sync::OnceLock;

/// Identifier-like runs at least this long that mix letters and digits are
/// reported as secret candidates.
const CREDENTIAL_RUN_MIN_LEN: usize = 16;

const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_END: &str = "-----END ";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
            .expect("email pattern is valid")
    })
}

/// Scan text with no language hint.
pub fn scan(text: &str) -> Vec<Span> {
    scan_with(text, Language::Unknown)
}

/// Scan text using the lexical conventions of `language`.
pub fn scan_with(text: &str, language: Language) -> Vec<Span> {
    let mut lexer = Lexer::new(text, language);
    lexer.run();
    lexer.spans
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_bracket(c: char) -> bool {
    matches!(c, '(' | ')' | '{' | '}' | '[' | ']')
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    language: Language,
    spans: Vec<Span>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, language: Language) -> Self {
        Self {
            src,
            pos: 0,
            language,
            spans: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn emit(&mut self, start: usize, kind: SpanKind) {
        if self.pos > start {
            self.spans.push(Span::new(self.src, start..self.pos, kind));
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            let start = self.pos;

            if c.is_whitespace() {
                self.consume_while(char::is_whitespace);
                self.emit(start, SpanKind::Structural);
            } else if self.at_comment_start() {
                self.lex_comment();
                self.emit(start, SpanKind::Comment);
            } else if self.rest().starts_with(PEM_BEGIN) {
                self.lex_pem_block();
                self.emit(start, SpanKind::SecretCandidate);
            } else if let Some(prefix_len) = self.string_start() {
                self.pos += prefix_len;
                self.lex_string(prefix_len);
                self.emit(start, SpanKind::StringLiteral);
            } else if c.is_ascii_digit() {
                self.lex_number();
                self.emit(start, SpanKind::NumberLiteral);
            } else if let Some(m) = email_regex().find(self.rest()) {
                self.pos += m.end();
                self.emit(start, SpanKind::SecretCandidate);
            } else if is_ident_start(c) {
                self.consume_while(is_ident_continue);
                let kind = if looks_like_credential(&self.src[start..self.pos]) {
                    SpanKind::SecretCandidate
                } else {
                    SpanKind::Identifier
                };
                self.emit(start, kind);
            } else if is_bracket(c) {
                self.pos += c.len_utf8();
                self.emit(start, SpanKind::Structural);
            } else {
                self.lex_punctuation();
                self.emit(start, SpanKind::Structural);
            }
        }
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn at_comment_start(&self) -> bool {
        let rest = self.rest();
        if self.language.has_c_comments() && (rest.starts_with("//") || rest.starts_with("/*")) {
            return true;
        }
        if !rest.starts_with('#') {
            return false;
        }
        match self.language.hash_comments() {
            HashComments::Always => true,
            HashComments::Never => false,
            HashComments::Heuristic => match self.peek_nth(1) {
                None => true,
                Some(next) if next.is_whitespace() || next == '#' => true,
                Some('!') => self.pos == 0,
                _ => false,
            },
        }
    }

    fn lex_comment(&mut self) {
        if self.rest().starts_with("/*") {
            self.lex_block_comment();
        } else {
            self.skip_to_line_end();
        }
    }

    fn skip_to_line_end(&mut self) {
        self.pos = self.rest().find('\n').map_or(self.src.len(), |i| self.pos + i);
    }

    fn lex_block_comment(&mut self) {
        let nested = self.language.nested_block_comments();
        let mut depth = 0usize;
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("/*") && (nested || depth == 0) {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("*/") {
                self.pos += 2;
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else if let Some(c) = self.peek() {
                self.pos += c.len_utf8();
            }
        }
    }

    fn lex_pem_block(&mut self) {
        let rest = self.rest();
        let end = rest.find(PEM_END).and_then(|end_hdr| {
            let after = end_hdr + PEM_END.len();
            rest[after..].find("-----").map(|close| after + close + "-----".len())
        });
        match end {
            Some(len) => self.pos += len,
            None => self.skip_to_line_end(),
        }
    }

    /// If a string literal starts here, the byte length of its prefix
    /// (`r`, `b`, `f`, `br`, ...), zero when unprefixed.
    fn string_start(&self) -> Option<usize> {
        let mut prefix_len = 0;
        let mut chars = self.rest().chars();
        let mut next = chars.next();

        while let Some(c) = next {
            if prefix_len < 2 && matches!(c, 'r' | 'R' | 'b' | 'B' | 'f' | 'F' | 'u' | 'U') {
                prefix_len += 1;
                next = chars.next();
            } else {
                break;
            }
        }

        let opener = next?;
        let raw_hash = opener == '#'
            && prefix_len > 0
            && self.language.raw_strings()
            && self.rest()[..prefix_len].contains(['r', 'R'])
            && self.rest()[prefix_len..].trim_start_matches('#').starts_with('"');
        let is_quote = match opener {
            '"' => true,
            '`' => prefix_len == 0 && self.language.backtick_strings(),
            '\'' => self.language.single_quote_strings() || self.is_rust_char_literal(prefix_len),
            _ => raw_hash,
        };
        if !is_quote {
            return None;
        }
        // An identifier like `bar"` must not lose its leading letters.
        if prefix_len > 0 && !self.prefix_is_standalone() {
            return None;
        }
        Some(prefix_len)
    }

    fn prefix_is_standalone(&self) -> bool {
        self.src[..self.pos]
            .chars()
            .next_back()
            .map_or(true, |c| !is_ident_continue(c))
    }

    fn is_rust_char_literal(&self, prefix_len: usize) -> bool {
        let body = &self.rest()[prefix_len + 1..];
        let mut chars = body.chars();
        match chars.next() {
            Some('\\') => body.find('\'').is_some_and(|i| i <= 10),
            Some(c) if c != '\'' => chars.next() == Some('\''),
            _ => false,
        }
    }

    /// Lex a string literal whose prefix (`prefix_len` bytes) has been consumed.
    fn lex_string(&mut self, prefix_len: usize) {
        let rest = self.rest();
        let prefix = &self.src[self.pos - prefix_len..self.pos];
        if self.language.raw_strings() && prefix.contains(['r', 'R']) {
            self.lex_raw_string();
            return;
        }

        let quote = match self.peek() {
            Some(q) => q,
            None => return,
        };

        if self.language.triple_quoted_strings() && (quote == '"' || quote == '\'') {
            let triple: String = std::iter::repeat(quote).take(3).collect();
            if rest.starts_with(&triple) {
                self.pos += 3;
                self.lex_until(&triple, true);
                return;
            }
        }

        self.pos += quote.len_utf8();
        let multiline = quote == '`' || (quote == '"' && self.language == Language::Rust);
        self.lex_until(&quote.to_string(), multiline);
    }

    fn lex_raw_string(&mut self) {
        let hashes = self.rest().chars().take_while(|&c| c == '#').count();
        self.pos += hashes;
        if self.peek() != Some('"') {
            return;
        }
        self.pos += 1;
        let closing = format!("\"{}", "#".repeat(hashes));
        match self.rest().find(&closing) {
            Some(i) => self.pos += i + closing.len(),
            None => self.pos = self.src.len(),
        }
    }

    /// Advance past `closing`, honoring backslash escapes. Without
    /// `multiline`, an unescaped newline ends the literal (left unconsumed).
    fn lex_until(&mut self, closing: &str, multiline: bool) {
        while let Some(c) = self.peek() {
            if self.rest().starts_with(closing) {
                self.pos += closing.len();
                return;
            }
            match c {
                '\\' => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        self.pos += escaped.len_utf8();
                    }
                }
                '\n' if !multiline => return,
                _ => self.pos += c.len_utf8(),
            }
        }
    }

    fn lex_number(&mut self) {
        let rest = self.rest();
        if rest.len() > 1 && rest.starts_with('0') && matches!(self.peek_nth(1), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O')) {
            self.pos += 2;
            self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
            return;
        }

        self.consume_while(|c| c.is_ascii_digit() || c == '_');

        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            self.consume_while(|c| c.is_ascii_digit() || c == '_');
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                self.consume_while(|c| c.is_ascii_digit());
            }
        }

        // Type suffixes such as `u32`, `f64`, `L`, `n`.
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
    }

    fn lex_punctuation(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
        while let Some(c) = self.peek() {
            if c.is_whitespace()
                || is_ident_continue(c)
                || is_bracket(c)
                || self.at_comment_start()
                || self.rest().starts_with(PEM_BEGIN)
                || self.string_start().is_some()
            {
                break;
            }
            self.pos += c.len_utf8();
        }
    }
}

/// Long runs mixing letters and digits are shaped like tokens and keys.
fn looks_like_credential(run: &str) -> bool {
    run.chars().count() >= CREDENTIAL_RUN_MIN_LEN
        && run.chars().any(|c| c.is_ascii_digit())
        && run.chars().any(char::is_alphabetic)
}
