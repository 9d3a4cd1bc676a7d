//! Approximate lexical scope tracking over a span sequence.
//!
//! Brace-delimited languages open a scope at `{` and close it at `}`.
//! A parenthesized header directly followed by a block (`f(x) {`) opens the
//! scope at its `(` instead, so parameters belong to the body they guard.
//! Indentation-delimited languages open a scope after a line ending in `:`
//! (or at the `(` of such a header line) and close it on dedent.

use super::mapping::{ScopeArena, ScopeId};
use crate::models::{Span, SpanKind};

/// Significant spans inspected after a header's `)` before giving up.
const HEADER_LOOKAHEAD: usize = 24;

/// Spans searched for the `)` matching a header's `(`.
const PAREN_SEARCH_LIMIT: usize = 1024;

/// Keywords introducing a variable binding that may shadow an outer one.
const BINDING_KEYWORDS: &[&str] = &[
    "let", "var", "const", "mut", "val", "auto", "for", "int", "long", "short", "float",
    "double", "char", "bool", "boolean", "byte", "unsigned", "string", "String",
];

/// Keywords introducing a function definition.
const FUNCTION_KEYWORDS: &[&str] = &["fn", "def", "function", "func"];

/// Header keywords whose indented body owns the names assigned in it.
const LOCAL_OWNER_KEYWORDS: &[&str] = &["def", "class", "lambda"];

/// How block structure is expressed in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Braces,
    Indentation,
}

impl BlockStyle {
    /// Guess the block style of text with no language hint.
    pub fn detect(spans: &[Span]) -> Self {
        let has_braces = spans.iter().any(|s| s.is_punct("{"));
        if has_braces {
            return BlockStyle::Braces;
        }
        let layout = Neighbors::new(spans);
        let colon_headers = spans.iter().enumerate().any(|(i, s)| {
            s.is_whitespace()
                && s.text.contains('\n')
                && layout.prev[i].is_some_and(|p| spans[p].is_punct(":"))
        });
        if colon_headers {
            BlockStyle::Indentation
        } else {
            BlockStyle::Braces
        }
    }
}

/// Indices of the nearest significant (non-trivia) spans around each span.
struct Neighbors {
    prev: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
}

impl Neighbors {
    fn new(spans: &[Span]) -> Self {
        let mut prev = vec![None; spans.len()];
        let mut next = vec![None; spans.len()];

        let mut last = None;
        for (i, span) in spans.iter().enumerate() {
            prev[i] = last;
            if !span.is_trivia() {
                last = Some(i);
            }
        }
        let mut last = None;
        for (i, span) in spans.iter().enumerate().rev() {
            next[i] = last;
            if !span.is_trivia() {
                last = Some(i);
            }
        }

        Self { prev, next }
    }
}

#[derive(Debug)]
struct Frame {
    scope: ScopeId,
    /// Indentation of the header line (indentation style only)
    indent: Option<usize>,
    /// Bare assignments in nested blocks bind here (function or class body)
    owns_locals: bool,
}

/// Forward-only scope tracker for one file.
pub struct ScopeTracker<'s> {
    spans: &'s [Span],
    style: BlockStyle,
    neighbors: Neighbors,
    frames: Vec<Frame>,
    /// `{` already accounted for by a scope opened at its header's `(`
    absorbed_brace: Option<usize>,
    /// Open and close indices of the current header's parameter list
    params: Option<(usize, usize)>,
    line_indent: usize,
    /// First significant span of the current logical line
    line_first: Option<usize>,
    at_line_start: bool,
    opened_on_line: bool,
    bracket_depth: usize,
}

impl<'s> ScopeTracker<'s> {
    pub fn new(spans: &'s [Span], style: BlockStyle, root: ScopeId) -> Self {
        Self {
            spans,
            style,
            neighbors: Neighbors::new(spans),
            frames: vec![Frame {
                scope: root,
                indent: None,
                owns_locals: false,
            }],
            absorbed_brace: None,
            params: None,
            line_indent: 0,
            line_first: None,
            at_line_start: true,
            opened_on_line: false,
            bracket_depth: 0,
        }
    }

    /// Scope spans are currently emitted into.
    pub fn current(&self) -> ScopeId {
        self.frames.last().map(|f| f.scope).unwrap_or_default()
    }

    /// Root scope of the file.
    pub fn root(&self) -> ScopeId {
        self.frames[0].scope
    }

    /// Update the scope stack for span `i`. Must be called for every span
    /// in order before the span is emitted.
    pub fn advance(&mut self, i: usize, arena: &mut ScopeArena) {
        match self.style {
            BlockStyle::Braces => self.advance_braces(i, arena),
            BlockStyle::Indentation => self.advance_indentation(i, arena),
        }
    }

    /// Whether the identifier at `i` introduces a binding in the current scope.
    pub fn is_binding(&self, i: usize) -> bool {
        let Some(prev) = self.neighbors.prev[i] else {
            return false;
        };
        let prev = &self.spans[prev];

        if prev.kind == SpanKind::Identifier && BINDING_KEYWORDS.contains(&prev.text.as_str()) {
            return true;
        }
        self.in_params(i) && (prev.is_punct("(") || prev.is_punct(","))
    }

    /// Scope the identifier at `i` binds in, if it introduces a binding.
    ///
    /// Besides keyword and parameter bindings, a `name = ...` statement in
    /// an indentation-style function or class body binds in that body, even
    /// from a nested block.
    pub fn binding_scope(&self, i: usize) -> Option<ScopeId> {
        if self.is_binding(i) {
            return Some(self.current());
        }
        if !self.is_assignment_target(i) {
            return None;
        }
        self.frames
            .iter()
            .rev()
            .find(|f| f.owns_locals)
            .map(|f| f.scope)
    }

    fn is_assignment_target(&self, i: usize) -> bool {
        self.style == BlockStyle::Indentation
            && self.line_first == Some(i)
            && self.neighbors.next[i].is_some_and(|n| self.spans[n].is_punct("="))
    }

    /// Whether the identifier at `i` names a function (called or defined).
    pub fn is_function_name(&self, i: usize) -> bool {
        if self.neighbors.next[i].is_some_and(|n| self.spans[n].is_punct("(")) {
            return true;
        }
        self.neighbors.prev[i].is_some_and(|p| {
            let prev = &self.spans[p];
            prev.kind == SpanKind::Identifier && FUNCTION_KEYWORDS.contains(&prev.text.as_str())
        })
    }

    fn in_params(&self, i: usize) -> bool {
        self.params.is_some_and(|(open, close)| open < i && i < close)
    }

    fn push(&mut self, arena: &mut ScopeArena, indent: Option<usize>) {
        let owns_locals = indent.is_some()
            && self.line_first.is_some_and(|f| {
                let first = &self.spans[f];
                first.kind == SpanKind::Identifier
                    && LOCAL_OWNER_KEYWORDS.contains(&first.text.as_str())
            });
        let scope = arena.new_child(self.current());
        self.frames.push(Frame {
            scope,
            indent,
            owns_locals,
        });
    }

    fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn advance_braces(&mut self, i: usize, arena: &mut ScopeArena) {
        let spans = self.spans;
        let span = &spans[i];
        if span.kind != SpanKind::Structural {
            return;
        }

        match span.text.as_str() {
            "(" if self.absorbed_brace.is_none() && !self.in_params(i) => {
                if let Some((close, brace)) = self.brace_header(i) {
                    self.push(arena, None);
                    self.absorbed_brace = Some(brace);
                    self.params = Some((i, close));
                }
            }
            "{" => {
                if self.absorbed_brace == Some(i) {
                    self.absorbed_brace = None;
                } else {
                    self.push(arena, None);
                }
            }
            "}" => self.pop(),
            _ => {}
        }
    }

    fn advance_indentation(&mut self, i: usize, arena: &mut ScopeArena) {
        let spans = self.spans;
        let span = &spans[i];

        if span.is_whitespace() {
            if span.text.contains('\n') && self.bracket_depth == 0 {
                let ends_with_colon = self.neighbors.prev[i]
                    .is_some_and(|p| self.spans[p].is_punct(":"));
                if ends_with_colon && !self.opened_on_line {
                    self.push(arena, Some(self.line_indent));
                }
                self.line_indent = indentation_width(&span.text);
                self.at_line_start = true;
                self.opened_on_line = false;
            }
            return;
        }
        if span.kind == SpanKind::Comment {
            return;
        }

        if self.at_line_start {
            self.at_line_start = false;
            self.line_first = Some(i);
            while self.frames.len() > 1
                && self
                    .frames
                    .last()
                    .and_then(|f| f.indent)
                    .is_some_and(|header| self.line_indent <= header)
            {
                self.pop();
            }
        }

        if span.kind != SpanKind::Structural {
            return;
        }
        match span.text.as_str() {
            "(" => {
                if self.bracket_depth == 0 && !self.opened_on_line {
                    if let Some(close) = self.colon_header(i) {
                        self.push(arena, Some(self.line_indent));
                        self.opened_on_line = true;
                        self.params = Some((i, close));
                    }
                }
                self.bracket_depth += 1;
            }
            "[" | "{" => self.bracket_depth += 1,
            ")" | "]" | "}" => self.bracket_depth = self.bracket_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (j, span) in self
            .spans
            .iter()
            .enumerate()
            .skip(open)
            .take(PAREN_SEARCH_LIMIT)
        {
            if span.is_punct("(") {
                depth += 1;
            } else if span.is_punct(")") {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
        }
        None
    }

    /// `(close, brace)` when the parenthesis at `open` heads a `{` block.
    fn brace_header(&self, open: usize) -> Option<(usize, usize)> {
        let close = self.matching_paren(open)?;
        let mut seen = 0;

        for j in close + 1..self.spans.len() {
            let span = &self.spans[j];
            if span.kind == SpanKind::Comment {
                continue;
            }
            if span.is_whitespace() {
                if span.text.contains('\n') {
                    // Allman style: the block may start on the next line.
                    let next = self.neighbors.next[j]?;
                    return self.spans[next].is_punct("{").then_some((close, next));
                }
                continue;
            }

            seen += 1;
            if seen > HEADER_LOOKAHEAD {
                return None;
            }
            if span.is_punct("{") {
                return Some((close, j));
            }
            if span.kind == SpanKind::Structural && is_header_stop(&span.text) {
                return None;
            }
        }
        None
    }

    /// Close index when the parenthesis at `open` belongs to a header line
    /// ending in `:`.
    fn colon_header(&self, open: usize) -> Option<usize> {
        let close = self.matching_paren(open)?;
        let mut last = None;

        for j in close + 1..self.spans.len() {
            let span = &self.spans[j];
            if span.is_whitespace() && span.text.contains('\n') {
                break;
            }
            if !span.is_trivia() {
                last = Some(j);
            }
            if j - close > HEADER_LOOKAHEAD * 2 {
                return None;
            }
        }
        last.filter(|&j| self.spans[j].is_punct(":")).map(|_| close)
    }
}

fn is_header_stop(text: &str) -> bool {
    text.contains(';') || matches!(text, "}" | ")" | "]" | "(" | "," | "=")
}

/// Width of the last line's leading whitespace, tabs counting to the next
/// multiple of eight.
fn indentation_width(whitespace: &str) -> usize {
    let tail = whitespace.rsplit('\n').next().unwrap_or("");
    tail.chars().fold(0, |width, c| match c {
        '\t' => (width / 8 + 1) * 8,
        _ => width + 1,
    })
}
