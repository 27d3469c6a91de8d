//! Declaration outlines for context files.
//!
//! A skeleton keeps imports, declaration headers and the comments or
//! attributes directly above them, and collapses every body to
//! [`ELISION`]. Every emitted line comes from a distinct source line, so a
//! skeleton is never longer than its input. Files whose brackets do not
//! balance, and languages without a strategy, come back unchanged.

use lazy_static::lazy_static;
use regex::Regex;

pub const ELISION: &str = "...";

lazy_static! {
    static ref IMPORT_LINE: Regex = Regex::new(
        r#"^(import\b|use\s|pub(\([^)]*\))?\s+use\s|extern\s+crate\b|package\s|using\s|#\s*include\b|#\s*import\b|require_once\b|require\s*\(|export\s*\*|export\s+(type\s+)?\{[^}]*\}\s*from\b|(const|let|var)\s+[^=]+=\s*require\s*\()"#
    )
    .unwrap();
    static ref CONTAINER: Regex = Regex::new(
        r"^((export|default|declare|pub(\([^)]*\))?|public|private|protected|internal|static|final|abstract|sealed|partial|open|data|inner|unsafe|enum)\s+)*(class|interface|trait|impl|mod|namespace|module|enum|struct|union|record|object|extension|protocol)(\s|<|\{|$)|^type\s+\w+(\[[^\]]*\])?\s+(struct|interface)\b|^(export\s+)?type\s+[\w$]+(<[^>]*>)?\s*=\s*\{"
    )
    .unwrap();
    static ref DECLARATION: Regex = Regex::new(
        r#"^(export\b|((default|declare|pub(\([^)]*\))?|public|private|protected|internal|static|final|abstract|async|unsafe|const|extern(\s+"[^"]*")?|inline|override|suspend|open)\s+)*(fn|fun|func|function\*?|type|interface|enum|namespace|trait|impl|mod|struct|union|macro_rules!|static|const|let|var)\b)"#
    )
    .unwrap();
    static ref C_FUNCTION: Regex =
        Regex::new(r"^([\w\*&:<>,~]+\s+)+[\*&]*[\w:~]+\s*\(").unwrap();
    static ref HEADER_CONTINUATION: Regex =
        Regex::new(r"^(where\b|[:)\]>{]|->|=>|extends\b|implements\b|throws\b|[\w$]+\??\s*[:,]|[&|])").unwrap();
    static ref TYPE_ALIAS: Regex = Regex::new(r"^(export\s+)?(declare\s+)?type\s").unwrap();
    static ref PY_DEF: Regex = Regex::new(r"^(async\s+)?def\s").unwrap();
    static ref PY_IMPORT: Regex = Regex::new(r"^(import|from)\s").unwrap();
    static ref PY_MEMBER: Regex = Regex::new(r"^[A-Za-z_]\w*\s*(:[^=]+)?=|^[A-Za-z_]\w*\s*:\s*\S").unwrap();
    static ref PY_CONSTANT: Regex = Regex::new(r"^([A-Z_][A-Z0-9_]*|__all__)\s*(:[^=]+)?=").unwrap();
}

const CONTROL_KEYWORDS: &[&str] = &[
    "return", "new", "else", "if", "for", "while", "switch", "case", "do", "try", "catch", "throw",
    "await", "yield", "delete", "typeof", "sizeof", "goto",
];

#[derive(Debug, Clone, Copy)]
struct Syntax {
    line_comment: &'static str,
    block_comments: bool,
    single_quote_strings: bool,
    multiline_backticks: bool,
    triple_quotes: bool,
}

const C_LIKE: Syntax = Syntax {
    line_comment: "//",
    block_comments: true,
    single_quote_strings: true,
    multiline_backticks: false,
    triple_quotes: false,
};

const SCRIPT: Syntax = Syntax {
    multiline_backticks: true,
    ..C_LIKE
};

const RUST: Syntax = Syntax {
    single_quote_strings: false,
    ..C_LIKE
};

const PYTHON: Syntax = Syntax {
    line_comment: "#",
    block_comments: false,
    single_quote_strings: true,
    multiline_backticks: false,
    triple_quotes: true,
};

fn syntax_for(extension: &str) -> Option<Syntax> {
    match extension {
        "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" | "mts" | "cts" | "go" => Some(SCRIPT),
        "rs" => Some(RUST),
        "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "java" | "kt" | "kts" | "cs" | "swift"
        | "scala" | "php" | "dart" => Some(C_LIKE),
        "py" | "pyi" => Some(PYTHON),
        _ => None,
    }
}

/// Whether [`to_skeleton`] has a strategy for this lowercase extension.
pub fn supports(extension: &str) -> bool {
    syntax_for(extension).is_some()
}

/// Outline of `text`, or `text` itself when no outline can be produced.
pub fn to_skeleton(text: &str, extension: Option<&str>) -> String {
    let outline = match extension.and_then(syntax_for) {
        Some(syntax) if syntax.triple_quotes => outline_indented(text),
        Some(syntax) => outline_braces(text, syntax),
        None => None,
    };
    outline.unwrap_or_else(|| text.to_string())
}

/// Strips string literals and comments, reporting bracket characters.
struct Scanner {
    syntax: Syntax,
    in_block_comment: bool,
    open_literal: Option<&'static str>,
}

impl Scanner {
    fn new(syntax: Syntax) -> Self {
        Scanner {
            syntax,
            in_block_comment: false,
            open_literal: None,
        }
    }

    fn in_literal(&self) -> bool {
        self.in_block_comment || self.open_literal.is_some()
    }

    fn brackets(&mut self, line: &str) -> Vec<(usize, char)> {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut found = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let (pos, c) = chars[i];
            let rest = &line[pos..];

            if let Some(close) = self.open_literal {
                if c == '\\' {
                    i += 2;
                } else if rest.starts_with(close) {
                    self.open_literal = None;
                    i += close.len();
                } else {
                    i += 1;
                }
                continue;
            }
            if self.in_block_comment {
                if rest.starts_with("*/") {
                    self.in_block_comment = false;
                    i += 2;
                } else {
                    i += 1;
                }
                continue;
            }

            if rest.starts_with(self.syntax.line_comment) {
                break;
            }
            if self.syntax.block_comments && rest.starts_with("/*") {
                self.in_block_comment = true;
                i += 2;
                continue;
            }
            if self.syntax.triple_quotes {
                if rest.starts_with("\"\"\"") {
                    self.open_literal = Some("\"\"\"");
                    i += 3;
                    continue;
                }
                if rest.starts_with("'''") {
                    self.open_literal = Some("'''");
                    i += 3;
                    continue;
                }
            }

            i = match c {
                '"' => skip_string(&chars, i, '"'),
                '\'' if self.syntax.single_quote_strings => skip_string(&chars, i, '\''),
                '\'' => skip_char_literal(&chars, i),
                '`' if self.syntax.multiline_backticks => {
                    self.open_literal = Some("`");
                    i + 1
                }
                '{' | '}' | '(' | ')' | '[' | ']' => {
                    found.push((pos, c));
                    i + 1
                }
                _ => i + 1,
            };
        }
        found
    }
}

fn skip_string(chars: &[(usize, char)], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// `'x'` and `'\n'` are literals; anything else is a lifetime tick.
fn skip_char_literal(chars: &[(usize, char)], start: usize) -> usize {
    match chars.get(start + 1).map(|c| c.1) {
        Some('\\') => (start + 2..chars.len().min(start + 12))
            .find(|&j| chars[j].1 == '\'')
            .map(|j| j + 1)
            .unwrap_or(start + 1),
        Some(_) if chars.get(start + 2).map(|c| c.1) == Some('\'') => start + 3,
        _ => start + 1,
    }
}

/// Kept lines plus comments waiting to see whether a declaration follows.
#[derive(Default)]
struct Outline {
    lines: Vec<String>,
    pending: Vec<String>,
}

impl Outline {
    fn keep(&mut self, line: &str) {
        self.lines.append(&mut self.pending);
        self.lines.push(line.to_string());
    }

    fn pend(&mut self, line: &str) {
        self.pending.push(line.to_string());
    }

    fn discard(&mut self) {
        self.pending.clear();
    }

    fn blank(&mut self) {
        self.pending.clear();
        if self.lines.last().map(|l| !l.trim().is_empty()).unwrap_or(false) {
            self.lines.push(String::new());
        }
    }

    fn finish(mut self, original: &str) -> String {
        while self.lines.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            if original.trim().is_empty() {
                return original.to_string();
            }
            self.lines.push(ELISION.to_string());
        }
        let mut out = self.lines.join("\n");
        if original.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Outline,
    /// Inside an elided body; resumes once depth falls back to `until`.
    Skip { until: i64 },
    /// Inside a multi-line import, kept verbatim.
    Import { until: i64, parens: i64 },
    /// Inside an elided initializer; ends at `;` or when indentation
    /// returns to the declaration's.
    Value { until: i64, parens: i64, indent: usize },
}

#[derive(Debug, Clone, Copy)]
struct Header {
    container: bool,
    alias: bool,
    parens: i64,
    incomplete: bool,
    /// The last header line leaves an initializer or arrow body open.
    value: bool,
    indent: usize,
}

fn incomplete(trimmed: &str, parens: i64) -> bool {
    parens > 0
        || ["(", ",", "=", "=>", "<", "|", "&", ":", "->"]
            .iter()
            .any(|end| trimmed.ends_with(end))
}

fn opens_value(trimmed: &str) -> bool {
    trimmed.ends_with("=>")
        || (trimmed.ends_with('=')
            && !["==", "!=", "<=", ">="].iter().any(|op| trimmed.ends_with(op)))
}

fn is_declaration(trimmed: &str) -> bool {
    if DECLARATION.is_match(trimmed) || CONTAINER.is_match(trimmed) {
        return true;
    }
    let first = trimmed
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("");
    C_FUNCTION.is_match(trimmed) && !CONTROL_KEYWORDS.contains(&first) && !trimmed.contains('=')
}

fn is_annotation(trimmed: &str, opens: bool) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with("#[")
        || trimmed.starts_with("#!")
        || (trimmed.starts_with('@') && !opens)
}

fn outline_braces(text: &str, syntax: Syntax) -> Option<String> {
    let mut scanner = Scanner::new(syntax);
    let mut out = Outline::default();
    let mut depth: i64 = 0;
    let mut containers: Vec<i64> = Vec::new();
    let mut mode = Mode::Outline;
    let mut header: Option<Header> = None;

    for line in text.lines() {
        let inside_literal = scanner.in_literal();
        let marks = scanner.brackets(line);
        let start = depth;
        let mut open_at = None;
        let mut parens = 0i64;
        for &(pos, c) in &marks {
            match c {
                '{' => {
                    if open_at.is_none() && depth == start {
                        open_at = Some(pos);
                    }
                    depth += 1;
                }
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return None;
                    }
                }
                '(' => parens += 1,
                ')' => parens -= 1,
                _ => {}
            }
        }

        match mode {
            Mode::Skip { until } => {
                if depth <= until {
                    mode = Mode::Outline;
                }
                continue;
            }
            Mode::Import { until, parens: open } => {
                out.keep(line);
                let open = open + parens;
                mode = if depth <= until && open <= 0 {
                    Mode::Outline
                } else {
                    Mode::Import { until, parens: open }
                };
                continue;
            }
            Mode::Value {
                until,
                parens: open,
                indent,
            } => {
                let trimmed = line.trim();
                let ended = start <= until
                    && open <= 0
                    && !inside_literal
                    && (trimmed.is_empty()
                        || (indent_width(line) <= indent
                            && !trimmed.starts_with(|c: char| ".?:+-*/&|=,)]}".contains(c))));
                if !ended {
                    let open = open + parens;
                    mode = if depth <= until && open <= 0 && trimmed.ends_with(';') {
                        Mode::Outline
                    } else {
                        Mode::Value {
                            until,
                            parens: open,
                            indent,
                        }
                    };
                    continue;
                }
                mode = Mode::Outline;
            }
            Mode::Outline => {}
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.blank();
            header = None;
            continue;
        }
        if inside_literal && !scanner.in_block_comment && !trimmed.starts_with('*') {
            // Continuation of a multi-line string at outline level.
            if header.is_some() {
                out.keep(line);
            }
            continue;
        }
        if inside_literal || is_annotation(trimmed, open_at.is_some()) {
            out.pend(line);
            continue;
        }

        if open_at.is_none() && depth < start {
            let mut closed = false;
            while containers.last().map(|&c| depth <= c).unwrap_or(false) {
                containers.pop();
                closed = true;
            }
            if closed {
                out.discard();
                out.keep(line);
                header = None;
                continue;
            }
        }

        if header.is_none() && IMPORT_LINE.is_match(trimmed) {
            out.keep(line);
            if depth > start || parens > 0 {
                mode = Mode::Import {
                    until: start,
                    parens,
                };
            }
            continue;
        }

        if let Some(h) = header {
            let continues = h.parens > 0 || h.incomplete || HEADER_CONTINUATION.is_match(trimmed);
            if !continues {
                header = None;
            } else if h.value && !h.container && !trimmed.starts_with('{') {
                header = None;
                out.keep(&format!("{}{}", leading_whitespace(line), ELISION));
                let open = h.parens + parens;
                if depth > start || open > 0 || !trimmed.ends_with(';') {
                    mode = Mode::Value {
                        until: start,
                        parens: open,
                        indent: h.indent,
                    };
                }
                continue;
            }
        }

        let in_container = start > 0;
        if let Some(pos) = open_at {
            let container = match header {
                Some(h) => h.container,
                None => CONTAINER.is_match(trimmed),
            };
            let declared = header.is_some() || in_container || is_declaration(trimmed);
            header = None;

            if container && declared {
                out.keep(line);
                if depth > start {
                    containers.push(start);
                }
                continue;
            }
            if declared {
                out.keep(&format!("{} {} }}", &line[..=pos], ELISION));
            } else {
                out.discard();
            }
            if depth > start {
                mode = Mode::Skip { until: start };
            }
            continue;
        }

        if let Some(h) = header.as_mut() {
            out.keep(line);
            h.parens += parens;
            h.incomplete = incomplete(trimmed, h.parens);
            h.value = !h.alias && opens_value(trimmed);
            if trimmed.ends_with(';') {
                header = None;
            }
            continue;
        }

        if in_container {
            out.keep(line);
            continue;
        }

        if is_declaration(trimmed) {
            out.keep(line);
            if !trimmed.ends_with(';') && !trimmed.ends_with('}') {
                let alias = TYPE_ALIAS.is_match(trimmed);
                header = Some(Header {
                    container: CONTAINER.is_match(trimmed),
                    alias,
                    parens,
                    incomplete: incomplete(trimmed, parens),
                    value: !alias && opens_value(trimmed),
                    indent: indent_width(line),
                });
            }
            continue;
        }

        out.discard();
    }

    let unfinished = matches!(mode, Mode::Skip { .. } | Mode::Import { .. });
    if depth != 0 || unfinished || scanner.in_literal() {
        return None;
    }
    Some(out.finish(text))
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 8 } else { 1 })
        .sum()
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Byte offset of the colon ending a `def`/`class` header, ignoring colons
/// nested in brackets or strings.
fn header_colon(trimmed: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in trimmed.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ':' if depth == 0 => return Some(i),
            '#' => return None,
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, Copy)]
struct Body {
    header_indent: usize,
    marked: bool,
}

#[derive(Debug, Clone, Copy)]
struct PyHeader {
    indent: usize,
    class: bool,
}

fn outline_indented(text: &str) -> Option<String> {
    let mut scanner = Scanner::new(PYTHON);
    let mut out = Outline::default();
    let mut depth: i64 = 0;
    let mut classes: Vec<usize> = Vec::new();
    let mut body: Option<Body> = None;
    let mut header: Option<PyHeader> = None;
    let mut continuation = false;
    let mut pending_open = false;

    for line in text.lines() {
        let inside_literal = scanner.in_literal();
        let marks = scanner.brackets(line);
        let start = depth;
        for &(_, c) in &marks {
            match c {
                '(' | '[' | '{' => depth += 1,
                _ => depth -= 1,
            }
            if depth < 0 {
                return None;
            }
        }
        let trimmed = line.trim();
        let indent = indent_width(line);

        if let Some(h) = header {
            out.keep(line);
            if depth == 0 && trimmed.ends_with(':') {
                header = None;
                if h.class {
                    classes.push(h.indent);
                } else {
                    body = Some(Body {
                        header_indent: h.indent,
                        marked: false,
                    });
                }
            }
            continue;
        }
        if continuation {
            out.keep(line);
            continuation = depth > 0;
            continue;
        }

        if let Some(b) = body.as_mut() {
            if inside_literal || start > 0 || trimmed.is_empty() || indent > b.header_indent {
                if !b.marked && !trimmed.is_empty() {
                    out.keep(&format!("{}{}", leading_whitespace(line), ELISION));
                    b.marked = true;
                }
                continue;
            }
            body = None;
        }

        if inside_literal || start > 0 {
            if pending_open {
                out.pend(line);
                pending_open = depth > 0;
            }
            continue;
        }
        pending_open = false;

        if trimmed.is_empty() {
            out.blank();
            continue;
        }
        while classes.last().map(|&c| indent <= c).unwrap_or(false) {
            classes.pop();
        }

        if trimmed.starts_with('#') || trimmed.starts_with('@') {
            out.pend(line);
            pending_open = depth > 0;
            continue;
        }

        if PY_IMPORT.is_match(trimmed) {
            out.keep(line);
            continuation = depth > 0;
            continue;
        }

        let class = trimmed.starts_with("class ") || trimmed.starts_with("class(");
        if class || PY_DEF.is_match(trimmed) {
            match header_colon(trimmed) {
                Some(pos) => {
                    let rest = trimmed[pos + 1..].trim();
                    if rest.is_empty() || rest.starts_with('#') {
                        out.keep(line);
                        if class {
                            classes.push(indent);
                        } else {
                            body = Some(Body {
                                header_indent: indent,
                                marked: false,
                            });
                        }
                    } else if class {
                        out.keep(line);
                    } else {
                        out.keep(&format!(
                            "{}{} {}",
                            leading_whitespace(line),
                            &trimmed[..=pos],
                            ELISION
                        ));
                    }
                }
                None if depth > 0 => {
                    out.keep(line);
                    header = Some(PyHeader { indent, class });
                }
                None => out.keep(line),
            }
            continue;
        }

        let member = classes.last().map(|&c| indent > c).unwrap_or(false) && PY_MEMBER.is_match(trimmed);
        let constant = indent == 0 && PY_CONSTANT.is_match(trimmed);
        if member || constant {
            out.keep(line);
            continuation = depth > 0;
            continue;
        }

        out.discard();
    }

    if depth != 0 || scanner.in_literal() || header.is_some() {
        return None;
    }
    Some(out.finish(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TS_SOURCE: &str = r#"import { b } from './b';
import {
  c,
  d,
} from './cd';

/** Adds numbers. */
export function add(x: number, y: number): number {
  const secretSauce = x + y;
  return secretSauce;
}

const internal = 5;
console.log(internal);

export class Counter {
  private count = 0;

  increment(): void {
    this.count += 1;
  }

  get value(): number { return this.count; }
}

export interface Shape {
  area(): number;
}

export const double = (n: number) => {
  return n * 2;
};
"#;

    #[test]
    fn test_typescript_outline() {
        let skeleton = to_skeleton(TS_SOURCE, Some("ts"));

        assert!(skeleton.contains("import { b } from './b';"));
        assert!(skeleton.contains("  d,\n} from './cd';"));
        assert!(skeleton.contains("/** Adds numbers. */\nexport function add(x: number, y: number): number { ... }"));
        assert!(skeleton.contains("export class Counter {"));
        assert!(skeleton.contains("  private count = 0;"));
        assert!(skeleton.contains("  increment(): void { ... }"));
        assert!(skeleton.contains("  get value(): number { ... }"));
        assert!(skeleton.contains("  area(): number;"));
        assert!(skeleton.contains("export const double = (n: number) => { ... }"));

        assert!(!skeleton.contains("secretSauce"));
        assert!(!skeleton.contains("this.count += 1"));
        assert!(!skeleton.contains("console.log"));
        assert!(skeleton.lines().count() <= TS_SOURCE.lines().count());
    }

    #[test]
    fn test_wrapped_initializers_are_elided() {
        let source = r#"export const sum = (a: number, b: number) =>
  a + SECRET_SALT + b;

export const token =
 computeHiddenToken(k);

export const pipeline = (xs: number[]) =>
  xs
    .map(hiddenStep)
    .filter(Boolean)
export type Handler =
  (req: Request) => void;
"#;
        let skeleton = to_skeleton(source, Some("ts"));

        assert!(skeleton.contains("export const sum = (a: number, b: number) =>\n  ..."));
        assert!(skeleton.contains("export const token =\n ..."));
        assert!(skeleton.contains("export const pipeline = (xs: number[]) =>\n  ...\nexport type Handler ="));
        assert!(skeleton.contains("  (req: Request) => void;"));
        assert!(!skeleton.contains("SECRET_SALT"));
        assert!(!skeleton.contains("computeHiddenToken"));
        assert!(!skeleton.contains("hiddenStep"));
        assert!(skeleton.lines().count() <= source.lines().count());
    }

    #[test]
    fn test_rust_outline() {
        let source = r#"use std::fmt;

/// A point.
#[derive(Debug)]
pub struct Point<'a> {
    pub name: &'a str,
}

impl<'a> Point<'a> {
    pub fn new(name: &'a str) -> Self {
        let brace = '{';
        Point { name }
    }
}

fn generic<T>(value: T) -> T
where
    T: Clone,
{
    value.clone()
}
"#;
        let skeleton = to_skeleton(source, Some("rs"));
        assert!(skeleton.contains("use std::fmt;"));
        assert!(skeleton.contains("/// A point.\n#[derive(Debug)]\npub struct Point<'a> {"));
        assert!(skeleton.contains("    pub name: &'a str,"));
        assert!(skeleton.contains("impl<'a> Point<'a> {"));
        assert!(skeleton.contains("    pub fn new(name: &'a str) -> Self { ... }"));
        assert!(skeleton.contains("where\n    T: Clone,\n{ ... }"));
        assert!(!skeleton.contains("let brace"));
        assert!(!skeleton.contains("value.clone()"));
    }

    #[test]
    fn test_python_outline() {
        let source = r#"import os
from typing import (
    List,
)

MAX_ITEMS = 10
counter = 0

# Service entry point.
@dataclass
class Service:
    name: str = "svc"

    def run(self, items: List[str]) -> int:
        total = len(items)
        return total

    async def stop(self): return None


def helper(
    a,
    b,
):
    """Docstring."""
    return a + b
"#;
        let skeleton = to_skeleton(source, Some("py"));
        assert!(skeleton.contains("import os"));
        assert!(skeleton.contains("from typing import (\n    List,\n)"));
        assert!(skeleton.contains("MAX_ITEMS = 10"));
        assert!(!skeleton.contains("counter = 0"));
        assert!(skeleton.contains("# Service entry point.\n@dataclass\nclass Service:"));
        assert!(skeleton.contains("    name: str = \"svc\""));
        assert!(skeleton.contains("    def run(self, items: List[str]) -> int:\n        ..."));
        assert!(skeleton.contains("    async def stop(self): ..."));
        assert!(skeleton.contains("def helper(\n    a,\n    b,\n):\n    ..."));
        assert!(!skeleton.contains("total"));
        assert!(!skeleton.contains("Docstring"));
        assert!(!skeleton.contains("a + b"));
    }

    #[test]
    fn test_unbalanced_input_is_returned_unchanged() {
        let source = "export function broken() {\n  if (x) {\n    return 1;\n}\n";
        assert_eq!(to_skeleton(source, Some("ts")), source);

        let python = "def f(:\n    pass\n";
        assert_eq!(to_skeleton(python, Some("py")), python);
    }

    #[test]
    fn test_unsupported_extension_is_unchanged() {
        let source = "# Title\n\nSome { text\n";
        assert_eq!(to_skeleton(source, Some("md")), source);
        assert_eq!(to_skeleton(source, None), source);
    }

    #[test]
    fn test_strings_and_comments_do_not_count_braces() {
        let source = "const open = \"{\";\n// }\nexport function f() {\n  return `${open} {`;\n}\n";
        let skeleton = to_skeleton(source, Some("js"));
        assert!(skeleton.contains("export function f() { ... }"));
        assert!(!skeleton.contains("return"));
    }

    #[test]
    fn test_script_without_declarations_collapses() {
        let source = "console.log('hi');\nrun();\n";
        assert_eq!(to_skeleton(source, Some("js")), "...\n");
    }

    #[test]
    fn test_c_function_definitions() {
        let source = "#include \"util.h\"\n\nstatic int add(int a, int b)\n{\n    return a + b;\n}\n\nint main(void) {\n    if (add(1, 2)) {\n        return 0;\n    }\n    return 1;\n}\n";
        let skeleton = to_skeleton(source, Some("c"));
        assert!(skeleton.contains("#include \"util.h\""));
        assert!(skeleton.contains("static int add(int a, int b)\n{ ... }"));
        assert!(skeleton.contains("int main(void) { ... }"));
        assert!(!skeleton.contains("return 0"));
    }

    proptest! {
        #[test]
        fn test_skeleton_never_grows(lines in proptest::collection::vec("[a-z (){};:=,'\"]{0,24}", 0..40), ext in "(ts|rs|py|c|go)") {
            let text = lines.join("\n");
            let skeleton = to_skeleton(&text, Some(&ext));
            prop_assert!(skeleton.lines().count() <= text.lines().count());
        }
    }
}
