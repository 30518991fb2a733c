//! Comment and whitespace stripping for Lua source text
//!
//! The stripper is a small lexer rather than a line filter: it tracks quoted
//! strings and long brackets alongside comments, so a `--` inside
//! `"a -- b"` or `[[ ... ]]` is never mistaken for a comment marker.
//!
//! Lexer states:
//! - normal code, copied through
//! - line comment (`--` up to the line break), dropped
//! - block comment (`--[[ ... ]]`, `--[==[ ... ]==]`), dropped
//! - short string (`'...'`, `"..."`), copied verbatim
//! - long string (`[[ ... ]]`, `[=[ ... ]=]`), copied verbatim including line breaks
//!
//! Every surviving line is trimmed and empty lines are dropped. Lines are then
//! joined with `\n` or, in flattened mode, with a single space.

use log::trace;

use crate::{
    error::{Diagnostic, DiagnosticKind},
    types::MinifyMode,
};

/// Result of stripping one source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub text: String,
    /// Malformed constructs found along the way; none of them are fatal
    pub warnings: Vec<Diagnostic>,
}

/// Strip comments and blank lines from `source`
///
/// `MinifyMode::Off` returns the source unchanged.
pub fn strip(source: &str, mode: MinifyMode) -> Stripped {
    if !mode.is_enabled() {
        return Stripped {
            text: source.to_string(),
            warnings: Vec::new(),
        };
    }

    let mut stripper = Stripper::new(source);
    stripper.run();

    let separator = if mode.is_flattened() { " " } else { "\n" };
    Stripped {
        text: stripper.lines.join(separator),
        warnings: stripper.warnings,
    }
}

/// Drop a leading `#` line, which Lua skips only at the top of a chunk
///
/// Inside a wrapped module such a line would be a syntax error.
pub fn without_shebang(source: &str) -> &str {
    if source.starts_with('#') {
        source.find('\n').map_or("", |idx| &source[idx..])
    } else {
        source
    }
}

/// Length of the long bracket opening at `pos`, and its level
///
/// `[[` is level 0, `[=[` level 1 and so on. Returns `None` when the `[` at
/// `pos` is an ordinary index bracket.
fn long_bracket_open(bytes: &[u8], pos: usize) -> Option<(usize, usize)> {
    if bytes.get(pos) != Some(&b'[') {
        return None;
    }
    let level = bytes[pos + 1..].iter().take_while(|&&b| b == b'=').count();
    (bytes.get(pos + 1 + level) == Some(&b'[')).then_some((level + 2, level))
}

/// Check whether a long bracket of `level` closes at `pos`
fn long_bracket_closes(bytes: &[u8], pos: usize, level: usize) -> bool {
    bytes.get(pos) == Some(&b']')
        && bytes.len() > pos + level + 1
        && bytes[pos + 1..=pos + level].iter().all(|&b| b == b'=')
        && bytes[pos + level + 1] == b']'
}

fn is_special(byte: u8) -> bool {
    matches!(byte, b'\n' | b'-' | b'"' | b'\'' | b'[')
}

struct Stripper<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    /// 1-based line of `pos`
    line: usize,
    current: String,
    lines: Vec<String>,
    warnings: Vec<Diagnostic>,
}

impl<'src> Stripper<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            current: String::new(),
            lines: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn run(&mut self) {
        self.pos = self.src.len() - without_shebang(self.src).len();

        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\n' => {
                    self.end_line();
                    self.pos += 1;
                    self.line += 1;
                }
                b'-' if self.bytes.get(self.pos + 1) == Some(&b'-') => self.comment(),
                quote @ (b'"' | b'\'') => self.short_string(quote),
                b'[' => match long_bracket_open(self.bytes, self.pos) {
                    Some((open_len, level)) => self.long_string(open_len, level),
                    None => {
                        self.current.push('[');
                        self.pos += 1;
                    }
                },
                _ => self.code_run(),
            }
        }
        self.end_line();
    }

    /// Copy plain code up to the next byte that may start a token of interest
    fn code_run(&mut self) {
        let start = self.pos;
        let end = self.bytes[start + 1..]
            .iter()
            .position(|&b| is_special(b))
            .map_or(self.bytes.len(), |offset| start + 1 + offset);
        self.current.push_str(&self.src[start..end]);
        self.pos = end;
    }

    fn comment(&mut self) {
        let body = self.pos + 2;
        if let Some((open_len, level)) = long_bracket_open(self.bytes, body) {
            self.block_comment(body + open_len, level);
        } else {
            self.pos = self.find_line_end(body);
        }
    }

    fn block_comment(&mut self, body: usize, level: usize) {
        let start_line = self.line;
        trace!("block comment (level {level}) opens at line {start_line}");

        // The comment may sit between two tokens; keep them apart
        if self
            .current
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace())
        {
            self.current.push(' ');
        }

        let mut pos = body;
        while pos < self.bytes.len() {
            if self.bytes[pos] == b'\n' {
                self.end_line();
                self.line += 1;
            } else if long_bracket_closes(self.bytes, pos, level) {
                self.pos = pos + level + 2;
                return;
            }
            pos += 1;
        }

        self.warnings.push(Diagnostic::new(
            start_line,
            DiagnosticKind::UnterminatedBlockComment,
        ));
        self.pos = self.bytes.len();
    }

    fn short_string(&mut self, quote: u8) {
        let start = self.pos;
        let start_line = self.line;
        let mut pos = start + 1;
        loop {
            match self.bytes.get(pos) {
                None => {
                    self.warnings
                        .push(Diagnostic::new(start_line, DiagnosticKind::UnterminatedString));
                    break;
                }
                Some(&b'\\') => {
                    pos += 1;
                    match self.bytes.get(pos) {
                        Some(&b'\r') if self.bytes.get(pos + 1) == Some(&b'\n') => {
                            pos += 2;
                            self.line += 1;
                        }
                        Some(&b'\n') => {
                            pos += 1;
                            self.line += 1;
                        }
                        // `\z` skips the whitespace after it, line breaks included
                        Some(&b'z') => {
                            pos += 1;
                            while let Some(&b) = self.bytes.get(pos) {
                                if !(b.is_ascii_whitespace() || b == 0x0B) {
                                    break;
                                }
                                if b == b'\n' {
                                    self.line += 1;
                                }
                                pos += 1;
                            }
                        }
                        Some(_) => {
                            pos += self.src[pos..].chars().next().map_or(1, char::len_utf8);
                        }
                        None => {}
                    }
                }
                Some(&b'\n') => {
                    // Leave the line break to the main loop
                    self.warnings
                        .push(Diagnostic::new(start_line, DiagnosticKind::UnterminatedString));
                    break;
                }
                Some(&b) if b == quote => {
                    pos += 1;
                    break;
                }
                Some(_) => pos += 1,
            }
        }
        self.current.push_str(&self.src[start..pos]);
        self.pos = pos;
    }

    fn long_string(&mut self, open_len: usize, level: usize) {
        let start = self.pos;
        let start_line = self.line;
        let mut pos = start + open_len;
        let end = loop {
            if pos >= self.bytes.len() {
                self.warnings.push(Diagnostic::new(
                    start_line,
                    DiagnosticKind::UnterminatedLongString,
                ));
                break self.bytes.len();
            }
            if self.bytes[pos] == b'\n' {
                self.line += 1;
            } else if long_bracket_closes(self.bytes, pos, level) {
                break pos + level + 2;
            }
            pos += 1;
        };
        self.current.push_str(&self.src[start..end]);
        self.pos = end;
    }

    fn find_line_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.bytes.len(), |offset| from + offset)
    }

    fn end_line(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.lines.push(trimmed.to_string());
        }
        self.current.clear();
    }
}
