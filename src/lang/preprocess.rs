use super::token::{is_name_char, is_type_suffix};
use super::{Defines, Error};
use crate::error;
use crate::mach::MAX_LINE_LEN;

type Result<T> = std::result::Result<T, Error>;

/// Marker that starts a directive line.
pub const DIRECTIVE: char = '#';

/// ## Source line normalization
///
/// Removes comments, collapses white space and upper-cases everything
/// outside of strings and `DATA`. Block comment nesting and the
/// `MMDEBUG` gate persist from one line to the next.

#[derive(Debug, Default)]
pub struct Preprocessor {
    comment_level: usize,
    debug: bool,
}

impl Preprocessor {
    pub fn new(debug: bool) -> Preprocessor {
        Preprocessor {
            comment_level: 0,
            debug,
        }
    }

    pub fn reset(&mut self, debug: bool) {
        self.comment_level = 0;
        self.debug = debug;
    }

    pub fn in_comment(&self) -> bool {
        self.comment_level > 0
    }

    pub fn comment_level(&self) -> usize {
        self.comment_level
    }

    pub fn open_comment(&mut self) {
        self.comment_level += 1;
    }

    pub fn close_comment(&mut self) -> Result<()> {
        if self.comment_level == 0 {
            return Err(error!(NoCommentToTerminate));
        }
        self.comment_level -= 1;
        Ok(())
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn process(&mut self, raw: &str, defines: &Defines) -> Result<String> {
        if self.in_comment() && self.nested_directive(raw)? {
            return Ok(String::new());
        }
        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::with_capacity(chars.len());
        let mut expecting_command = true;
        let mut in_quotes = false;
        let mut in_data = false;
        let mut i = 0;
        while let Some(&c) = chars.get(i) {
            let next = chars.get(i + 1).copied();
            if self.comment_level > 0 {
                if c == '/' && next == Some('*') {
                    self.comment_level += 1;
                    i += 2;
                } else if c == '*' && next == Some('/') {
                    self.comment_level -= 1;
                    i += 2;
                } else {
                    i += 1;
                }
                continue;
            }
            if in_quotes {
                out.push(c);
                in_quotes = c != '"';
                i += 1;
                continue;
            }
            match c {
                '"' => {
                    in_quotes = true;
                    expecting_command = false;
                    out.push(c);
                }
                ' ' | '\t' => {
                    if !expecting_command && !out.ends_with(' ') {
                        out.push(' ');
                    }
                }
                '\'' => break,
                '/' if next == Some('*') => {
                    self.comment_level += 1;
                    i += 1;
                }
                '*' if next == Some('/') => return Err(error!(NoCommentToTerminate)),
                ':' => {
                    expecting_command = true;
                    out.push(c);
                }
                _ => {
                    if expecting_command {
                        expecting_command = false;
                        if keyword_at(&chars[i..], "REM") {
                            break;
                        }
                        if !self.debug && keyword_at(&chars[i..], "MMDEBUG") {
                            break;
                        }
                        if keyword_at(&chars[i..], "DATA") {
                            in_data = true;
                            out.push_str("DATA");
                            i += 4;
                            continue;
                        }
                    }
                    if in_data {
                        out.push(c);
                    } else {
                        out.push(c.to_ascii_uppercase());
                    }
                }
            }
            i += 1;
        }
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
        if in_quotes {
            out.push('"');
        }
        if out.chars().count() > MAX_LINE_LEN {
            return Err(error!(LineTooLong));
        }
        if !out.starts_with(DIRECTIVE) {
            out = defines.apply(&out);
        }
        Ok(out)
    }

    // `#COMMENT START` and `#COMMENT END` are honoured inside a comment.
    fn nested_directive(&mut self, raw: &str) -> Result<bool> {
        let mut words = raw.split_whitespace();
        match words.next() {
            Some(w) if w.eq_ignore_ascii_case("#COMMENT") => {}
            _ => return Ok(false),
        }
        let arg = words.next().map(|w| w.to_ascii_uppercase());
        let start = match arg.as_deref() {
            Some("START") => true,
            Some("END") => false,
            _ => return Ok(false),
        };
        if words.next().is_some() {
            return Err(error!(SyntaxError; "UNEXPECTED TEXT"));
        }
        if start {
            self.open_comment();
        } else {
            self.close_comment()?;
        }
        Ok(true)
    }
}

fn keyword_at(chars: &[char], keyword: &str) -> bool {
    let len = keyword.chars().count();
    if chars.len() < len {
        return false;
    }
    if !chars[..len]
        .iter()
        .zip(keyword.chars())
        .all(|(a, b)| a.eq_ignore_ascii_case(&b))
    {
        return false;
    }
    match chars.get(len) {
        Some(&c) if c.is_ascii() => !is_name_char(c as u8) && !is_type_suffix(c as u8),
        Some(_) => false,
        None => true,
    }
}

/// Replace tabs with spaces up to the next multiple of `width`.
pub fn expand_tabs(line: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = width - column % width;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}
