use super::{Error, ErrorCode};
use crate::error;
use crate::mach::{Stack, MAX_DEFINES, MAX_DEFINE_LEN};

type Result<T> = std::result::Result<T, Error>;

/// ## Text substitutions registered by `#DEFINE`

#[derive(Debug)]
pub struct Defines {
    entries: Stack<(String, String)>,
}

impl Default for Defines {
    fn default() -> Defines {
        Defines::with_capacity(MAX_DEFINES)
    }
}

impl Defines {
    pub fn new() -> Defines {
        Defines::default()
    }

    pub fn with_capacity(capacity: usize) -> Defines {
        Defines {
            entries: Stack::new(capacity, ErrorCode::TooManyDefines),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn add(&mut self, from: &str, to: &str) -> Result<()> {
        if from.chars().count() > MAX_DEFINE_LEN || to.chars().count() > MAX_DEFINE_LEN {
            return Err(error!(StringTooLong; "DEFINE"));
        }
        if from.trim().is_empty() {
            return Err(error!(SyntaxError; "EMPTY DEFINE"));
        }
        self.entries
            .push((from.to_ascii_uppercase(), to.to_ascii_uppercase()))
    }

    /// Replace every whole-word occurrence outside quoted text.
    pub fn apply(&self, line: &str) -> String {
        if self.entries.is_empty() {
            return line.to_string();
        }
        let mut work = protect_quoted(line);
        for (from, to) in self.entries.iter() {
            work = replace_words(&work, from, to);
        }
        restore_quoted(&work)
    }
}

const PLACEHOLDER_BASE: u32 = 0xE000;

fn is_boundary(c: char) -> bool {
    c.is_ascii() && !(c.is_ascii_alphanumeric() || "_$%!#\"".contains(c))
}

// Inside quotes every boundary character becomes a private-use placeholder,
// so quoted text never offers a word boundary to the matcher.
fn protect_quoted(line: &str) -> String {
    let mut in_quotes = false;
    line.chars()
        .map(|c| {
            if c == '"' {
                in_quotes = !in_quotes;
                c
            } else if in_quotes && is_boundary(c) {
                std::char::from_u32(PLACEHOLDER_BASE + c as u32).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

fn restore_quoted(line: &str) -> String {
    line.chars()
        .map(|c| {
            let n = c as u32;
            if (PLACEHOLDER_BASE..PLACEHOLDER_BASE + 0x80).contains(&n) {
                std::char::from_u32(n - PLACEHOLDER_BASE).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

fn replace_words(line: &str, from: &str, to: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let needle: Vec<char> = from.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;
    while i < chars.len() {
        let end = i + needle.len();
        let matched = end <= chars.len()
            && chars[i..end]
                .iter()
                .zip(needle.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
            && (i == 0 || is_boundary(chars[i - 1]))
            && (end == chars.len() || is_boundary(chars[end]));
        if matched {
            out.push_str(to);
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}
