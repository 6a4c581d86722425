use super::token::*;
use super::Error;
use crate::error;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// Encode one normalized line as a stored program line. Each char
/// stands for one stored byte.
pub fn tokenize(s: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(s.len());
    for c in s.chars() {
        match u8::try_from(u32::from(c)) {
            Ok(b) if b >= 0x20 && b != 0x7F => bytes.push(b),
            _ => return Err(error!(SyntaxError; "INVALID CHARACTER")),
        }
    }
    Tokenizer::tokenize(&bytes)
}

/// Listing text of one stored line. Bytes inside strings, comments and
/// `DATA` are listed one char per byte.
pub fn detokenize(line: &[u8]) -> String {
    let mut s = String::new();
    let mut index = 0;
    let mut in_quotes = false;
    let mut raw = false;
    while let Some(&b) = line.get(index) {
        index += 1;
        if b != 0 && (in_quotes || raw) {
            in_quotes = in_quotes && b != b'"';
            s.push(char::from(b));
            continue;
        }
        match b {
            T_NEWLINE => {}
            T_LABEL => {
                let len = line.get(index).copied().unwrap_or(0) as usize;
                let start = (index + 1).min(line.len());
                let end = (start + len).min(line.len());
                s.push_str(&String::from_utf8_lossy(&line[start..end]));
                s.push(':');
                index = end;
            }
            0 => {
                raw = false;
                if let Some(&next) = line.get(index) {
                    if next != 0 && next != T_NEWLINE {
                        s.push(':');
                    }
                }
            }
            _ => {
                if let Some(command) = Command::from_byte(b) {
                    raw = command == Command::Rem || command == Command::Data;
                    s.push_str(command.name());
                    if let Some(&next) = line.get(index) {
                        if next != 0 {
                            s.push(' ');
                        }
                    }
                } else if let Some(keyword) = Keyword::from_byte(b) {
                    s.push_str(keyword.name());
                } else {
                    in_quotes = b == b'"';
                    raw = b == b'\'';
                    s.push(char::from(b));
                }
            }
        }
    }
    s
}

struct Tokenizer<'a> {
    s: &'a [u8],
    pos: usize,
    out: Vec<u8>,
}

impl<'a> Tokenizer<'a> {
    fn tokenize(s: &'a [u8]) -> Result<Vec<u8>> {
        let mut this = Tokenizer {
            s,
            pos: 0,
            out: vec![T_NEWLINE],
        };
        this.skip_spaces();
        this.label();
        loop {
            this.skip_spaces();
            match this.peek() {
                None => break,
                Some(b':') => this.pos += 1,
                Some(_) => this.statement()?,
            }
        }
        if this.out.last() != Some(&0) {
            this.out.push(0);
        }
        Ok(this.out)
    }

    fn peek(&self) -> Option<u8> {
        self.s.get(self.pos).copied()
    }

    fn rest(&self) -> &'a [u8] {
        &self.s[self.pos..]
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn skip_one_space(&mut self) {
        if self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn name_len(&self, from: usize) -> usize {
        let s = &self.s[from..];
        match s.first() {
            Some(b) if is_name_start(*b) => {}
            _ => return 0,
        }
        let mut len = s.iter().take_while(|b| is_name_char(**b)).count();
        if let Some(b) = s.get(len) {
            if is_type_suffix(*b) {
                len += 1;
            }
        }
        len
    }

    fn label(&mut self) {
        let len = self.name_len(self.pos);
        if len == 0 || len > u8::max_value() as usize {
            return;
        }
        if self.s.get(self.pos + len) != Some(&b':') {
            return;
        }
        if Command::match_prefix(self.rest()).is_some() {
            return;
        }
        self.out.push(T_LABEL);
        self.out.push(len as u8);
        self.out.extend_from_slice(&self.s[self.pos..self.pos + len]);
        self.pos += len + 1;
    }

    fn is_assignment(&self) -> bool {
        let mut at = self.pos + self.name_len(self.pos);
        if at == self.pos {
            return false;
        }
        while self.s.get(at) == Some(&b' ') {
            at += 1;
        }
        if self.s.get(at) == Some(&b'(') {
            let mut depth = 0;
            while let Some(&b) = self.s.get(at) {
                at += 1;
                match b {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    b'"' => {
                        while let Some(&q) = self.s.get(at) {
                            at += 1;
                            if q == b'"' {
                                break;
                            }
                        }
                    }
                    _ => {}
                }
            }
            while self.s.get(at) == Some(&b' ') {
                at += 1;
            }
        }
        self.s.get(at) == Some(&b'=')
    }

    fn command(&mut self) -> Option<Command> {
        if let Some((command, len)) = Command::match_prefix(self.rest()) {
            self.out.push(command.byte());
            self.pos += len;
            self.skip_one_space();
            return Some(command);
        }
        if self.is_assignment() {
            self.out.push(Command::Let.byte());
        }
        None
    }

    fn statement(&mut self) -> Result<()> {
        let start = self.out.len();
        match self.command() {
            Some(Command::Rem) => self.verbatim(),
            Some(Command::Data) => self.arguments(true)?,
            _ => self.arguments(false)?,
        }
        while self.out.len() > start && self.out.last() == Some(&b' ') {
            self.out.pop();
        }
        self.out.push(0);
        Ok(())
    }

    fn arguments(&mut self, data: bool) -> Result<()> {
        while let Some(b) = self.peek() {
            match b {
                b'"' => self.string(),
                b'\'' => {
                    self.verbatim();
                    return Ok(());
                }
                b':' => {
                    self.pos += 1;
                    return Ok(());
                }
                _ if data => {
                    self.out.push(b);
                    self.pos += 1;
                }
                _ if is_name_start(b) => self.word(),
                _ if b.is_ascii_digit() => self.number(),
                _ if !b.is_ascii() => return Err(error!(SyntaxError; "INVALID CHARACTER")),
                _ => {
                    self.out.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(())
    }

    fn verbatim(&mut self) {
        self.out.extend_from_slice(self.rest());
        self.pos = self.s.len();
    }

    fn string(&mut self) {
        self.out.push(b'"');
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.out.push(b);
            self.pos += 1;
            if b == b'"' {
                break;
            }
        }
    }

    fn number(&mut self) {
        while let Some(b) = self.peek() {
            if !(b.is_ascii_alphanumeric() || b == b'.') {
                break;
            }
            self.out.push(b);
            self.pos += 1;
        }
    }

    fn word(&mut self) {
        let s = self.s;
        let len = self.name_len(self.pos);
        let word = &s[self.pos..self.pos + len];
        match Keyword::from_word(word) {
            Some(keyword) => {
                self.out.push(keyword.byte());
                self.pos += len;
                if keyword.starts_statement() {
                    while self.peek() == Some(b' ') {
                        self.out.push(b' ');
                        self.pos += 1;
                    }
                    match self.peek() {
                        Some(b) if is_name_start(b) => {
                            self.command();
                        }
                        _ => {}
                    }
                }
            }
            None => {
                self.out.extend_from_slice(word);
                self.pos += len;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(c: Command) -> u8 {
        c.byte()
    }

    #[test]
    fn test_command_and_implied_let() {
        let t = tokenize("DIM BAR = 1").unwrap();
        let mut expected = vec![T_NEWLINE, cmd(Command::Dim)];
        expected.extend_from_slice(b"BAR = 1");
        expected.push(0);
        assert_eq!(t, expected);
        let t = tokenize("BAR = 2").unwrap();
        assert_eq!(detokenize(&t), "LET BAR = 2");
    }

    #[test]
    fn test_statements_are_nul_terminated() {
        let t = tokenize("PRINT 1:PRINT 2 :").unwrap();
        assert_eq!(t.iter().filter(|b| **b == 0).count(), 2);
        assert_eq!(detokenize(&t), "PRINT 1:PRINT 2");
    }

    #[test]
    fn test_label() {
        let t = tokenize("LOOP1: PRINT \"A:B\"").unwrap();
        assert_eq!(&t[..3], &[T_NEWLINE, T_LABEL, 5]);
        assert_eq!(detokenize(&t), "LOOP1:PRINT \"A:B\"");
    }

    #[test]
    fn test_keywords_and_then() {
        let t = tokenize("IF A THEN PRINT 1 ELSE B = 2").unwrap();
        assert!(t.contains(&Keyword::Then.byte()));
        assert!(t.contains(&Command::Print.byte()));
        assert_eq!(detokenize(&t), "IF A THEN PRINT 1 ELSE LET B = 2");
    }

    #[test]
    fn test_comment_kept_verbatim() {
        let t = tokenize("PRINT 1 '|one.inc,3").unwrap();
        assert_eq!(detokenize(&t), "PRINT 1 '|one.inc,3");
        assert!(t.windows(2).any(|w| w == b"'|"));
    }

    #[test]
    fn test_hex_words_are_raw() {
        let t = tokenize("0000002C DEADBEEF").unwrap();
        assert_eq!(t[1], b'0');
        assert_eq!(detokenize(&t), "0000002C DEADBEEF");
    }

    #[test]
    fn test_rejects_control_characters() {
        assert!(tokenize("PRINT \u{1}").is_err());
        assert!(tokenize("PRINT \"\u{7F}\"").is_err());
        assert!(tokenize("PRINT \"\u{2103}\"").is_err());
    }

    #[test]
    fn test_high_bytes_outside_code() {
        let t = tokenize("PRINT \"25\u{B0}C\" '\u{E9}t\u{E9}").unwrap();
        assert!(t.contains(&0xB0));
        assert!(t.contains(&0xE9));
        assert_eq!(detokenize(&t), "PRINT \"25\u{B0}C\" '\u{E9}t\u{E9}");
        let t = tokenize("DATA \u{C0},\u{C1}:REM \u{80}\u{BF}").unwrap();
        assert_eq!(t[1], Command::Data.byte());
        assert_eq!(&t[2..5], &[0xC0, b',', 0xC1]);
        assert_eq!(detokenize(&t), "DATA \u{C0},\u{C1}:REM \u{80}\u{BF}");
        let e = tokenize("A\u{B0} = 1").unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::SyntaxError);
        assert!(tokenize("PRINT 1 + \u{C0}").is_err());
    }
}
