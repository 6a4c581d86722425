use super::Error;
use crate::error;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq, Clone)]
pub enum Directive {
    Include(String),
    Define(String, String),
    CommentStart,
    CommentEnd,
    Debug(bool),
}

/// Interpret a normalized line that starts with `#`.
///
/// Unknown directives yield `None` so that newer programs still load.
pub fn parse(line: &str) -> Result<Option<Directive>> {
    let keyword_len = line
        .find(|c: char| c == ' ' || c == '"')
        .unwrap_or_else(|| line.len());
    let keyword = line[..keyword_len].to_ascii_uppercase();
    let mut args = Args::new(&line[keyword_len..]);
    let directive = match keyword.as_str() {
        "#INCLUDE" => {
            let name = args.string()?;
            args.end()?;
            if name.is_empty() {
                return Err(error!(SyntaxError; "EMPTY FILE NAME"));
            }
            Directive::Include(name)
        }
        "#DEFINE" => {
            let from = args.string()?;
            args.comma()?;
            let to = args.string()?;
            args.end()?;
            Directive::Define(from, to)
        }
        "#COMMENT" => match args.word().as_str() {
            "START" => {
                args.end()?;
                Directive::CommentStart
            }
            "END" => {
                args.end()?;
                Directive::CommentEnd
            }
            _ => return Err(error!(SyntaxError; "EXPECTED START OR END")),
        },
        "#MMDEBUG" => match args.word().as_str() {
            "ON" => {
                args.end()?;
                Directive::Debug(true)
            }
            "OFF" => {
                args.end()?;
                Directive::Debug(false)
            }
            _ => return Err(error!(SyntaxError; "EXPECTED ON OR OFF")),
        },
        _ => return Ok(None),
    };
    Ok(Some(directive))
}

struct Args<'a> {
    s: &'a str,
}

impl<'a> Args<'a> {
    fn new(s: &'a str) -> Args<'a> {
        Args { s }
    }

    fn skip_spaces(&mut self) {
        self.s = self.s.trim_start_matches(' ');
    }

    fn word(&mut self) -> String {
        self.skip_spaces();
        let len = self
            .s
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or_else(|| self.s.len());
        let word = self.s[..len].to_ascii_uppercase();
        self.s = &self.s[len..];
        word
    }

    fn literal(&mut self) -> Result<String> {
        self.skip_spaces();
        if !self.s.starts_with('"') {
            return Err(error!(SyntaxError; "EXPECTED STRING"));
        }
        let body = &self.s[1..];
        match body.find('"') {
            Some(end) => {
                self.s = &body[end + 1..];
                Ok(body[..end].to_string())
            }
            None => Err(error!(SyntaxError; "EXPECTED STRING")),
        }
    }

    /// String literals joined with `+`.
    fn string(&mut self) -> Result<String> {
        let mut s = self.literal()?;
        loop {
            self.skip_spaces();
            if !self.s.starts_with('+') {
                return Ok(s);
            }
            self.s = &self.s[1..];
            s.push_str(&self.literal()?);
        }
    }

    fn comma(&mut self) -> Result<()> {
        self.skip_spaces();
        if !self.s.starts_with(',') {
            return Err(error!(SyntaxError; "EXPECTED COMMA"));
        }
        self.s = &self.s[1..];
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.skip_spaces();
        if self.s.is_empty() {
            Ok(())
        } else {
            Err(error!(SyntaxError; "UNEXPECTED TEXT"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_include() {
        assert_eq!(
            parse("#INCLUDE \"lib/One.inc\"").unwrap(),
            Some(Directive::Include("lib/One.inc".to_string()))
        );
        assert_eq!(
            parse("#INCLUDE\"a\" + \".inc\"").unwrap(),
            Some(Directive::Include("a.inc".to_string()))
        );
        assert!(parse("#INCLUDE ONE.INC").is_err());
    }

    #[test]
    fn test_define() {
        assert_eq!(
            parse("#DEFINE \"foo\",\"bar\"").unwrap(),
            Some(Directive::Define("foo".to_string(), "bar".to_string()))
        );
        let e = parse("#DEFINE \"foo\"").unwrap_err();
        assert_eq!(e.code(), ErrorCode::SyntaxError);
        assert!(parse("#DEFINE \"a\",\"b\",\"c\"").is_err());
    }

    #[test]
    fn test_comment_and_debug() {
        assert_eq!(
            parse("#COMMENT START").unwrap(),
            Some(Directive::CommentStart)
        );
        assert_eq!(parse("#COMMENT END").unwrap(), Some(Directive::CommentEnd));
        assert!(parse("#COMMENT START NOW").is_err());
        assert_eq!(parse("#MMDEBUG ON").unwrap(), Some(Directive::Debug(true)));
        assert_eq!(
            parse("#MMDEBUG OFF").unwrap(),
            Some(Directive::Debug(false))
        );
        assert!(parse("#MMDEBUG MAYBE").is_err());
    }

    #[test]
    fn test_unknown_directive_is_ignored() {
        assert_eq!(parse("#GFXBUFFER 2").unwrap(), None);
    }
}
