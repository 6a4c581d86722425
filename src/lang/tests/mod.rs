use super::{detokenize, directive, tokenize, Defines, Directive, Preprocessor, DIRECTIVE};
use crate::lang::Error;


/// Run lines through the preprocessor, applying directives as the loader
/// would, and list what would be stored.
fn listing(lines: &[&str]) -> Result<Vec<String>, Error> {
    listing_with(Preprocessor::new(false), lines)
}

fn listing_with(mut pp: Preprocessor, lines: &[&str]) -> Result<Vec<String>, Error> {
    listing_into(&mut pp, &mut Defines::new(), lines)
}

/// Like [`listing_with`], leaving the defines behind for inspection.
fn listing_into(
    pp: &mut Preprocessor,
    defines: &mut Defines,
    lines: &[&str],
) -> Result<Vec<String>, Error> {
    let mut stored = vec![];
    for line in lines {
        let text = pp.process(line, defines)?;
        if text.starts_with(DIRECTIVE) {
            match directive::parse(&text)? {
                Some(Directive::Define(from, to)) => defines.add(&from, &to)?,
                Some(Directive::CommentStart) => pp.open_comment(),
                Some(Directive::CommentEnd) => pp.close_comment()?,
                Some(Directive::Debug(on)) => pp.set_debug(on),
                _ => {}
            }
        } else if !text.is_empty() {
            stored.push(detokenize(&tokenize(&text)?));
        }
    }
    Ok(stored)
}
