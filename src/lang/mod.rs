/*!
# Rust Language Module

This Rust module turns BASIC source text into stored program lines:
line normalization, directives, `#DEFINE` substitution and tokenizing.

*/

#[macro_use]
mod error;
mod define;
mod preprocess;
mod tokenize;

pub mod directive;
pub mod token;

pub use define::Defines;
pub use directive::Directive;
pub use error::Error;
pub use error::ErrorCode;
pub use preprocess::expand_tabs;
pub use preprocess::Preprocessor;
pub use preprocess::DIRECTIVE;
pub use tokenize::detokenize;
pub use tokenize::tokenize;

#[cfg(test)]
mod tests;
