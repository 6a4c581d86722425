//! # BASIC program loader
//!
//! The front end of a BASIC interpreter. A program and its `#INCLUDE`
//! files are read line by line, normalized, tokenized and stored in a
//! fixed size program store. Embedded `CSUB` routines and `DEFINEFONT`
//! bitmaps are then packed into a binary region after the program.
//!
//! The variable table the interpreter runs against lives here as well.
//!
//! ```no_run
//! use basic::mach::Loader;
//!
//! let mut loader = Loader::default();
//! match loader.load("blink.bas") {
//!     Ok(()) => println!("{} bytes", loader.program().len()),
//!     Err(error) => eprintln!("{}", error),
//! }
//! ```

pub mod lang;
pub mod mach;
