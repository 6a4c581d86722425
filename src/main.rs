//! # basic-load
//!
//! Load a BASIC program the way the interpreter would and report on it.
//!

mod term;

fn main() {
    term::main()
}
