/*!
## Rust Machine Module

This Rust module holds the in-memory program: the source file stack,
the program store with its native blob region, the loader that fills
them, and the variable table used while a program runs.

*/

/// Program store capacity in bytes.
pub const PROGRAM_SIZE: usize = 512 * 1024;
/// Bytes kept free at the end of the program store for the footer.
pub const PROGRAM_TAIL: usize = 16;
pub const MAX_LINE_LEN: usize = 255;
pub const MAX_OPEN_FILES: usize = 8;
pub const MAX_DEFINES: usize = 256;
pub const MAX_DEFINE_LEN: usize = 64;
pub const MAX_VARS: usize = 1024;
pub const MAX_VAR_LEN: usize = 32;
pub const MAX_DIMS: usize = 8;
pub const FONT_TABLE_SIZE: usize = 16;
pub const STRING_SIZE: usize = 255;
/// Bytes available to variable values.
pub const HEAP_SIZE: usize = 4 * 1024 * 1024;

mod blob;
mod config;
mod heap;
mod loader;
mod program;
mod source;
mod stack;
mod var;

pub use blob::pack;
pub use blob::read_blobs;
pub use blob::Blob;
pub use config::Config;
pub use heap::Heap;
pub use heap::HeapHandle;
pub use loader::Loader;
pub use program::Lines;
pub use program::ProgramStore;
pub use source::FileStack;
pub use source::latin1;
pub use source::utf8;
pub use source::FsResolver;
pub use source::Resolve;
pub use source::SourceFile;
pub use stack::Stack;
pub use var::Found;
pub use var::Value;
pub use var::Var;
pub use var::VarTable;
pub use var::VarType;
pub use var::DIMS_UNDIMENSIONED;

#[cfg(test)]
mod tests;
