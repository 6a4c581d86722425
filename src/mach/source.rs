use super::{Stack, MAX_OPEN_FILES};
use crate::error;
use crate::lang::{expand_tabs, Error, ErrorCode};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, Error>;

/// Finds the file behind a program or `#INCLUDE` name.
pub trait Resolve {
    /// `dir` is the directory of the including file, or `None` for the
    /// top level program.
    fn resolve(&self, name: &str, dir: Option<&Path>) -> Option<PathBuf>;
}

/// Resolves names on the local file system.
///
/// A name with an extension is tried as written. A bare name tries
/// `.bas`, `.BAS` and `.Bas` before the bare name itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResolver;

impl FsResolver {
    fn candidates(name: &str) -> Vec<String> {
        if Path::new(name).extension().is_some() {
            return vec![name.to_string()];
        }
        let mut v: Vec<String> = [".bas", ".BAS", ".Bas"]
            .iter()
            .map(|ext| format!("{}{}", name, ext))
            .collect();
        v.push(name.to_string());
        v
    }
}

impl Resolve for FsResolver {
    fn resolve(&self, name: &str, dir: Option<&Path>) -> Option<PathBuf> {
        for candidate in FsResolver::candidates(name) {
            let path = match dir {
                Some(dir) if Path::new(&candidate).is_relative() => dir.join(&candidate),
                _ => PathBuf::from(&candidate),
            };
            if path.is_file() {
                return path.canonicalize().ok();
            }
        }
        None
    }
}

/// One char per byte so every source byte survives as text.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

/// Reads the bytes behind a [`latin1`] string as UTF-8.
pub fn utf8(text: &str) -> String {
    let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// One open source file.
#[derive(Debug)]
pub struct SourceFile {
    reader: BufReader<File>,
    path: PathBuf,
    name: String,
    line: u32,
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The name used when reporting on this file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of the line most recently read, starting at 1.
    pub fn line(&self) -> u32 {
        self.line
    }

    fn read_line(&mut self, tab_width: usize) -> Result<Option<String>> {
        let mut buf = vec![];
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => {
                self.line += 1;
                while let Some(b'\n') | Some(b'\r') = buf.last() {
                    buf.pop();
                }
                Ok(Some(expand_tabs(&latin1(&buf), tab_width)))
            }
            Err(e) => Err(error!(InternalError, &self.name, self.line + 1; &e.to_string())),
        }
    }
}

/// ## Open source files
///
/// The program and its nested includes, innermost on top.

#[derive(Debug)]
pub struct FileStack {
    files: Stack<SourceFile>,
    tab_width: usize,
}

impl FileStack {
    pub fn new(tab_width: usize) -> FileStack {
        FileStack::with_capacity(tab_width, MAX_OPEN_FILES)
    }

    pub fn with_capacity(tab_width: usize, capacity: usize) -> FileStack {
        FileStack {
            files: Stack::new(capacity, ErrorCode::TooManyFiles),
            tab_width,
        }
    }

    pub fn set_tab_width(&mut self, tab_width: usize) {
        self.tab_width = tab_width;
    }

    /// Resolve and open `name`. Includes resolve against the directory of
    /// the file on top of the stack. The top level file is reported by its
    /// absolute path, includes by the name they were given.
    pub fn open(&mut self, name: &str, resolver: &dyn Resolve) -> Result<&SourceFile> {
        let dir = self
            .files
            .last()
            .and_then(|parent| parent.path.parent().map(Path::to_path_buf));
        let path = match resolver.resolve(name, dir.as_deref()) {
            Some(path) => path,
            None => return Err(error!(FileNotFound; name)),
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(_) => return Err(error!(FileNotFound; name)),
        };
        let display = if self.files.is_empty() {
            path.to_string_lossy().into_owned()
        } else {
            name.to_string()
        };
        self.files.push(SourceFile {
            reader: BufReader::new(file),
            path,
            name: display,
            line: 0,
        })?;
        self.files
            .last()
            .ok_or_else(|| error!(InternalError; "FILE STACK"))
    }

    pub fn close(&mut self) -> Result<SourceFile> {
        self.files.pop()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn current(&self) -> Option<&SourceFile> {
        self.files.last()
    }

    pub fn depth(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Next line of the file on top, `None` at its end.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let tab_width = self.tab_width;
        match self.files.last_mut() {
            Some(file) => file.read_line(tab_width),
            None => Err(error!(InternalError; "NO OPEN FILE")),
        }
    }
}
