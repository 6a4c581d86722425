use super::{blob, latin1, utf8, Config, FileStack, FsResolver, ProgramStore, Resolve};
use crate::error;
use crate::lang::{directive, tokenize, Defines, Directive, Error, Preprocessor, DIRECTIVE};
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, Error>;

/// ## Program loader
///
/// Reads a program and its includes line by line, runs each line
/// through the preprocessor, acts on directives and stores everything
/// else tokenized with a `'|line` or `'|file,line` suffix. A failed
/// load leaves the program store empty.

#[derive(Debug)]
pub struct Loader<R: Resolve = FsResolver> {
    config: Config,
    resolver: R,
    files: FileStack,
    defines: Defines,
    preprocessor: Preprocessor,
    program: ProgramStore,
    current_file: Option<PathBuf>,
    top_name: String,
    trace: Vec<(usize, String)>,
}

impl Default for Loader {
    fn default() -> Loader {
        Loader::new(Config::default())
    }
}

impl Loader {
    pub fn new(config: Config) -> Loader {
        Loader::with_resolver(config, FsResolver)
    }
}

impl<R: Resolve> Loader<R> {
    pub fn with_resolver(config: Config, resolver: R) -> Loader<R> {
        Loader {
            files: FileStack::new(config.tab_width),
            defines: Defines::new(),
            preprocessor: Preprocessor::new(config.debug),
            program: ProgramStore::new(config.program_size),
            current_file: None,
            top_name: String::new(),
            trace: vec![],
            config,
            resolver,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn program(&self) -> &ProgramStore {
        &self.program
    }

    pub fn defines(&self) -> &Defines {
        &self.defines
    }

    /// Absolute path of the most recently loaded program.
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Every file opened by the last load with its include depth.
    pub fn trace(&self) -> &[(usize, String)] {
        &self.trace
    }

    /// The file and line that produced the stored byte at `offset`.
    pub fn locate(&self, offset: usize) -> Option<(String, u32)> {
        let (file, line) = self.program.locate(offset)?;
        Some((file.unwrap_or_else(|| self.top_name.clone()), line))
    }

    pub fn load(&mut self, name: &str) -> Result<()> {
        self.reset();
        self.current_file = None;
        self.top_name.clear();
        self.trace.clear();
        if let Err(error) = self.load_files(name) {
            self.reset();
            return Err(error);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.files.clear();
        self.files.set_tab_width(self.config.tab_width);
        self.defines.clear();
        self.preprocessor.reset(self.config.debug);
        self.program.clear();
    }

    fn load_files(&mut self, name: &str) -> Result<()> {
        let top = self.files.open(name, &self.resolver)?;
        self.current_file = Some(top.path().to_path_buf());
        self.top_name = top.name().to_string();
        self.trace.push((0, self.top_name.clone()));
        while let Some(file) = self.files.current() {
            let nested = self.files.depth() > 1;
            let (file, line) = (file.name().to_string(), file.line() + 1);
            let raw = match self.files.read_line()? {
                Some(raw) => raw,
                None if self.preprocessor.in_comment() => {
                    return Err(error!(UnterminatedComment, &file, line - 1));
                }
                None => {
                    self.files.close()?;
                    continue;
                }
            };
            if let Err(e) = self.line(&raw, &file, line, nested) {
                return Err(e.in_file(&file, line));
            }
        }
        self.program.finish();
        blob::pack(&mut self.program, &self.top_name)
    }

    fn line(&mut self, raw: &str, file: &str, line: u32, nested: bool) -> Result<()> {
        let text = self.preprocessor.process(raw, &self.defines)?;
        if text.starts_with(DIRECTIVE) {
            return self.directive(&text);
        }
        if text.is_empty() {
            return Ok(());
        }
        let text = if nested {
            format!("{} '|{},{}", text, latin1(file.as_bytes()), line)
        } else {
            format!("{} '|{}", text, line)
        };
        self.program.append(&tokenize(&text)?)
    }

    fn directive(&mut self, text: &str) -> Result<()> {
        match directive::parse(text)? {
            Some(Directive::Include(name)) => {
                let depth = self.files.depth();
                let file = self.files.open(&utf8(&name), &self.resolver)?;
                self.trace.push((depth, file.name().to_string()));
            }
            Some(Directive::Define(from, to)) => self.defines.add(&from, &to)?,
            Some(Directive::CommentStart) => self.preprocessor.open_comment(),
            Some(Directive::CommentEnd) => self.preprocessor.close_comment()?,
            Some(Directive::Debug(on)) => self.preprocessor.set_debug(on),
            None => {}
        }
        Ok(())
    }
}
