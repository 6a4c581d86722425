use basic::lang::Error;
use basic::mach::Loader;
use std::fs;
use tempfile::TempDir;

/// Write `files` into a fresh directory, creating subdirectories.
pub fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }
    dir
}

pub fn try_load(dir: &TempDir, name: &str) -> (Loader, Result<(), Error>) {
    let mut loader = Loader::default();
    let result = loader.load(&dir.path().join(name).to_string_lossy());
    (loader, result)
}

pub fn load(dir: &TempDir, name: &str) -> Loader {
    let (loader, result) = try_load(dir, name);
    if let Err(error) = result {
        panic!("{}", error);
    }
    loader
}

/// Listing without the attribution suffixes or the closing `END`.
pub fn statements(loader: &Loader) -> Vec<String> {
    let mut listing = loader.program().listing();
    listing.pop();
    listing
        .into_iter()
        .map(|line| match line.rfind(" '|") {
            Some(at) => line[..at].to_string(),
            None => line,
        })
        .collect()
}
