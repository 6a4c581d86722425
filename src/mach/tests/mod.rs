use super::{Config, Loader, Resolve};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

mod loader_test;

/// Write `files` into a fresh directory.
fn tree<T: AsRef<[u8]>>(files: &[(&str, T)]) -> TempDir {
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

fn load(dir: &TempDir, name: &str) -> Loader {
    let mut loader = Loader::default();
    let path = dir.path().join(name);
    loader.load(&path.to_string_lossy()).unwrap();
    loader
}

/// Only finds files inside one directory, ignoring the includer.
struct Jail(PathBuf);

impl Resolve for Jail {
    fn resolve(&self, name: &str, _dir: Option<&Path>) -> Option<PathBuf> {
        let path = self.0.join(name);
        if path.is_file() {
            path.canonicalize().ok()
        } else {
            None
        }
    }
}

fn jailed(dir: &TempDir) -> Loader<Jail> {
    Loader::with_resolver(Config::default(), Jail(dir.path().to_path_buf()))
}
