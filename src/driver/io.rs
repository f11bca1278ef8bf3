//! File I/O operations
//!
//! Reading source files and writing compiled output to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default object file name when none is given.
pub const DEFAULT_OUTPUT: &str = "a.out";

pub fn read_source(path: impl AsRef<Path>) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Ensure the directory that will hold `path` exists.
fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if parent != Path::new("") && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write the object bytes to `path`.
pub fn write_object_file(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}

/// Write WAT text next to the object: `out.o` becomes `out.o.wat`.
pub fn write_wat_file(object_path: impl AsRef<Path>, wat_text: &str) -> io::Result<PathBuf> {
    let mut name = object_path.as_ref().as_os_str().to_os_string();
    name.push(".wat");
    let path = PathBuf::from(name);
    ensure_parent_dir(&path)?;
    fs::write(&path, wat_text)?;
    Ok(path)
}
