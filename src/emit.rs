//! Writing generated files.
//!
//! Every output goes through [`write_if_changed`]: the text is compared by
//! content hash with what is already on disk, and only a differing file is
//! replaced. Replacement writes a temporary file next to the target and
//! renames it into place, so readers never see a half-written kernel.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::trace;

use crate::error::{GenError, Result};

/// What [`write_if_changed`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Content fingerprint of generated text.
pub fn fingerprint(text: &str) -> blake3::Hash {
    blake3::hash(text.as_bytes())
}

/// Write `contents` to `path` unless the file already holds exactly that.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome> {
    if let Ok(existing) = fs::read(path) {
        if blake3::hash(&existing) == fingerprint(contents) {
            trace!(file = %path.display(), "unchanged");
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let write_err = |source| GenError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k_cl_source.inl");
        assert_eq!(write_if_changed(&path, "abc").unwrap(), WriteOutcome::Written);
        assert_eq!(write_if_changed(&path, "abc").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, "abd").unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "abd");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("x.inl");
        write_if_changed(&path, "x").unwrap();
        assert!(path.exists());
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint("kernel"), fingerprint("kernel"));
        assert_ne!(fingerprint("kernel"), fingerprint("kernel "));
    }
}
