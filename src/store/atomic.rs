//! Temp-file-then-rename writes.
//!
//! A [`StagedWrite`] holds fully written and synced bytes in a `.tmp`
//! sibling of the destination. Committing renames it over the destination,
//! which is atomic when both live on the same filesystem. Dropping it
//! without committing deletes the temp file and leaves the destination as
//! it was.

use super::error::{io_err, StoreResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of the temp file written next to the destination.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Append a suffix to the full file name (`db.json` -> `db.json.bak`).
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Bytes staged next to their destination, waiting for [`StagedWrite::commit`].
#[derive(Debug)]
pub struct StagedWrite {
    temp: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Write `bytes` to the temp sibling of `dest` and sync them to disk.
    pub fn stage(dest: &Path, bytes: &[u8]) -> StoreResult<Self> {
        let temp = sibling(dest, TEMP_SUFFIX);
        let written = File::create(&temp).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });

        if let Err(e) = written {
            if temp.exists() {
                let _ = fs::remove_file(&temp);
            }
            return Err(io_err("write temporary file", &temp)(e));
        }

        Ok(Self {
            temp,
            dest: dest.to_path_buf(),
            committed: false,
        })
    }

    /// Path of the staged temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Atomically replace the destination with the staged bytes.
    ///
    /// On failure the temp file is removed and the destination is untouched.
    pub fn commit(mut self) -> StoreResult<()> {
        fs::rename(&self.temp, &self.dest).map_err(io_err("replace", &self.dest))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if self.committed || !self.temp.exists() {
            return;
        }
        match fs::remove_file(&self.temp) {
            Ok(()) => log::debug!("Discarded uncommitted write {}", self.temp.display()),
            Err(e) => log::warn!(
                "Failed to remove temporary file {}: {}",
                self.temp.display(),
                e
            ),
        }
    }
}
