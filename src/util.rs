use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{Result, SimError};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_parent_directory(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|err| SimError::io(parent, err))
        }
        _ => Ok(()),
    }
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|err| SimError::io(path, err))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file.read(&mut buf).map_err(|err| SimError::io(path, err))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Write a file so that readers see either the old contents or the complete
/// new contents: the body goes to a temporary file in the destination
/// directory, which is then renamed over `path`.
pub fn write_atomically<F>(path: &Path, write_body: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    ensure_parent_directory(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|err| SimError::io(dir, err))?;
    write_body(staged.as_file_mut())?;
    staged
        .as_file()
        .sync_all()
        .map_err(|err| SimError::io(staged.path(), err))?;
    staged
        .persist(path)
        .map_err(|err| SimError::io(path, err.error))?;
    Ok(())
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_atomically(path, |file| {
        file.write_all(&data).map_err(|err| SimError::io(path, err))?;
        file.write_all(b"\n").map_err(|err| SimError::io(path, err))
    })
}
