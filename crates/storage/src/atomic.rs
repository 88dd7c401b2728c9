// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-then-rename atomicity, shared by every persisted artifact in this
//! crate (RunnerState, Signal envelopes, Identity records). No ACID
//! guarantees — just "readers never observe a partial write".

use crate::error::StoreIoError;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Serialize `value` to JSON and write it to `path` atomically: write to a
/// sibling temp file in the same directory, `fsync`, then `rename` over the
/// destination. A crash before the rename leaves `path` untouched; a crash
/// after leaves the new content in place. Readers never see a half-written
/// file.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreIoError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let bytes = serde_json::to_vec_pretty(value)?;

    let tmp_name = format!(".{}.tmp-{}", file_stem_or(path, "state"), std::process::id());
    let tmp_path = dir.join(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Append `line` (plus a trailing newline) to `path`, creating it if absent,
/// and fsync before returning. Used by the audit writer, where each append
/// is a single atomic unit and partial lines are detected (not hidden) by
/// `verify_chain`.
pub fn append_line_fsync(path: &Path, line: &str) -> Result<(), StoreIoError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreIoError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn file_stem_or<'a>(path: &'a Path, default: &'a str) -> &'a str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or(default)
}
