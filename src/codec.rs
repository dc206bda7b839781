//! Versioned codec: validated, atomic saves and validated loads.
//!
//! The stored encoding is one record per file, written with `\n` line endings.
//! Loads accept `\r\n` and lone `\r` as well, so files edited on any platform
//! decode to the same record.

use crate::error::{Error, FormatError, Result};
use crate::format::Format;
use crate::peek::VersionProbe;
use crate::validate::record_version;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Explicit format. `None` infers it from each file's extension.
    pub format: Option<Format>,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Create missing parent directories on save.
    pub create_dirs: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            format: None,
            pretty: true,
            create_dirs: true,
        }
    }
}

/// Reads and writes versioned records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    options: CodecOptions,
}

impl Codec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    /// Codec that always uses `format`, regardless of file extension.
    pub fn with_format(format: Format) -> Self {
        Self::new(CodecOptions {
            format: Some(format),
            ..CodecOptions::default()
        })
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// The format used for `path`.
    pub fn format_for(&self, path: &Path) -> Format {
        self.options
            .format
            .unwrap_or_else(|| Format::from_path(path))
    }

    /// Validate `record` and write it to `path`, replacing any prior content.
    ///
    /// Nothing is written if validation fails. The new content becomes
    /// visible in one rename, so a reader never observes a partial file.
    pub fn save<T, P>(&self, record: &T, path: P) -> Result<()>
    where
        T: Serialize + ?Sized,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let version = record_version(record)?;
        let format = self.format_for(path);
        let text = format
            .encode(record, self.options.pretty)
            .map_err(Error::encode)?;

        self.write_atomic(path, text.as_bytes())?;
        debug!(path = %path.display(), %version, %format, "saved config");
        Ok(())
    }

    /// Decode `path` into `T` and validate the decoded record.
    ///
    /// A `T` without a textual `Version` field fails validation even when
    /// the file itself carries one.
    pub fn load<T, P>(&self, path: P) -> Result<T>
    where
        T: DeserializeOwned + Serialize,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = read_text(path)?;
        let format = self.format_for(path);
        let record: T = format
            .decode(&text)
            .map_err(|err| Error::decode(path, err))?;

        let version = record_version(&record)?;
        debug!(path = %path.display(), %version, %format, "loaded config");
        Ok(record)
    }

    /// Read only the version of the record stored at `path`.
    pub fn peek_version<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let text = read_text(path)?;
        let format = self.format_for(path);
        let probe: VersionProbe = format
            .decode(&text)
            .map_err(|err| Error::decode(path, err))?;

        let version = probe.into_version()?;
        debug!(path = %path.display(), %version, "peeked config version");
        Ok(version)
    }

    /// Write to a temp file beside `path`, sync, then rename over `path`.
    ///
    /// The temp file is removed if any step fails.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if self.options.create_dirs {
            fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
        }

        let mut temp = tempfile::Builder::new()
            .prefix(".vconfig-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|err| Error::io(dir, err))?;

        // Keep the permissions of the file being replaced
        if let Ok(meta) = fs::metadata(path) {
            temp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|err| Error::io(path, err))?;
        }

        temp.write_all(contents)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| Error::io(temp.path(), err))?;

        temp.persist(path)
            .map_err(|err| Error::io(path, err.error))?;
        sync_dir(dir)
    }
}

/// Flush a directory entry so a completed rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(|err| Error::io(dir, err))
}

// Directories cannot be opened as files here; the rename is still atomic.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Read a stored encoding as UTF-8 text.
fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
    String::from_utf8(bytes).map_err(|err| Error::decode(path, FormatError::from(err)))
}

/// Validate `record` and save it to `path` with the default codec.
pub fn save<T, P>(record: &T, path: P) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    Codec::default().save(record, path)
}

/// Load and validate a record of shape `T` from `path` with the default codec.
pub fn load<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned + Serialize,
    P: AsRef<Path>,
{
    Codec::default().load(path)
}

/// Read only the `Version` of the record stored at `path`.
pub fn peek_version<P: AsRef<Path>>(path: P) -> Result<String> {
    Codec::default().peek_version(path)
}
