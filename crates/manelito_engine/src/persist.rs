use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use manelito_core::SessionId;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const TEMP_FILE_NAME: &str = "manelitoscrapper_temp.txt";
pub const SAVE_EXTENSION: &str = "html";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} missing or not writable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0:?} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct PersistSettings {
    pub temp_dir: PathBuf,
    pub temp_file_name: String,
    /// Give every session its own temp file instead of the shared fixed one.
    pub session_scoped_temp: bool,
}

impl Default for PersistSettings {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            temp_file_name: TEMP_FILE_NAME.to_string(),
            session_scoped_temp: false,
        }
    }
}

/// `<local-app-data>/Temp`, or the OS temp dir when there is no local data dir.
pub fn default_temp_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("Temp"))
        .unwrap_or_else(std::env::temp_dir)
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let output_dir = |source| PersistError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(output_dir)?;
        if !meta.is_dir() {
            return Err(PersistError::NotADirectory(dir.to_path_buf()));
        }
    } else {
        fs::create_dir_all(dir).map_err(output_dir)?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let write_err = |source| PersistError::Write {
            path: target.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.as_file_mut().sync_all().map_err(write_err)?;

        // Rename replaces an existing target; the old content stays until then.
        tmp.persist(&target).map_err(|e| write_err(e.error))?;
        Ok(target)
    }
}

/// Where `write_temp` puts its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempScope {
    /// The fixed shared file name.
    Shared,
    /// A name unique to this process and session.
    Session(SessionId),
}

impl PersistSettings {
    pub fn temp_scope(&self, session_id: SessionId) -> TempScope {
        if self.session_scoped_temp {
            TempScope::Session(session_id)
        } else {
            TempScope::Shared
        }
    }

    fn temp_file_name_for(&self, scope: TempScope) -> String {
        match scope {
            TempScope::Shared => self.temp_file_name.clone(),
            TempScope::Session(session_id) => {
                let name = Path::new(&self.temp_file_name);
                let stem = name
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let suffix = format!("{}-{}", std::process::id(), session_id);
                match name.extension() {
                    Some(ext) => format!("{stem}-{suffix}.{}", ext.to_string_lossy()),
                    None => format!("{stem}-{suffix}"),
                }
            }
        }
    }
}

/// Overwrite the temp file with `html` and return its absolute path.
pub fn write_temp(
    settings: &PersistSettings,
    html: &str,
    scope: TempScope,
) -> Result<PathBuf, PersistError> {
    let name = settings.temp_file_name_for(scope);
    let path = AtomicFileWriter::new(settings.temp_dir.clone())
        .write(&name, html)
        .inspect_err(|err| engine_warn!("Temp write failed: {}", err))?;
    let path = absolute(path);
    engine_info!("Wrote {} bytes to temp file {:?}", html.len(), path);
    Ok(path)
}

/// Write `html` to a user-chosen path, adding `.html` when there is no extension.
pub fn write_as(html: &str, path: &Path) -> Result<PathBuf, PersistError> {
    let target = if path.extension().is_none() {
        path.with_extension(SAVE_EXTENSION)
    } else {
        path.to_path_buf()
    };
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PersistError::Write {
            path: target.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let path = AtomicFileWriter::new(dir)
        .write(&file_name, html)
        .inspect_err(|err| engine_warn!("Save failed: {}", err))?;
    let path = absolute(path);
    engine_info!("Saved {} bytes to {:?}", html.len(), path);
    Ok(path)
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}
