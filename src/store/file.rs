//! Directory-backed configuration storage
//!
//! Each configuration item is one `<name>.yml` file in a flat directory, the
//! same layout extensions use for their `config/install` directories. Writes
//! go through a temporary file that is renamed into place, so a reader never
//! observes half of a document.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use super::{validate_name, ConfigStore, FILE_EXTENSION};
use crate::document::{self, Document};
use crate::error::{Error, Result};

/// Configuration store over a directory of YAML files
#[derive(Debug, Clone)]
pub struct FileStore {
    label: String,
    directory: PathBuf,
    read_only: bool,
}

impl FileStore {
    /// Create a writable store rooted at `directory`.
    ///
    /// The directory does not need to exist yet; it is created on first write.
    pub fn new<P: AsRef<Path>>(label: &str, directory: P) -> Self {
        Self {
            label: label.to_string(),
            directory: directory.as_ref().to_path_buf(),
            read_only: false,
        }
    }

    /// Create a store that rejects writes and deletes.
    pub fn read_only<P: AsRef<Path>>(label: &str, directory: P) -> Self {
        Self {
            read_only: true,
            ..Self::new(label, directory)
        }
    }

    /// The directory holding the configuration files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file backing `name`.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", name, FILE_EXTENSION))
    }

    fn read_error(&self, name: &str, message: impl ToString) -> Error {
        Error::StoreRead {
            store: self.label.clone(),
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    fn write_error(&self, name: &str, message: impl ToString) -> Error {
        Error::StoreWrite {
            store: self.label.clone(),
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnlyStore {
                store: self.label.clone(),
            });
        }
        Ok(())
    }
}

impl ConfigStore for FileStore {
    fn name(&self) -> &str {
        &self.label
    }

    fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.file_path(name).is_file())
    }

    fn read(&self, name: &str) -> Result<Option<Document>> {
        validate_name(name)?;
        let path = self.file_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|err| self.read_error(name, err))?;
        document::parse(&content)
            .map(Some)
            .map_err(|err| self.read_error(name, err))
    }

    fn write(&self, name: &str, doc: &Document) -> Result<()> {
        self.ensure_writable()?;
        validate_name(name)?;

        let content = document::to_yaml(doc).map_err(|err| self.write_error(name, err))?;
        fs::create_dir_all(&self.directory).map_err(|err| self.write_error(name, err))?;

        let path = self.file_path(name);
        let temp_path = NamedTempFile::new_in(&self.directory)
            .map_err(|err| self.write_error(name, err))?
            .into_temp_path();
        fs::write(&temp_path, content).map_err(|err| self.write_error(name, err))?;
        temp_path
            .persist(&path)
            .map_err(|err| self.write_error(name, err.error))?;

        debug!("{}: wrote {}", self.label, path.display());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        validate_name(name)?;
        let path = self.file_path(name);
        if path.is_file() {
            fs::remove_file(&path).map_err(|err| self.write_error(name, err))?;
            debug!("{}: deleted {}", self.label, path.display());
        }
        Ok(())
    }

    fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.directory).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|err| self.read_error(prefix, err))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            // Skip hidden files, including in-flight temporary writes
            if stem.starts_with('.') {
                continue;
            }
            if stem.starts_with(prefix) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}
