//! Durable storage for the single channel binding.
//!
//! All reads and writes go through one mutex. Mutations are applied to a
//! copy, written to disk, and only then committed, so a failed write leaves
//! the previous binding in effect.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, info};

use crate::{
    binding::{BindingConfig, BindingState},
    error::{Context, Error, Result},
    format::DocumentFormat,
};

pub struct BindingStore {
    path: PathBuf,
    format: DocumentFormat,
    current: Mutex<BindingConfig>,
}

impl BindingStore {
    /// Load the binding document at `path`, creating an empty one on first run.
    ///
    /// A document that exists but cannot be parsed is an error; it is never
    /// overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = DocumentFormat::from_path(&path)?;
        let store = Self {
            path,
            format,
            current: Mutex::new(BindingConfig::default()),
        };

        match store.load() {
            Ok(cfg) => {
                info!(
                    path = %store.path.display(),
                    state = %cfg.state(),
                    aliases = cfg.aliases.len(),
                    "loaded binding"
                );
                *store.lock() = cfg;
            },
            Err(Error::NotFound { .. }) => {
                info!(path = %store.path.display(), "no binding document, creating an empty one");
                store.save(&BindingConfig::default())?;
            },
            Err(e) => return Err(e),
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document from disk without touching the in-memory copy.
    pub fn load(&self) -> Result<BindingConfig> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound {
                    path: self.path.clone(),
                });
            },
            Err(source) => {
                return Err(Error::Read {
                    path: self.path.clone(),
                    source,
                });
            },
        };
        self.format.parse(&raw, &self.path)
    }

    /// Write `cfg` to disk and make it the current binding.
    pub fn save(&self, cfg: &BindingConfig) -> Result<()> {
        let mut current = self.lock();
        self.write(cfg)?;
        *current = cfg.clone();
        Ok(())
    }

    /// Copy of the current binding.
    pub fn snapshot(&self) -> BindingConfig {
        self.lock().clone()
    }

    pub fn state(&self) -> BindingState {
        self.lock().state()
    }

    /// Bind the source side to `channel_id`.
    pub fn register_source(&self, channel_id: &str) -> Result<BindingState> {
        self.update(|cfg| {
            cfg.source_channel_id = channel_id.to_string();
            cfg.state()
        })
    }

    /// Bind the destination side to `chat_id`.
    pub fn register_dest(&self, chat_id: i64) -> Result<BindingState> {
        self.update(|cfg| {
            cfg.dest_chat_id = chat_id;
            cfg.state()
        })
    }

    /// Map `display_name` to `handle`, replacing any previous handle.
    pub fn set_alias(&self, display_name: &str, handle: &str) -> Result<()> {
        self.update(|cfg| {
            cfg.aliases
                .insert(display_name.to_string(), handle.to_string());
        })
    }

    /// Returns whether an alias was removed. Nothing is written when absent.
    pub fn remove_alias(&self, display_name: &str) -> Result<bool> {
        if !self.lock().aliases.contains_key(display_name) {
            return Ok(false);
        }
        self.update(|cfg| cfg.aliases.remove(display_name).is_some())
    }

    /// Reset both ids and all aliases.
    pub fn clear(&self) -> Result<()> {
        self.save(&BindingConfig::default())
    }

    fn update<R>(&self, mutate: impl FnOnce(&mut BindingConfig) -> R) -> Result<R> {
        let mut current = self.lock();
        let mut next = current.clone();
        let out = mutate(&mut next);
        self.write(&next)?;
        *current = next;
        Ok(out)
    }

    fn write(&self, cfg: &BindingConfig) -> Result<()> {
        let body = self.format.render(cfg)?;
        let file_name = self
            .path
            .file_name()
            .context("binding path has no file name")?;
        let tmp = self
            .path
            .with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

        let write_err = |source| Error::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&tmp, body).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;

        debug!(path = %self.path.display(), state = %cfg.state(), "saved binding");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BindingConfig> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
