//! Loader interfaces (spec.md §6): `filesystem`, `app_directories`,
//! `cached` and `locmem`, behind a single `Loader` trait so `Engine`
//! can chain them in the order the host configured.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Where a template's source text came from, kept around so a future
/// reload/watch feature (or just a better error message) can point back
/// at a real file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub name: String,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("template not found")]
    NotFound,
    #[error("refusing to read outside the template root: {0}")]
    DirectoryTraversal(String),
}

/// A source of template text by name (spec.md §6). Loaders are tried in
/// the order `Engine` was configured with; the first hit wins.
pub trait Loader: Send + Sync {
    fn get_source(&self, name: &str) -> Result<(String, Origin), LoaderError>;
}

/// Rejects any name with a `..` path segment, the way both Django's
/// filesystem loader and `sugar_path`-based path-safety checks in the
/// reference implementation's dependency tree do (spec.md §6).
fn reject_traversal(name: &str) -> Result<(), LoaderError> {
    if name.split('/').any(|segment| segment == "..") {
        return Err(LoaderError::DirectoryTraversal(name.to_string()));
    }
    Ok(())
}

/// Reads template sources from an ordered list of filesystem roots.
pub struct FilesystemLoader {
    pub dirs: Vec<PathBuf>,
}

impl Loader for FilesystemLoader {
    fn get_source(&self, name: &str) -> Result<(String, Origin), LoaderError> {
        reject_traversal(name)?;
        for dir in &self.dirs {
            let path = dir.join(name);
            if let Ok(contents) = std::fs::read_to_string(&path) {
                log::trace!("filesystem loader resolved '{name}' under {}", dir.display());
                return Ok((
                    contents,
                    Origin {
                        name: name.to_string(),
                        path: Some(path),
                    },
                ));
            }
        }
        Err(LoaderError::NotFound)
    }
}

/// Reads from each installed app's own `templates/` directory
/// (spec.md §6 `app_dirs`). Resolution is identical to
/// [`FilesystemLoader`]; the distinct type exists so `Engine` can report
/// which loader kind actually served a template in its trace logging.
pub struct AppDirectoriesLoader {
    pub app_template_dirs: Vec<PathBuf>,
}

impl Loader for AppDirectoriesLoader {
    fn get_source(&self, name: &str) -> Result<(String, Origin), LoaderError> {
        reject_traversal(name)?;
        for dir in &self.app_template_dirs {
            let path = dir.join(name);
            if let Ok(contents) = std::fs::read_to_string(&path) {
                log::trace!("app_directories loader resolved '{name}' under {}", dir.display());
                return Ok((
                    contents,
                    Origin {
                        name: name.to_string(),
                        path: Some(path),
                    },
                ));
            }
        }
        Err(LoaderError::NotFound)
    }
}

/// An in-memory name -> source map (spec.md §6 `locmem`), useful for
/// tests and for embedding templates at compile time.
pub struct LocMemLoader {
    pub templates: HashMap<String, String>,
}

impl Loader for LocMemLoader {
    fn get_source(&self, name: &str) -> Result<(String, Origin), LoaderError> {
        self.templates
            .get(name)
            .map(|source| {
                (
                    source.clone(),
                    Origin {
                        name: name.to_string(),
                        path: None,
                    },
                )
            })
            .ok_or(LoaderError::NotFound)
    }
}

/// Wraps an ordered list of inner loaders with write-once memoization by
/// name (spec.md §5, §6): the first successful resolution for a given
/// name is cached for the lifetime of the loader.
pub struct CachedLoader {
    inner: Vec<Box<dyn Loader>>,
    cache: Mutex<HashMap<String, (String, Origin)>>,
}

impl CachedLoader {
    pub fn new(inner: Vec<Box<dyn Loader>>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl Loader for CachedLoader {
    fn get_source(&self, name: &str) -> Result<(String, Origin), LoaderError> {
        if let Some(hit) = self.cache.lock().unwrap().get(name) {
            log::debug!("cached loader hit for '{name}'");
            return Ok(hit.clone());
        }

        for loader in &self.inner {
            if let Ok(result) = loader.get_source(name) {
                log::debug!("cached loader storing '{name}' after first resolution");
                self.cache.lock().unwrap().insert(name.to_string(), result.clone());
                return Ok(result);
            }
        }
        Err(LoaderError::NotFound)
    }
}
