//! Engine construction, loader composition and the `libraries`
//! resolution seam (spec.md §6).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::EngineError;
use crate::loader::{AppDirectoriesLoader, CachedLoader, FilesystemLoader, Loader, LoaderError, LocMemLoader};
use crate::template::Template;

/// One entry of the `loaders` config list (spec.md §6): either a leaf
/// loader or, for `cached`/`locmem`, a composite carrying its own
/// configuration.
pub enum LoaderSpec {
    Filesystem,
    AppDirectories,
    Cached(Vec<LoaderSpec>),
    LocMem(HashMap<String, String>),
}

/// Builder-style engine configuration (spec.md §6), following the
/// teacher's convention of a config struct with chainable `with_*`
/// methods (see `vais-dynload::ModuleLoaderConfig`) rather than a
/// parsed config-file format, since spec.md §6 implies none.
#[derive(Default)]
pub struct EngineConfig {
    pub dirs: Vec<PathBuf>,
    pub app_dirs: bool,
    pub app_template_dirs: Vec<PathBuf>,
    pub loaders: Vec<LoaderSpec>,
    pub libraries: HashMap<String, String>,
    pub string_if_invalid: String,
    pub autoescape: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            autoescape: true,
            ..Default::default()
        }
    }

    pub fn with_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.dirs = dirs;
        self
    }

    pub fn with_app_dirs(mut self, app_dirs: bool, app_template_dirs: Vec<PathBuf>) -> Self {
        self.app_dirs = app_dirs;
        self.app_template_dirs = app_template_dirs;
        self
    }

    pub fn with_loaders(mut self, loaders: Vec<LoaderSpec>) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn with_library(mut self, alias: impl Into<String>, dotted_path: impl Into<String>) -> Self {
        self.libraries.insert(alias.into(), dotted_path.into());
        self
    }

    pub fn with_string_if_invalid(mut self, value: impl Into<String>) -> Self {
        self.string_if_invalid = value.into();
        self
    }

    pub fn with_autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }
}

/// Why a `libraries` alias failed to resolve (spec.md §6). Actually
/// importing a dotted Rust/Python module path has no meaning inside
/// this crate, so resolution is delegated to a host-supplied
/// [`LibraryRegistry`] — this engine only needs the pass/fail contract
/// and its two reference-matching error shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryLoadError {
    NotFound,
    NoRegister,
}

/// Host-supplied answer to "does this dotted path name a loadable
/// library exposing `register`?" (spec.md §6). The Non-goal this spec
/// excludes is *executing* a custom tag a library would register, not
/// the registration bookkeeping itself, so this trait keeps that
/// bookkeeping faithful without resurrecting the excluded feature.
pub trait LibraryRegistry: Send + Sync {
    fn resolve(&self, dotted_path: &str) -> Result<(), LibraryLoadError>;
}

/// The registry used when a host doesn't supply one of its own: every
/// library alias is unresolved, since there is nothing to import.
pub struct NullLibraryRegistry;

impl LibraryRegistry for NullLibraryRegistry {
    fn resolve(&self, _dotted_path: &str) -> Result<(), LibraryLoadError> {
        Err(LibraryLoadError::NotFound)
    }
}

/// Reproduces the reference implementation's exact `InvalidTemplateLibrary`
/// wording for each failure shape (spec.md §6, `examples/original_source/tests/test_engine.py`).
pub fn library_error_message(dotted_path: &str, err: LibraryLoadError) -> String {
    match err {
        LibraryLoadError::NotFound => {
            let module = dotted_path.split('.').next().unwrap_or(dotted_path);
            format!(
                "Invalid template library specified. ImportError raised when trying to load '{dotted_path}': No module named '{module}'"
            )
        }
        LibraryLoadError::NoRegister => {
            format!("Module '{dotted_path}' does not have a variable named 'register'")
        }
    }
}

/// A compiled-template factory bound to a set of loaders and render
/// defaults (spec.md §6).
pub struct Engine {
    loaders: Vec<Box<dyn Loader>>,
    autoescape: bool,
    string_if_invalid: Arc<str>,
}

impl Engine {
    pub fn new(config: EngineConfig, registry: &dyn LibraryRegistry) -> Result<Self, EngineError> {
        for dotted_path in config.libraries.values() {
            registry
                .resolve(dotted_path)
                .map_err(|err| EngineError::InvalidTemplateLibrary(library_error_message(dotted_path, err)))?;
        }

        let loaders = build_loaders(&config);
        log::debug!("engine constructed with {} loader(s)", loaders.len());
        Ok(Self {
            loaders,
            autoescape: config.autoescape,
            string_if_invalid: config.string_if_invalid.into(),
        })
    }

    pub fn from_string(&self, source: impl Into<String>) -> Result<Template, EngineError> {
        Template::compile(source.into(), None, self.autoescape, self.string_if_invalid.clone())
    }

    /// Resolve `name` through the configured loaders in order
    /// (spec.md §6). Surfaces `TemplateDoesNotExist` only once every
    /// loader has missed.
    pub fn get_template(&self, name: &str) -> Result<Template, EngineError> {
        let mut tried = Vec::new();
        for loader in &self.loaders {
            match loader.get_source(name) {
                Ok((source, origin)) => {
                    log::trace!("resolved template '{name}'");
                    return Template::compile(source, Some(origin), self.autoescape, self.string_if_invalid.clone());
                }
                Err(LoaderError::NotFound) => tried.push(name.to_string()),
                Err(LoaderError::DirectoryTraversal(bad)) => tried.push(bad),
            }
        }
        Err(EngineError::TemplateDoesNotExist {
            name: name.to_string(),
            tried,
        })
    }
}

fn build_loaders(config: &EngineConfig) -> Vec<Box<dyn Loader>> {
    if config.loaders.is_empty() {
        let mut loaders: Vec<Box<dyn Loader>> = Vec::new();
        if !config.dirs.is_empty() {
            loaders.push(Box::new(FilesystemLoader { dirs: config.dirs.clone() }));
        }
        if config.app_dirs {
            loaders.push(Box::new(AppDirectoriesLoader {
                app_template_dirs: config.app_template_dirs.clone(),
            }));
        }
        return loaders;
    }

    config.loaders.iter().map(|spec| build_loader(spec, config)).collect()
}

fn build_loader(spec: &LoaderSpec, config: &EngineConfig) -> Box<dyn Loader> {
    match spec {
        LoaderSpec::Filesystem => Box::new(FilesystemLoader { dirs: config.dirs.clone() }),
        LoaderSpec::AppDirectories => Box::new(AppDirectoriesLoader {
            app_template_dirs: config.app_template_dirs.clone(),
        }),
        LoaderSpec::Cached(inner) => {
            Box::new(CachedLoader::new(inner.iter().map(|s| build_loader(s, config)).collect()))
        }
        LoaderSpec::LocMem(templates) => Box::new(LocMemLoader { templates: templates.clone() }),
    }
}
