//! Filters, renderer, engine/loader surface and boundary errors for the
//! template engine (spec.md §4.6–§4.7, §6, §7).
//!
//! This is the facade crate: it depends on [`tmpl_ast`] for the value
//! model and node tree and [`tmpl_parser`] to turn source text into that
//! tree, the way the teacher's `vaisc` binary/driver crate sits on top
//! of its own `vais-lexer`/`vais-parser`/`vais-ast` split.

mod context;
mod engine;
mod error;
mod escape;
mod filters;
mod json;
pub mod loader;
mod render;
mod template;

pub use context::RenderContext;
pub use engine::{
    library_error_message, Engine, EngineConfig, LibraryLoadError, LibraryRegistry, LoaderSpec, NullLibraryRegistry,
};
pub use error::{EngineError, TemplateSyntaxError};
pub use escape::{escape_html, escape_html_into};
pub use filters::{apply as apply_filter, FilterError};
pub use json::{context_from_json, value_from_json};
pub use loader::{AppDirectoriesLoader, CachedLoader, FilesystemLoader, Loader, LoaderError, LocMemLoader, Origin};
pub use template::Template;

pub use tmpl_ast::{HostValue, Value};
