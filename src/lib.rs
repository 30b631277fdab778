//! dirflat - flatten a directory tree into a single folder
//!
//! This library walks a source directory, picks out files whose extension is in
//! a configured set, and copies each into one output directory under the name of
//! the folder it came from. Name clashes get numeric suffixes, so nothing already
//! in the output directory is overwritten.

pub mod cli;
pub mod config;
pub mod extension_filter;
pub mod organizer;
pub mod output;
pub mod report;

pub use config::{AppConfig, CompiledFilters, ConfigError};
pub use extension_filter::ExtensionFilter;
pub use organizer::{
    CollisionResolver, DirectoryOrganizer, EventSink, FileCopier, NullSink, OrganizeError,
    OrganizeEvent, PreservingCopier, RunResult, organize,
};
pub use report::RunReport;

pub use cli::{CliArgs, CliError, run_cli};
