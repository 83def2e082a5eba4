#![allow(clippy::cargo_common_metadata)]

mod collector;
mod config;
mod error;

pub mod finder;
pub mod fmt;
pub mod lang;
pub mod layout;
pub mod path;


pub use crate::collector::{package_root, AliasTable, DependencyCollector};
pub use crate::config::Config;
pub use crate::error::{DependencyError, DependencyResult};
pub use crate::finder::{ImportAnalyzer, ModuleFinder, ModuleKind, ModuleRecord};
pub use crate::layout::{Layout, LayoutOverrides};
