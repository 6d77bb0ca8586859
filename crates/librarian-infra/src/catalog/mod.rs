//! File-backed book catalog.

pub mod file;

pub use file::FileCatalog;
