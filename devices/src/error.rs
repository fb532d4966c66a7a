use std::path::PathBuf;

use thiserror::Error;

/// Failures parsing a hypervisor's `-device help` listing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("device listing contains no class headers")]
    NoSections,
}

/// Failures reading the persisted catalog format.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("line {line}: device entry before any class header")]
    EntryBeforeClass { line: usize },

    #[error("line {line}: device entry has no name")]
    MissingName { line: usize },

    #[error("line {line}: malformed entry field: {field}")]
    MalformedField { line: usize, field: String },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Command(#[from] skiff_cmd::CommandError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("failed to write device catalog: {path}")]
    WriteCatalog {
        path: PathBuf,
        #[source]
        source: tokio::io::Error,
    },

    #[error("failed to read device catalog: {path}")]
    ReadCatalog {
        path: PathBuf,
        #[source]
        source: tokio::io::Error,
    },
}
