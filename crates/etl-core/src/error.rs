use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the warehouse ETL.
#[derive(Error, Debug)]
pub enum EtlError {
    /// A source extract could not be opened or read from disk.
    #[error("Failed to read source file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A delimited-text file could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    CsvParse(String),

    /// A date string did not match any recognised format.
    #[error("Invalid date format: {0}")]
    DateParse(String),

    /// A numeric field did not parse.
    #[error("Invalid numeric value: {0}")]
    NumberParse(String),

    /// A plan name string is not one of the recognised plan types.
    #[error("Invalid plan type: {0}")]
    InvalidPlan(String),

    /// A typed extraction asked for a column the cleaned table does not have.
    #[error("Table {table} is missing column {column}")]
    MissingColumn { table: String, column: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A failure reported by the storage engine during a warehouse write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the ETL crates.
pub type Result<T> = std::result::Result<T, EtlError>;
