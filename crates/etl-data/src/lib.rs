//! Ingestion and derivation layer for the SaaS warehouse ETL.
//!
//! Responsible for reading the delimited-text extracts, cleaning them,
//! lifting cleaned tables into typed records, deriving the versioned
//! dimension histories and generating the monthly snapshot facts. The
//! seeded change simulator that synthesises demo history lives here too,
//! deliberately outside the derivation path.

pub mod cleaner;
pub mod reader;
pub mod scd;
pub mod snapshot;
pub mod synth;

pub use etl_core as core;
