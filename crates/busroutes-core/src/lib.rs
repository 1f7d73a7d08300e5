pub mod cleaning;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod identifiers;
pub mod ingestion;
pub mod loader;
pub mod merge;
pub mod preview;
pub mod run;
pub mod schema;
pub mod status;
