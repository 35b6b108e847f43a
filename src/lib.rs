pub mod cli;
pub mod config;
pub mod dump;
pub mod format;
pub mod storage;

pub use dump::{ContainerQuery, DumpError, DumpOutcome, LogFetcher};
