//! Business logic services

pub mod contact_resolver;
pub mod duplicates;
pub mod import_queue;
pub mod import_runner;
pub mod import_source;
pub mod row_parser;
pub mod store;

#[cfg(test)]
pub mod memory_store;
