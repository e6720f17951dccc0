//! Durable link configuration.
//! One JSON document holds the oversight record and every link record.
//! All access is whole-document read-modify-write behind [`ConfigStore`].

pub mod backend;
pub mod error;
pub mod store_file;
pub mod store_memory;
pub mod transaction;
pub mod types;

pub use {
    backend::DocumentStore,
    error::{Error, Result},
    store_file::FileStore,
    store_memory::MemoryStore,
    transaction::{ConfigStore, Transaction},
    types::{Document, LinkRecord, QgRecord},
};
