pub mod config;
pub mod error;
pub mod db;
pub mod graph;
pub mod rest;

pub use config::Config;
pub use error::{DmrestError, Result};
pub use graph::{MemoryStore, SqliteStore, TopicStore};
pub use rest::{GraphSerializer, LinkBuilder, SchemaResolver};
