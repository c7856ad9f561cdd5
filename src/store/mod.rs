//! Repository functions over the SQLite pool.

pub mod posts;
pub mod settings;
pub mod videos;
