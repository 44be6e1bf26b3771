//! Storage module for the persistent vector collection
//!
//! Provides SQLite-based persistence for indexed chunks and their embeddings.

mod collection;

pub use collection::{cosine_distance, VectorStore, DB_FILE_NAME, DISTANCE_SPACE};
