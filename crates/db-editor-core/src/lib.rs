pub mod camel;
pub mod check;
pub mod config;
pub mod dataset;
pub mod dataset_parse;
pub mod diff;
pub mod driver;
pub mod emit;
pub mod error;
pub mod flatten;
pub mod graph;
pub mod key;
pub mod nest;
pub mod order;
pub mod pgvalue;
pub mod schema;
pub mod sync;

// Re-export key types for convenience
pub use dataset::{FlatDataset, FlatRow, NestedDataset, NestedNode, NestedRow, PartialMarker, RefMarker};
pub use diff::{diff, Change, ChangeSet};
pub use driver::{Executor, PostgresDriver, RowFetcher};
pub use emit::{emit, quote_identifier, Statement};
pub use error::{DbEditorError, Result};
pub use flatten::flatten;
pub use nest::{nest, NestOptions};
pub use order::order;
pub use schema::types::Schema;
