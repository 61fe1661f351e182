pub mod dag;
pub mod topo;
pub mod tree;

pub use dag::{is_composition, DependencyGraph, EdgeInfo};
pub use topo::{topological_sort, InsertionOrder};
pub use tree::{OwnershipEdge, OwnershipTree};
