use crate::error::Result;
use crate::schema::types::Schema;

/// Narrow capability a database backend must provide to supply a `Schema`.
///
/// Expressed as a trait so a live `sqlx::PgPool` and a mocked test double
/// satisfy the same contract.
pub trait SchemaExtractor: Send + Sync {
    fn extract(&self) -> impl std::future::Future<Output = Result<Schema>> + Send;
}
