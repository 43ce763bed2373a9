use kraalcheck_core::tuple::{RelationFact, TupleFilter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("duplicate relation fact: {0}")]
    DuplicateFact(String),
    #[error("internal storage error: {0}")]
    Internal(String),
}

pub trait RelationshipStore: Send + Sync {
    /// Appends `facts` as one batch. Nothing is written if any fact is
    /// already stored or repeated within the batch.
    fn write(
        &self,
        facts: &[RelationFact],
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Matching facts in insertion order.
    fn read(
        &self,
        filter: &TupleFilter,
    ) -> impl Future<Output = Result<Vec<RelationFact>, StorageError>> + Send;
}
