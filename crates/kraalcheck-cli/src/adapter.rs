use std::sync::Arc;

use kraalcheck_core::engine::{CheckError, TupleReader};
use kraalcheck_core::tuple::{RelationFact, TupleFilter};
use kraalcheck_storage::RelationshipStore;

pub struct StoreFactReader<S: RelationshipStore> {
    store: Arc<S>,
}

impl<S: RelationshipStore> StoreFactReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: RelationshipStore> TupleReader for StoreFactReader<S> {
    async fn query_facts(&self, filter: &TupleFilter) -> Result<Vec<RelationFact>, CheckError> {
        self.store
            .read(filter)
            .await
            .map_err(|e| CheckError::StorageError(e.to_string()))
    }
}
