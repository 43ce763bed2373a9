use std::sync::{Arc, RwLock};

use kraalcheck_core::tuple::{RelationFact, TupleFilter};

use crate::traits::{RelationshipStore, StorageError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    facts: Arc<RwLock<Vec<RelationFact>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facts(facts: Vec<RelationFact>) -> Self {
        Self {
            facts: Arc::new(RwLock::new(facts)),
        }
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Internal("fact store lock poisoned".to_string())
}

impl RelationshipStore for InMemoryStore {
    async fn write(&self, facts: &[RelationFact]) -> Result<(), StorageError> {
        for (i, fact) in facts.iter().enumerate() {
            if facts[i + 1..].contains(fact) {
                return Err(StorageError::DuplicateFact(fact.to_string()));
            }
        }

        let mut stored = self.facts.write().map_err(poisoned)?;

        if let Some(dup) = facts.iter().find(|f| stored.contains(f)) {
            return Err(StorageError::DuplicateFact(dup.to_string()));
        }

        stored.extend_from_slice(facts);

        Ok(())
    }

    async fn read(&self, filter: &TupleFilter) -> Result<Vec<RelationFact>, StorageError> {
        let facts = self.facts.read().map_err(poisoned)?;

        Ok(facts.iter().filter(|f| filter.matches(f)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraalcheck_core::tuple::{Object, Subject};

    fn fact(s: &str) -> RelationFact {
        s.parse().unwrap()
    }

    async fn all(store: &InMemoryStore) -> Vec<RelationFact> {
        store.read(&TupleFilter::default()).await.unwrap()
    }

    #[tokio::test]
    async fn written_fact_can_be_read_back() {
        let store = InMemoryStore::new();
        store.write(&[fact("doc:readme#viewer@john")]).await.unwrap();

        let results = all(&store).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].object, Object::new("doc", "readme"));
        assert_eq!(results[0].relation.as_str(), "viewer");
        assert_eq!(results[0].subject, Subject::user("john"));
    }

    #[tokio::test]
    async fn filter_matches_only_matching_facts() {
        let store = InMemoryStore::with_facts(vec![
            fact("doc:1#viewer@a"),
            fact("doc:1#editor@b"),
            fact("doc:2#viewer@c"),
        ]);

        let results = store
            .read(&TupleFilter::for_object("doc", "1", "viewer"))
            .await
            .unwrap();

        assert_eq!(results, vec![fact("doc:1#viewer@a")]);
    }

    #[tokio::test]
    async fn read_preserves_insertion_order() {
        let store = InMemoryStore::with_facts(vec![fact("doc:1#viewer@a")]);
        store
            .write(&[fact("doc:1#viewer@group:eng#member"), fact("doc:1#viewer@c")])
            .await
            .unwrap();

        assert_eq!(
            all(&store).await,
            vec![
                fact("doc:1#viewer@a"),
                fact("doc:1#viewer@group:eng#member"),
                fact("doc:1#viewer@c"),
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_in_batch_rejected() {
        let store = InMemoryStore::new();

        let result = store
            .write(&[fact("doc:1#viewer@a"), fact("doc:1#viewer@a")])
            .await;

        assert!(matches!(result, Err(StorageError::DuplicateFact(_))));
        assert!(all(&store).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_of_stored_fact_rejected_atomically() {
        let store = InMemoryStore::with_facts(vec![fact("doc:1#viewer@a")]);

        let result = store
            .write(&[fact("doc:1#viewer@b"), fact("doc:1#viewer@a")])
            .await;

        assert_eq!(
            result,
            Err(StorageError::DuplicateFact("doc:1#viewer@a".to_string()))
        );
        assert_eq!(all(&store).await, vec![fact("doc:1#viewer@a")]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryStore::new();
        let clone = store.clone();

        clone.write(&[fact("doc:1#viewer@a")]).await.unwrap();

        assert_eq!(all(&store).await.len(), 1);
    }
}
