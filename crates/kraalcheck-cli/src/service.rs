use std::fmt;
use std::path::Path;
use std::sync::Arc;

use kraalcheck_core::engine::{CheckEngine, CheckError, Decision, EngineConfig};
use kraalcheck_core::schema::types::Schema;
use kraalcheck_storage::{InMemoryStore, RelationshipStore};
use tracing::info;

use crate::adapter::StoreFactReader;
use crate::config::AppConfig;
use crate::error::CliError;
use crate::fixtures::{load_facts_file, load_schema_file};

#[derive(Debug)]
pub struct CheckInput {
    pub subject: String,
    pub action: String,
    pub object: String,
    pub depth: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    Denied,
    Indeterminate(CheckError),
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Allowed => 0,
            Outcome::Denied => 1,
            Outcome::Indeterminate(_) => 2,
        }
    }
}

impl From<Decision> for Outcome {
    fn from(decision: Decision) -> Self {
        match decision.into_result() {
            Ok(true) => Outcome::Allowed,
            Ok(false) => Outcome::Denied,
            Err(err) => Outcome::Indeterminate(err),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Allowed => f.write_str("allowed"),
            Outcome::Denied => f.write_str("denied"),
            Outcome::Indeterminate(err) => write!(f, "indeterminate: {err}"),
        }
    }
}

pub struct PermissionService<S: RelationshipStore> {
    engine: CheckEngine<StoreFactReader<S>>,
}

impl<S: RelationshipStore> PermissionService<S> {
    pub fn new(store: Arc<S>, schema: Schema, engine_config: EngineConfig) -> Self {
        let reader = StoreFactReader::new(store);
        Self {
            engine: CheckEngine::new(Arc::new(reader), Arc::new(schema), engine_config),
        }
    }

    /// An explicit `depth` replaces the configured budget; the configured
    /// deadline applies either way.
    pub async fn check(&self, input: CheckInput) -> Outcome {
        let config = self.engine.config();
        let decision = match (input.depth, config.timeout) {
            (None, _) => {
                self.engine
                    .check_default(&input.subject, &input.action, &input.object)
                    .await
            }
            (Some(depth), Some(timeout)) => {
                self.engine
                    .check_with_timeout(
                        &input.subject,
                        &input.action,
                        &input.object,
                        depth,
                        timeout,
                    )
                    .await
            }
            (Some(depth), None) => {
                self.engine
                    .check(
                        &tokio_util::sync::CancellationToken::new(),
                        &input.subject,
                        &input.action,
                        &input.object,
                        depth,
                    )
                    .await
            }
        };

        let outcome = Outcome::from(decision);
        info!(
            subject = %input.subject,
            action = %input.action,
            object = %input.object,
            %outcome,
            "check evaluated"
        );
        outcome
    }
}

impl PermissionService<InMemoryStore> {
    /// Builds a service over an in-memory store seeded from fixture files.
    pub async fn from_files(
        schema_path: &Path,
        facts_path: &Path,
        config: &AppConfig,
    ) -> Result<Self, CliError> {
        let schema = load_schema_file(schema_path, &config.to_schema_limits())?;
        let facts = load_facts_file(facts_path)?;

        let store = Arc::new(InMemoryStore::new());
        store.write(&facts).await?;

        Ok(Self::new(store, schema, config.to_engine_config()))
    }
}
