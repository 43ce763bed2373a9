mod check;
mod combinator;

pub use check::{CheckEngine, Request};
pub use combinator::{CheckFuture, CheckTask, intersection, union};

use std::future::Future;
use std::time::Duration;

use crate::tuple::{ParseError, RelationFact, TupleFilter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("action '{action}' not found on namespace '{namespace}'")]
    ActionNotFound { namespace: String, action: String },

    #[error("max depth exceeded")]
    MaxDepthExceeded,

    #[error("check canceled")]
    Canceled,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Outcome of one check task. A present `error` makes the decision
/// indeterminate; `allowed` is then always false and must not be read as a
/// denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub error: Option<CheckError>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            error: None,
        }
    }

    pub fn deny() -> Self {
        Self {
            allowed: false,
            error: None,
        }
    }

    pub fn fail(error: CheckError) -> Self {
        Self {
            allowed: false,
            error: Some(error),
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> Result<bool, CheckError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.allowed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_depth: u32,
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            timeout: None,
        }
    }
}

pub trait TupleReader: Send + Sync {
    fn query_facts(
        &self,
        filter: &TupleFilter,
    ) -> impl Future<Output = Result<Vec<RelationFact>, CheckError>> + Send;
}
