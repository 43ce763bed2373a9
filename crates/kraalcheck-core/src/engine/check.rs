use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::schema::types::{Child, LeafKind, RewriteOp, Schema};
use crate::tuple::{Object, Relation, Subject, TupleFilter, parse_object, parse_subject};

use super::combinator::{CheckFuture, CheckTask, intersection, union};
use super::{CheckError, Decision, EngineConfig, TupleReader};

/// One check call's state. Cloned down every edge, so concurrent branches
/// never share the depth budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub object: Object,
    pub subject: Subject,
    pub remaining_depth: u32,
}

impl Request {
    pub fn new(object: Object, subject: Subject, remaining_depth: u32) -> Self {
        Self {
            object,
            subject,
            remaining_depth,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_depth == 0
    }

    /// The request one userset hop further down.
    pub fn descend(&self) -> Self {
        Self {
            object: self.object.clone(),
            subject: self.subject.clone(),
            remaining_depth: self.remaining_depth.saturating_sub(1),
        }
    }
}

pub struct CheckEngine<T: TupleReader> {
    reader: Arc<T>,
    schema: Arc<Schema>,
    config: EngineConfig,
}

impl<T: TupleReader> CheckEngine<T> {
    pub fn new(reader: Arc<T>, schema: Arc<Schema>, config: EngineConfig) -> Self {
        Self {
            reader,
            schema,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decides whether `subject` may perform `action` on `object`, walking
    /// userset edges at most `max_depth` hops deep. Canceling `scope` ends
    /// the check with [`CheckError::Canceled`].
    ///
    /// An object whose namespace has no entity fails with
    /// [`CheckError::NamespaceNotFound`] instead of being folded into
    /// [`CheckError::ActionNotFound`].
    #[tracing::instrument(level = "debug", skip(self, scope))]
    pub async fn check(
        &self,
        scope: &CancellationToken,
        subject: &str,
        action: &str,
        object: &str,
        max_depth: u32,
    ) -> Decision {
        let object = match parse_object(object) {
            Ok(object) => object,
            Err(err) => return Decision::fail(err.into()),
        };

        let root = match self.root_child(&object.namespace, action) {
            Ok(root) => root,
            Err(err) => return Decision::fail(err),
        };

        let request = Request::new(object, parse_subject(subject), max_depth);
        let decision = union(scope, vec![self.dispatch(root, request)]).await;

        debug!(allowed = decision.allowed, error = ?decision.error, "check finished");
        decision
    }

    /// Runs [`check`](Self::check) and cancels it once `timeout` elapses.
    pub async fn check_with_timeout(
        &self,
        subject: &str,
        action: &str,
        object: &str,
        max_depth: u32,
        timeout: Duration,
    ) -> Decision {
        let scope = CancellationToken::new();
        let check = self.check(&scope, subject, action, object, max_depth);
        tokio::pin!(check);

        tokio::select! {
            decision = &mut check => decision,
            _ = tokio::time::sleep(timeout) => {
                warn!(?timeout, "check deadline elapsed, canceling");
                scope.cancel();
                check.await
            }
        }
    }

    /// Checks with the configured depth budget and deadline.
    pub async fn check_default(&self, subject: &str, action: &str, object: &str) -> Decision {
        let max_depth = self.config.max_depth;
        match self.config.timeout {
            Some(timeout) => {
                self.check_with_timeout(subject, action, object, max_depth, timeout)
                    .await
            }
            None => {
                self.check(&CancellationToken::new(), subject, action, object, max_depth)
                    .await
            }
        }
    }

    fn root_child(&self, namespace: &str, action: &str) -> Result<&Child, CheckError> {
        let entity = self
            .schema
            .get_entity(namespace)
            .ok_or_else(|| CheckError::NamespaceNotFound(namespace.to_string()))?;

        entity
            .get_action(action)
            .map(|a| &a.child)
            .ok_or_else(|| CheckError::ActionNotFound {
                namespace: namespace.to_string(),
                action: action.to_string(),
            })
    }

    fn dispatch<'a>(&'a self, child: &'a Child, request: Request) -> CheckTask<'a> {
        match child {
            // Both leaf kinds resolve through the tuple graph the same way.
            Child::Leaf(leaf) => match leaf.kind {
                LeafKind::TupleToUserSet | LeafKind::ComputedUserSet => {
                    let object = request.object.clone();
                    self.leaf_task(object, leaf.relation.clone(), request)
                }
            },
            Child::Rewrite(rewrite) => {
                let tasks: Vec<CheckTask<'a>> = rewrite
                    .children
                    .iter()
                    .map(|c| self.dispatch(c, request.clone()))
                    .collect();
                let op = rewrite.op;

                Box::new(move |scope: CancellationToken| -> CheckFuture<'a> {
                    Box::pin(async move {
                        match op {
                            RewriteOp::Union => union(&scope, tasks).await,
                            RewriteOp::Intersection => intersection(&scope, tasks).await,
                        }
                    })
                })
            }
        }
    }

    fn leaf_task<'a>(
        &'a self,
        object: Object,
        relation: Relation,
        request: Request,
    ) -> CheckTask<'a> {
        Box::new(move |scope: CancellationToken| -> CheckFuture<'a> {
            self.resolve_leaf(scope, object, relation, request)
        })
    }

    fn resolve_leaf<'a>(
        &'a self,
        scope: CancellationToken,
        object: Object,
        relation: Relation,
        request: Request,
    ) -> CheckFuture<'a> {
        Box::pin(async move {
            if request.is_exhausted() {
                warn!(%object, %relation, "depth budget exhausted");
                return Decision::fail(CheckError::MaxDepthExceeded);
            }
            if scope.is_cancelled() {
                return Decision::fail(CheckError::Canceled);
            }

            let (query, computed) = relation.split();
            let filter = TupleFilter::for_object(&object.namespace, &object.id, query);

            let facts = match self.reader.query_facts(&filter).await {
                Ok(facts) => facts,
                Err(err) => {
                    warn!(%object, relation = query, error = %err, "fact query failed");
                    return Decision::fail(err);
                }
            };

            for fact in &facts {
                let subject = fact.resolve_subject(computed);
                if subject == request.subject {
                    return Decision::allow();
                }
                // Only the first userset edge is followed.
                if let Subject::UserSet(userset) = subject {
                    debug!(
                        from = %object,
                        to = %userset.object,
                        relation = %userset.relation,
                        "following userset"
                    );
                    let task = self.leaf_task(userset.object, userset.relation, request.descend());
                    return union(&scope, vec![task]).await;
                }
            }

            Decision::deny()
        })
    }
}
