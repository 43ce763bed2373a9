use std::future::Future;
use std::pin::Pin;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{CheckError, Decision};

pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Decision> + Send + 'a>>;

/// Deferred check work. Invoked with the scope it should observe, it
/// resolves to exactly one decision.
pub type CheckTask<'a> = Box<dyn FnOnce(CancellationToken) -> CheckFuture<'a> + Send + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    Union,
    Intersection,
}

impl Fold {
    /// The error-free outcome that settles the whole set.
    fn settles_on(self) -> bool {
        match self {
            Fold::Union => true,
            Fold::Intersection => false,
        }
    }

    fn exhausted(self) -> Decision {
        match self {
            Fold::Union => Decision::deny(),
            Fold::Intersection => Decision::allow(),
        }
    }
}

/// Allowed as soon as one task allows. An empty set is denied.
pub async fn union(scope: &CancellationToken, tasks: Vec<CheckTask<'_>>) -> Decision {
    combine(scope, tasks, Fold::Union).await
}

/// Denied as soon as one task denies. An empty set is also denied.
pub async fn intersection(scope: &CancellationToken, tasks: Vec<CheckTask<'_>>) -> Decision {
    combine(scope, tasks, Fold::Intersection).await
}

async fn combine(scope: &CancellationToken, tasks: Vec<CheckTask<'_>>, fold: Fold) -> Decision {
    if tasks.is_empty() {
        return Decision::deny();
    }

    let child = scope.child_token();
    // Siblings still running when we return see their scope canceled.
    let _cancel_on_return = child.clone().drop_guard();

    let mut pending: FuturesUnordered<CheckFuture<'_>> =
        tasks.into_iter().map(|task| task(child.clone())).collect();

    loop {
        tokio::select! {
            biased;

            _ = scope.cancelled() => {
                trace!(?fold, "scope canceled before a settling decision");
                return Decision::fail(CheckError::Canceled);
            }
            next = pending.next() => match next {
                Some(Decision { error: Some(err), .. }) => return Decision::fail(err),
                Some(Decision { allowed, error: None }) if allowed == fold.settles_on() => {
                    trace!(?fold, allowed, remaining = pending.len(), "short-circuited");
                    return Decision { allowed, error: None };
                }
                Some(_) => {}
                None => return fold.exhausted(),
            },
        }
    }
}
