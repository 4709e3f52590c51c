/// Transfer Agent: retried copies reported as outcomes
use std::path::Path;

use log::{error, info, warn};

use crate::error::TransferError;
use crate::models::TransferOutcome;

use super::remote::{RemoteCopy, RemoteTarget};
use super::retry::{RetryError, RetryPolicy};

pub struct TransferAgent<R> {
    pub(crate) copier: R,
    policy: RetryPolicy,
}

impl<R: RemoteCopy> TransferAgent<R> {
    pub fn new(copier: R, policy: RetryPolicy) -> Self {
        Self { copier, policy }
    }

    /// Copy `local` to `remote`, retrying per the policy.
    ///
    /// Never fails: every path ends in an outcome, and only `Confirmed`
    /// allows the caller to delete the local copy.
    pub async fn transfer(&self, local: &Path, remote: &RemoteTarget) -> TransferOutcome {
        let label = format!("Copy of {}", local.display());
        let copier = &self.copier;
        let result = self
            .policy
            .run(
                &label,
                move |_attempt| copier.copy(local, remote),
                TransferError::is_retryable,
            )
            .await;

        match result {
            Ok(((), attempts)) => {
                info!("Copied: {} -> {}", local.display(), remote);
                TransferOutcome::Confirmed { attempts }
            }
            Err(RetryError::Aborted { attempts, error }) => {
                warn!(
                    "Not retrying {} -> {}: {}; left for the next cycle",
                    local.display(),
                    remote,
                    error
                );
                TransferOutcome::Failed {
                    attempts,
                    reason: error.to_string(),
                }
            }
            Err(RetryError::Exhausted {
                attempts,
                last_error,
            }) => {
                error!(
                    "Failed to transfer {} after {} attempts: {}",
                    local.display(),
                    attempts,
                    last_error
                );
                TransferOutcome::Exhausted {
                    attempts,
                    last_error: last_error.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCopy;
    use std::time::Duration;
    use tokio::time::Instant;

    const BACKOFF: Duration = Duration::from_secs(5);

    fn agent(copier: ScriptedCopy) -> TransferAgent<ScriptedCopy> {
        TransferAgent::new(copier, RetryPolicy::new(3, BACKOFF))
    }

    fn target() -> RemoteTarget {
        RemoteTarget::new("pi@archive", "/srv/station/images/")
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_after_transient_failures() {
        for k in 0..3u32 {
            let agent = agent(ScriptedCopy::failing_first(k));
            let start = Instant::now();

            let outcome = agent.transfer(Path::new("a.jpg"), &target()).await;

            assert_eq!(outcome, TransferOutcome::Confirmed { attempts: k + 1 });
            assert_eq!(agent.copier.calls(), (k + 1) as usize);
            let elapsed = start.elapsed();
            assert!(elapsed >= BACKOFF * k, "k={} waited {:?}", k, elapsed);
            assert!(elapsed < BACKOFF * (k + 1), "k={} waited {:?}", k, elapsed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_ceiling() {
        let agent = agent(ScriptedCopy::always_failing());

        let outcome = agent.transfer(Path::new("a.jpg"), &target()).await;

        assert!(matches!(
            outcome,
            TransferOutcome::Exhausted { attempts: 3, .. }
        ));
        assert_eq!(agent.copier.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn local_fault_fails_without_retrying() {
        let agent = agent(ScriptedCopy::missing_artifacts());

        let outcome = agent.transfer(Path::new("a.jpg"), &target()).await;

        assert!(matches!(outcome, TransferOutcome::Failed { attempts: 1, .. }));
        assert_eq!(agent.copier.calls(), 1);
    }
}
