/// Submission state for the post and comment composers
///
/// `Idle -> Submitting -> Idle`, with the error of a failed attempt kept on
/// the idle state until the next submission. Nothing is retried; the user
/// has to submit again.
use error_types::{Outcome, WriteError};
use std::future::Future;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle { last_error: Option<String> },
    Submitting,
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            SubmissionState::Idle { last_error } => last_error.as_deref(),
            SubmissionState::Submitting => None,
        }
    }
}

impl Default for SubmissionState {
    fn default() -> Self {
        SubmissionState::Idle { last_error: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("A submission is already in progress")]
    Busy,

    #[error(transparent)]
    Failed(#[from] WriteError),
}

/// Resets a cancelled submission back to idle
struct InFlight<'a> {
    state: &'a watch::Sender<SubmissionState>,
    done: bool,
}

impl InFlight<'_> {
    fn finish(mut self, last_error: Option<String>) {
        self.done = true;
        self.state.send_replace(SubmissionState::Idle { last_error });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.state.send_replace(SubmissionState::Idle {
                last_error: Some("Submission cancelled".into()),
            });
        }
    }
}

pub struct Composer {
    state: watch::Sender<SubmissionState>,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SubmissionState::default());
        Self { state }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Run one submission
    ///
    /// Returns `ComposeError::Busy` without polling `submission` while an
    /// earlier one is still in flight.
    pub async fn submit<T, F>(&self, submission: F) -> Result<T, ComposeError>
    where
        F: Future<Output = Result<T, WriteError>>,
    {
        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            *state = SubmissionState::Submitting;
            claimed = true;
            true
        });
        if !claimed {
            debug!("Submission refused, one is already in flight");
            return Err(ComposeError::Busy);
        }

        let guard = InFlight {
            state: &self.state,
            done: false,
        };
        match submission.await {
            Ok(value) => {
                guard.finish(None);
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "Submission failed");
                guard.finish(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// [`Self::submit`] collapsed into the view-facing [`Outcome`]
    pub async fn submit_outcome<T, F>(&self, submission: F) -> Outcome
    where
        F: Future<Output = Result<T, WriteError>>,
    {
        self.submit(submission).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_success_returns_to_clean_idle() {
        let composer = Composer::new();
        let id = composer.submit(async { Ok::<_, WriteError>("p1") }).await.unwrap();
        assert_eq!(id, "p1");
        assert_eq!(composer.state(), SubmissionState::default());
    }

    #[tokio::test]
    async fn test_failure_is_kept_until_next_submission() {
        let composer = Composer::new();
        let err = composer
            .submit(async { Err::<(), _>(WriteError::Network("offline".into())) })
            .await
            .unwrap_err();
        assert_eq!(err, ComposeError::Failed(WriteError::Network("offline".into())));
        assert_eq!(
            composer.state().last_error(),
            Some("Network error: offline")
        );

        composer.submit(async { Ok::<_, WriteError>(()) }).await.unwrap();
        assert_eq!(composer.state().last_error(), None);
    }

    #[tokio::test]
    async fn test_second_submission_is_refused_while_in_flight() {
        let composer = Arc::new(Composer::new());
        let (release, wait) = oneshot::channel::<()>();

        let first = {
            let composer = composer.clone();
            tokio::spawn(async move {
                composer
                    .submit(async move {
                        let _ = wait.await;
                        Ok::<_, WriteError>(1)
                    })
                    .await
            })
        };

        let mut state = composer.watch();
        state.wait_for(|s| s.is_submitting()).await.unwrap();

        let outcome = composer.submit_outcome(async { Ok::<_, WriteError>(2) }).await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.message.as_deref(),
            Some("A submission is already in progress")
        );

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        assert!(!composer.state().is_submitting());
    }

    #[tokio::test]
    async fn test_cancelled_submission_unlocks() {
        let composer = Composer::new();
        let pending = composer.submit(std::future::pending::<Result<(), WriteError>>());
        let _ = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;

        assert_eq!(composer.state().last_error(), Some("Submission cancelled"));
        assert!(composer.submit(async { Ok::<_, WriteError>(()) }).await.is_ok());
    }
}
