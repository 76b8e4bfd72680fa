//! Step sequences with compensating actions.
//!
//! The backend has no transactions, so a multi-request operation is run as a
//! saga: each step that leaves a remote side effect registers an undo action,
//! and a failing step triggers the registered undos in reverse order before
//! the error is reported.
//!
//! ```rust,ignore
//! let mut saga = Saga::new("add_comment");
//! let created = saga
//!     .step_with("create_comment", api.create_comment(&comment), |c| {
//!         let id = c.id.clone();
//!         Box::pin(async move { api.delete_comment(&id).await })
//!     })
//!     .await?;
//! let product = saga.step("link_comment", link(api, created.id)).await?;
//! saga.commit();
//! ```

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::ApiError;

/// A pending compensation for a completed step.
pub type Undo<'a> = Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>>;

/// A step that failed, and the compensations that could not be applied.
#[derive(Debug, Error)]
#[error("{saga} failed at {step}: {source}{}", format_rollback(.compensation_failures))]
pub struct SagaError {
    /// Saga name.
    pub saga: &'static str,
    /// Name of the failing step.
    pub step: &'static str,
    /// Why the step failed.
    pub source: ApiError,
    /// Compensations that failed in turn, by step name.
    pub compensation_failures: Vec<(&'static str, ApiError)>,
}

impl SagaError {
    /// Whether every completed step was undone.
    #[must_use]
    pub fn rolled_back(&self) -> bool {
        self.compensation_failures.is_empty()
    }
}

fn format_rollback(failures: &[(&'static str, ApiError)]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let steps = failures
        .iter()
        .map(|(step, e)| format!("{step} ({e})"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("; rollback incomplete: {steps}")
}

/// Compensation log for one multi-step operation.
pub struct Saga<'a> {
    name: &'static str,
    completed: Vec<(&'static str, Undo<'a>)>,
}

impl std::fmt::Debug for Saga<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saga")
            .field("name", &self.name)
            .field(
                "completed",
                &self.completed.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<'a> Saga<'a> {
    /// Start an empty saga.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            completed: Vec::new(),
        }
    }

    /// Run a step that needs no compensation.
    ///
    /// # Errors
    ///
    /// Returns the step's error after rolling back earlier steps.
    pub async fn step<T, Fut>(&mut self, step: &'static str, action: Fut) -> Result<T, SagaError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match action.await {
            Ok(value) => Ok(value),
            Err(source) => Err(self.fail(step, source).await),
        }
    }

    /// Run a step and register how to undo it.
    ///
    /// `compensate` receives the step's result and returns the undo action;
    /// it only runs if a later step fails.
    ///
    /// # Errors
    ///
    /// Returns the step's error after rolling back earlier steps.
    pub async fn step_with<T, Fut, C>(
        &mut self,
        step: &'static str,
        action: Fut,
        compensate: C,
    ) -> Result<T, SagaError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        C: FnOnce(&T) -> Undo<'a>,
    {
        let value = self.step(step, action).await?;
        self.completed.push((step, compensate(&value)));
        Ok(value)
    }

    /// Finish successfully, discarding all compensations.
    pub fn commit(self) {
        if !self.completed.is_empty() {
            info!(saga = self.name, steps = self.completed.len(), "Saga committed");
        }
    }

    async fn fail(&mut self, step: &'static str, source: ApiError) -> SagaError {
        warn!(saga = self.name, step, error = %source, "Saga step failed, rolling back");

        let mut compensation_failures = Vec::new();
        while let Some((done, undo)) = self.completed.pop() {
            if let Err(e) = undo.await {
                error!(saga = self.name, step = done, error = %e, "Compensation failed");
                compensation_failures.push((done, e));
            }
        }

        SagaError {
            saga: self.name,
            step,
            source,
            compensation_failures,
        }
    }
}
