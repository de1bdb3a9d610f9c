//! Best-effort in-page typesetting.
//!
//! Math typesetting runs inside the browser after the page is idle. If it
//! fails (the library never loaded, the script throws, the CDN is
//! unreachable) the page still prints, just with raw TeX where formulae
//! would be. That contract is made explicit here: [`attempt`] always
//! yields a [`TypesetOutcome`], never an error.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

/// Result of the typesetting step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypesetOutcome {
    /// The script ran and resolved.
    Applied,
    /// No script configured, or the backend has no browser step.
    #[default]
    Skipped,
    /// The script failed; output may contain untypeset math.
    Failed(String),
}

impl TypesetOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TypesetOutcome::Failed(_))
    }
}

/// Await `op`; log and swallow any error.
pub async fn attempt<F, T, E>(op: F) -> TypesetOutcome
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match op.await {
        Ok(_) => {
            debug!("Typesetting script completed");
            TypesetOutcome::Applied
        }
        Err(e) => {
            warn!("Typesetting failed, continuing with untypeset math: {}", e);
            TypesetOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_is_applied() {
        let outcome = attempt(async { Ok::<_, String>(()) }).await;
        assert_eq!(outcome, TypesetOutcome::Applied);
    }

    #[tokio::test]
    async fn failure_is_swallowed() {
        let outcome =
            attempt(async { Err::<(), _>("ReferenceError: MathJax is not defined") }).await;
        assert_eq!(
            outcome,
            TypesetOutcome::Failed("ReferenceError: MathJax is not defined".into())
        );
        assert!(outcome.is_failed());
    }

    #[test]
    fn default_is_skipped() {
        assert_eq!(TypesetOutcome::default(), TypesetOutcome::Skipped);
    }
}
