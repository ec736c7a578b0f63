//! The uniform result of a cpm command.

use crate::ops::error::OpError;

pub const BUILD_FINISHED: &str = "Build finished";
pub const TESTS_PASSED: &str = "✔ PASS";
pub const TESTS_FAILED: &str = "✖ FAIL";
pub const NO_TESTS: &str = "no tests to run";
pub const BITS_INSTALLED: &str = "installed bits";
pub const NOT_A_PROJECT: &str = "error: not a Chromos project";

/// Exit status and message of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status_code: i32,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Outcome {
            status_code: 0,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome {
            status_code: 1,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 0
    }

    /// The fixed message and status for an error kind.
    pub fn from_error(error: &OpError) -> Self {
        match error {
            OpError::NotAChromosProject => Outcome::failure(NOT_A_PROJECT),
            OpError::Compilation(diagnostics) => Outcome::failure(diagnostics.clone()),
            OpError::TestsFailed { .. } => Outcome::failure(TESTS_FAILED),
            OpError::DependencyResolution(reason) | OpError::Configuration(reason) => {
                Outcome::failure(format!("error: {}", reason))
            }
            OpError::Io(e) => Outcome::failure(format!("error: {:#}", e)),
        }
    }

    /// Fold an operation result into an outcome.
    pub fn from_result<T: Into<Outcome>>(result: Result<T, OpError>) -> Self {
        match result {
            Ok(report) => report.into(),
            Err(e) => {
                tracing::debug!("operation failed: {:?}", e);
                Outcome::from_error(&e)
            }
        }
    }
}
