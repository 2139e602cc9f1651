//! Test runner implementation
//!
//! Runs test cases one at a time. Each body is spawned as its own task and
//! joined under a deadline; whatever happens inside (assertion failure,
//! skip, collaborator error, panic, hang) comes back as one [`Outcome`].
//!
//! Cancellation is cooperative. When the deadline passes the task is
//! aborted, which stops it at its next await point. A body stuck in blocking
//! code cannot be interrupted and keeps its worker thread until it returns;
//! the run moves on without it.

use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use super::category::CategoryOrder;
use super::check::{CheckError, CheckResult};
use super::registry::TestCase;
use super::report::RunReport;

/// Terminal classification of one test execution
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Failed {
        message: String,
        expected: Option<Value>,
        got: Option<Value>,
    },
    Skipped {
        reason: String,
    },
    TimedOut {
        budget: Duration,
    },
    Errored {
        kind: String,
        message: String,
    },
}

impl Outcome {
    /// Classify what a body returned
    pub fn from_check(result: CheckResult) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(CheckError::Failed(f)) => Outcome::Failed {
                message: f.message,
                expected: f.expected,
                got: f.got,
            },
            Err(CheckError::Skipped(reason)) => Outcome::Skipped { reason },
            Err(CheckError::Fault { kind, message }) => Outcome::Errored { kind, message },
        }
    }

    fn from_join_error(e: JoinError) -> Self {
        if e.is_panic() {
            Outcome::Errored {
                kind: "panic".to_string(),
                message: panic_message(e.into_panic()),
            }
        } else {
            Outcome::Errored {
                kind: "cancelled".to_string(),
                message: e.to_string(),
            }
        }
    }

    /// Passed or skipped; skips never count as failures
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Passed | Outcome::Skipped { .. })
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }

    /// Failed, timed out or errored
    pub fn is_failure(&self) -> bool {
        !self.is_pass()
    }

    /// Short machine-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed { .. } => "failed",
            Outcome::Skipped { .. } => "skipped",
            Outcome::TimedOut { .. } => "timed_out",
            Outcome::Errored { .. } => "errored",
        }
    }

    /// Human-readable error line for non-passing outcomes
    pub fn error_message(&self) -> Option<String> {
        match self {
            Outcome::Passed | Outcome::Skipped { .. } => None,
            Outcome::Failed { message, .. } => Some(message.clone()),
            Outcome::TimedOut { budget } => {
                Some(format!("Test timed out after {}", format_budget(*budget)))
            }
            Outcome::Errored { kind, message } => Some(format!("{}: {}", kind, message)),
        }
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Outcome::Skipped { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn expected(&self) -> Option<&Value> {
        match self {
            Outcome::Failed { expected, .. } => expected.as_ref(),
            _ => None,
        }
    }

    pub fn got(&self) -> Option<&Value> {
        match self {
            Outcome::Failed { got, .. } => got.as_ref(),
            _ => None,
        }
    }
}

fn format_budget(budget: Duration) -> String {
    if budget.subsec_nanos() == 0 {
        format!("{}s", budget.as_secs())
    } else {
        format!("{:.2}s", budget.as_secs_f64())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub name: String,
    pub category: String,
    pub outcome: Outcome,
    pub duration: Duration,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_pass()
    }

    pub fn skipped(&self) -> bool {
        self.outcome.is_skip()
    }
}

/// The armed deadline for one test
///
/// Owns the spawned body. Dropping it aborts the task, so the deadline is
/// disarmed on every exit path of [`Runner::run_one`], the timeout path
/// included. Aborting a finished task is a no-op.
struct ArmedDeadline<T> {
    handle: JoinHandle<T>,
}

impl<T> Drop for ArmedDeadline<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sequential test runner with a per-test budget
#[derive(Debug, Clone)]
pub struct Runner {
    timeout: Duration,
}

impl Runner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one test case under the deadline
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run_one<C>(&self, case: &TestCase<C>, ctx: Arc<C>) -> TestResult
    where
        C: Send + Sync + 'static,
    {
        debug!(test = case.name(), category = case.category(), "Running test");
        let start = Instant::now();

        let outcome = {
            let mut deadline = ArmedDeadline {
                handle: tokio::spawn(case.start(ctx)),
            };
            let joined = tokio::time::timeout(self.timeout, &mut deadline.handle).await;
            match joined {
                Ok(Ok(result)) => Outcome::from_check(result),
                Ok(Err(join_error)) => Outcome::from_join_error(join_error),
                Err(_elapsed) => {
                    warn!(
                        test = case.name(),
                        budget_secs = self.timeout.as_secs_f64(),
                        "Test exceeded its budget; abandoning it"
                    );
                    Outcome::TimedOut {
                        budget: self.timeout,
                    }
                }
            }
        };

        let duration = start.elapsed();
        match &outcome {
            Outcome::Passed | Outcome::Skipped { .. } => {
                debug!(test = case.name(), outcome = outcome.label(), ?duration, "Test finished")
            }
            _ => info!(test = case.name(), outcome = outcome.label(), ?duration, "Test did not pass"),
        }

        TestResult {
            name: case.name().to_string(),
            category: case.category().to_string(),
            outcome,
            duration,
        }
    }

    /// Run the selected tests, grouped by category in display order
    pub async fn run<C>(
        &self,
        selected: Vec<&TestCase<C>>,
        ctx: Arc<C>,
        order: &CategoryOrder,
    ) -> RunReport
    where
        C: Send + Sync + 'static,
    {
        self.run_with(selected, ctx, order, |_| {}).await
    }

    /// Like [`Runner::run`], calling `on_result` as each test finishes
    pub async fn run_with<C, F>(
        &self,
        mut selected: Vec<&TestCase<C>>,
        ctx: Arc<C>,
        order: &CategoryOrder,
        mut on_result: F,
    ) -> RunReport
    where
        C: Send + Sync + 'static,
        F: FnMut(&TestResult),
    {
        order.sort_by_category(&mut selected, |case| case.category());

        let mut categories: Vec<String> = Vec::new();
        for case in &selected {
            if !categories.iter().any(|c| c == case.category()) {
                categories.push(case.category().to_string());
            }
        }

        let mut report = RunReport::new(selected.len(), categories);
        for case in selected {
            let result = self.run_one(case, Arc::clone(&ctx)).await;
            on_result(&result);
            report.push(result);
        }
        report
    }
}
