//! Run report and result aggregation

use std::time::Duration;

use super::runner::TestResult;

/// Summary counts for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// Passed, not counting skipped tests
    pub passed: usize,
    /// Failed, timed out or errored
    pub failed: usize,
    pub skipped: usize,
    pub total_duration: Duration,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// All results of one invocation, in execution order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    selected_count: usize,
    results: Vec<TestResult>,
    category_order: Vec<String>,
}

impl RunReport {
    pub fn new(selected_count: usize, category_order: Vec<String>) -> Self {
        Self {
            selected_count,
            results: Vec::with_capacity(selected_count),
            category_order,
        }
    }

    /// Append the result of a finished test
    pub fn push(&mut self, result: TestResult) {
        debug_assert!(
            !self.results.iter().any(|r| r.name == result.name),
            "test '{}' reported twice",
            result.name
        );
        self.results.push(result);
    }

    pub fn selected_count(&self) -> usize {
        self.selected_count
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Categories of the selection in display order
    pub fn category_order(&self) -> &[String] {
        &self.category_order
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for result in &self.results {
            if result.outcome.is_skip() {
                summary.skipped += 1;
            } else if result.outcome.is_pass() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            summary.total_duration += result.duration;
        }
        summary
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failure()).count()
    }

    /// Process exit code: the failure count capped at 127
    pub fn exit_code(&self) -> i32 {
        self.failure_count().min(127) as i32
    }

    /// Results grouped by category, groups in `category_order`
    ///
    /// Categories missing from `category_order` follow in first-seen order.
    pub fn grouped(&self) -> Vec<(&str, Vec<&TestResult>)> {
        let mut groups: Vec<(&str, Vec<&TestResult>)> = self
            .category_order
            .iter()
            .map(|c| (c.as_str(), Vec::new()))
            .collect();

        for result in &self.results {
            match groups.iter_mut().find(|(c, _)| *c == result.category) {
                Some((_, members)) => members.push(result),
                None => groups.push((result.category.as_str(), vec![result])),
            }
        }
        groups.retain(|(_, members)| !members.is_empty());
        groups
    }
}
