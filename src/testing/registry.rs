//! Test registry
//!
//! The catalog of test cases, built once at startup by an explicit
//! registration step and read-only afterwards.

use futures_util::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::check::CheckResult;
use crate::common::{Error, Result};

/// Future returned by a test body
pub type TestFuture = BoxFuture<'static, CheckResult>;

/// A test body: takes the shared run context, yields a future
pub type TestBody<C> = Arc<dyn Fn(Arc<C>) -> TestFuture + Send + Sync>;

/// A named, categorized unit of verification logic
pub struct TestCase<C> {
    name: String,
    category: String,
    body: TestBody<C>,
}

impl<C> TestCase<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Start the body against a context
    pub(crate) fn start(&self, ctx: Arc<C>) -> TestFuture {
        (self.body)(ctx)
    }
}

impl<C> Clone for TestCase<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            category: self.category.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<C> fmt::Debug for TestCase<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Ordered catalog of test cases with unique names
pub struct Registry<C> {
    tests: Vec<TestCase<C>>,
    names: HashSet<String>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self {
            tests: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Register a test case
    ///
    /// Names are unique across the registry. A duplicate is a programming
    /// error and is returned as [`Error::DuplicateTest`] so startup aborts
    /// instead of overwriting the earlier registration.
    pub fn register<F, Fut>(&mut self, name: &str, category: &str, body: F) -> Result<()>
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CheckResult> + Send + 'static,
    {
        if !self.names.insert(name.to_string()) {
            return Err(Error::duplicate_test(name, category));
        }

        let body: TestBody<C> = Arc::new(move |ctx| body(ctx).boxed());
        self.tests.push(TestCase {
            name: name.to_string(),
            category: category.to_string(),
            body,
        });
        Ok(())
    }

    /// All test cases in registration order
    ///
    /// The iterator is `Clone`, so a caller can walk the catalog again.
    pub fn all(&self) -> std::slice::Iter<'_, TestCase<C>> {
        self.tests.iter()
    }

    /// Look up a test case by name
    pub fn get(&self, name: &str) -> Option<&TestCase<C>> {
        self.tests.iter().find(|t| t.name == name)
    }

    /// Distinct categories in first-seen order
    pub fn categories_seen(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for test in &self.tests {
            if !seen.contains(&test.category.as_str()) {
                seen.push(&test.category);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
