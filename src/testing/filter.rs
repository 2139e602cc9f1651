//! Test selection

use super::registry::{Registry, TestCase};

/// Select the tests to run
///
/// - An explicit name selects that test alone, or nothing when no test has
///   that name. It takes precedence over categories.
/// - Otherwise a non-empty category list selects every test in one of them.
/// - Otherwise everything is selected.
///
/// Selected tests come back in registration order.
pub fn select<'a, C>(
    registry: &'a Registry<C>,
    explicit_name: Option<&str>,
    categories: &[String],
) -> Vec<&'a TestCase<C>> {
    if let Some(name) = explicit_name {
        return registry.get(name).into_iter().collect();
    }

    if !categories.is_empty() {
        return registry
            .all()
            .filter(|t| categories.iter().any(|c| c == t.category()))
            .collect();
    }

    registry.all().collect()
}
