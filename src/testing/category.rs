//! Category display ordering
//!
//! Categories in the priority list come first, in list order. Anything
//! else sorts after them, keeping first-seen order.

use std::collections::HashMap;

/// Priority lookup built from an ordered list of category names
#[derive(Debug, Clone, Default)]
pub struct CategoryOrder {
    names: Vec<String>,
    priority: HashMap<String, usize>,
}

impl CategoryOrder {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Self::default();
        for name in names {
            let name = name.into();
            if !order.priority.contains_key(&name) {
                order.priority.insert(name.clone(), order.names.len());
                order.names.push(name);
            }
        }
        order
    }

    /// Position in the priority list; unlisted categories get `len(list)`
    pub fn priority(&self, category: &str) -> usize {
        self.priority
            .get(category)
            .copied()
            .unwrap_or(self.names.len())
    }

    /// Sort items so categories are contiguous and in display order
    ///
    /// Unlisted categories follow in first-seen order. The sort is stable,
    /// so items keep their insertion order within a category.
    pub fn sort_by_category<T, F>(&self, items: &mut [T], category_of: F)
    where
        F: Fn(&T) -> &str,
    {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        for item in items.iter() {
            let category = category_of(item);
            if !first_seen.contains_key(category) {
                first_seen.insert(category.to_string(), first_seen.len());
            }
        }
        items.sort_by_key(|item| {
            let category = category_of(item);
            (self.priority(category), first_seen[category])
        });
    }

    /// Group items by category, groups in display order
    ///
    /// Unlisted categories appear after listed ones in first-seen order.
    pub fn group<'a, T, F>(&self, items: &'a [T], category_of: F) -> Vec<(&'a str, Vec<&'a T>)>
    where
        F: Fn(&'a T) -> &'a str,
    {
        let mut groups: Vec<(&'a str, Vec<&'a T>)> = Vec::new();
        for item in items {
            let category = category_of(item);
            match groups.iter_mut().find(|(name, _)| *name == category) {
                Some((_, members)) => members.push(item),
                None => groups.push((category, vec![item])),
            }
        }
        groups.sort_by_key(|(name, _)| self.priority(name));
        groups
    }
}
