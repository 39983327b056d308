//! Named query parameters.

use crate::value::Value;
use std::collections::BTreeMap;

/// Placeholder name → bound value.
///
/// Names are stored without the leading `:`; executors add it back when
/// binding. The map is ordered so rendered statements and their parameters
/// are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `name`, returning the value previously bound to it.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(normalize(name.as_ref()), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(normalize(name).as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(normalize(name).as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fold `other` into `self`. A name already bound to a *different* value
    /// is recorded in `conflicts`; the first binding wins.
    pub(crate) fn merge(&mut self, other: Params, conflicts: &mut Vec<String>) {
        for (name, value) in other.0 {
            match self.0.get(&name) {
                Some(existing) if *existing != value => {
                    if !conflicts.contains(&name) {
                        conflicts.push(name);
                    }
                }
                Some(_) => {}
                None => {
                    self.0.insert(name, value);
                }
            }
        }
    }
}

fn normalize(name: &str) -> String {
    name.strip_prefix(':').unwrap_or(name).to_string()
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Anything that can be bound to a fragment: `()`, a [`Params`] map, or a
/// list of `(name, value)` pairs.
pub trait IntoParams {
    fn into_params(self) -> Params;
}

impl IntoParams for Params {
    fn into_params(self) -> Params {
        self
    }
}

impl IntoParams for () {
    fn into_params(self) -> Params {
        Params::new()
    }
}

impl<K: AsRef<str>, V: Into<Value>, const N: usize> IntoParams for [(K, V); N] {
    fn into_params(self) -> Params {
        self.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<Value>> IntoParams for Vec<(K, V)> {
    fn into_params(self) -> Params {
        self.into_iter().collect()
    }
}
