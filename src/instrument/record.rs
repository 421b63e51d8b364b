//! Resolved arguments of one call.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// Every declared parameter of one call mapped to exactly one value.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRecord {
    function: String,
    entries: Vec<(String, Value)>,
    var_keyword: Option<String>,
}

impl InvocationRecord {
    pub(crate) fn new(function: String, entries: Vec<(String, Value)>, var_keyword: Option<String>) -> Self {
        Self {
            function,
            entries,
            var_keyword,
        }
    }

    /// Name of the function the arguments were bound for.
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Like [`get`](Self::get), but also searches the keyword collector.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name).or_else(|| {
            let collector = self.var_keyword.as_deref()?;
            match self.get(collector)? {
                Value::Mapping(extra) => extra.get(name),
                _ => None,
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for InvocationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
