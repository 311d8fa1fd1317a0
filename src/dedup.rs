use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Keeps the most recently inserted value per id.
///
/// Values are yielded in the order each id was first seen, holding the data
/// of that id's last insertion.
#[derive(Debug, Clone)]
pub struct LatestById<T> {
    index: HashMap<String, usize>,
    entries: Vec<T>,
}

impl<T> Default for LatestById<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> LatestById<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when an earlier value for `id` was replaced.
    pub fn insert(&mut self, id: impl Into<String>, value: T) -> bool {
        match self.index.entry(id.into()) {
            Entry::Occupied(slot) => {
                self.entries[*slot.get()] = value;
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(self.entries.len());
                self.entries.push(value);
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|position| &self.entries[*position])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_values(self) -> Vec<T> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut table = LatestById::new();
        assert!(!table.insert("IE-1", "free"));
        assert!(!table.insert("IE-2", "occupied"));
        assert!(table.insert("IE-1", "out of service"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("IE-1"), Some(&"out of service"));
        assert_eq!(table.into_values(), vec!["out of service", "occupied"]);
    }
}
