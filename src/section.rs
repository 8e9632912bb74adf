/// A named group of settings, written as `[name]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<Entry>,
}

impl Section {
    #[must_use]
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            entries: Vec::with_capacity(16),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Entry::key)
    }

    /// Look up a value; keys are compared case-insensitively.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = normalize_key(key);
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(Entry::value)
    }

    /// Set `key` to `value`, replacing an earlier assignment in place.
    /// Returns the previous value, if any.
    pub(crate) fn insert(&mut self, key: &str, value: String) -> Option<String> {
        let key = normalize_key(key);

        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            return Some(std::mem::replace(&mut entry.value, value));
        }

        self.entries.push(Entry { key, value });
        None
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }
}

/// One `key = value` line. The key is stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    value: String,
}

impl Entry {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut String {
        &mut self.value
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
