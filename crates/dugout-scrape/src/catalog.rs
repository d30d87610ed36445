// LeagueCatalog: the schedule pages known for the current season.

use serde::{Deserialize, Serialize};

/// One configured league. `url` may be empty for a league whose schedule has
/// not been posted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueCatalog {
    entries: Vec<CatalogEntry>,
}

impl LeagueCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, label: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.label.eq_ignore_ascii_case(label))
    }
}

impl FromIterator<CatalogEntry> for LeagueCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
