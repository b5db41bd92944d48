//! Admin management view: client-side search, sort and multi-select over the
//! already loaded catalog list.

use std::cmp::Ordering;
use std::str::FromStr;

use rand::seq::SliceRandom;

use crate::models::CatalogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Alphabetical.
    #[default]
    Title,
    /// Highest rated first.
    Rating,
    /// Newest first.
    Year,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SortKey::Title),
            "rating" => Ok(SortKey::Rating),
            "year" => Ok(SortKey::Year),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManageQuery {
    pub search: String,
    pub sort: SortKey,
}

impl ManageQuery {
    pub fn new(search: impl Into<String>, sort: SortKey) -> Self {
        Self {
            search: search.into(),
            sort,
        }
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || entry.title.to_lowercase().contains(&needle)
            || entry.genre.to_lowercase().contains(&needle)
    }

    /// Entries whose title or genre contains the search term, in sort order.
    pub fn apply<'a>(&self, entries: &'a [CatalogEntry]) -> Vec<&'a CatalogEntry> {
        let mut visible: Vec<&CatalogEntry> = entries.iter().filter(|e| self.matches(e)).collect();
        match self.sort {
            SortKey::Title => visible.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            SortKey::Rating => visible.sort_by(|a, b| {
                b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
            }),
            SortKey::Year => visible.sort_by(|a, b| b.year.cmp(&a.year)),
        }
        visible
    }
}

/// Ids ticked in the management list, in the order they were ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<i64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: i64) {
        if let Some(pos) = self.ids.iter().position(|&i| i == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    /// Select every visible entry, or clear if they are all selected already.
    pub fn toggle_all(&mut self, visible: &[&CatalogEntry]) {
        if !visible.is_empty() && self.ids.len() == visible.len() {
            self.ids.clear();
        } else {
            self.ids = visible.iter().map(|e| e.id).collect();
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// The "surprise me" button.
pub fn pick_random(entries: &[CatalogEntry]) -> Option<&CatalogEntry> {
    entries.choose(&mut rand::thread_rng())
}
