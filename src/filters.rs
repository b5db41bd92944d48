/// Selector values that mean "no filter". The genre and year pickers use the
/// localized label, the type switch uses `all`.
pub const SENTINELS: [&str; 2] = ["all", "Все"];

pub fn is_sentinel(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(value))
}

/// A genre offered by the browse page. `name` is the exact value the server
/// stores, so it doubles as the `genre` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genre {
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

pub const GENRES: [Genre; 6] = [
    Genre {
        name: "Приключения",
        emoji: "🗺️",
        description: "Thrilling journeys and discoveries",
    },
    Genre {
        name: "Экшен",
        emoji: "⚔️",
        description: "Battles and fast-paced scenes",
    },
    Genre {
        name: "Фэнтези",
        emoji: "🧙",
        description: "Magic and fantastic worlds",
    },
    Genre {
        name: "Фантастика",
        emoji: "🚀",
        description: "Space and future technology",
    },
    Genre {
        name: "Комедия",
        emoji: "😂",
        description: "Humour and funny situations",
    },
    Genre {
        name: "Драма",
        emoji: "🎭",
        description: "Deep emotions and experiences",
    },
];

/// Release years offered by the year picker, newest first.
pub const YEARS: [i32; 5] = [2024, 2023, 2022, 2021, 2020];

/// Case-insensitive lookup in [`GENRES`].
pub fn find_genre(name: &str) -> Option<&'static Genre> {
    let wanted = name.trim().to_lowercase();
    GENRES.iter().find(|g| g.name.to_lowercase() == wanted)
}

/// Criteria for the catalog listing, combined with AND on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilters {
    pub content_type: String,
    pub genre: String,
    pub year: String,
    pub search: String,
}

impl Default for CatalogFilters {
    fn default() -> Self {
        Self {
            content_type: "all".to_string(),
            genre: "Все".to_string(),
            year: "Все".to_string(),
            search: String::new(),
        }
    }
}

impl CatalogFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(mut self, value: impl Into<String>) -> Self {
        self.content_type = value.into();
        self
    }

    pub fn genre(mut self, value: impl Into<String>) -> Self {
        self.genre = value.into();
        self
    }

    pub fn year(mut self, value: impl Into<String>) -> Self {
        self.year = value.into();
        self
    }

    pub fn search(mut self, value: impl Into<String>) -> Self {
        self.search = value.into();
        self
    }

    /// Query parameters to send. Fields holding a sentinel are left out
    /// entirely rather than sent empty.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !is_sentinel(&self.content_type) {
            pairs.push(("type", self.content_type.trim().to_string()));
        }
        if !is_sentinel(&self.genre) {
            pairs.push(("genre", self.genre.trim().to_string()));
        }
        if !is_sentinel(&self.year) {
            pairs.push(("year", self.year.trim().to_string()));
        }
        // Search is free text, so only blankness counts as "no filter"
        if !self.search.trim().is_empty() {
            pairs.push(("search", self.search.trim().to_string()));
        }
        pairs
    }

    /// Everything in one genre, as opened from the browse page.
    pub fn for_genre(genre: &Genre) -> Self {
        Self::new().genre(genre.name)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.query_pairs().is_empty()
    }
}
