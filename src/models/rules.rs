use serde::Deserialize;

/// One category and the keywords that trigger it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn new(name: &str, keywords: &[&str]) -> Self {
        CategoryRule {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Keyword tables driving the heuristic extractors.
///
/// The defaults are tuned for English banners from Bangladeshi campuses;
/// every table can be replaced from the `[extraction]` config section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractionTables {
    /// Checked in order; the first category with a keyword appearing as a
    /// case-insensitive substring of the text wins.
    pub categories: Vec<CategoryRule>,
    /// Matched as case-insensitive substrings of the whole text.
    pub tag_keywords: Vec<String>,
    /// Matched case-insensitively at the start of a word, not as a bare
    /// substring: `hall` finds "Main Hall" and "Halls" but not "challenge".
    pub venue_gazetteer: Vec<String>,
    /// Location entities skipped while a more specific one exists.
    pub excluded_locations: Vec<String>,
    pub caption_title_limit: usize,
}

impl Default for ExtractionTables {
    fn default() -> Self {
        let categories = vec![
            CategoryRule::new("workshop", &["workshop", "training", "seminar", "tutorial"]),
            CategoryRule::new("seminar", &["seminar", "talk", "lecture", "presentation"]),
            CategoryRule::new("competition", &["competition", "contest", "hackathon", "challenge"]),
            CategoryRule::new("conference", &["conference", "summit", "symposium"]),
            CategoryRule::new("cultural", &["cultural", "festival", "concert", "performance"]),
            CategoryRule::new("sports", &["sports", "tournament", "match", "game"]),
            CategoryRule::new("social", &["social", "meetup", "gathering", "networking"]),
            CategoryRule::new("academic", &["academic", "research", "colloquium"]),
        ];

        let tag_keywords = ["online", "offline", "hybrid", "certificate", "networking", "workshop"];

        let venue_gazetteer = [
            "auditorium",
            "hall",
            "university",
            "college",
            "campus",
            "institute",
            "school",
            "stadium",
            "convention",
            "center",
            "centre",
            "library",
            "hotel",
            "building",
            "room",
            "theatre",
            "theater",
            "gymnasium",
            "bicc",
            "tsc",
            "buet",
            "shilpakala",
            "bangla academy",
        ];

        let excluded_locations = [
            "bangladesh",
            "dhaka",
            "chittagong",
            "chattogram",
            "india",
            "usa",
            "united states",
            "uk",
            "united kingdom",
            "london",
            "new york",
            "kolkata",
        ];

        ExtractionTables {
            categories,
            tag_keywords: tag_keywords.iter().map(|s| s.to_string()).collect(),
            venue_gazetteer: venue_gazetteer.iter().map(|s| s.to_string()).collect(),
            excluded_locations: excluded_locations.iter().map(|s| s.to_string()).collect(),
            caption_title_limit: 100,
        }
    }
}

impl ExtractionTables {
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Exact (case-insensitive) lookup of a category name.
    pub fn known_category(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_lowercase();
        self.category_names().find(|c| c.to_lowercase() == name)
    }

    pub fn is_excluded_location(&self, location: &str) -> bool {
        let location = location.trim().to_lowercase();
        self.excluded_locations.iter().any(|e| e.to_lowercase() == location)
    }
}
