//! Shared domain enumerations.

use serde::{Deserialize, Serialize};

/// Column a list search is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Title,
    Content,
    Username,
}

impl SearchType {
    pub const ALL: [SearchType; 3] = [SearchType::Title, SearchType::Content, SearchType::Username];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Title => "title",
            SearchType::Content => "content",
            SearchType::Username => "username",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchType::Title => "Title",
            SearchType::Content => "Content",
            SearchType::Username => "Author",
        }
    }

    /// Parses the query-string form. Unknown values yield `None`, which
    /// disables filtering rather than rejecting the request.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "title" => Some(SearchType::Title),
            "content" => Some(SearchType::Content),
            "username" => Some(SearchType::Username),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_columns_only() {
        assert_eq!(SearchType::parse("title"), Some(SearchType::Title));
        assert_eq!(SearchType::parse(" content "), Some(SearchType::Content));
        assert_eq!(SearchType::parse("username"), Some(SearchType::Username));
        assert_eq!(SearchType::parse("password"), None);
        assert_eq!(SearchType::parse(""), None);
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for search_type in SearchType::ALL {
            assert_eq!(SearchType::parse(search_type.as_str()), Some(search_type));
        }
    }
}
