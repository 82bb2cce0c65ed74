//! Search criteria for post listings.

use crate::domain::types::SearchType;

/// List filter. A search is only active when both a known column and a
/// non-blank keyword are present. The keyword is matched as typed; it is
/// dropped when the column is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostSearch {
    pub search_type: Option<SearchType>,
    pub keyword: Option<String>,
}

impl PostSearch {
    pub fn new(search_type: Option<&str>, keyword: Option<&str>) -> Self {
        let search_type = search_type.and_then(SearchType::parse);
        let keyword = keyword
            .filter(|value| search_type.is_some() && !value.trim().is_empty())
            .map(str::to_string);

        Self {
            search_type,
            keyword,
        }
    }

    /// The column and keyword to filter on, if the search is active.
    pub fn criteria(&self) -> Option<(SearchType, &str)> {
        match (self.search_type, self.keyword.as_deref()) {
            (Some(search_type), Some(keyword)) => Some((search_type, keyword)),
            _ => None,
        }
    }
}
