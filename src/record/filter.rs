//! Filter criteria and summary counts for the browsing grid.

use super::project::{ProjectRecord, RecordMap};
use serde::Serialize;
use std::collections::BTreeSet;

/// Good/bad rating filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Good,
    Bad,
    /// Neither good nor bad.
    Unrated,
}

/// Criteria a record must satisfy to be shown. Unset criteria match anything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub favorite_only: bool,
    pub done: Option<bool>,
    pub rating: Option<Rating>,
    pub analyzed: Option<bool>,
    /// Exact (case-insensitive) category name.
    pub category: Option<String>,
    /// Exact (case-insensitive) tag.
    pub tag: Option<String>,
    pub origin: Option<String>,
    /// Case-insensitive substring over name, path, categories, tags and description.
    pub search: Option<String>,
}

impl RecordFilter {
    /// Returns true if no criterion is set.
    pub fn is_empty(&self) -> bool {
        !self.favorite_only
            && self.done.is_none()
            && self.rating.is_none()
            && self.analyzed.is_none()
            && self.category.is_none()
            && self.tag.is_none()
            && self.origin.is_none()
            && self.search.is_none()
    }

    pub fn matches(&self, record: &ProjectRecord) -> bool {
        if self.favorite_only && !record.favorite {
            return false;
        }
        if self.done.is_some_and(|done| record.done != done) {
            return false;
        }
        if self.analyzed.is_some_and(|analyzed| record.analyzed != analyzed) {
            return false;
        }
        if let Some(rating) = self.rating {
            let ok = match rating {
                Rating::Good => record.is_good(),
                Rating::Bad => record.is_bad(),
                Rating::Unrated => !record.is_good() && !record.is_bad(),
            };
            if !ok {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !record.categories.iter().any(|c| same_text(c, category)) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !record.tags.iter().any(|t| same_text(t, tag)) {
                return false;
            }
        }
        if let Some(origin) = &self.origin {
            if !same_text(&record.origin, origin) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !needle.is_empty() && !haystack_contains(record, &needle) {
                return false;
            }
        }
        true
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn haystack_contains(record: &ProjectRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle)
        || record.path().to_lowercase().contains(needle)
        || record
            .categories
            .iter()
            .chain(record.tags.iter())
            .any(|s| s.to_lowercase().contains(needle))
        || record
            .ai_description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Counts shown in the status bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub favorites: usize,
    pub done: usize,
    pub good: usize,
    pub bad: usize,
    pub analyzed: usize,
    pub categories: usize,
    pub tags: usize,
}

impl RecordMap {
    /// Records matching the filter, in path order.
    pub fn filter<'a>(&'a self, filter: &RecordFilter) -> Vec<&'a ProjectRecord> {
        self.iter().filter(|r| filter.matches(r)).collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats::default();
        let mut categories = BTreeSet::new();
        let mut tags = BTreeSet::new();
        for record in self {
            stats.total += 1;
            stats.favorites += usize::from(record.favorite);
            stats.done += usize::from(record.done);
            stats.good += usize::from(record.is_good());
            stats.bad += usize::from(record.is_bad());
            stats.analyzed += usize::from(record.analyzed);
            categories.extend(record.categories.iter().map(|c| c.as_str()));
            tags.extend(record.tags.iter().map(|t| t.as_str()));
        }
        stats.categories = categories.len();
        stats.tags = tags.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Flag;

    fn sample() -> RecordMap {
        let mut a = ProjectRecord::new("/p/Arvore Natal");
        a.categories = vec!["Natal".into()];
        a.tags = vec!["mdf".into(), "3mm".into()];
        a.favorite = true;
        a.set_flag(Flag::Good, true);
        a.analyzed = true;

        let mut b = ProjectRecord::new("/p/Caixa Pascoa");
        b.categories = vec!["Pascoa".into()];
        b.tags = vec!["mdf".into()];
        b.done = true;
        b.set_flag(Flag::Bad, true);
        b.ai_description = Some("Caixa com tampa deslizante".into());

        let c = ProjectRecord::new("/p/Luminaria");
        [a, b, c].into_iter().collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let map = sample();
        let filter = RecordFilter::default();
        assert!(filter.is_empty());
        assert_eq!(map.filter(&filter).len(), 3);
    }

    #[test]
    fn test_filter_combines_criteria() {
        let map = sample();
        let filter = RecordFilter {
            tag: Some("MDF".into()),
            rating: Some(Rating::Bad),
            ..Default::default()
        };
        let hits = map.filter(&filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Caixa Pascoa");
    }

    #[test]
    fn test_filter_unrated_and_favorites() {
        let map = sample();
        let unrated = RecordFilter {
            rating: Some(Rating::Unrated),
            ..Default::default()
        };
        assert_eq!(map.filter(&unrated)[0].name, "Luminaria");

        let favorites = RecordFilter {
            favorite_only: true,
            ..Default::default()
        };
        assert_eq!(map.filter(&favorites)[0].name, "Arvore Natal");
    }

    #[test]
    fn test_search_looks_at_description() {
        let map = sample();
        let filter = RecordFilter {
            search: Some("deslizante".into()),
            ..Default::default()
        };
        assert_eq!(map.filter(&filter).len(), 1);
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.favorites, 1);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.good, 1);
        assert_eq!(stats.bad, 1);
        assert_eq!(stats.analyzed, 1);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.tags, 2);
    }
}
