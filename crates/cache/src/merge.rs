use std::collections::HashMap;
use tome_catalog::models::CatalogEntry;

/// Result of overlaying cached metadata onto a fresh catalog response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Merged {
    /// One entry per fresh result, in the catalog's order.
    pub entries: Vec<CatalogEntry>,
    /// Fresh results that had no cached counterpart and should be backfilled.
    pub misses: Vec<CatalogEntry>,
}

/// Prefers the cached copy of each fresh result.
///
/// Cached metadata may have been enriched by a details lookup (ISBNs, a
/// larger cover), which a plain search result never carries.
pub fn merge(fresh: Vec<CatalogEntry>, cached: &HashMap<String, CatalogEntry>) -> Merged {
    let mut merged = Merged { entries: Vec::with_capacity(fresh.len()), misses: Vec::new() };
    for entry in fresh {
        match cached.get(&entry.id) {
            Some(hit) => merged.entries.push(hit.clone()),
            None => {
                merged.misses.push(entry.clone());
                merged.entries.push(entry);
            },
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_wins_and_misses_are_reported() {
        let fresh = vec![
            CatalogEntry::new("/works/OL1W", "Dune"),
            CatalogEntry::new("/works/OL2W", "Emma"),
            CatalogEntry::new("/works/OL3W", "Ulysses"),
        ];
        let enriched = CatalogEntry::new("/works/OL2W", "Emma").with_isbn(["9780141439587"]);
        let cached = HashMap::from([(enriched.id.clone(), enriched.clone())]);

        let merged = merge(fresh, &cached);
        let ids: Vec<_> = merged.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["/works/OL1W", "/works/OL2W", "/works/OL3W"]);
        assert_eq!(merged.entries[1], enriched);
        let misses: Vec<_> = merged.misses.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(misses, ["/works/OL1W", "/works/OL3W"]);
    }

    #[test]
    fn test_nothing_cached() {
        let fresh = vec![CatalogEntry::new("/works/OL1W", "Dune")];
        let merged = merge(fresh.clone(), &HashMap::new());
        assert_eq!(merged.entries, fresh);
        assert_eq!(merged.misses, fresh);
    }
}
