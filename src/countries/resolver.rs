use std::collections::HashMap;
use tracing::debug;

use super::aliases::canonical_name;
use super::model::CountryMetadata;
use crate::observability::metrics;

/// Resolve a feed location to its reference record.
///
/// The alias table is applied first, then the canonical name is compared
/// case-insensitively with each record's `name` and `native_name` (the raw
/// location is also tried against `native_name`). The first match in
/// reference order wins.
pub fn resolve_country<'a>(
    location: &str,
    countries: &'a [CountryMetadata],
) -> Option<&'a CountryMetadata> {
    find_index(location, countries).map(|i| &countries[i])
}

fn find_index(location: &str, countries: &[CountryMetadata]) -> Option<usize> {
    if location.trim().is_empty() {
        return None;
    }
    let canonical = canonical_name(location).to_lowercase();
    let raw = location.to_lowercase();

    // Reference entries with a blank name or native name never match on it
    countries.iter().position(|c| {
        let name_matches = !c.name.is_empty() && c.name.to_lowercase() == canonical;
        let native = c.native_name.to_lowercase();
        name_matches || (!native.is_empty() && (native == canonical || native == raw))
    })
}

/// Resolver that memoises the result per distinct location, so a long
/// series only scans the reference set once per country.
pub struct CountryResolver<'a> {
    countries: &'a [CountryMetadata],
    cache: HashMap<String, Option<usize>>,
}

impl<'a> CountryResolver<'a> {
    pub fn new(countries: &'a [CountryMetadata]) -> Self {
        Self {
            countries,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, location: &str) -> Option<&'a CountryMetadata> {
        let countries = self.countries;
        if let Some(hit) = self.cache.get(location) {
            return hit.map(|i| &countries[i]);
        }

        let found = find_index(location, countries);
        match found {
            Some(i) => {
                debug!(location, country = %countries[i].name, "resolved location");
                metrics::resolve::location_resolved();
            }
            None => {
                debug!(location, "no reference country for location");
                metrics::resolve::location_unresolved();
            }
        }
        self.cache.insert(location.to_string(), found);
        found.map(|i| &countries[i])
    }

    /// Distinct locations looked up so far that had no match, sorted
    pub fn unresolved(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .cache
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn distinct_locations(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_set() -> Vec<CountryMetadata> {
        vec![
            CountryMetadata::new("Portugal", Some(10_000_000), Some(92_000.0)).with_code("PT"),
            CountryMetadata::new("Korea (Republic of)", Some(51_000_000), Some(100_210.0))
                .with_native_name("대한민국")
                .with_code("KR"),
            CountryMetadata::new("Germany", Some(83_000_000), Some(357_114.0))
                .with_native_name("Deutschland")
                .with_code("DE"),
        ]
    }

    #[test]
    fn test_alias_resolution() {
        let countries = reference_set();
        let found = resolve_country("South Korea", &countries).unwrap();
        assert_eq!(found.alpha2_code, "KR");
    }

    #[test]
    fn test_unknown_location_is_absent() {
        let countries = reference_set();
        assert!(resolve_country("Narnia", &countries).is_none());
    }

    #[test]
    fn test_case_insensitive_name_match() {
        let countries = reference_set();
        assert_eq!(resolve_country("PORTUGAL", &countries).unwrap().alpha2_code, "PT");
    }

    #[test]
    fn test_native_name_match() {
        let countries = reference_set();
        assert_eq!(resolve_country("deutschland", &countries).unwrap().alpha2_code, "DE");
    }

    #[test]
    fn test_blank_location_never_matches() {
        // No native names set, so every entry carries an empty one
        let countries = vec![CountryMetadata::new("Portugal", Some(1000), Some(10.0))];
        assert!(resolve_country("", &countries).is_none());
        assert!(resolve_country("   ", &countries).is_none());

        let nameless = vec![CountryMetadata::new("", Some(1000), Some(10.0))];
        assert!(resolve_country(" ", &nameless).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let countries = vec![
            CountryMetadata::new("Georgia", Some(3_700_000), None).with_code("GE"),
            CountryMetadata::new("Georgia", Some(10_600_000), None).with_code("US-GA"),
        ];
        assert_eq!(resolve_country("Georgia", &countries).unwrap().alpha2_code, "GE");
    }

    #[test]
    fn test_resolver_caches_and_reports_unresolved() {
        let countries = reference_set();
        let mut resolver = CountryResolver::new(&countries);

        assert!(resolver.resolve("Portugal").is_some());
        assert!(resolver.resolve("Portugal").is_some());
        assert!(resolver.resolve("Narnia").is_none());
        assert!(resolver.resolve("Atlantis").is_none());

        assert_eq!(resolver.distinct_locations(), 3);
        assert_eq!(resolver.unresolved(), vec!["Atlantis", "Narnia"]);
    }
}
