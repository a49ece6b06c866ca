/// Feed location names that differ from the reference set's canonical name.
/// Lookup is case-sensitive.
pub static COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("Brunei", "Brunei Darussalam"),
    ("Cape Verde", "Cabo Verde"),
    ("Cote d'Ivoire", "Côte d'Ivoire"),
    ("Curacao", "Curaçao"),
    ("Democratic Republic of Congo", "Congo (Democratic Republic of the)"),
    ("Faeroe Islands", "Faroe Islands"),
    ("Iran", "Iran (Islamic Republic of)"),
    ("Kosovo", "Republic of Kosovo"),
    ("Laos", "Lao People's Democratic Republic"),
    ("Macedonia", "Macedonia (the former Yugoslav Republic of)"),
    ("Palestine", "Palestine, State of"),
    ("Russia", "Russian Federation"),
    ("South Korea", "Korea (Republic of)"),
    ("Syria", "Syrian Arab Republic"),
    ("Timor", "Timor-Leste"),
    ("United States Virgin Islands", "Virgin Islands (U.S.)"),
    ("Vatican", "Holy See"),
    ("Vietnam", "Viet Nam"),
];

/// Canonical reference name for a feed location; the name itself when no
/// alias exists.
pub fn canonical_name(location: &str) -> &str {
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == location)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_aliases() {
        assert_eq!(canonical_name("South Korea"), "Korea (Republic of)");
        assert_eq!(canonical_name("Brunei"), "Brunei Darussalam");
        assert_eq!(canonical_name("Vatican"), "Holy See");
    }

    #[test]
    fn test_unknown_name_passes_through() {
        assert_eq!(canonical_name("Portugal"), "Portugal");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(canonical_name("south korea"), "south korea");
    }

    #[test]
    fn test_alias_keys_unique() {
        let keys: HashSet<_> = COUNTRY_ALIASES.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), COUNTRY_ALIASES.len());
        assert_eq!(COUNTRY_ALIASES.len(), 18);
    }
}
