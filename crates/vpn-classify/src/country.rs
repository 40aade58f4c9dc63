use std::collections::HashMap;
use std::sync::LazyLock;

/// Full country names (and a handful of common aliases) mapped to their
/// ISO 3166-1 alpha-2 code. Lookup is case-insensitive; alpha-2 inputs
/// pass through unchanged (also case-insensitively).
static COUNTRY_CODES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("united kingdom", "GB"),
        ("great britain", "GB"),
        ("uk", "GB"),
        ("united states", "US"),
        ("united states of america", "US"),
        ("usa", "US"),
        ("romania", "RO"),
        ("germany", "DE"),
        ("france", "FR"),
        ("netherlands", "NL"),
        ("holland", "NL"),
        ("switzerland", "CH"),
        ("sweden", "SE"),
        ("norway", "NO"),
        ("finland", "FI"),
        ("denmark", "DK"),
        ("ireland", "IE"),
        ("spain", "ES"),
        ("italy", "IT"),
        ("portugal", "PT"),
        ("poland", "PL"),
        ("austria", "AT"),
        ("belgium", "BE"),
        ("czechia", "CZ"),
        ("czech republic", "CZ"),
        ("hungary", "HU"),
        ("canada", "CA"),
        ("australia", "AU"),
        ("japan", "JP"),
        ("singapore", "SG"),
        ("hong kong", "HK"),
        ("south korea", "KR"),
        ("korea, republic of", "KR"),
        ("india", "IN"),
        ("brazil", "BR"),
        ("mexico", "MX"),
        ("south africa", "ZA"),
        ("iceland", "IS"),
        ("luxembourg", "LU"),
        ("bulgaria", "BG"),
        ("ukraine", "UA"),
        ("turkey", "TR"),
        ("greece", "GR"),
    ])
});

/// Normalize a country string (full name or alpha-2 code, any case) to its
/// upper-case alpha-2 code. Returns `None` for the sentinel `unknown`/empty
/// input, which must never compare equal to anything.
pub fn normalize_country(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if let Some(code) = COUNTRY_CODES.get(lower.as_str()) {
        return Some((*code).to_string());
    }

    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_uppercase());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_full_names_and_codes() {
        assert_eq!(normalize_country("Romania").as_deref(), Some("RO"));
        assert_eq!(normalize_country("GB").as_deref(), Some("GB"));
        assert_eq!(normalize_country("gb").as_deref(), Some("GB"));
        assert_eq!(normalize_country("United Kingdom").as_deref(), Some("GB"));
    }

    #[test]
    fn unknown_sentinel_normalizes_to_none() {
        assert_eq!(normalize_country("Unknown"), None);
        assert_eq!(normalize_country(""), None);
        assert_eq!(normalize_country("unknown"), None);
    }

    #[test]
    fn unrecognized_long_form_does_not_guess() {
        assert_eq!(normalize_country("Atlantis"), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_country("Romania").unwrap();
        let twice = normalize_country(&once).unwrap();
        assert_eq!(once, twice);
    }
}
