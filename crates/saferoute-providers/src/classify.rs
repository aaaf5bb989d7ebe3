//! Keyword classification of alert descriptions.
//!
//! The alerts feed carries free-text descriptions sourced from news
//! reports. Category and severity are derived from weighted threat
//! keywords when the feed does not state them explicitly.

use saferoute_core::models::{HazardCategory, HazardSeverity};

/// Threat keywords and their weights. Weight 2 keywords indicate
/// concrete violent events; weight 1 keywords are advisory language.
const THREAT_KEYWORDS: &[(&str, u32)] = &[
    ("attack", 2),
    ("terror", 2),
    ("bomb", 2),
    ("explosion", 2),
    ("shooting", 2),
    ("gunfire", 2),
    ("hostage", 2),
    ("riot", 2),
    ("violence", 2),
    ("threat", 1),
    ("alert", 1),
    ("warning", 1),
    ("danger", 1),
    ("suspicious", 1),
    ("security", 1),
    ("emergency", 1),
    ("evacuation", 1),
    ("protest", 1),
    ("strike", 1),
    ("blockade", 1),
];

/// Total threat weight of a description (case-insensitive substring
/// match, each keyword counted once).
pub fn threat_weight(text: &str) -> u32 {
    let text = text.to_lowercase();
    THREAT_KEYWORDS
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, weight)| weight)
        .sum()
}

/// Derive a hazard category from description text.
pub fn classify_category(text: &str) -> HazardCategory {
    let text = text.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if contains_any(&["terror", "bomb", "attack", "explosion", "shooting", "gunfire", "hostage"]) {
        HazardCategory::Terrorism
    } else if contains_any(&["protest", "riot", "strike", "blockade", "demonstration"]) {
        HazardCategory::Protest
    } else if contains_any(&["theft", "robbery", "burglary", "stolen"]) {
        HazardCategory::Theft
    } else if contains_any(&["accident", "collision", "crash", "pileup"]) {
        HazardCategory::Accident
    } else {
        HazardCategory::Other
    }
}

/// Derive a severity from the accumulated threat weight.
pub fn classify_severity(text: &str) -> HazardSeverity {
    match threat_weight(text) {
        0 => HazardSeverity::Low,
        1 => HazardSeverity::Medium,
        _ => HazardSeverity::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violent_keywords_score_high() {
        let text = "Terror attack reported near the highway";
        assert!(threat_weight(text) >= 2);
        assert_eq!(classify_severity(text), HazardSeverity::High);
        assert_eq!(classify_category(text), HazardCategory::Terrorism);
    }

    #[test]
    fn advisory_language_is_medium() {
        let text = "Security warning issued for the area";
        assert_eq!(classify_severity(text), HazardSeverity::High); // warning + security = 2
        let single = "Suspicious package reported";
        assert_eq!(classify_severity(single), HazardSeverity::Medium);
    }

    #[test]
    fn neutral_text_is_low_other() {
        let text = "Road resurfacing work continues this week";
        assert_eq!(threat_weight(text), 0);
        assert_eq!(classify_severity(text), HazardSeverity::Low);
        assert_eq!(classify_category(text), HazardCategory::Other);
    }

    #[test]
    fn category_groups() {
        assert_eq!(classify_category("Protest blocks the bypass"), HazardCategory::Protest);
        assert_eq!(classify_category("Vehicle theft ring busted"), HazardCategory::Theft);
        assert_eq!(classify_category("Multi-car collision on NH44"), HazardCategory::Accident);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(threat_weight("BOMB SCARE"), threat_weight("bomb scare"));
    }
}
