//! Fallback category inference from free-text order tags.
//!
//! The rules are a flat, ordered table: the first rule whose predicate holds
//! decides the category. When none holds the default applies.

use contracts::enums::appointment_category::AppointmentCategory;

const NEW_CUSTOMER_MARKER: &str = "new customer";
const RECURRENT_MARKER: &str = "recurrent";

/// Purchase motives typical of a first garment
const FIRST_PURCHASE_MOTIVES: &[&str] = &[
    "own wedding",
    "work-related",
    "work related",
    "someone else's wedding",
    "someone else's celebration",
];

/// Purchase motives typical of a repeat customer
const RECURRENT_PURCHASE_MOTIVES: &[&str] = &["daily for pleasure", "occasional for leisure"];

/// Default when no rule fires: first-step visit, the majority case
pub const DEFAULT_CATEGORY: AppointmentCategory = AppointmentCategory::Measurement;
pub const DEFAULT_RULE_NAME: &str = "default";

/// Flags extracted from an order's tags (case-insensitive substring matches)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSignals {
    pub is_new_customer: bool,
    pub is_recurrent_customer: bool,
    pub has_first_purchase_motive: bool,
    pub has_recurrent_purchase_motive: bool,
}

impl TagSignals {
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let lowered: Vec<String> = tags.iter().map(|t| t.as_ref().to_lowercase()).collect();
        let any_contains = |needle: &str| lowered.iter().any(|tag| tag.contains(needle));

        Self {
            is_new_customer: any_contains(NEW_CUSTOMER_MARKER),
            is_recurrent_customer: any_contains(RECURRENT_MARKER),
            has_first_purchase_motive: FIRST_PURCHASE_MOTIVES.iter().any(|m| any_contains(m)),
            has_recurrent_purchase_motive: RECURRENT_PURCHASE_MOTIVES
                .iter()
                .any(|m| any_contains(m)),
        }
    }
}

/// One row of the decision table
pub struct ClassificationRule {
    pub name: &'static str,
    pub applies: fn(&TagSignals) -> bool,
    pub category: AppointmentCategory,
}

/// Evaluated top to bottom, first match wins
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "new-customer",
        applies: |s| s.is_new_customer,
        category: AppointmentCategory::Measurement,
    },
    ClassificationRule {
        name: "recurrent-with-recurrent-motive",
        applies: |s| s.is_recurrent_customer && s.has_recurrent_purchase_motive,
        category: AppointmentCategory::Fitting,
    },
    ClassificationRule {
        // a returning customer buying a new garment gets measured again
        name: "recurrent-with-first-purchase-motive",
        applies: |s| s.is_recurrent_customer && s.has_first_purchase_motive,
        category: AppointmentCategory::Measurement,
    },
    ClassificationRule {
        name: "recurrent",
        applies: |s| s.is_recurrent_customer,
        category: AppointmentCategory::Fitting,
    },
];

/// Category plus the name of the rule that decided it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: AppointmentCategory,
    pub rule: &'static str,
}

/// Classify an order by its tags. Total: every tag list, empty included,
/// yields a category.
pub fn classify<S: AsRef<str>>(tags: &[S]) -> Classification {
    let signals = TagSignals::from_tags(tags);

    RULES
        .iter()
        .find(|rule| (rule.applies)(&signals))
        .map(|rule| Classification {
            category: rule.category,
            rule: rule.name,
        })
        .unwrap_or(Classification {
            category: DEFAULT_CATEGORY,
            rule: DEFAULT_RULE_NAME,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentCategory::{Fitting, Measurement};

    fn category_of<S: AsRef<str>>(tags: &[S]) -> AppointmentCategory {
        classify(tags).category
    }

    #[test]
    fn test_new_customer_overrides_recurrence() {
        assert_eq!(
            category_of(&["New Customer", "Occasional for leisure"]),
            Measurement
        );
        assert_eq!(
            classify(&["Recurrent", "NEW CUSTOMER", "Daily for pleasure"]).rule,
            "new-customer"
        );
    }

    #[test]
    fn test_recurrent_with_recurrent_motive() {
        assert_eq!(category_of(&["Recurrent", "Daily for pleasure"]), Fitting);
    }

    #[test]
    fn test_recurrent_with_first_purchase_motive() {
        let result = classify(&["Recurrent", "Own wedding"]);
        assert_eq!(result.category, Measurement);
        assert_eq!(result.rule, "recurrent-with-first-purchase-motive");
    }

    #[test]
    fn test_recurrent_motive_wins_over_first_purchase_motive() {
        assert_eq!(
            category_of(&["Recurrent", "Own wedding", "Occasional for leisure"]),
            Fitting
        );
    }

    #[test]
    fn test_recurrent_without_motive() {
        assert_eq!(category_of(&["Recurrent"]), Fitting);
        assert_eq!(classify(&["cliente recurrente"]).rule, "recurrent");
    }

    #[test]
    fn test_defaults() {
        let empty: [&str; 0] = [];
        assert_eq!(classify(&empty).category, Measurement);
        assert_eq!(classify(&empty).rule, DEFAULT_RULE_NAME);
        assert_eq!(category_of(&["Madrid store"]), Measurement);
        // a motive alone says nothing about recurrence
        assert_eq!(category_of(&["Daily for pleasure"]), Measurement);
    }

    #[test]
    fn test_own_celebration_is_not_a_first_purchase_motive() {
        let signals = TagSignals::from_tags(&["Recurrent", "Celebration dinner"]);
        assert!(!signals.has_first_purchase_motive);
        assert_eq!(classify(&["Recurrent", "Celebration dinner"]).rule, "recurrent");
        assert_eq!(
            category_of(&["Recurrent", "Someone else's celebration"]),
            Measurement
        );
    }

    #[test]
    fn test_case_insensitive_substring() {
        let signals = TagSignals::from_tags(&["motive: WORK-RELATED event", "ReCuRrEnT"]);
        assert!(signals.is_recurrent_customer);
        assert!(signals.has_first_purchase_motive);
        assert!(!signals.has_recurrent_purchase_motive);
        assert!(!signals.is_new_customer);
    }

    #[test]
    fn test_deterministic() {
        let tags = vec!["Recurrent".to_string(), "Own wedding".to_string()];
        assert_eq!(classify(&tags), classify(&tags));
    }
}
