//! Reference resolver - category and payment type names to ids

use crate::domain::Lookups;

/// Name lookups against one session's snapshot of the lookup lists
///
/// Matching is exact after trimming, ignoring case. Categories match on
/// their title; payment types on the description or `description (*1234)`.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    lookups: &'a Lookups,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(lookups: &'a Lookups) -> Self {
        Self { lookups }
    }

    pub fn category_id(&self, name: &str) -> Option<i64> {
        let wanted = name.trim().to_lowercase();
        self.lookups
            .categories
            .iter()
            .find(|c| c.title.trim().to_lowercase() == wanted)
            .map(|c| c.id)
    }

    pub fn payment_type_id(&self, name: &str) -> Option<i64> {
        let wanted = name.trim().to_lowercase();
        self.lookups
            .payment_types
            .iter()
            .find(|p| p.names().iter().any(|n| n.trim().to_lowercase() == wanted))
            .map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, PaymentType};

    fn lookups() -> Lookups {
        Lookups::new(
            vec![
                Category {
                    id: 3,
                    title: "Food".to_string(),
                    description: None,
                },
                Category {
                    id: 4,
                    title: "Fast Food".to_string(),
                    description: None,
                },
            ],
            vec![
                PaymentType {
                    id: 1,
                    description: "Visa Gold".to_string(),
                    last_card_number: Some(42),
                    card_brand_name: None,
                    card_bank_name: None,
                },
                PaymentType {
                    id: 2,
                    description: "Cash".to_string(),
                    last_card_number: None,
                    card_brand_name: None,
                    card_bank_name: None,
                },
            ],
        )
    }

    #[test]
    fn test_category_exact_match_ignoring_case() {
        let lookups = lookups();
        let resolver = ReferenceResolver::new(&lookups);
        assert_eq!(resolver.category_id("food"), Some(3));
        assert_eq!(resolver.category_id(" FAST FOOD "), Some(4));
        // Substrings do not count
        assert_eq!(resolver.category_id("Foo"), None);
        assert_eq!(resolver.category_id("Groceries"), None);
    }

    #[test]
    fn test_payment_type_matches_description_and_label() {
        let lookups = lookups();
        let resolver = ReferenceResolver::new(&lookups);
        assert_eq!(resolver.payment_type_id("visa gold"), Some(1));
        assert_eq!(resolver.payment_type_id("Visa Gold (*0042)"), Some(1));
        assert_eq!(resolver.payment_type_id("Visa Gold (*42)"), Some(1));
        assert_eq!(resolver.payment_type_id("CASH"), Some(2));
        assert_eq!(resolver.payment_type_id("Visa Gold (*9999)"), None);
    }
}
