//! # Validation Module
//!
//! Business-rule validation for guest-supplied input.
//!
//! The important one is add-on validation: the selected add-ons arrive from
//! the client and must be checked against the room's configured catalog at
//! write time, otherwise a tampered request could book breakfast at one
//! cent. Name, price and currency must all match a catalog entry.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::AddOn;
use crate::MAX_SELECTED_ADD_ONS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates selected add-ons against the room's catalog.
///
/// ## Rules
/// - at most [`MAX_SELECTED_ADD_ONS`] entries
/// - every name must exist in the catalog
/// - price and currency must match the catalog entry exactly
///   (currency compared case-insensitively)
///
/// ## Returns
/// The validated add-on total, ready to fold into a quote.
pub fn validate_selected_add_ons(
    catalog: &[AddOn],
    selected: &[AddOn],
) -> ValidationResult<Money> {
    if selected.len() > MAX_SELECTED_ADD_ONS {
        return Err(ValidationError::TooManyAddOns {
            max: MAX_SELECTED_ADD_ONS,
        });
    }

    let mut total = Money::zero();

    for entry in selected {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "add-on name".to_string(),
            });
        }

        let allowed = catalog
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| ValidationError::UnknownAddOn {
                name: name.to_string(),
            })?;

        if allowed.price_cents != entry.price_cents {
            return Err(ValidationError::AddOnPriceMismatch {
                name: name.to_string(),
            });
        }

        if !allowed.currency.eq_ignore_ascii_case(&entry.currency) {
            return Err(ValidationError::AddOnCurrencyMismatch {
                name: name.to_string(),
            });
        }

        total += entry.price();
    }

    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn add_on(name: &str, cents: i64) -> AddOn {
        AddOn {
            name: name.to_string(),
            price_cents: cents,
            currency: "EUR".to_string(),
        }
    }

    fn catalog() -> Vec<AddOn> {
        vec![add_on("breakfast", 1500), add_on("late-checkout", 2500)]
    }

    #[test]
    fn test_valid_selection_sums_total() {
        let selected = vec![add_on("breakfast", 1500), add_on("late-checkout", 2500)];
        let total = validate_selected_add_ons(&catalog(), &selected).unwrap();
        assert_eq!(total, Money::from_cents(4000));
    }

    #[test]
    fn test_empty_selection_is_zero() {
        let total = validate_selected_add_ons(&catalog(), &[]).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_unknown_add_on_rejected() {
        let selected = vec![add_on("helicopter", 100)];
        let err = validate_selected_add_ons(&catalog(), &selected).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownAddOn { .. }));
    }

    #[test]
    fn test_tampered_price_rejected() {
        let selected = vec![add_on("breakfast", 1)];
        let err = validate_selected_add_ons(&catalog(), &selected).unwrap_err();
        assert!(matches!(err, ValidationError::AddOnPriceMismatch { .. }));
    }

    #[test]
    fn test_tampered_currency_rejected() {
        let mut entry = add_on("breakfast", 1500);
        entry.currency = "USD".to_string();
        let err = validate_selected_add_ons(&catalog(), &[entry]).unwrap_err();
        assert!(matches!(err, ValidationError::AddOnCurrencyMismatch { .. }));
    }

    #[test]
    fn test_currency_comparison_is_case_insensitive() {
        let mut entry = add_on("breakfast", 1500);
        entry.currency = "eur".to_string();
        assert!(validate_selected_add_ons(&catalog(), &[entry]).is_ok());
    }

    #[test]
    fn test_more_than_five_rejected() {
        let catalog: Vec<AddOn> = (0..6).map(|i| add_on(&format!("svc-{i}"), 100)).collect();
        let selected = catalog.clone();
        let err = validate_selected_add_ons(&catalog, &selected).unwrap_err();
        assert_eq!(err, ValidationError::TooManyAddOns { max: 5 });
    }
}
