//! Price parsing and rendering.
//!
//! Prices are fixed-point currency values with two decimal places. Form
//! input arrives as a string and may contain thousands separators
//! ("1,234.50"), which are stripped before parsing.

use core::str::FromStr;

use rust_decimal::Decimal;

use stockbook_core::{DomainError, DomainResult};

/// Parse a user-supplied price string into a 2-decimal fixed-point value.
pub fn parse_price(input: &str) -> DomainResult<Decimal> {
    let cleaned = input.replace(',', "");
    let mut price = Decimal::from_str(cleaned.trim())
        .map_err(|_| DomainError::validation("Invalid price"))?;
    if price.is_sign_negative() {
        return Err(DomainError::validation("Price cannot be negative"));
    }
    price.rescale(2);
    Ok(price)
}

/// Render a price with exactly two decimal places.
pub fn format_price(price: &Decimal) -> String {
    let mut price = *price;
    price.rescale(2);
    price.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_values() {
        assert_eq!(format_price(&parse_price("12.5").unwrap()), "12.50");
        assert_eq!(format_price(&parse_price("7").unwrap()), "7.00");
    }

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(format_price(&parse_price("1,234.56").unwrap()), "1234.56");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_price("twelve").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for unparseable price"),
        }
    }

    #[test]
    fn rejects_negative_prices() {
        let err = parse_price("-3.00").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for negative price"),
        }
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(format_price(&parse_price("0.999").unwrap()), "1.00");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: rendering then re-parsing a price is lossless.
            #[test]
            fn format_then_parse_round_trips(cents in 0i64..10_000_000_000) {
                let price = Decimal::new(cents, 2);
                let rendered = format_price(&price);
                prop_assert_eq!(parse_price(&rendered).unwrap(), price);
            }

            /// Property: parsed prices always carry exactly two decimals.
            #[test]
            fn parsed_prices_have_scale_two(units in 0u32..100_000, frac in 0u32..1000) {
                let input = format!("{units}.{frac:03}");
                let price = parse_price(&input).unwrap();
                prop_assert_eq!(price.scale(), 2);
            }
        }
    }
}
