use num_format::{Locale, ToFormattedString as _};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serializer;

use crate::decimal::Money;

/// Format a money amount with thousands separators and exactly two decimals,
/// always in the en locale (1,234.56).
pub fn format_money(amount: Money) -> String {
    let rounded = amount.round_dp(2).as_decimal();
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let abs = rounded.abs();

    let integer_part = abs.trunc().to_i128().unwrap_or_default();
    let cents = (abs.fract() * Decimal::from(100)).to_u32().unwrap_or_default();

    format!("{sign}{}.{cents:02}", integer_part.to_formatted_string(&Locale::en))
}

/// serialize money as a plain number instead of the decimal string form
pub(crate) fn money_as_number<S: Serializer>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(amount.to_f64())
}
