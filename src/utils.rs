use bigdecimal::BigDecimal;

/// Round to `scale` decimal places, ties away from zero.
///
/// bigdecimal 0.3 has no explicit rounding-mode API, so this shifts the value,
/// nudges it by one half and truncates. The result always carries exactly
/// `scale` decimal digits.
pub fn round_half_up(value: &BigDecimal, scale: u32) -> BigDecimal {
    let factor = BigDecimal::from(10u64.pow(scale));
    let half = BigDecimal::from(1) / BigDecimal::from(2);
    let shifted = value * &factor;
    let nudged = if shifted >= BigDecimal::from(0) {
        shifted + half
    } else {
        shifted - half
    };
    (nudged.with_scale(0) / factor).with_scale(scale as i64)
}

/// Displayed money: 2 decimal places, half-up.
pub fn round_money(value: &BigDecimal) -> BigDecimal {
    round_half_up(value, 2)
}

/// Intermediate ratios: 4 decimal places, half-up.
pub fn round_ratio(value: &BigDecimal) -> BigDecimal {
    round_half_up(value, 4)
}

pub fn is_zero(value: &BigDecimal) -> bool {
    *value == BigDecimal::from(0)
}
