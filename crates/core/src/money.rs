use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn sum_fixed(total: Decimal, amount: Decimal) -> Decimal {
    round2(total + amount)
}

/// Subtraction for running aggregates; floored at zero so repeated
/// add/remove cycles cannot drive a total negative.
pub fn subtract_clamped(total: Decimal, amount: Decimal) -> Decimal {
    round2((total - amount).max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{round2, subtract_clamped, sum_fixed};

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round2(Decimal::new(12_345, 3)), Decimal::new(1235, 2));
        assert_eq!(round2(Decimal::new(12_344, 3)), Decimal::new(1234, 2));
    }

    #[test]
    fn sum_rounds_after_each_operation() {
        let total = sum_fixed(Decimal::new(1005, 3), Decimal::new(1005, 3));
        assert_eq!(total, Decimal::new(201, 2));
    }

    #[test]
    fn subtract_floors_at_zero() {
        let total = subtract_clamped(Decimal::new(500, 2), Decimal::new(800, 2));
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn subtract_keeps_two_decimals() {
        let total = subtract_clamped(Decimal::new(1000, 2), Decimal::new(333, 2));
        assert_eq!(total, Decimal::new(667, 2));
    }
}
