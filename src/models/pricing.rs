use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Unit price after applying a percentage discount.
///
/// The discount *amount* is rounded up before subtraction
/// (`price - ceil(price * percent / 100)`), matching the totals of every
/// order already on record. Do not change the rounding direction.
pub fn discounted_unit_price(price: Decimal, discount_percent: u32) -> Decimal {
    let discount = (price * Decimal::from(discount_percent) / dec!(100)).ceil();
    price - discount
}

/// Line total for a cart line: discounted unit price times quantity.
pub fn line_total(price: Decimal, discount_percent: u32, quantity: u32) -> Decimal {
    discounted_unit_price(price, discount_percent) * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_percent_off_hundred() {
        assert_eq!(discounted_unit_price(dec!(100), 10), dec!(90));
        assert_eq!(line_total(dec!(100), 10, 3), dec!(270));
    }

    #[test]
    fn discount_amount_rounds_up() {
        // 99 * 10% = 9.9, rounded up to 10
        assert_eq!(discounted_unit_price(dec!(99), 10), dec!(89));
        // 101 * 3% = 3.03, rounded up to 4
        assert_eq!(discounted_unit_price(dec!(101), 3), dec!(97));
    }

    #[test]
    fn zero_discount_is_identity() {
        assert_eq!(discounted_unit_price(dec!(250), 0), dec!(250));
        assert_eq!(line_total(dec!(250), 0, 2), dec!(500));
    }
}
