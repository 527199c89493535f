use preora_core::CoreError;
use preora_shared::{PreorderTotals, Pricing};

/// Upper bound of a discount, in percent
pub const MAX_DISCOUNT_PERCENT: i32 = 100;

/// Pricing input errors. These are caller mistakes and are never clamped away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("base price must not be negative: {0}")]
    NegativePrice(i64),

    #[error("down-payment must not be negative: {0}")]
    NegativeDownPayment(i64),

    #[error("discount must be within 0..=100 percent: {0}")]
    DiscountOutOfRange(i32),

    #[error("quantity must not be negative: {0}")]
    NegativeQuantity(i32),

    #[error("amount overflow while pricing")]
    Overflow,
}

impl From<PricingError> for CoreError {
    fn from(err: PricingError) -> Self {
        CoreError::ValidationError(err.to_string())
    }
}

/// Stateless price calculator for preorder lines.
///
/// Amounts are whole currency units. The discounted unit price is rounded
/// half-up; the down-payment is never discounted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    pub fn new() -> Self {
        Self
    }

    /// `max(0, round_half_up(base * (100 - discount) / 100))`
    pub fn final_unit_price(&self, base_price: i64, discount_percent: i32) -> Result<i64, PricingError> {
        if base_price < 0 {
            return Err(PricingError::NegativePrice(base_price));
        }
        if !(0..=MAX_DISCOUNT_PERCENT).contains(&discount_percent) {
            return Err(PricingError::DiscountOutOfRange(discount_percent));
        }

        let keep_percent = i64::from(MAX_DISCOUNT_PERCENT - discount_percent);
        let numerator = base_price
            .checked_mul(keep_percent)
            .and_then(|n| n.checked_add(50))
            .ok_or(PricingError::Overflow)?;

        // numerator is non-negative, so flooring after +50 is half-up
        Ok((numerator / 100).max(0))
    }

    /// Price one line. Quantity 0 is valid here and yields zero totals.
    pub fn price_line(
        &self,
        base_price: i64,
        discount_percent: i32,
        down_payment: i64,
        quantity: i32,
    ) -> Result<Pricing, PricingError> {
        if down_payment < 0 {
            return Err(PricingError::NegativeDownPayment(down_payment));
        }
        if quantity < 0 {
            return Err(PricingError::NegativeQuantity(quantity));
        }

        let unit_final_price = self.final_unit_price(base_price, discount_percent)?;
        let qty = i64::from(quantity);

        Ok(Pricing {
            unit_price: base_price,
            unit_discount_pct: discount_percent,
            unit_final_price,
            unit_dp: down_payment,
            line_total_price: unit_final_price.checked_mul(qty).ok_or(PricingError::Overflow)?,
            line_total_dp: down_payment.checked_mul(qty).ok_or(PricingError::Overflow)?,
        })
    }

    /// Sum line totals into order totals
    pub fn aggregate<'a, I>(&self, lines: I) -> Result<PreorderTotals, PricingError>
    where
        I: IntoIterator<Item = &'a Pricing>,
    {
        lines.into_iter().try_fold(PreorderTotals::default(), |acc, line| {
            Ok(PreorderTotals {
                price: acc
                    .price
                    .checked_add(line.line_total_price)
                    .ok_or(PricingError::Overflow)?,
                downpayment: acc
                    .downpayment
                    .checked_add(line.line_total_dp)
                    .ok_or(PricingError::Overflow)?,
            })
        })
    }
}
