//! Tag-based price adjustment and order total rounding
//!
//! Adjusted prices are never rounded. Rounding happens once, on the order
//! total, and always up to the next cent. Arithmetic is checked: a product or
//! sum outside the decimal range is a validation error, never a panic.

use crate::config::PriceAdjustments;
use crate::core::error::{RentalError, RentalResult, ValidationError};
use crate::core::model::{Movie, PricedMovie, Tag};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

/// Decimal places of a monetary amount
const CENT_PLACES: u32 = 2;

/// Round a monetary amount up to the next cent
///
/// `10.001` becomes `10.01`; amounts already on a cent boundary are unchanged.
pub fn ceil_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CENT_PLACES, RoundingStrategy::ToPositiveInfinity)
}

/// Maps a movie's base price and tag to its adjusted price
#[derive(Debug, Clone)]
pub struct PricingEngine {
    adjustments: Arc<PriceAdjustments>,
}

impl PricingEngine {
    pub fn new(adjustments: Arc<PriceAdjustments>) -> Self {
        Self { adjustments }
    }

    /// Multiplier applied to movies carrying `tag`
    pub fn multiplier(&self, tag: Tag) -> Decimal {
        self.adjustments.multiplier(tag)
    }

    /// `base_price * multiplier(tag)`, unrounded
    pub fn adjusted_price(&self, base_price: Decimal, tag: Tag) -> RentalResult<Decimal> {
        base_price
            .checked_mul(self.multiplier(tag))
            .ok_or_else(|| out_of_range("price", "The price"))
    }

    /// Attach the adjusted price to a movie for catalog listings
    pub fn price_movie(&self, movie: Movie) -> RentalResult<PricedMovie> {
        let adjusted_price = self.adjusted_price(movie.price, movie.tag)?;
        Ok(PricedMovie {
            movie,
            adjusted_price,
        })
    }

    /// Exact sum of adjusted prices, rounded up to the cent
    pub fn order_total<'a, I>(&self, movies: I) -> RentalResult<Decimal>
    where
        I: IntoIterator<Item = &'a Movie>,
    {
        let mut sum = Decimal::ZERO;
        for movie in movies {
            let line = self
                .adjusted_price(movie.price, movie.tag)
                .map_err(|_| out_of_range("movie_ids", "The order total"))?;
            sum = sum
                .checked_add(line)
                .ok_or_else(|| out_of_range("movie_ids", "The order total"))?;
        }
        Ok(ceil_to_cents(sum))
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(Arc::new(PriceAdjustments::default()))
    }
}

fn out_of_range(field: &str, subject: &str) -> RentalError {
    ValidationError::FieldError {
        field: field.to_string(),
        message: format!("{} exceeds the supported price range.", subject),
    }
    .into()
}
