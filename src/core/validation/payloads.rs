//! Validation rules of the request payloads

use super::config::{Presence, ValidationConfig};
use super::extractor::ValidatableEntity;
use super::{filters, validators};
use crate::core::model::{MovieId, MoviePatch, NewMovie, Tag};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// Longest accepted movie title, in characters
pub const MAX_TITLE_LENGTH: usize = 255;

/// Decimal places a price may carry, as stored in `NUMERIC(10, 2)`
pub const PRICE_PLACES: u32 = 2;

/// Largest storable price in cents (99 999 999.99)
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Largest accepted movie price
pub fn max_price() -> Decimal {
    Decimal::new(MAX_PRICE_CENTS, PRICE_PLACES)
}

/// Body of order create and update requests
///
/// Elements are kept raw so that ids of the wrong type and ids missing from
/// the catalog are reported together by the order assembler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderInput {
    pub movie_ids: Vec<Value>,
}

impl OrderInput {
    /// One entry per requested position, `None` where the element is not an
    /// integer id
    pub fn positions(&self) -> Vec<Option<MovieId>> {
        self.movie_ids.iter().map(Value::as_i64).collect()
    }
}

fn tag_values() -> Vec<String> {
    Tag::ALL
        .iter()
        .filter_map(|t| t.as_str())
        .map(str::to_string)
        .collect()
}

fn movie_rules(presence: Presence) -> ValidationConfig {
    let mut config = ValidationConfig::new("movie");
    config
        .field("title", presence)
        .filter(filters::trim())
        .validator(validators::required())
        .validator(validators::string())
        .validator(validators::string_length(1, MAX_TITLE_LENGTH));
    config
        .field("price", presence)
        .validator(validators::required())
        .validator(validators::numeric())
        .validator(validators::min_value(Decimal::ZERO))
        .validator(validators::max_value(max_price()))
        .validator(validators::decimal_places(PRICE_PLACES));
    config
        .field("tag", Presence::Sometimes)
        .nullable()
        .filter(filters::trim())
        .filter(filters::empty_to_null())
        .validator(validators::in_list(tag_values()));
    config
}

impl ValidatableEntity for NewMovie {
    fn validation_config() -> ValidationConfig {
        movie_rules(Presence::Required)
    }
}

impl ValidatableEntity for MoviePatch {
    fn validation_config() -> ValidationConfig {
        movie_rules(Presence::Sometimes)
    }
}

impl ValidatableEntity for OrderInput {
    fn validation_config() -> ValidationConfig {
        let mut config = ValidationConfig::new("order");
        config
            .field("movie_ids", Presence::Required)
            .validator(validators::required())
            .validator(validators::array());
        config
    }
}
