//! Domain types: movies, tags and orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a movie in the catalog
pub type MovieId = i64;

/// Identifier of an order
pub type OrderId = i64;

/// Categorical label on a movie that selects its price multiplier
///
/// `Tag::None` covers both an absent tag and the empty string. It serializes
/// as JSON `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Trending,
    Under,
    #[default]
    None,
}

impl Tag {
    /// All tag values a movie may carry
    pub const ALL: [Tag; 3] = [Tag::Trending, Tag::Under, Tag::None];

    /// Wire/storage representation; `None` has no string form
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Tag::Trending => Some("trending"),
            Tag::Under => Some("under"),
            Tag::None => None,
        }
    }

    /// Decode a nullable stored value
    pub fn from_nullable(value: Option<&str>) -> Result<Self, UnknownTag> {
        match value {
            None => Ok(Tag::None),
            Some(s) => s.parse(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or(""))
    }
}

/// A tag string outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tag '{0}'")]
pub struct UnknownTag(pub String);

impl FromStr for Tag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(Tag::Trending),
            "under" => Ok(Tag::Under),
            "" => Ok(Tag::None),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(s) => serializer.serialize_str(s),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagVisitor;

        impl<'de> Visitor<'de> for TagVisitor {
            type Value = Tag;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("null, \"\", \"trending\" or \"under\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Tag, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_none<E: de::Error>(self) -> Result<Tag, E> {
                Ok(Tag::None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Tag, E> {
                Ok(Tag::None)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Tag, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_option(TagVisitor)
    }
}

/// A movie available for rental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub tag: Tag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A movie as shown in the catalog listing, with its tag-adjusted price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedMovie {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(with = "rust_decimal::serde::float")]
    pub adjusted_price: Decimal,
}

/// Fields of a movie about to be added to the catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub tag: Tag,
}

impl NewMovie {
    pub fn new(title: impl Into<String>, price: Decimal, tag: Tag) -> Self {
        Self {
            title: title.into(),
            price,
            tag,
        }
    }
}

/// Partial update of a catalog movie; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    /// `Some(Tag::None)` clears the tag; an explicit JSON `null` decodes to it
    #[serde(default, deserialize_with = "present_tag")]
    pub tag: Option<Tag>,
}

fn present_tag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Tag>, D::Error> {
    Tag::deserialize(deserializer).map(Some)
}

impl MoviePatch {
    /// Apply the patch in place and bump `updated_at`
    pub fn apply(&self, movie: &mut Movie, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            movie.title = title.clone();
        }
        if let Some(price) = self.price {
            movie.price = price;
        }
        if let Some(tag) = self.tag {
            movie.tag = tag;
        }
        movie.updated_at = now;
    }
}

/// An order as the persistence layer stores it: total plus associated ids
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub total: Decimal,
    pub movie_ids: BTreeSet<MovieId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its movies resolved, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub movies: Vec<Movie>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Ids of the associated movies
    pub fn movie_ids(&self) -> BTreeSet<MovieId> {
        self.movies.iter().map(|m| m.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn movie(tag: Tag) -> Movie {
        let now = Utc::now();
        Movie {
            id: 1,
            title: "Inception".to_string(),
            price: dec!(10.00),
            tag,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tag_parses_closed_set() {
        assert_eq!("trending".parse::<Tag>().unwrap(), Tag::Trending);
        assert_eq!("under".parse::<Tag>().unwrap(), Tag::Under);
        assert_eq!("".parse::<Tag>().unwrap(), Tag::None);
        let err = "popular".parse::<Tag>().unwrap_err();
        assert_eq!(err.to_string(), "unknown tag 'popular'");
    }

    #[test]
    fn test_tag_null_and_empty_are_none() {
        let from_null: Tag = serde_json::from_value(json!(null)).unwrap();
        let from_empty: Tag = serde_json::from_value(json!("")).unwrap();
        assert_eq!(from_null, Tag::None);
        assert_eq!(from_empty, Tag::None);
        assert!(serde_json::from_value::<Tag>(json!("new")).is_err());
    }

    #[test]
    fn test_missing_tag_field_defaults_to_none() {
        let draft: NewMovie =
            serde_json::from_value(json!({"title": "Heat", "price": 7.25})).unwrap();
        assert_eq!(draft.tag, Tag::None);
        assert_eq!(draft.price, dec!(7.25));
    }

    #[test]
    fn test_movie_serializes_numeric_price_and_nullable_tag() {
        let value = serde_json::to_value(movie(Tag::None)).unwrap();
        assert_eq!(value["price"], json!(10.0));
        assert_eq!(value["tag"], json!(null));

        let value = serde_json::to_value(movie(Tag::Trending)).unwrap();
        assert_eq!(value["tag"], json!("trending"));
    }

    #[test]
    fn test_priced_movie_flattens() {
        let priced = PricedMovie {
            movie: movie(Tag::Trending),
            adjusted_price: dec!(13.50),
        };
        let value = serde_json::to_value(priced).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["title"], json!("Inception"));
        assert_eq!(value["adjusted_price"], json!(13.5));
    }

    #[test]
    fn test_patch_distinguishes_null_tag_from_absent() {
        let cleared: MoviePatch = serde_json::from_value(json!({"tag": null})).unwrap();
        assert_eq!(cleared.tag, Some(Tag::None));

        let untouched: MoviePatch = serde_json::from_value(json!({"title": "Heat"})).unwrap();
        assert_eq!(untouched.tag, None);
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut m = movie(Tag::Trending);
        let patch = MoviePatch {
            tag: Some(Tag::None),
            ..Default::default()
        };
        patch.apply(&mut m, Utc::now());
        assert_eq!(m.tag, Tag::None);
        assert_eq!(m.title, "Inception");
        assert_eq!(m.price, dec!(10.00));
    }
}
