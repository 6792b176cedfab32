//! Book record data model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Star rating shown on a detail page
///
/// The page encodes the rating as a class name word ("One".."Five").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rating {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Rating {
    /// Maps a class-name word to a rating, `None` for anything unrecognized
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "One" => Some(Self::One),
            "Two" => Some(Self::Two),
            "Three" => Some(Self::Three),
            "Four" => Some(Self::Four),
            "Five" => Some(Self::Five),
            _ => None,
        }
    }

    /// Maps a numeric value (1-5) to a rating
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            5 => Some(Self::Five),
            _ => None,
        }
    }

    /// Numeric star count
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for Rating {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_value(value)
            .ok_or_else(|| serde::de::Error::custom(format!("rating out of range: {}", value)))
    }
}

/// One book scraped from a detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,

    /// Price without the currency symbol
    pub price: f64,

    pub amount_in_stock: u32,

    /// `None` when the page carries an unrecognized rating word
    pub rating: Option<Rating>,

    /// Third breadcrumb entry (Home / Books / <category>)
    pub category: String,

    pub description: Option<String>,

    /// Universal product code, unique per book
    pub upc: String,
}
