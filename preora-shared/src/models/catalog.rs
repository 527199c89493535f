use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Game reference data, looked up by business id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Copy of a game's fields stamped onto an item when the item is written.
///
/// Items never follow a live reference to their game; editing the game
/// afterwards leaves existing items untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub id: String,
    pub game_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_image: Option<String>,
}

impl GameSnapshot {
    pub fn capture(game: &Game) -> Self {
        Self {
            id: game.id.clone(),
            game_title: game.title.clone(),
            game_image: game.image.clone(),
        }
    }
}

/// A catalog item that can be preordered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Business id (e.g. `ITEM-...`)
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base unit price in whole currency units
    pub price: i64,
    /// Down-payment per unit, never discounted
    pub dp: i64,
    /// Discount percent in [0, 100]
    #[serde(default)]
    pub discount: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "releaseDate", default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameSnapshot>,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: i64, dp: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: None,
            description: None,
            price,
            dp,
            discount: 0,
            category: None,
            release_date: None,
            image: None,
            images: Vec::new(),
            game: None,
        }
    }

    pub fn with_discount(mut self, discount: i32) -> Self {
        self.discount = discount;
        self
    }

    /// Stamp a snapshot of `game` onto this item
    pub fn with_game(mut self, game: &Game) -> Self {
        self.game = Some(GameSnapshot::capture(game));
        self
    }
}
