//! Item catalogue for the shop and the farm
//!
//! Items are fixed at compile time. An item is a crop, a seed or both; seeds
//! carry the growth time and the harvest they turn into.

use std::time::Duration;

use crate::core::search::similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Crops,
    Seeds,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Crops, Category::Seeds];

    pub fn id(self) -> &'static str {
        match self {
            Category::Crops => "crops",
            Category::Seeds => "seeds",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Crops => "Crops",
            Category::Seeds => "Seeds",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Category::Crops => "🌾",
            Category::Seeds => "🌱",
        }
    }
}

/// What a planted seed becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    pub time: Duration,
    pub yields: &'static str,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub id: &'static str,
    pub name: &'static str,
    pub korean: &'static str,
    pub categories: &'static [Category],
    pub buy: Option<i64>,
    pub sell: Option<i64>,
    pub growth: Option<Growth>,
}

impl Item {
    pub fn is(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Best similarity of `typed` against the id and both names
    pub fn matches(&self, typed: &str) -> f64 {
        [self.id, self.name, self.korean]
            .into_iter()
            .map(|name| similarity(name, typed))
            .fold(0.0, f64::max)
    }
}

const MINUTE: u64 = 60;

const fn growth(minutes: u64, yields: &'static str, min: i64, max: i64) -> Option<Growth> {
    Some(Growth {
        time: Duration::from_secs(minutes * MINUTE),
        yields,
        min,
        max,
    })
}

pub static ITEMS: [Item; 10] = [
    Item {
        id: "beetroot",
        name: "Beetroot",
        korean: "비트",
        categories: &[Category::Crops],
        buy: None,
        sell: Some(1_350),
        growth: None,
    },
    Item {
        id: "beetroot_seeds",
        name: "Beetroot Seeds",
        korean: "비트씨앗",
        categories: &[Category::Seeds],
        buy: Some(1_500),
        sell: None,
        growth: growth(20, "beetroot", 2, 4),
    },
    Item {
        id: "carrot",
        name: "Carrot",
        korean: "당근",
        categories: &[Category::Crops, Category::Seeds],
        buy: Some(1_000),
        sell: Some(970),
        growth: growth(15, "carrot", 2, 4),
    },
    Item {
        id: "melon",
        name: "Melon",
        korean: "수박",
        categories: &[Category::Crops],
        buy: None,
        sell: Some(4_700),
        growth: None,
    },
    Item {
        id: "melon_seeds",
        name: "Melon Seeds",
        korean: "수박씨앗",
        categories: &[Category::Seeds],
        buy: Some(1_000),
        sell: None,
        growth: growth(30, "melon", 1, 1),
    },
    Item {
        id: "potato",
        name: "Potato",
        korean: "감자",
        categories: &[Category::Crops, Category::Seeds],
        buy: Some(1_000),
        sell: Some(970),
        growth: growth(15, "potato", 2, 4),
    },
    Item {
        id: "pumpkin",
        name: "Pumpkin",
        korean: "호박",
        categories: &[Category::Crops],
        buy: None,
        sell: Some(4_700),
        growth: None,
    },
    Item {
        id: "pumpkin_seeds",
        name: "Pumpkin Seeds",
        korean: "호박씨앗",
        categories: &[Category::Seeds],
        buy: Some(1_000),
        sell: None,
        growth: growth(30, "pumpkin", 1, 1),
    },
    Item {
        id: "wheat",
        name: "Wheat",
        korean: "밀",
        categories: &[Category::Crops],
        buy: None,
        sell: Some(2_050),
        growth: None,
    },
    Item {
        id: "wheat_seeds",
        name: "Wheat Seeds",
        korean: "밀씨앗",
        categories: &[Category::Seeds],
        buy: Some(100),
        sell: None,
        growth: growth(15, "wheat", 1, 1),
    },
];

pub fn item(id: &str) -> Option<&'static Item> {
    ITEMS.iter().find(|item| item.id == id)
}

/// Display name, falling back to the raw id for items no longer listed
pub fn name_of(id: &str) -> &str {
    item(id).map_or(id, |item| item.name)
}
