//! A vocabulary item is a Bulgarian/German word pair with its category and CEFR level.
use serde::{Deserialize, Serialize};
use std::fmt;

/// CEFR proficiency level of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Example sentence shown on the back of a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageExample {
    pub bulgarian: String,
    pub german: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: String,
    pub bulgarian: String,
    pub german: String,
    pub category: String,
    pub level: CefrLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<UsageExample>,
}

impl VocabularyItem {
    pub fn new(id: &str, bulgarian: &str, german: &str, category: &str, level: CefrLevel) -> Self {
        Self {
            id: id.to_string(),
            bulgarian: bulgarian.to_string(),
            german: german.to_string(),
            category: category.to_string(),
            level,
            notes: None,
            examples: Vec::new(),
        }
    }
}
