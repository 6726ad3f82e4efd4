use serde::{Deserialize, Serialize};

/// Which side of a card is shown first. German → Bulgarian recall is the harder one and
/// is scheduled with a larger interval multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "bg-de")]
    BgToDe,
    #[serde(rename = "de-bg")]
    DeToBg,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::BgToDe => "Bulgarian → German",
            Direction::DeToBg => "German → Bulgarian",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Direction::BgToDe => Direction::DeToBg,
            Direction::DeToBg => Direction::BgToDe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Direction::DeToBg).unwrap(), "\"de-bg\"");
        let parsed: Direction = serde_json::from_str("\"bg-de\"").unwrap();
        assert_eq!(parsed, Direction::BgToDe);
        assert_eq!(parsed.flipped(), Direction::DeToBg);
    }
}
