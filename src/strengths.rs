use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{LeagueError, Result};

/// Rating used by the prediction engine for any team missing from its table.
pub const DEFAULT_PREDICTION_RATING: i32 = 70;

/// Immutable name -> rating lookup with a fallback for unlisted teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthTable {
    ratings: HashMap<String, i32>,
    default_rating: i32,
}

/// Ratings the forecasts are computed from.
pub static PREDICTION_STRENGTHS: Lazy<StrengthTable> = Lazy::new(|| {
    StrengthTable::from_pairs(
        [
            ("Manchester City", 90),
            ("Liverpool", 85),
            ("Arsenal", 80),
            ("Chelsea", 75),
        ],
        DEFAULT_PREDICTION_RATING,
    )
});

/// Ratings handed to the outcome predictor when a week is simulated. Unlisted
/// teams are sent with a rating of zero.
pub static SIMULATION_STRENGTHS: Lazy<StrengthTable> = Lazy::new(|| {
    StrengthTable::from_pairs(
        [
            ("Manchester City", 85),
            ("Liverpool", 83),
            ("Arsenal", 78),
            ("Chelsea", 75),
        ],
        0,
    )
});

impl StrengthTable {
    pub fn new(ratings: HashMap<String, i32>, default_rating: i32) -> Self {
        Self {
            ratings,
            default_rating,
        }
    }

    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, i32)>,
        default_rating: i32,
    ) -> Self {
        let ratings = pairs
            .into_iter()
            .map(|(name, rating)| (name.to_string(), rating))
            .collect();
        Self::new(ratings, default_rating)
    }

    /// Reads a `{ "Team": rating }` JSON object. Ratings must be non-negative.
    pub fn from_json_file(path: &Path, default_rating: i32) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            LeagueError::invalid(format!("read strength table {}: {err}", path.display()))
        })?;
        let ratings = serde_json::from_str::<HashMap<String, i32>>(&raw).map_err(|err| {
            LeagueError::invalid(format!("parse strength table {}: {err}", path.display()))
        })?;
        if default_rating < 0 {
            return Err(LeagueError::invalid(format!(
                "default rating must be non-negative, got {default_rating}"
            )));
        }
        if let Some((name, rating)) = ratings.iter().find(|(_, r)| **r < 0) {
            return Err(LeagueError::invalid(format!(
                "strength table {}: {name} has negative rating {rating}",
                path.display()
            )));
        }
        Ok(Self::new(ratings, default_rating))
    }

    pub fn rating(&self, team_name: &str) -> i32 {
        self.ratings
            .get(team_name)
            .copied()
            .unwrap_or(self.default_rating)
    }

    pub fn default_rating(&self) -> i32 {
        self.default_rating
    }
}

impl Default for StrengthTable {
    fn default() -> Self {
        PREDICTION_STRENGTHS.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_teams_fall_back_to_default() {
        let table = StrengthTable::default();
        assert_eq!(table.rating("Liverpool"), 85);
        assert_eq!(table.rating("Brentford"), DEFAULT_PREDICTION_RATING);
        assert_eq!(SIMULATION_STRENGTHS.rating("Brentford"), 0);
    }

    #[test]
    fn negative_ratings_in_a_file_are_rejected() {
        let path = std::env::temp_dir().join(format!(
            "league_sim_strengths_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"Arsenal": 80, "Chelsea": -20}"#).unwrap();
        let err = StrengthTable::from_json_file(&path, 70).unwrap_err();
        fs::write(&path, r#"{"Arsenal": 80, "Chelsea": 75}"#).unwrap();
        let ok = StrengthTable::from_json_file(&path, 70).unwrap();
        let _ = fs::remove_file(&path);

        assert!(matches!(err, LeagueError::InvalidInput(_)));
        assert_eq!(ok.rating("Chelsea"), 75);
        assert_eq!(ok.rating("Fulham"), 70);
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = StrengthTable::from_json_file(Path::new("/nonexistent/strengths.json"), 70)
            .unwrap_err();
        assert!(matches!(err, LeagueError::InvalidInput(_)));
    }
}
