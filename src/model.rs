use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
}

impl Team {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Result of a match from the home team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn from_scores(home_score: u32, away_score: u32) -> Self {
        if home_score > away_score {
            MatchOutcome::Win
        } else if home_score < away_score {
            MatchOutcome::Loss
        } else {
            MatchOutcome::Draw
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchOutcome::Win => "win",
            MatchOutcome::Draw => "draw",
            MatchOutcome::Loss => "loss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: u32,
    pub week: u32,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_score: u32,
    pub away_score: u32,
    pub result: MatchOutcome,
}

impl Match {
    pub fn involves(&self, team_id: u32) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    /// Id of the winning side, or `None` for a draw.
    pub fn winner_id(&self) -> Option<u32> {
        match self.result {
            MatchOutcome::Win => Some(self.home_team_id),
            MatchOutcome::Loss => Some(self.away_team_id),
            MatchOutcome::Draw => None,
        }
    }
}

/// A scored match that has not been written to the store yet. The outcome is
/// always derived from the scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub week: u32,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_score: u32,
    pub away_score: u32,
}

impl NewMatch {
    pub fn outcome(&self) -> MatchOutcome {
        MatchOutcome::from_scores(self.home_score, self.away_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPairing {
    pub home_team: Team,
    pub away_team: Team,
}

/// Ordered weeks, each an ordered list of pairings.
pub type Fixture = Vec<Vec<MatchPairing>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub team_id: u32,
    pub team_name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goal_difference: i32,
    pub points: u32,
}

/// A stored match joined with team names, the shape shown for a week's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekResult {
    pub id: u32,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub result: MatchOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_relative_to_home_side() {
        assert_eq!(MatchOutcome::from_scores(2, 0), MatchOutcome::Win);
        assert_eq!(MatchOutcome::from_scores(1, 1), MatchOutcome::Draw);
        assert_eq!(MatchOutcome::from_scores(1, 2), MatchOutcome::Loss);
    }

    #[test]
    fn outcome_serializes_lowercase() {
        let json = serde_json::to_string(&MatchOutcome::Draw).unwrap();
        assert_eq!(json, "\"draw\"");
    }

    #[test]
    fn winner_follows_result() {
        let m = Match {
            id: 1,
            week: 4,
            home_team_id: 3,
            away_team_id: 4,
            home_score: 1,
            away_score: 2,
            result: MatchOutcome::Loss,
        };
        assert_eq!(m.winner_id(), Some(4));
        assert!(m.involves(3));
        assert!(!m.involves(1));
    }
}
