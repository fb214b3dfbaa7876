use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LeagueError, Result};
use crate::model::{Fixture, Match, MatchPairing, Standing};
use crate::strengths::StrengthTable;

pub const SEASON_WEEKS: u32 = 12;

const FORM_WIN_POINTS: f64 = 3.0;
const STRENGTH_WEIGHT: f64 = 0.15;
const HOME_ADVANTAGE: f64 = 5.0;
const PAST_WINNER_BONUS: f64 = 4.0;
const DRAW_PCT: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionshipOdds {
    #[serde(rename = "team")]
    pub team_name: String,
    pub chance: f64,
}

/// Win/draw/loss forecast for one upcoming pairing. Odds are `None` when the
/// matching percentage rounds to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub home_team: String,
    pub away_team: String,
    pub home_win_pct: f64,
    pub draw_pct: f64,
    pub away_win_pct: f64,
    pub home_odds: Option<f64>,
    pub draw_odds: Option<f64>,
    pub away_odds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    #[serde(rename = "championship_odds")]
    pub championship: Vec<ChampionshipOdds>,
    #[serde(rename = "next_week_predictions")]
    pub next_week: Vec<MatchPrediction>,
}

/// Lookup of the most recent meeting between two teams, in either orientation.
pub trait MeetingHistory {
    fn last_meeting(&self, team_a: u32, team_b: u32) -> Result<Option<Match>>;
}

impl MeetingHistory for [Match] {
    fn last_meeting(&self, team_a: u32, team_b: u32) -> Result<Option<Match>> {
        Ok(self
            .iter()
            .filter(|m| m.involves(team_a) && m.involves(team_b) && team_a != team_b)
            .max_by_key(|m| m.id)
            .cloned())
    }
}

impl MeetingHistory for Vec<Match> {
    fn last_meeting(&self, team_a: u32, team_b: u32) -> Result<Option<Match>> {
        self.as_slice().last_meeting(team_a, team_b)
    }
}

/// Turns standings, ratings and the upcoming week into odds.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    strengths: StrengthTable,
    season_weeks: u32,
}

impl PredictionEngine {
    pub fn new(strengths: StrengthTable) -> Self {
        Self {
            strengths,
            season_weeks: SEASON_WEEKS,
        }
    }

    pub fn with_season_weeks(mut self, season_weeks: u32) -> Self {
        self.season_weeks = season_weeks;
        self
    }

    /// Share of `3·wins + draws + 0.15·rating` across the table, in percent.
    /// Ratings below zero count as zero. Each chance is rounded on its own, so
    /// the total can drift from 100.
    pub fn championship_odds(&self, standings: &[Standing]) -> Vec<ChampionshipOdds> {
        let weights: Vec<(&str, f64)> = standings
            .iter()
            .map(|s| {
                let rating = self.rating(&s.team_name);
                let score = FORM_WIN_POINTS * s.wins as f64
                    + s.draws as f64
                    + STRENGTH_WEIGHT * rating;
                (s.team_name.as_str(), score)
            })
            .collect();
        let total: f64 = weights.iter().map(|(_, w)| w).sum();

        weights
            .into_iter()
            .map(|(name, weight)| ChampionshipOdds {
                team_name: name.to_string(),
                chance: if total > 0.0 {
                    round2(100.0 * weight / total)
                } else {
                    0.0
                },
            })
            .collect()
    }

    fn rating(&self, team_name: &str) -> f64 {
        self.strengths.rating(team_name).max(0) as f64
    }

    pub fn match_odds(&self, pairing: &MatchPairing, last_meeting: Option<&Match>) -> MatchPrediction {
        let home = &pairing.home_team;
        let away = &pairing.away_team;

        let mut home_str = self.rating(&home.name) + HOME_ADVANTAGE;
        let mut away_str = self.rating(&away.name);

        match last_meeting.and_then(Match::winner_id) {
            Some(id) if id == home.id => home_str += PAST_WINNER_BONUS,
            Some(id) if id == away.id => away_str += PAST_WINNER_BONUS,
            _ => {}
        }

        let total = home_str + away_str;
        let home_share = if total > 0.0 { home_str / total } else { 0.5 };
        let remaining = 100.0 - DRAW_PCT;
        let home_pct = remaining * home_share;
        let away_pct = remaining * (1.0 - home_share);

        MatchPrediction {
            home_team: home.name.clone(),
            away_team: away.name.clone(),
            home_win_pct: round2(home_pct),
            draw_pct: round2(DRAW_PCT),
            away_win_pct: round2(away_pct),
            home_odds: decimal_odds(home_pct),
            draw_odds: decimal_odds(DRAW_PCT),
            away_odds: decimal_odds(away_pct),
        }
    }

    /// Forecasts for the week after `last_played_week`. Returns nothing once
    /// the season cap has been reached.
    pub fn next_week_predictions<H>(
        &self,
        last_played_week: u32,
        fixture: &Fixture,
        history: &H,
    ) -> Result<Vec<MatchPrediction>>
    where
        H: MeetingHistory + ?Sized,
    {
        if last_played_week >= self.season_weeks {
            return Ok(Vec::new());
        }
        // Week N+1 lives at index N.
        let Some(week) = fixture.get(last_played_week as usize) else {
            return Err(LeagueError::invalid(format!(
                "next week fixture not available (week {})",
                last_played_week + 1
            )));
        };

        let mut out = Vec::with_capacity(week.len());
        for pairing in week {
            let meeting = history.last_meeting(pairing.home_team.id, pairing.away_team.id)?;
            out.push(self.match_odds(pairing, meeting.as_ref()));
        }
        debug!(
            "forecast {} matches for week {}",
            out.len(),
            last_played_week + 1
        );
        Ok(out)
    }

    pub fn predict<H>(
        &self,
        standings: &[Standing],
        last_played_week: u32,
        fixture: &Fixture,
        history: &H,
    ) -> Result<PredictionReport>
    where
        H: MeetingHistory + ?Sized,
    {
        Ok(PredictionReport {
            championship: self.championship_odds(standings),
            next_week: self.next_week_predictions(last_played_week, fixture, history)?,
        })
    }
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(StrengthTable::default())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn decimal_odds(pct: f64) -> Option<f64> {
    if round2(pct) <= 0.0 {
        return None;
    }
    Some(round2(100.0 / pct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchOutcome, Team};

    fn standing(id: u32, name: &str, wins: u32, draws: u32) -> Standing {
        Standing {
            team_id: id,
            team_name: name.to_string(),
            played: wins + draws,
            wins,
            draws,
            losses: 0,
            goal_difference: 0,
            points: 3 * wins + draws,
        }
    }

    fn pairing(home: (u32, &str), away: (u32, &str)) -> MatchPairing {
        MatchPairing {
            home_team: Team::new(home.0, home.1),
            away_team: Team::new(away.0, away.1),
        }
    }

    fn result(id: u32, home: u32, away: u32, hs: u32, as_: u32) -> Match {
        Match {
            id,
            week: 4,
            home_team_id: home,
            away_team_id: away,
            home_score: hs,
            away_score: as_,
            result: MatchOutcome::from_scores(hs, as_),
        }
    }

    #[test]
    fn negative_ratings_keep_chances_in_range() {
        let strengths = StrengthTable::from_pairs([("A", 90), ("B", -20)], 70);
        let engine = PredictionEngine::new(strengths);
        let odds = engine.championship_odds(&[standing(1, "A", 0, 0), standing(2, "B", 0, 0)]);
        assert_eq!(odds[0].chance, 100.0);
        assert_eq!(odds[1].chance, 0.0);

        let p = engine.match_odds(&pairing((2, "B"), (1, "A")), None);
        for pct in [p.home_win_pct, p.draw_pct, p.away_win_pct] {
            assert!((0.0..=100.0).contains(&pct));
        }
        assert!((p.home_win_pct - 3.95).abs() < 1e-9);
    }

    #[test]
    fn equal_teams_get_equal_championship_chances() {
        let strengths = StrengthTable::from_pairs([("A", 80), ("B", 80)], 70);
        let engine = PredictionEngine::new(strengths);
        let odds = engine.championship_odds(&[standing(1, "A", 0, 0), standing(2, "B", 0, 0)]);
        assert_eq!(odds[0].chance, odds[1].chance);
        assert_eq!(odds[0].chance, 50.0);
    }

    #[test]
    fn championship_uses_default_rating_for_unknown_teams() {
        let engine = PredictionEngine::default();
        // Liverpool 85 -> 12.75, Unknown 70 -> 10.5; total 23.25.
        let odds = engine.championship_odds(&[
            standing(1, "Liverpool", 0, 0),
            standing(2, "Unknown FC", 0, 0),
        ]);
        assert_eq!(odds[0].chance, 54.84);
        assert_eq!(odds[1].chance, 45.16);
        assert!(odds.iter().all(|o| (0.0..=100.0).contains(&o.chance)));
    }

    #[test]
    fn match_odds_split_the_non_draw_share_by_strength() {
        let engine = PredictionEngine::new(StrengthTable::from_pairs([("H", 75), ("A", 80)], 70));
        let p = engine.match_odds(&pairing((1, "H"), (2, "A")), None);
        // 80 vs 80 after the home bonus.
        assert_eq!(p.home_win_pct, 37.5);
        assert_eq!(p.away_win_pct, 37.5);
        assert_eq!(p.draw_pct, 25.0);
        assert_eq!(p.draw_odds, Some(4.0));
        assert_eq!(p.home_odds, Some(2.67));
    }

    #[test]
    fn percentages_sum_to_about_100() {
        let engine = PredictionEngine::default();
        let p = engine.match_odds(&pairing((1, "Manchester City"), (4, "Chelsea")), None);
        let sum = p.home_win_pct + p.draw_pct + p.away_win_pct;
        assert!((sum - 100.0).abs() <= 0.02, "sum was {sum}");
        assert!(p.home_win_pct > p.away_win_pct);
    }

    #[test]
    fn last_meeting_winner_gets_bonus() {
        let engine = PredictionEngine::new(StrengthTable::from_pairs([("H", 75), ("A", 80)], 70));
        let pair = pairing((1, "H"), (2, "A"));
        let away_won = result(7, 1, 2, 0, 1);
        let p = engine.match_odds(&pair, Some(&away_won));
        assert!(p.away_win_pct > p.home_win_pct);

        let drawn = result(8, 2, 1, 1, 1);
        let p = engine.match_odds(&pair, Some(&drawn));
        assert_eq!(p.home_win_pct, p.away_win_pct);
    }

    #[test]
    fn slice_history_picks_latest_meeting_in_either_orientation() {
        let history = vec![result(1, 1, 2, 2, 0), result(5, 2, 1, 3, 0), result(3, 1, 3, 0, 0)];
        let last = history.last_meeting(1, 2).unwrap().unwrap();
        assert_eq!(last.id, 5);
        assert_eq!(last.winner_id(), Some(2));
        assert!(history.last_meeting(2, 3).unwrap().is_none());
    }

    #[test]
    fn zero_percentage_has_no_odds() {
        let engine = PredictionEngine::new(StrengthTable::from_pairs([], 0));
        let p = engine.match_odds(&pairing((1, "H"), (2, "A")), None);
        assert_eq!(p.away_win_pct, 0.0);
        assert_eq!(p.away_odds, None);
        assert_eq!(p.home_win_pct, 75.0);
        assert_eq!(p.home_odds, Some(1.33));
    }

    #[test]
    fn no_forecast_after_the_season_cap() {
        let engine = PredictionEngine::default();
        let fixture: Fixture = vec![vec![pairing((1, "A"), (2, "B"))]; 12];
        let history: Vec<Match> = Vec::new();
        assert!(engine
            .next_week_predictions(12, &fixture, &history)
            .unwrap()
            .is_empty());
        assert_eq!(
            engine.next_week_predictions(11, &fixture, &history).unwrap().len(),
            1
        );
    }

    #[test]
    fn missing_fixture_week_is_invalid() {
        let engine = PredictionEngine::default();
        let fixture: Fixture = vec![vec![pairing((1, "A"), (2, "B"))]; 3];
        let history: Vec<Match> = Vec::new();
        assert!(matches!(
            engine.next_week_predictions(5, &fixture, &history),
            Err(LeagueError::InvalidInput(_))
        ));
    }
}
