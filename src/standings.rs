use std::collections::HashMap;

use log::debug;

use crate::model::{Match, MatchOutcome, Standing, Team};

pub const POINTS_WIN: u32 = 3;
pub const POINTS_DRAW: u32 = 1;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    played: u32,
    wins: u32,
    draws: u32,
    losses: u32,
    goal_difference: i32,
}

/// Builds the league table from the full match history.
///
/// Every team in `teams` gets a row, including those that have not played.
/// Matches naming a team outside the roster are ignored, and each outcome is
/// taken from the scores rather than the stored `result`. Rows are ordered by
/// points, goal difference and wins (all descending), then by team id.
pub fn compute_standings(teams: &[Team], matches: &[Match]) -> Vec<Standing> {
    let mut tallies: HashMap<u32, Tally> = teams.iter().map(|t| (t.id, Tally::default())).collect();

    for m in matches {
        let home_gd = m.home_score as i32 - m.away_score as i32;
        let (home_delta, away_delta) = match MatchOutcome::from_scores(m.home_score, m.away_score) {
            MatchOutcome::Win => ((1, 0, 0), (0, 0, 1)),
            MatchOutcome::Draw => ((0, 1, 0), (0, 1, 0)),
            MatchOutcome::Loss => ((0, 0, 1), (1, 0, 0)),
        };
        if let Some(t) = tallies.get_mut(&m.home_team_id) {
            t.record(home_delta, home_gd);
        }
        if let Some(t) = tallies.get_mut(&m.away_team_id) {
            t.record(away_delta, -home_gd);
        }
    }

    let mut table: Vec<Standing> = teams
        .iter()
        .map(|team| {
            let t = tallies.get(&team.id).copied().unwrap_or_default();
            Standing {
                team_id: team.id,
                team_name: team.name.clone(),
                played: t.played,
                wins: t.wins,
                draws: t.draws,
                losses: t.losses,
                goal_difference: t.goal_difference,
                points: POINTS_WIN * t.wins + POINTS_DRAW * t.draws,
            }
        })
        .collect();

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_difference.cmp(&a.goal_difference))
            .then(b.wins.cmp(&a.wins))
            .then(a.team_id.cmp(&b.team_id))
    });
    debug!(
        "standings over {} matches for {} teams",
        matches.len(),
        table.len()
    );
    table
}

impl Tally {
    fn record(&mut self, (wins, draws, losses): (u32, u32, u32), goal_difference: i32) {
        self.played += 1;
        self.wins += wins;
        self.draws += draws;
        self.losses += losses;
        self.goal_difference += goal_difference;
    }
}
