use std::collections::HashSet;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{LeagueError, Result};
use crate::model::{Fixture, MatchPairing, Team};

/// Anything that can turn a team list into a week-by-week schedule.
pub trait FixtureGenerator {
    fn generate(&self, teams: &[Team], week_count: usize) -> Result<Fixture>;
}

/// Circle-method round robin. The last slot is the anchor that never rotates;
/// an odd team count gets a bye slot whose pairings are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinFixture;

impl RoundRobinFixture {
    pub fn new() -> Self {
        Self
    }
}

impl FixtureGenerator for RoundRobinFixture {
    fn generate(&self, teams: &[Team], week_count: usize) -> Result<Fixture> {
        validate_teams(teams)?;
        if week_count == 0 {
            return Ok(Vec::new());
        }

        let base = base_cycle(teams);
        let weeks = extend_cycle(&base, week_count);
        debug!(
            "generated {} weeks from a {}-round cycle for {} teams",
            weeks.len(),
            base.len(),
            teams.len()
        );
        Ok(weeks)
    }
}

/// Same circle method over a seeded permutation of the team order. A given
/// seed always yields the same schedule.
#[derive(Debug, Clone, Copy)]
pub struct ShuffledRoundRobin {
    pub seed: u64,
}

impl ShuffledRoundRobin {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl FixtureGenerator for ShuffledRoundRobin {
    fn generate(&self, teams: &[Team], week_count: usize) -> Result<Fixture> {
        let mut order = teams.to_vec();
        let mut rng = StdRng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);
        RoundRobinFixture.generate(&order, week_count)
    }
}

/// Pairings for a 1-indexed week.
pub fn fixture_week(fixture: &Fixture, week: u32) -> Result<&[MatchPairing]> {
    if week == 0 {
        return Err(LeagueError::invalid("week index must be at least 1"));
    }
    fixture
        .get(week as usize - 1)
        .map(|w| w.as_slice())
        .ok_or_else(|| LeagueError::invalid(format!("week {week} does not exist")))
}

fn validate_teams(teams: &[Team]) -> Result<()> {
    if teams.len() < 2 {
        return Err(LeagueError::invalid(format!(
            "a fixture needs at least 2 teams, got {}",
            teams.len()
        )));
    }
    let mut seen = HashSet::new();
    for team in teams {
        if !seen.insert(team.id) {
            return Err(LeagueError::invalid(format!(
                "team id {} appears more than once",
                team.id
            )));
        }
    }
    Ok(())
}

fn base_cycle(teams: &[Team]) -> Fixture {
    // `None` is the bye slot.
    let mut slots: Vec<Option<&Team>> = teams.iter().map(Some).collect();
    if slots.len() % 2 != 0 {
        slots.push(None);
    }

    let n = slots.len();
    let total_rounds = n - 1;
    let per_round = n / 2;

    let mut weeks = Vec::with_capacity(total_rounds);
    for round in 0..total_rounds {
        let mut week = Vec::with_capacity(per_round);
        for slot in 0..per_round {
            let home_idx = (round + slot) % (n - 1);
            let away_idx = if slot == 0 {
                n - 1
            } else {
                (n - 1 - slot + round) % (n - 1)
            };

            let (Some(home), Some(away)) = (slots[home_idx], slots[away_idx]) else {
                continue;
            };

            let (home, away) = if round % 2 == 0 {
                (home, away)
            } else {
                (away, home)
            };
            week.push(MatchPairing {
                home_team: home.clone(),
                away_team: away.clone(),
            });
        }
        weeks.push(week);
    }
    weeks
}

fn extend_cycle(base: &Fixture, week_count: usize) -> Fixture {
    (0..week_count)
        .map(|idx| base[idx % base.len()].clone())
        .collect()
}
