//! Season workflow: ties the store, the scheduler, the outcome predictor and
//! the prediction engine together.
//!
//! The season holds its store by value and every mutating operation takes
//! `&mut self`, so writes to one season are serialized by the borrow checker.
//! Callers sharing a season across threads wrap it in a `Mutex`.

use log::{debug, info, warn};

use crate::config::LeagueConfig;
use crate::error::{LeagueError, Result};
use crate::fixture::{FixtureGenerator, RoundRobinFixture, fixture_week};
use crate::model::{Fixture, Match, MatchPairing, NewMatch, Standing, Team, WeekResult};
use crate::outcome::{OutcomePredictor, build_requests, validate_outcomes};
use crate::predict::{MeetingHistory, PredictionEngine, PredictionReport, SEASON_WEEKS};
use crate::standings::compute_standings;
use crate::store::{ResultStore, SqliteStore};
use crate::strengths::{SIMULATION_STRENGTHS, StrengthTable};

/// First week with real results; earlier weeks exist in the fixture only.
pub const SEASON_START_WEEK: u32 = 4;
/// Fixture length generated when a single week is simulated by number.
pub const FIXTURE_LOOKAHEAD_WEEKS: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSettings {
    pub season_weeks: u32,
    pub start_week: u32,
    pub lookahead_weeks: usize,
    /// Clear a week before asking the predictor for its scores. If the
    /// predictor then fails, the week stays empty until it is simulated again.
    pub clear_before_predict: bool,
}

impl Default for SeasonSettings {
    fn default() -> Self {
        Self {
            season_weeks: SEASON_WEEKS,
            start_week: SEASON_START_WEEK,
            lookahead_weeks: FIXTURE_LOOKAHEAD_WEEKS,
            clear_before_predict: true,
        }
    }
}

pub struct Season<S: ResultStore> {
    store: S,
    scheduler: Box<dyn FixtureGenerator>,
    predictor: Box<dyn OutcomePredictor>,
    engine: PredictionEngine,
    simulation_strengths: StrengthTable,
    settings: SeasonSettings,
}

struct StoreMeetings<'a, S: ResultStore>(&'a S);

impl<S: ResultStore> MeetingHistory for StoreMeetings<'_, S> {
    fn last_meeting(&self, team_a: u32, team_b: u32) -> Result<Option<Match>> {
        self.0.find_last_meeting(team_a, team_b)
    }
}

/// Opens the configured database, seeds it and wires up a season.
pub fn open_season(config: &LeagueConfig) -> Result<Season<SqliteStore>> {
    let mut store = SqliteStore::open(&config.db_path)?;
    store.seed_defaults()?;
    let engine =
        PredictionEngine::new(config.prediction_strengths()?).with_season_weeks(config.season_weeks);
    Ok(Season::new(store, config.build_predictor()?)
        .with_scheduler(config.build_scheduler())
        .with_engine(engine)
        .with_simulation_strengths(config.simulation_strengths()?)
        .with_settings(config.settings()))
}

impl<S: ResultStore> Season<S> {
    pub fn new(store: S, predictor: Box<dyn OutcomePredictor>) -> Self {
        Self {
            store,
            scheduler: Box::new(RoundRobinFixture),
            predictor,
            engine: PredictionEngine::default(),
            simulation_strengths: SIMULATION_STRENGTHS.clone(),
            settings: SeasonSettings::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn FixtureGenerator>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_engine(mut self, engine: PredictionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_simulation_strengths(mut self, strengths: StrengthTable) -> Self {
        self.simulation_strengths = strengths;
        self
    }

    pub fn with_settings(mut self, settings: SeasonSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> SeasonSettings {
        self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn teams(&self) -> Result<Vec<Team>> {
        self.store.list_teams()
    }

    pub fn add_team(&mut self, name: &str) -> Result<Team> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeagueError::invalid("team name must not be empty"));
        }
        self.store.add_team(name)
    }

    /// Schedule for `weeks` weeks, or the full season when `None` or zero.
    pub fn fixture(&self, weeks: Option<usize>) -> Result<Fixture> {
        let weeks = weeks
            .filter(|w| *w > 0)
            .unwrap_or(self.settings.season_weeks as usize);
        self.scheduler.generate(&self.teams()?, weeks)
    }

    /// Week to show as "current": the start week until it has been played,
    /// `season_weeks + 1` once the season is over.
    pub fn current_week(&self) -> Result<u32> {
        let start = self.settings.start_week;
        let last = self.settings.season_weeks;
        Ok(match self.store.max_played_week()? {
            None => start,
            Some(played) if played < start => start,
            Some(played) if played >= last => last + 1,
            Some(played) => played + 1,
        })
    }

    pub fn is_finished(&self) -> Result<bool> {
        Ok(self.current_week()? > self.settings.season_weeks)
    }

    pub fn next_week_to_simulate(&self) -> Result<u32> {
        let next = self.store.max_played_week()?.map_or(1, |w| w + 1);
        if next > self.settings.season_weeks {
            return Err(LeagueError::invalid(format!(
                "week {next} exceeds max week limit {}",
                self.settings.season_weeks
            )));
        }
        Ok(next)
    }

    /// Simulates one week by number against the look-ahead fixture.
    pub fn simulate_week(&mut self, week: u32) -> Result<Vec<Match>> {
        if week == 0 {
            return Err(LeagueError::invalid("week index must be at least 1"));
        }
        let fixture = self.scheduler.generate(&self.teams()?, self.settings.lookahead_weeks)?;
        let pairings = fixture_week(&fixture, week)?.to_vec();
        self.play_week(week, &pairings)
    }

    pub fn simulate_next(&mut self) -> Result<(u32, Vec<Match>)> {
        let week = self.next_week_to_simulate()?;
        let fixture = self.fixture(None)?;
        let pairings = fixture_week(&fixture, week)?.to_vec();
        let played = self.play_week(week, &pairings)?;
        Ok((week, played))
    }

    /// Simulates every remaining week of the season, stopping at the first
    /// failure.
    pub fn simulate_all(&mut self) -> Result<Vec<(u32, Vec<Match>)>> {
        let first = self.current_week()?;
        let fixture = self.fixture(None)?;
        let mut out = Vec::new();
        for week in first..=self.settings.season_weeks {
            let pairings = fixture_week(&fixture, week)?.to_vec();
            let played = self.play_week(week, &pairings).map_err(|err| {
                warn!("simulation stopped at week {week}: {err}");
                err
            })?;
            out.push((week, played));
        }
        info!("simulated {} weeks", out.len());
        Ok(out)
    }

    fn play_week(&mut self, week: u32, pairings: &[MatchPairing]) -> Result<Vec<Match>> {
        let requests = build_requests(pairings, &self.simulation_strengths);

        let cleared = self.settings.clear_before_predict;
        if cleared {
            self.store.clear_week(week)?;
        }

        let results = self
            .predictor
            .predict(&requests)
            .and_then(|results| validate_outcomes(&requests, &results).map(|_| results));
        let results = match results {
            Ok(results) => results,
            Err(err) => {
                if cleared {
                    warn!("week {week} was cleared before the predictor failed and is now empty");
                }
                return Err(err);
            }
        };

        let rows: Vec<NewMatch> = results
            .iter()
            .map(|r| NewMatch {
                week,
                home_team_id: r.home_team_id,
                away_team_id: r.away_team_id,
                home_score: r.home_score,
                away_score: r.away_score,
            })
            .collect();
        debug!("week {week}: {} simulated results", rows.len());
        self.store.replace_week(week, &rows)
    }

    /// Deletes everything after the start week; returns the next week to play.
    pub fn reset(&mut self) -> Result<u32> {
        self.store.delete_after_week(self.settings.start_week)?;
        Ok(self.settings.start_week + 1)
    }

    /// Manual result entry.
    pub fn record_match(&mut self, m: &NewMatch) -> Result<Match> {
        if m.week == 0 {
            return Err(LeagueError::invalid("week must be at least 1"));
        }
        if m.home_team_id == m.away_team_id {
            return Err(LeagueError::invalid("a team cannot play itself"));
        }
        let teams = self.teams()?;
        for id in [m.home_team_id, m.away_team_id] {
            if !teams.iter().any(|t| t.id == id) {
                return Err(LeagueError::invalid(format!("unknown team id {id}")));
            }
        }
        self.store.insert_match(m)
    }

    pub fn correct_score(&mut self, match_id: u32, home_score: u32, away_score: u32) -> Result<Match> {
        if match_id == 0 {
            return Err(LeagueError::invalid("match id must be at least 1"));
        }
        self.store.update_score(match_id, home_score, away_score)
    }

    pub fn week_results(&self, week: u32) -> Result<Vec<WeekResult>> {
        if week == 0 {
            return Err(LeagueError::invalid("week number must be at least 1"));
        }
        self.store.week_results(week)
    }

    pub fn standings(&self) -> Result<Vec<Standing>> {
        Ok(compute_standings(&self.teams()?, &self.store.list_matches(None)?))
    }

    pub fn predictions(&self) -> Result<PredictionReport> {
        let teams = self.teams()?;
        let standings = compute_standings(&teams, &self.store.list_matches(None)?);
        if teams.is_empty() || standings.is_empty() {
            return Err(LeagueError::store("failed to retrieve teams or standings"));
        }
        let Some(last_played) = self.store.max_played_week()? else {
            return Err(LeagueError::store("failed to determine current week"));
        };

        let fixture = if last_played >= self.settings.season_weeks {
            Vec::new()
        } else {
            self.scheduler.generate(&teams, self.settings.season_weeks as usize)?
        };
        self.engine
            .predict(&standings, last_played, &fixture, &StoreMeetings(&self.store))
    }

    /// League leader once the last week has been played.
    pub fn champion(&self) -> Result<Option<Standing>> {
        if !self.is_finished()? {
            return Ok(None);
        }
        Ok(self.standings()?.into_iter().next())
    }
}
