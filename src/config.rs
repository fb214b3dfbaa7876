use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::fixture::{FixtureGenerator, RoundRobinFixture, ShuffledRoundRobin};
use crate::outcome::{CommandPredictor, HttpPredictor, OutcomePredictor, StrengthRatioPredictor};
use crate::predict::SEASON_WEEKS;
use crate::season::{FIXTURE_LOOKAHEAD_WEEKS, SEASON_START_WEEK, SeasonSettings};
use crate::store::default_db_path;
use crate::strengths::{
    DEFAULT_PREDICTION_RATING, PREDICTION_STRENGTHS, SIMULATION_STRENGTHS, StrengthTable,
};

const DEFAULT_PREDICTOR_CMD: &str = "python3 predictor/predict.py";
const DEFAULT_PREDICTOR_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictorKind {
    Builtin,
    Command(String),
    Http(String),
}

/// `LEAGUE_SCHEDULER`: `roundrobin` (default), `shuffled` or `shuffled:SEED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    RoundRobin,
    Shuffled(u64),
}

#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub db_path: PathBuf,
    pub scheduler: SchedulerKind,
    pub predictor: PredictorKind,
    pub predictor_timeout: Duration,
    pub season_weeks: u32,
    pub start_week: u32,
    pub prediction_strengths_path: Option<PathBuf>,
    pub simulation_strengths_path: Option<PathBuf>,
    pub clear_before_predict: bool,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            scheduler: SchedulerKind::RoundRobin,
            predictor: PredictorKind::Builtin,
            predictor_timeout: Duration::from_secs(DEFAULT_PREDICTOR_TIMEOUT_SECS),
            season_weeks: SEASON_WEEKS,
            start_week: SEASON_START_WEEK,
            prediction_strengths_path: None,
            simulation_strengths_path: None,
            clear_before_predict: true,
        }
    }
}

impl LeagueConfig {
    /// Loads `.env.local` / `.env` if present, then reads `LEAGUE_*` variables.
    /// Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let predictor = match non_empty("LEAGUE_PREDICTOR")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("command") => PredictorKind::Command(
                non_empty("LEAGUE_PREDICTOR_CMD").unwrap_or_else(|| DEFAULT_PREDICTOR_CMD.to_string()),
            ),
            Some("http") => match non_empty("LEAGUE_PREDICTOR_URL") {
                Some(url) => PredictorKind::Http(url),
                None => PredictorKind::Builtin,
            },
            _ => PredictorKind::Builtin,
        };

        let timeout_secs = non_empty("LEAGUE_PREDICTOR_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_PREDICTOR_TIMEOUT_SECS)
            .max(1);

        Self {
            db_path: non_empty("LEAGUE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            scheduler: non_empty("LEAGUE_SCHEDULER")
                .and_then(|v| parse_scheduler(&v))
                .unwrap_or(defaults.scheduler),
            predictor,
            predictor_timeout: Duration::from_secs(timeout_secs),
            season_weeks: non_empty("LEAGUE_SEASON_WEEKS")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|w| *w > 0)
                .unwrap_or(defaults.season_weeks),
            start_week: non_empty("LEAGUE_START_WEEK")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|w| *w > 0)
                .unwrap_or(defaults.start_week),
            prediction_strengths_path: non_empty("LEAGUE_PREDICTION_STRENGTHS").map(PathBuf::from),
            simulation_strengths_path: non_empty("LEAGUE_SIMULATION_STRENGTHS").map(PathBuf::from),
            clear_before_predict: non_empty("LEAGUE_CLEAR_BEFORE_PREDICT")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.clear_before_predict),
        }
    }

    pub fn build_scheduler(&self) -> Box<dyn FixtureGenerator> {
        match self.scheduler {
            SchedulerKind::RoundRobin => Box::new(RoundRobinFixture),
            SchedulerKind::Shuffled(seed) => Box::new(ShuffledRoundRobin::new(seed)),
        }
    }

    pub fn build_predictor(&self) -> Result<Box<dyn OutcomePredictor>> {
        Ok(match &self.predictor {
            PredictorKind::Builtin => Box::new(StrengthRatioPredictor),
            PredictorKind::Command(line) => {
                Box::new(CommandPredictor::from_command_line(line, self.predictor_timeout)?)
            }
            PredictorKind::Http(url) => Box::new(HttpPredictor::new(url, self.predictor_timeout)),
        })
    }

    pub fn prediction_strengths(&self) -> Result<StrengthTable> {
        match &self.prediction_strengths_path {
            Some(path) => StrengthTable::from_json_file(path, DEFAULT_PREDICTION_RATING),
            None => Ok(PREDICTION_STRENGTHS.clone()),
        }
    }

    pub fn simulation_strengths(&self) -> Result<StrengthTable> {
        match &self.simulation_strengths_path {
            Some(path) => StrengthTable::from_json_file(path, SIMULATION_STRENGTHS.default_rating()),
            None => Ok(SIMULATION_STRENGTHS.clone()),
        }
    }

    pub fn settings(&self) -> SeasonSettings {
        SeasonSettings {
            season_weeks: self.season_weeks,
            start_week: self.start_week,
            lookahead_weeks: FIXTURE_LOOKAHEAD_WEEKS.max(self.season_weeks as usize),
            clear_before_predict: self.clear_before_predict,
        }
    }
}

fn parse_scheduler(raw: &str) -> Option<SchedulerKind> {
    let raw = raw.trim().to_ascii_lowercase();
    let (name, seed) = match raw.split_once(':') {
        Some((name, seed)) => (name, Some(seed.trim().parse::<u64>().ok()?)),
        None => (raw.as_str(), None),
    };
    match name.trim() {
        "roundrobin" | "round-robin" => Some(SchedulerKind::RoundRobin),
        "shuffled" => Some(SchedulerKind::Shuffled(seed.unwrap_or(0))),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
