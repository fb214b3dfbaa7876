use std::collections::VecDeque;

use crate::error::Result;
use crate::model::{Standing, WeekResult};
use crate::predict::PredictionReport;
use crate::season::Season;
use crate::store::ResultStore;

const LOG_CAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SimulateNext,
    SimulateAll,
    Reset,
    AdjustHome(i32),
    AdjustAway(i32),
}

/// What the terminal view renders. Refreshed from the season after every
/// action; failures land in the log instead of aborting the UI.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub standings: Vec<Standing>,
    pub results: Vec<WeekResult>,
    pub results_week: Option<u32>,
    pub predictions: Option<PredictionReport>,
    pub current_week: u32,
    pub season_weeks: u32,
    pub champion: Option<String>,
    pub selected: usize,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl Dashboard {
    pub fn new(season_weeks: u32) -> Self {
        Self {
            standings: Vec::new(),
            results: Vec::new(),
            results_week: None,
            predictions: None,
            current_week: 0,
            season_weeks,
            champion: None,
            selected: 0,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push_back(line.into());
        while self.logs.len() > LOG_CAP {
            self.logs.pop_front();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_week > self.season_weeks
    }

    pub fn refresh<S: ResultStore>(&mut self, season: &Season<S>) {
        if let Err(err) = self.try_refresh(season) {
            self.push_log(format!("[WARN] refresh failed: {err}"));
        }
    }

    fn try_refresh<S: ResultStore>(&mut self, season: &Season<S>) -> Result<()> {
        self.season_weeks = season.settings().season_weeks;
        self.current_week = season.current_week()?;
        self.standings = season.standings()?;

        // Show the most recently played week.
        let shown = self.current_week.saturating_sub(1).min(self.season_weeks);
        if shown >= 1 {
            self.results = season.week_results(shown)?;
            self.results_week = Some(shown);
        } else {
            self.results.clear();
            self.results_week = None;
        }
        if self.selected >= self.results.len() {
            self.selected = self.results.len().saturating_sub(1);
        }

        self.predictions = match season.predictions() {
            Ok(report) => Some(report),
            Err(err) => {
                self.push_log(format!("[INFO] no predictions: {err}"));
                None
            }
        };
        self.champion = season.champion()?.map(|s| s.team_name);
        Ok(())
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.results.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_result(&self) -> Option<&WeekResult> {
        self.results.get(self.selected)
    }

    pub fn apply<S: ResultStore>(&mut self, season: &mut Season<S>, action: Action) {
        let outcome = match action {
            Action::SimulateNext => season
                .simulate_next()
                .map(|(week, played)| format!("[INFO] week {week} simulated ({} matches)", played.len())),
            Action::SimulateAll => season
                .simulate_all()
                .map(|weeks| format!("[INFO] simulated {} remaining weeks", weeks.len())),
            Action::Reset => season
                .reset()
                .map(|next| format!("[INFO] season reset, next week {next}")),
            Action::AdjustHome(delta) | Action::AdjustAway(delta) => {
                let Some(row) = self.selected_result().cloned() else {
                    self.push_log("[INFO] no match selected");
                    return;
                };
                let (mut home, mut away) = (row.home_score, row.away_score);
                if matches!(action, Action::AdjustHome(_)) {
                    home = home.saturating_add_signed(delta);
                } else {
                    away = away.saturating_add_signed(delta);
                }
                season.correct_score(row.id, home, away).map(|m| {
                    format!(
                        "[INFO] {} {}-{} {} saved",
                        row.home_team, m.home_score, m.away_score, row.away_team
                    )
                })
            }
        };

        match outcome {
            Ok(line) => self.push_log(line),
            Err(err) => self.push_log(format!("[WARN] {err}")),
        }
        self.refresh(season);
    }
}
