//! Contract with the outcome predictor: the component that turns a week of
//! rated pairings into simulated scores.
//!
//! Whatever implementation is plugged in, its answer goes through
//! [`validate_outcomes`] before anything is written to the store.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LeagueError, Result};
use crate::http_client::http_client;
use crate::model::{MatchPairing, Team};
use crate::strengths::StrengthTable;

const HOME_ADVANTAGE: f64 = 5.0;
const MAX_GD_BONUS: i32 = 5;
const GOAL_SCALE: f64 = 3.0;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorTeam {
    pub id: u32,
    pub name: String,
    pub strength: i32,
    /// Optional goal-difference form signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gd: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorRequest {
    pub home_team: PredictorTeam,
    pub away_team: PredictorTeam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorResult {
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_score: u32,
    pub away_score: u32,
}

pub trait OutcomePredictor {
    fn predict(&self, matches: &[PredictorRequest]) -> Result<Vec<PredictorResult>>;
}

/// Builds the predictor payload for a week's pairings.
pub fn build_requests(pairings: &[MatchPairing], strengths: &StrengthTable) -> Vec<PredictorRequest> {
    let side = |team: &Team| PredictorTeam {
        id: team.id,
        name: team.name.clone(),
        strength: strengths.rating(&team.name),
        gd: None,
    };
    pairings
        .iter()
        .map(|p| PredictorRequest {
            home_team: side(&p.home_team),
            away_team: side(&p.away_team),
        })
        .collect()
}

/// Decodes a raw JSON answer. Every element must carry the four fields as
/// non-negative integers.
pub fn parse_outcomes(raw: &str) -> Result<Vec<PredictorResult>> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let Some(items) = value.as_array() else {
        return Err(LeagueError::predictor("expected a json array of results"));
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let field = |key: &str| -> Result<u32> {
            item.get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    LeagueError::predictor(format!(
                        "result {idx}: `{key}` missing or not a non-negative integer"
                    ))
                })
        };
        out.push(PredictorResult {
            home_team_id: field("home_team_id")?,
            away_team_id: field("away_team_id")?,
            home_score: field("home_score")?,
            away_score: field("away_score")?,
        });
    }
    Ok(out)
}

/// Results must line up one-to-one with the requests, in order.
pub fn validate_outcomes(requests: &[PredictorRequest], results: &[PredictorResult]) -> Result<()> {
    if requests.len() != results.len() {
        return Err(LeagueError::predictor(format!(
            "expected {} results, got {}",
            requests.len(),
            results.len()
        )));
    }
    for (idx, (req, res)) in requests.iter().zip(results).enumerate() {
        if req.home_team.id != res.home_team_id || req.away_team.id != res.away_team_id {
            return Err(LeagueError::predictor(format!(
                "result {idx} is for {} v {}, expected {} v {}",
                res.home_team_id, res.away_team_id, req.home_team.id, req.away_team.id
            )));
        }
    }
    Ok(())
}

/// In-process scorer: splits three goals in proportion to each side's power
/// (rating, capped goal-difference form and the home bonus), never a draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrengthRatioPredictor;

impl StrengthRatioPredictor {
    fn score(req: &PredictorRequest) -> PredictorResult {
        let home_gd = req.home_team.gd.unwrap_or(0);
        let away_gd = req.away_team.gd.unwrap_or(0);
        let gd_bonus = (home_gd - away_gd).clamp(-MAX_GD_BONUS, MAX_GD_BONUS);

        let home_power = (req.home_team.strength + gd_bonus) as f64 + HOME_ADVANTAGE;
        let away_power = req.away_team.strength as f64;
        let total = home_power + away_power;

        let (mut home_score, away_score) = if total == 0.0 {
            (0, 0)
        } else {
            (
                goals(GOAL_SCALE * home_power / total),
                goals(GOAL_SCALE * away_power / total),
            )
        };
        if home_score == away_score {
            home_score += 1;
        }

        PredictorResult {
            home_team_id: req.home_team.id,
            away_team_id: req.away_team.id,
            home_score,
            away_score,
        }
    }
}

fn goals(expected: f64) -> u32 {
    expected.round_ties_even().max(0.0) as u32
}

impl OutcomePredictor for StrengthRatioPredictor {
    fn predict(&self, matches: &[PredictorRequest]) -> Result<Vec<PredictorResult>> {
        Ok(matches.iter().map(Self::score).collect())
    }
}

/// Runs an external program: JSON request on stdin, JSON answer on stdout.
/// The child is killed if it outlives `timeout`.
#[derive(Debug, Clone)]
pub struct CommandPredictor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandPredictor {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Splits a whitespace-separated command line such as `python3 predict.py`.
    pub fn from_command_line(line: &str, timeout: Duration) -> Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            return Err(LeagueError::invalid("empty predictor command"));
        };
        Ok(Self::new(program, parts.collect(), timeout))
    }

    fn run(&self, input: &[u8]) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| LeagueError::predictor(format!("spawn {}: {err}", self.program)))?;

        // The child may never read its input, so the write must not hold up
        // the deadline loop below.
        let written = feed(child.stdin.take(), input.to_vec());
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(err) => {
                    kill_quietly(&mut child);
                    return Err(err.into());
                }
            }
            if Instant::now() >= deadline {
                kill_quietly(&mut child);
                return Err(LeagueError::predictor(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                )));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let grace = Duration::from_secs(1);
        let out = stdout.recv_timeout(grace).unwrap_or_default();
        if !status.success() {
            let err = stderr.recv_timeout(grace).unwrap_or_default();
            return Err(LeagueError::predictor(format!(
                "{} exited with {status}: {}",
                self.program,
                err.trim()
            )));
        }
        if let Ok(Err(err)) = written.recv_timeout(grace) {
            return Err(LeagueError::predictor(format!(
                "write input to {}: {err}",
                self.program
            )));
        }
        Ok(out)
    }
}

impl OutcomePredictor for CommandPredictor {
    fn predict(&self, matches: &[PredictorRequest]) -> Result<Vec<PredictorResult>> {
        let input = serde_json::to_vec(matches)?;
        debug!("running predictor {} for {} matches", self.program, matches.len());
        let raw = self.run(&input)?;
        parse_outcomes(&raw)
    }
}

fn feed<W: Write + Send + 'static>(
    pipe: Option<W>,
    input: Vec<u8>,
) -> mpsc::Receiver<std::io::Result<()>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            // Dropping the pipe at the end closes the child's stdin.
            let _ = tx.send(pipe.write_all(&input));
        });
    }
    rx
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            let _ = tx.send(buf);
        });
    }
    rx
}

fn kill_quietly(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!("failed to kill predictor process: {err}");
    }
    let _ = child.wait();
}

/// POSTs the request array to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpPredictor {
    url: String,
    timeout: Duration,
}

impl HttpPredictor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl OutcomePredictor for HttpPredictor {
    fn predict(&self, matches: &[PredictorRequest]) -> Result<Vec<PredictorResult>> {
        let client = http_client()?;
        let body = client
            .post(&self.url)
            .timeout(self.timeout)
            .json(matches)
            .send()?
            .error_for_status()?
            .text()?;
        parse_outcomes(&body)
    }
}
