use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use serde_json::json;

use league_sim::config::LeagueConfig;
use league_sim::model::NewMatch;
use league_sim::season::open_season;

const USAGE: &str = "usage: league_cli [--db PATH] [--verbose] <command>

commands:
  teams                                  list teams
  add-team NAME                          add a team
  fixture [--weeks N]                    round-robin schedule
  standings                              league table
  week                                   current week
  results WEEK                           results for a week
  predictions                            championship and next-week odds
  simulate next|all|WEEK                 simulate matches
  reset                                  drop everything after week 4
  add-match WEEK HOME AWAY HS AS         record a result by team id
  set-score MATCH_ID HOME AWAY           correct a score";

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");

    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let mut config = LeagueConfig::from_env();
    if let Some(path) = parse_db_path_arg(&args) {
        config.db_path = path;
    }

    let rest = positional_args(&args);
    let Some((command, params)) = rest.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let mut season = open_season(&config)
        .with_context(|| format!("open league at {}", config.db_path.display()))?;

    match command.as_str() {
        "teams" => print_json(&season.teams()?),
        "add-team" => {
            if params.is_empty() {
                bail!("add-team needs a team name");
            }
            print_json(&season.add_team(&params.join(" "))?)
        }
        "fixture" => {
            let weeks = parse_weeks_arg(&args)?;
            print_json(&season.fixture(weeks)?)
        }
        "standings" => print_json(&season.standings()?),
        "week" => {
            let current = season.current_week()?;
            print_json(&json!({
                "current_week": current,
                "season_weeks": season.settings().season_weeks,
                "finished": season.is_finished()?,
            }))
        }
        "results" => {
            let week = parse_num(params.first(), "WEEK")?;
            print_json(&season.week_results(week)?)
        }
        "predictions" => print_json(&season.predictions()?),
        "simulate" => match params.first().map(String::as_str) {
            Some("next") => {
                let (week, played) = season.simulate_next()?;
                print_json(&json!({ "week": week, "matches": played }))
            }
            Some("all") => {
                let weeks = season.simulate_all()?;
                let out = weeks
                    .into_iter()
                    .map(|(week, played)| json!({ "week": week, "matches": played }))
                    .collect::<Vec<_>>();
                print_json(&out)?;
                if let Some(champion) = season.champion()? {
                    eprintln!("[INFO] champion: {}", champion.team_name);
                }
                Ok(())
            }
            other => {
                let week = parse_num(other.map(str::to_string).as_ref(), "WEEK")?;
                let played = season.simulate_week(week)?;
                print_json(&json!({ "week": week, "matches": played }))
            }
        },
        "reset" => {
            let next = season.reset()?;
            print_json(&json!({ "next_week": next }))
        }
        "add-match" => {
            if params.len() != 5 {
                bail!("add-match needs WEEK HOME AWAY HS AS");
            }
            let m = NewMatch {
                week: parse_num(params.first(), "WEEK")?,
                home_team_id: parse_num(params.get(1), "HOME")?,
                away_team_id: parse_num(params.get(2), "AWAY")?,
                home_score: parse_num(params.get(3), "HS")?,
                away_score: parse_num(params.get(4), "AS")?,
            };
            print_json(&season.record_match(&m)?)
        }
        "set-score" => {
            if params.len() != 3 {
                bail!("set-score needs MATCH_ID HOME AWAY");
            }
            let id = parse_num(params.first(), "MATCH_ID")?;
            let home = parse_num(params.get(1), "HOME")?;
            let away = parse_num(params.get(2), "AWAY")?;
            print_json(&season.correct_score(id, home, away)?)
        }
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            Ok(())
        }
        other => Err(anyhow!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_num(raw: Option<&String>, what: &str) -> Result<u32> {
    let raw = raw.ok_or_else(|| anyhow!("missing {what}"))?;
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("{what} must be a non-negative integer, got `{raw}`"))
}

/// Drops the global flags and their values so commands see only their own
/// arguments.
fn positional_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        match arg.as_str() {
            "--db" | "--weeks" => skip_next = true,
            "--verbose" | "-v" => {}
            a if a.starts_with("--db=") || a.starts_with("--weeks=") => {}
            _ => out.push(arg.clone()),
        }
    }
    out
}

fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

fn parse_weeks_arg(args: &[String]) -> Result<Option<usize>> {
    for (idx, arg) in args.iter().enumerate() {
        let raw = if let Some(v) = arg.strip_prefix("--weeks=") {
            v.to_string()
        } else if arg == "--weeks" {
            args.get(idx + 1)
                .cloned()
                .ok_or_else(|| anyhow!("--weeks needs a value"))?
        } else {
            continue;
        };
        let weeks = raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("--weeks must be a number, got `{raw}`"))?;
        return Ok(Some(weeks));
    }
    Ok(None)
}
