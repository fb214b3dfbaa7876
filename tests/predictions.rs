use league_sim::model::{Match, MatchOutcome, MatchPairing, Standing, Team};
use league_sim::predict::PredictionEngine;
use league_sim::strengths::StrengthTable;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn engine() -> PredictionEngine {
    PredictionEngine::new(StrengthTable::from_pairs(
        [("A", 90), ("B", 85), ("C", 80), ("D", 75)],
        70,
    ))
}

fn pairing(home: (u32, &str), away: (u32, &str)) -> MatchPairing {
    MatchPairing {
        home_team: Team::new(home.0, home.1),
        away_team: Team::new(away.0, away.1),
    }
}

fn fresh(id: u32, name: &str) -> Standing {
    Standing {
        team_id: id,
        team_name: name.to_string(),
        played: 0,
        wins: 0,
        draws: 0,
        losses: 0,
        goal_difference: 0,
        points: 0,
    }
}

#[test]
fn home_side_gets_the_home_bonus() {
    let p = engine().match_odds(&pairing((1, "A"), (4, "D")), None);
    assert!(close(p.home_win_pct, 41.91));
    assert!(close(p.draw_pct, 25.0));
    assert!(close(p.away_win_pct, 33.09));
    assert_eq!(p.home_odds, Some(2.39));
    assert_eq!(p.draw_odds, Some(4.0));
    assert_eq!(p.away_odds, Some(3.02));
}

#[test]
fn previous_winner_gets_the_past_winner_bonus() {
    let last = Match {
        id: 3,
        week: 1,
        home_team_id: 1,
        away_team_id: 4,
        home_score: 0,
        away_score: 1,
        result: MatchOutcome::Loss,
    };
    let p = engine().match_odds(&pairing((1, "A"), (4, "D")), Some(&last));
    assert!(close(p.home_win_pct, 40.95));
    assert!(close(p.away_win_pct, 34.05));
}

#[test]
fn a_drawn_meeting_gives_no_bonus() {
    let last = Match {
        id: 3,
        week: 1,
        home_team_id: 4,
        away_team_id: 1,
        home_score: 2,
        away_score: 2,
        result: MatchOutcome::Draw,
    };
    let with = engine().match_odds(&pairing((1, "A"), (4, "D")), Some(&last));
    let without = engine().match_odds(&pairing((1, "A"), (4, "D")), None);
    assert_eq!(with, without);
}

#[test]
fn tied_teams_with_equal_strength_share_the_title_odds() {
    let engine = PredictionEngine::new(StrengthTable::from_pairs([("X", 80), ("Y", 80)], 70));
    let odds = engine.championship_odds(&[fresh(1, "X"), fresh(2, "Y")]);
    assert_eq!(odds.len(), 2);
    assert!(close(odds[0].chance, odds[1].chance));
    assert!(close(odds[0].chance, 50.0));
}

#[test]
fn championship_odds_keep_table_order_and_stay_in_range() {
    let mut leader = fresh(4, "D");
    leader.wins = 3;
    leader.played = 3;
    let table = vec![leader, fresh(1, "A"), fresh(2, "B"), fresh(3, "C")];
    let odds = engine().championship_odds(&table);

    let names: Vec<_> = odds.iter().map(|o| o.team_name.as_str()).collect();
    assert_eq!(names, vec!["D", "A", "B", "C"]);
    assert!(odds.iter().all(|o| (0.0..=100.0).contains(&o.chance)));
    let total: f64 = odds.iter().map(|o| o.chance).sum();
    assert!((total - 100.0).abs() < 0.05);
}

#[test]
fn nothing_to_forecast_after_the_last_week() {
    let fixture = vec![vec![pairing((1, "A"), (2, "B"))]];
    let history: Vec<Match> = Vec::new();
    let report = engine()
        .with_season_weeks(1)
        .predict(&[fresh(1, "A"), fresh(2, "B")], 1, &fixture, &history)
        .unwrap();
    assert!(report.next_week.is_empty());
    assert_eq!(report.championship.len(), 2);
}

#[test]
fn report_serializes_with_wire_names() {
    let fixture = vec![
        vec![pairing((1, "A"), (2, "B"))],
        vec![pairing((2, "B"), (1, "A"))],
    ];
    let history: Vec<Match> = Vec::new();
    let report = engine()
        .predict(&[fresh(1, "A"), fresh(2, "B")], 1, &fixture, &history)
        .unwrap();
    assert_eq!(report.next_week.len(), 1);
    assert_eq!(report.next_week[0].home_team, "B");

    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("championship_odds").is_some());
    assert!(value.get("next_week_predictions").is_some());
    assert_eq!(value["championship_odds"][0]["team"], "A");
}
