use league_sim::model::{Match, MatchOutcome, Team};
use league_sim::standings::compute_standings;

fn played(id: u32, home: u32, away: u32, hs: u32, aws: u32) -> Match {
    Match {
        id,
        week: id,
        home_team_id: home,
        away_team_id: away,
        home_score: hs,
        away_score: aws,
        result: MatchOutcome::from_scores(hs, aws),
    }
}

#[test]
fn win_and_draw_rank_by_points() {
    let teams = vec![Team::new(1, "Home"), Team::new(2, "Away")];
    let matches = vec![played(1, 1, 2, 2, 0), played(2, 2, 1, 1, 1)];

    let table = compute_standings(&teams, &matches);
    assert_eq!(table.len(), 2);

    let top = &table[0];
    assert_eq!(top.team_name, "Home");
    assert_eq!((top.played, top.wins, top.draws, top.losses), (2, 1, 1, 0));
    assert_eq!(top.goal_difference, 2);
    assert_eq!(top.points, 4);

    let bottom = &table[1];
    assert_eq!((bottom.wins, bottom.draws, bottom.losses), (0, 1, 1));
    assert_eq!(bottom.goal_difference, -2);
    assert_eq!(bottom.points, 1);
}

#[test]
fn teams_without_matches_still_appear() {
    let teams = vec![Team::new(1, "A"), Team::new(2, "B"), Team::new(3, "Idle")];
    let table = compute_standings(&teams, &[played(1, 1, 2, 3, 1)]);
    assert_eq!(table.len(), 3);
    let idle = table.iter().find(|s| s.team_name == "Idle").unwrap();
    assert_eq!((idle.played, idle.points, idle.goal_difference), (0, 0, 0));
}

#[test]
fn goal_difference_breaks_points_ties() {
    let teams = vec![
        Team::new(1, "A"),
        Team::new(2, "B"),
        Team::new(3, "C"),
        Team::new(4, "D"),
    ];
    let matches = vec![played(1, 1, 3, 1, 0), played(2, 2, 4, 4, 0)];
    let table = compute_standings(&teams, &matches);
    let order: Vec<_> = table.iter().map(|s| s.team_name.as_str()).collect();
    assert_eq!(order, vec!["B", "A", "C", "D"]);
}

#[test]
fn fully_tied_table_orders_the_same_every_time() {
    let teams = vec![
        Team::new(3, "C"),
        Team::new(1, "A"),
        Team::new(4, "D"),
        Team::new(2, "B"),
    ];
    let matches = vec![played(1, 3, 1, 1, 1), played(2, 4, 2, 0, 0)];

    let first = compute_standings(&teams, &matches);
    let again = compute_standings(&teams, &matches);
    assert_eq!(first, again);

    let ids: Vec<_> = first.iter().map(|s| s.team_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert!(first.iter().all(|s| s.points == 1 && s.goal_difference == 0));
}
