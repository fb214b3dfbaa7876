use std::collections::HashSet;

use league_sim::LeagueError;
use league_sim::fixture::{FixtureGenerator, RoundRobinFixture, ShuffledRoundRobin, fixture_week};
use league_sim::model::{MatchPairing, Team};

fn four_teams() -> Vec<Team> {
    vec![
        Team::new(1, "A"),
        Team::new(2, "B"),
        Team::new(3, "C"),
        Team::new(4, "D"),
    ]
}

fn pair_ids(week: &[MatchPairing]) -> Vec<(u32, u32)> {
    week.iter()
        .map(|p| (p.home_team.id, p.away_team.id))
        .collect()
}

#[test]
fn twelve_week_season_repeats_the_three_round_cycle() {
    let teams = four_teams();
    let fixture = RoundRobinFixture.generate(&teams, 12).unwrap();
    assert_eq!(fixture.len(), 12);

    for week in 4..=12u32 {
        let base = ((week - 1) % 3) + 1;
        assert_eq!(
            fixture_week(&fixture, week).unwrap(),
            fixture_week(&fixture, base).unwrap(),
            "week {week} should repeat week {base}"
        );
    }

    // Week 4 equals week 1 with orientation included.
    assert_eq!(
        pair_ids(fixture_week(&fixture, 4).unwrap()),
        vec![(1, 4), (2, 3)]
    );
}

#[test]
fn first_cycle_meets_every_pair_once() {
    let teams = four_teams();
    let fixture = RoundRobinFixture.generate(&teams, 3).unwrap();

    let mut seen = HashSet::new();
    for week in &fixture {
        let mut playing = HashSet::new();
        for p in week {
            assert_ne!(p.home_team.id, p.away_team.id);
            assert!(playing.insert(p.home_team.id));
            assert!(playing.insert(p.away_team.id));
            let key = (p.home_team.id.min(p.away_team.id), p.home_team.id.max(p.away_team.id));
            assert!(seen.insert(key), "pair {key:?} met twice");
        }
        assert_eq!(playing.len(), 4);
    }
    assert_eq!(seen.len(), 6);
}

#[test]
fn odd_team_count_rests_one_team_each_week() {
    let teams = vec![Team::new(1, "A"), Team::new(2, "B"), Team::new(3, "C")];
    let fixture = RoundRobinFixture.generate(&teams, 6).unwrap();
    assert_eq!(fixture.len(), 6);
    assert!(fixture.iter().all(|week| week.len() == 1));
    assert_eq!(fixture[0], fixture[3]);
}

#[test]
fn too_few_teams_is_invalid_input() {
    let err = RoundRobinFixture
        .generate(&[Team::new(1, "Solo")], 4)
        .unwrap_err();
    assert!(matches!(err, LeagueError::InvalidInput(_)));
    assert!(RoundRobinFixture.generate(&four_teams(), 0).unwrap().is_empty());
}

#[test]
fn shuffled_schedule_is_stable_for_a_seed() {
    let teams = four_teams();
    let first = ShuffledRoundRobin::new(7).generate(&teams, 6).unwrap();
    let again = ShuffledRoundRobin::new(7).generate(&teams, 6).unwrap();
    assert_eq!(first, again);
    assert_eq!(first[0], first[3]);
}

#[test]
fn round_robin_is_deterministic() {
    let teams = four_teams();
    let first = RoundRobinFixture.generate(&teams, 12).unwrap();
    let again = RoundRobinFixture.generate(&teams, 12).unwrap();
    assert_eq!(first, again);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&again).unwrap()
    );
}
