use std::fs;
use std::path::PathBuf;

use nflref_scrape::batch::{boxscore_urls_from_schedule, scrape_boxscore_page};
use nflref_scrape::combine::normalize_combine;
use nflref_scrape::config::SiteUrls;
use nflref_scrape::error::ScrapeError;
use nflref_scrape::page::RawPage;
use nflref_scrape::player_game::{normalize_play_by_play, normalize_players};
use nflref_scrape::table::{TABLE_CONTAINER, TableSlot, extract_table};
use nflref_scrape::team_game::normalize_team_game;

const BOXSCORE_URL: &str = "https://www.pro-football-reference.com/boxscores/201809090nwe.htm";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn boxscore_page() -> RawPage {
    RawPage::new(BOXSCORE_URL, &read_fixture("boxscore.html"))
}

#[test]
fn commented_tables_count_toward_positions() {
    let document = boxscore_page().into_document();
    let team_stats = document.table(TableSlot::TeamStats).expect("team stats should extract");
    assert_eq!(team_stats.headers, vec!["", "HOU", "NWE"]);

    let play_by_play = extract_table(&document, TABLE_CONTAINER, 19).expect("pbp should extract");
    assert_eq!(play_by_play.headers[0], "Quarter");

    match extract_table(&document, TABLE_CONTAINER, 21) {
        Err(ScrapeError::TableNotFound { found, .. }) => assert_eq!(found, 21),
        other => panic!("expected TableNotFound, got {other:?}"),
    }
}

#[test]
fn team_game_records_are_symmetric() {
    let document = boxscore_page().into_document();
    let [hou, nwe] = normalize_team_game(&document).expect("boxscore should normalize");

    assert_eq!(hou.team, "HOU");
    assert_eq!(hou.opponent, "NWE");
    assert_eq!(nwe.opponent, "HOU");
    assert_eq!(hou.boxscore, BOXSCORE_URL);
    assert_eq!(hou.stats, nwe.opponent_stats);
    assert_eq!(nwe.stats, hou.opponent_stats);

    assert_eq!((hou.team_points, hou.opponent_points), (20, 27));
    assert!(!hou.win);
    assert!(nwe.win);
    assert_eq!(hou.total, 47);
    assert_eq!(nwe.total, 47);
    assert!(!hou.go_over);
    assert_eq!(hou.game.over_under, 51.0);
}

#[test]
fn team_stat_compounds_are_split() {
    let document = boxscore_page().into_document();
    let [hou, nwe] = normalize_team_game(&document).expect("boxscore should normalize");

    assert_eq!(hou.stats.first_downs, 23);
    assert_eq!(
        (hou.stats.rush_atts, hou.stats.rush_yds, hou.stats.rush_tds),
        (33, 144, 1)
    );
    assert_eq!(nwe.stats.completions, 26);
    assert_eq!(nwe.stats.pass_attempts, 39);
    assert_eq!(nwe.stats.pass_yards, 277);
    assert_eq!(nwe.stats.pass_tds, 3);
    assert_eq!(nwe.stats.pass_int, 1);
    assert_eq!((hou.stats.times_sacked, hou.stats.sacked_yards), (3, 18));
    assert_eq!((hou.stats.fumbles, hou.stats.fumbles_lost), (2, 1));
    assert_eq!((nwe.stats.penalties, nwe.stats.penalty_yards), (8, 69));
    assert_eq!((hou.stats.third_down_conv, hou.stats.third_down_atts), (5, 13));
    assert_eq!((nwe.stats.fourth_down_conv, nwe.stats.fourth_down_atts), (0, 0));
    assert_eq!(hou.stats.time_of_possession_seconds, 31 * 60 + 4);
    assert_eq!(nwe.stats.time_of_possession_seconds, 28 * 60 + 56);
}

#[test]
fn game_info_and_meta_are_shared() {
    let document = boxscore_page().into_document();
    let [hou, nwe] = normalize_team_game(&document).expect("boxscore should normalize");

    assert_eq!(hou.game, nwe.game);
    assert_eq!(hou.game.won_toss, "Texans");
    assert_eq!(hou.game.roof, "outdoors");
    assert_eq!(hou.game.surface, "fieldturf");
    assert_eq!(hou.game.vegas_line, "New England Patriots -6.5");
    assert_eq!((hou.game.temperature, hou.game.wind_mph), (65, 8));

    assert_eq!(hou.meta, nwe.meta);
    assert_eq!(hou.meta.date_text, "Sunday Sep 9, 2018");
    assert_eq!(hou.meta.date.map(|d| d.to_string()).as_deref(), Some("2018-09-09"));
    assert_eq!(hou.meta.start_time, "1:00pm");
    assert_eq!(hou.meta.stadium, "Gillette Stadium");
    assert_eq!(hou.meta.attendance, 65878);
    assert_eq!(hou.meta.length_of_game_mins, 187);
}

#[test]
fn player_rows_skip_separators_and_fill_blanks() {
    let document = boxscore_page().into_document();
    let players = normalize_players(&document).expect("players should normalize");

    let names = players.iter().map(|p| p.player.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Deshaun Watson", "Lamar Miller", "Tom Brady", "James White"]);
    assert!(players.iter().all(|p| p.boxscore == BOXSCORE_URL));

    let miller = &players[1];
    assert_eq!(miller.stat("Cmp"), Some("0"));
    assert_eq!(miller.stats.len(), 7);
    assert_eq!(miller.stats[6].label, "Yds");
    assert_eq!(miller.stats[6].value, "98");
    assert_eq!(players[2].stats[6].value, "-1");
}

#[test]
fn play_by_play_drops_repeated_headers() {
    let document = boxscore_page().into_document();
    let plays = normalize_play_by_play(&document).expect("plays should normalize");

    assert_eq!(plays.len(), 3);
    assert_eq!(
        plays.iter().map(|p| p.sequence).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(plays[2].cell("Time"), Some("14:55"));
    assert_eq!(plays[0].cell("Down"), Some(""));
}

#[test]
fn full_boxscore_page_normalizes() {
    let data = scrape_boxscore_page(boxscore_page()).expect("page should normalize");
    assert_eq!(data.players.len(), 4);
    assert_eq!(data.plays.len(), 3);
    assert_eq!(data.teams[0].team, "HOU");
}

#[test]
fn schedule_fixture_yields_unique_boxscores() {
    let page = RawPage::new(
        "https://www.pro-football-reference.com/years/2018/games.htm",
        &read_fixture("schedule.html"),
    );
    let urls = boxscore_urls_from_schedule(&page.into_document(), &SiteUrls::default())
        .expect("schedule should parse");
    assert_eq!(
        urls.into_iter().collect::<Vec<_>>(),
        vec![
            "https://www.pro-football-reference.com/boxscores/201809060phi.htm",
            "https://www.pro-football-reference.com/boxscores/201809090nwe.htm",
            "https://www.pro-football-reference.com/boxscores/201809090rav.htm",
        ]
    );
}

#[test]
fn combine_fixture_normalizes() {
    let page = RawPage::new(
        "https://www.pro-football-reference.com/draft/2018-combine.htm",
        &read_fixture("combine.html"),
    );
    let rows = normalize_combine(&page.into_document(), 2018).expect("combine should normalize");

    assert_eq!(rows.len(), 3);
    let allen = &rows[0];
    assert_eq!(allen.player, "Josh Allen");
    assert_eq!(allen.height_inches, 77);
    assert_eq!(allen.bench_reps, 0.0);
    assert_eq!(allen.three_cone, 6.9);
    assert_eq!(allen.draft.as_ref().map(|d| (d.round, d.pick)), Some((1, 7)));

    let proehl = &rows[2];
    assert_eq!(proehl.height_inches, 70);
    assert_eq!(proehl.vertical, 0.0);
    assert!(proehl.drafted.is_none());
    assert!(proehl.college.is_none());
    assert!(rows.iter().all(|r| r.year == 2018 && r.extra.is_empty()));
}
