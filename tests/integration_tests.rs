// Integration tests for canasta.
//
// These exercise the full pipeline end-to-end through the library crate's
// public API: raw CSV text in, parsed and aggregated dataset, filtered and
// sorted views, filter-state persistence, and the CSV re-export.

use canasta::aggregate::SchemaVariant;
use canasta::config::Config;
use canasta::pipeline::{run, RawInput, Session};
use canasta::query::{self, FilterState, PositionFilter, SortDirection, SortKey};
use canasta::stats::Trend;

// ===========================================================================
// Test fixtures
// ===========================================================================

const COMBINED_HEADERS: &str = "\
Equipo Fantasy;Nombre;Equipo NBA;Posicion;Día 1;Día 2;Día 3;Día 4
Equipo Fantasy;Nombre;Equipo NBA;Posicion;21-oct;22-oct;23-oct;24-oct
";

fn combined_fixture() -> String {
    format!(
        "{COMBINED_HEADERS}\
Los Tigres;Luka Doncic;DAL;PG;32,5;;28;19
Los Tigres;Derrick White;BOS;PG/SG;12;0;;15
Los Osos;Nikola Jokic;DEN;C;41;22;30;
Los Osos;Jayson Tatum;BOS;SF;25;27;24;26
"
    )
}

const ROSTER_FIXTURE: &str = "\
ID;Nombre;Equipo Fantasy;Equipo NBA;Posicion;Enlace
lud77;Luka Doncic;Los Tigres;DAL;PG;https://example.com/luka
dwh9;Derrick White;Los Tigres;BOS;PG/SG
njo15;Nikola Jokic;Los Osos;DEN;C
jta0;Jayson Tatum;Los Osos;BOS;SF
ban7;Sin Partidos;Los Osos;SAS;PF
";

const SCORES_FIXTURE: &str = "\
ID;Semana;Puntos
lud77;1;45,5
lud77;2;38
lud77;3;52
njo15;1;50
njo15;2;48
njo15;3;49
dwh9;1;20
dwh9;2;0
dwh9;3;
jta0;1;30
jta0;2;31
jta0;3;29
";

fn session_with_combined() -> Session {
    let mut session = Session::new(Config::default());
    let report = session.load_combined(&combined_fixture());
    assert!(report.dataset_ready);
    session
}

fn session_with_split() -> Session {
    let mut session = Session::new(Config::default());
    session.load_roster(ROSTER_FIXTURE);
    let report = session.load_scores(SCORES_FIXTURE);
    assert!(report.dataset_ready);
    session
}

// ===========================================================================
// Combined variant: parse → combine
// ===========================================================================

#[test]
fn combined_pipeline_builds_padded_dataset() {
    let session = session_with_combined();
    let dataset = session.dataset().unwrap();
    assert_eq!(dataset.variant, SchemaVariant::Combined);
    assert_eq!(dataset.records.len(), 4);
    assert_eq!(dataset.series_len, 4);

    let luka = dataset
        .records
        .iter()
        .find(|r| r.identity.name == "Luka Doncic")
        .unwrap();
    assert_eq!(luka.series, vec![Some(32.5), None, Some(28.0), Some(19.0)]);
    assert_eq!(luka.games_played, 3);
    assert!((luka.total_points - 79.5).abs() < 1e-10);
    assert!((luka.average_points - 26.5).abs() < 1e-10);
}

#[test]
fn absent_and_zero_stay_distinct_through_the_pipeline() {
    let session = session_with_combined();
    let dataset = session.dataset().unwrap();
    let white = dataset
        .records
        .iter()
        .find(|r| r.identity.name == "Derrick White")
        .unwrap();

    // Day 2 was a played zero, day 3 was not played.
    assert_eq!(white.series, vec![Some(12.0), Some(0.0), None, Some(15.0)]);
    assert_eq!(white.games_played, 3);
    assert!((white.total_points - 27.0).abs() < 1e-10);
    assert!((white.average_points - 9.0).abs() < 1e-10);
}

#[test]
fn cumulative_series_skips_absent_without_carrying_forward() {
    let mut session = Session::new(Config::default());
    session.load_combined(
        "h\nh\nEQ;Jugador;DAL;PG;5;;3\n",
    );
    let dataset = session.dataset().unwrap();
    // [5, absent, 3] cumulates to [5, absent, 8].
    assert_eq!(
        dataset.records[0].cumulative,
        vec![Some(5.0), None, Some(8.0)]
    );
}

#[test]
fn weekly_totals_cover_only_observed_weeks() {
    let mut session = Session::new(Config::default());
    // Nine observed days: week 1 complete, week 2 partial, weeks 3+ unknown.
    session.load_combined("h\nh\nEQ;Jugador;DAL;PG;1;2;3;4;5;6;7;8;9\n");
    let dataset = session.dataset().unwrap();
    let totals = dataset.records[0].weekly_totals().unwrap();
    assert_eq!(totals.len(), 2);
    assert!((totals[0] - 28.0).abs() < 1e-10);
    assert!((totals[1] - 17.0).abs() < 1e-10);
}

#[test]
fn malformed_rows_become_diagnostics_not_errors() {
    let mut session = Session::new(Config::default());
    let text = format!("{COMBINED_HEADERS}Los Tigres;Luka Doncic;DAL;PG;10\nshort;row\n");
    let report = session.load_combined(&text);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.dataset_ready);
}

// ===========================================================================
// Split variant: join policy and ratings
// ===========================================================================

#[test]
fn split_pipeline_joins_by_id() {
    let session = session_with_split();
    let dataset = session.dataset().unwrap();
    assert_eq!(dataset.variant, SchemaVariant::Split);
    assert_eq!(dataset.records.len(), 5);
    assert_eq!(dataset.series_len, 3);

    let luka = dataset
        .records
        .iter()
        .find(|r| r.identity.id == "lud77")
        .unwrap();
    assert_eq!(luka.series, vec![Some(45.5), Some(38.0), Some(52.0)]);
    assert_eq!(
        luka.identity.external_link.as_deref(),
        Some("https://example.com/luka")
    );
}

#[test]
fn roster_player_without_scores_appears_all_absent() {
    let session = session_with_split();
    let dataset = session.dataset().unwrap();
    let benched = dataset
        .records
        .iter()
        .find(|r| r.identity.id == "ban7")
        .unwrap();
    assert_eq!(benched.series, vec![None, None, None]);
    assert_eq!(benched.games_played, 0);
    assert!((benched.total_points - 0.0).abs() < 1e-10);
    assert_eq!(benched.rating(), Some(0));
}

#[test]
fn ratings_rank_volume_and_regularity() {
    let session = session_with_split();
    let dataset = session.dataset().unwrap();

    let rating_of = |id: &str| {
        dataset
            .records
            .iter()
            .find(|r| r.identity.id == id)
            .and_then(|r| r.rating())
            .unwrap()
    };

    // Jokic: highest total and very steady — best rating.
    // White: low volume and a scoreless game — clearly worse.
    assert!(rating_of("njo15") > rating_of("jta0"));
    assert!(rating_of("jta0") > rating_of("dwh9"));
    assert_eq!(rating_of("ban7"), 0);
}

#[test]
fn combined_records_have_no_rating_split_records_no_weekly_totals() {
    let combined = session_with_combined();
    let record = &combined.dataset().unwrap().records[0];
    assert!(record.rating().is_none());
    assert!(record.weekly_totals().is_some());

    let split = session_with_split();
    let record = &split.dataset().unwrap().records[0];
    assert!(record.rating().is_some());
    assert!(record.weekly_totals().is_none());
}

// ===========================================================================
// Trend classification through the pipeline
// ===========================================================================

#[test]
fn trend_up_and_flat_classification() {
    let mut scores = String::from("ID;Semana;Puntos\n");
    for week in 1..=4 {
        scores.push_str(&format!("up1;{week};10\n"));
        scores.push_str(&format!("fl1;{week};10\n"));
    }
    for week in 5..=8 {
        scores.push_str(&format!("up1;{week};20\n"));
        scores.push_str(&format!("fl1;{week};10\n"));
    }
    let roster = "ID;Nombre;Equipo Fantasy;Equipo NBA;Posicion\n\
                  up1;Subiendo;EQ;DAL;PG\n\
                  fl1;Plano;EQ;DAL;SG\n";

    let mut session = Session::new(Config::default());
    session.load_roster(roster);
    session.load_scores(&scores);
    let dataset = session.dataset().unwrap();

    let trend_of = |id: &str| {
        dataset
            .records
            .iter()
            .find(|r| r.identity.id == id)
            .map(|r| r.trend)
            .unwrap()
    };
    assert_eq!(trend_of("up1"), Trend::Up);
    assert_eq!(trend_of("fl1"), Trend::Flat);
}

// ===========================================================================
// Query engine over a loaded dataset
// ===========================================================================

#[test]
fn guard_filter_matches_multi_valued_positions() {
    let mut session = session_with_combined();
    session.set_position_filter(PositionFilter::Key("G".into()));
    let names: Vec<&str> = session
        .view()
        .iter()
        .map(|r| r.identity.name.as_str())
        .collect();
    // Doncic (PG) and White (PG/SG) match; Jokic (C) and Tatum (SF) do not.
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Luka Doncic"));
    assert!(names.contains(&"Derrick White"));
}

#[test]
fn filters_compose_team_then_position() {
    let mut session = session_with_combined();
    session.set_fantasy_team_filter(Some("Los Osos".into()));
    session.set_nba_team_filter(Some("BOS".into()));
    let view = session.view();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].identity.name, "Jayson Tatum");
}

#[test]
fn sort_toggle_reverses_untied_order() {
    let mut session = session_with_combined();
    let descending: Vec<String> = session
        .view()
        .iter()
        .map(|r| r.identity.name.clone())
        .collect();

    // Same key again: direction toggles to ascending.
    session.toggle_sort(SortKey::TotalPoints);
    let ascending: Vec<String> = session
        .view()
        .iter()
        .map(|r| r.identity.name.clone())
        .collect();

    let mut reversed = descending.clone();
    reversed.reverse();
    assert_eq!(ascending, reversed);
}

#[test]
fn selector_lists_and_view_average() {
    let session = session_with_combined();
    let dataset = session.dataset().unwrap();
    assert_eq!(query::fantasy_teams(dataset), vec!["Los Osos", "Los Tigres"]);
    assert_eq!(query::nba_teams(dataset), vec!["BOS", "DAL", "DEN"]);

    let view = session.view();
    let expected: f64 = view.iter().map(|r| r.average_points).sum::<f64>() / view.len() as f64;
    assert!((query::view_average(&view) - expected).abs() < 1e-10);
}

// ===========================================================================
// Filter-state persistence
// ===========================================================================

#[test]
fn filter_state_blob_replays_on_a_fresh_session() {
    let mut session = session_with_combined();
    session.set_position_filter(PositionFilter::Key("G".into()));
    session.set_fantasy_team_filter(Some("Los Tigres".into()));
    session.toggle_sort(SortKey::AveragePoints);
    let blob = session.filter_blob();

    let mut restored = Session::new(Config::default());
    restored.load_combined(&combined_fixture());
    restored.restore_filter_blob(&blob);
    assert_eq!(restored.filter_state(), session.filter_state());

    let names: Vec<&str> = restored
        .view()
        .iter()
        .map(|r| r.identity.name.as_str())
        .collect();
    assert_eq!(names, vec!["Luka Doncic", "Derrick White"]);
}

#[test]
fn corrupt_blob_falls_back_to_default_state() {
    let mut session = session_with_combined();
    session.restore_filter_blob("{\"sort_key\": \"unknownColumn\"}");
    assert_eq!(session.filter_state(), &FilterState::default());
    assert_eq!(session.filter_state().sort_key, SortKey::TotalPoints);
    assert_eq!(session.filter_state().direction, SortDirection::Desc);
}

// ===========================================================================
// CSV re-export round-trip
// ===========================================================================

#[test]
fn reexport_reproduces_input_cells() {
    let session = session_with_combined();
    let exported = session.export().unwrap().unwrap();
    let lines: Vec<&str> = exported.lines().collect();

    assert_eq!(
        lines[0],
        "Equipo Fantasy;Nombre;Equipo NBA;Posicion;Día 1;Día 2;Día 3;Día 4"
    );
    assert_eq!(
        lines[1],
        "Equipo Fantasy;Nombre;Equipo NBA;Posicion;21-oct;22-oct;23-oct;24-oct"
    );

    // Every input data row reappears cell-for-cell (comma decimals kept,
    // absent cells empty).
    assert_eq!(lines[2], "Los Tigres;Luka Doncic;DAL;PG;32,5;;28;19");
    assert_eq!(lines[3], "Los Tigres;Derrick White;BOS;PG/SG;12;0;;15");
    assert_eq!(lines[4], "Los Osos;Nikola Jokic;DEN;C;41;22;30;");
    assert_eq!(lines[5], "Los Osos;Jayson Tatum;BOS;SF;25;27;24;26");
}

#[test]
fn reexport_then_reimport_is_identical() {
    let session = session_with_combined();
    let exported = session.export().unwrap().unwrap();

    let mut second = Session::new(Config::default());
    second.load_combined(&exported);
    let first_ds = session.dataset().unwrap();
    let second_ds = second.dataset().unwrap();

    assert_eq!(first_ds.records.len(), second_ds.records.len());
    for (a, b) in first_ds.records.iter().zip(&second_ds.records) {
        assert_eq!(a.identity, b.identity);
        assert_eq!(a.series, b.series);
        assert_eq!(a.cumulative, b.cumulative);
    }
}

// ===========================================================================
// Pure run() context
// ===========================================================================

#[test]
fn run_carries_previous_filter_through() {
    let mut filter = FilterState::default();
    filter.toggle_sort(SortKey::Name);
    let output = run(
        RawInput::Combined(&combined_fixture()),
        filter.clone(),
        &Config::default(),
    );
    assert_eq!(output.filter, filter);
    assert_eq!(output.dataset.records.len(), 4);

    let view = query::apply(&output.dataset, &output.filter);
    assert_eq!(view[0].identity.name, "Derrick White");
}
