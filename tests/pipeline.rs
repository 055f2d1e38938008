//! End-to-end pipeline tests: scene file in, placement CSV out.

use siteplan::config::RunConfig;
use siteplan::enumerate::{CombinationEnumerator, PlacementEnumerator};
use siteplan::error::{Error, OracleError};
use siteplan::grid::{CoverageGrid, CoverageSample};
use siteplan::oracle::{FsplOracle, SignalOracle};
use siteplan::placement::Placement;
use siteplan::scene::{extract_candidates, SceneFile};
use siteplan::scoring::Aggregation;
use siteplan::search::SearchBudget;
use siteplan::site::Site;
use siteplan::SearchBuilder;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn temp_path(suffix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("siteplan-{}-{}", uuid::Uuid::new_v4(), suffix))
}

fn write_scene(buildings: &str) -> PathBuf {
    let path = temp_path("scene.json");
    fs::write(&path, buildings).unwrap();
    path
}

const THREE_TOWERS: &str = r#"[
    {"id": "north", "footprint": [[90.0, 180.0], [110.0, 180.0], [110.0, 200.0], [90.0, 200.0]], "height": 45.0},
    {"id": "east", "footprint": [[180.0, 90.0], [200.0, 90.0], [200.0, 110.0], [180.0, 110.0]], "height": 38.0},
    {"id": "west", "footprint": [[0.0, 90.0], [20.0, 90.0], [20.0, 110.0], [0.0, 110.0]], "height": 52.0},
    {"id": "shed", "footprint": [[50.0, 50.0], [55.0, 50.0], [55.0, 55.0], [50.0, 55.0]], "height": 4.0}
]"#;

fn grid() -> CoverageGrid {
    CoverageGrid::new(0.0, 0.0, 200.0, 200.0, 50.0, 1.5).unwrap()
}

#[test]
fn scene_to_csv_end_to_end() {
    let scene_path = write_scene(THREE_TOWERS);
    let scene = SceneFile::load(&scene_path).unwrap();
    let candidates = extract_candidates(&scene, 10.0).unwrap();
    assert_eq!(candidates.len(), 3);

    let result = SearchBuilder::new(Arc::new(FsplOracle::default()), grid())
        .candidates(candidates)
        .k(2)
        .run(&SearchBudget::unlimited())
        .unwrap();
    assert!(result.completed);
    assert_eq!(result.placements_total, 3);
    assert_eq!(result.evaluated, 3);
    assert!(result.failures.is_empty());

    let mut csv = Vec::new();
    result.write_csv(&mut csv).unwrap();
    let text = String::from_utf8(csv).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "site_id,x,y,z,placement_score");
    assert_eq!(lines.len(), 3);

    fs::remove_file(scene_path).unwrap();
}

#[test]
fn pair_enumeration_covers_all_pairs() {
    let enumerator = CombinationEnumerator::new(3, 2).unwrap();
    let pairs: Vec<Vec<usize>> = enumerator.iter().map(|p| p.indices().to_vec()).collect();
    assert_eq!(pairs, vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
}

/// Oracle that fails for any placement containing a named site.
struct Blocklist {
    blocked: String,
}

impl SignalOracle for Blocklist {
    fn name(&self) -> &str {
        "blocklist"
    }

    fn evaluate(
        &self,
        sites: &[&Site],
        grid: &CoverageGrid,
    ) -> std::result::Result<Vec<CoverageSample>, OracleError> {
        if sites.iter().any(|s| s.id == self.blocked) {
            return Err(OracleError::Unreachable(format!(
                "no route to model for {}",
                self.blocked
            )));
        }
        FsplOracle::default().evaluate(sites, grid)
    }
}

#[test]
fn single_failure_is_reported_not_fatal() {
    let scene_path = write_scene(THREE_TOWERS);
    let scene = SceneFile::load(&scene_path).unwrap();
    let candidates = extract_candidates(&scene, 10.0).unwrap();

    let oracle = Arc::new(Blocklist {
        blocked: "west".to_string(),
    });
    let result = SearchBuilder::new(oracle, grid())
        .candidates(candidates)
        .k(1)
        .run(&SearchBudget::unlimited())
        .unwrap();
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.evaluated, 3);
    let best = result.best.unwrap();
    let ids: Vec<&str> = best
        .placement
        .resolve(&result.candidates)
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_ne!(ids, vec!["west"]);

    fs::remove_file(scene_path).unwrap();
}

/// Oracle that fails exactly one named pair of sites.
struct PairOutage {
    first: String,
    second: String,
}

impl SignalOracle for PairOutage {
    fn name(&self) -> &str {
        "pair-outage"
    }

    fn evaluate(
        &self,
        sites: &[&Site],
        grid: &CoverageGrid,
    ) -> std::result::Result<Vec<CoverageSample>, OracleError> {
        let ids: Vec<&str> = sites.iter().map(|s| s.id.as_str()).collect();
        if ids.contains(&self.first.as_str()) && ids.contains(&self.second.as_str()) {
            return Err(OracleError::Malformed("truncated model output".to_string()));
        }
        FsplOracle::default().evaluate(sites, grid)
    }
}

#[test]
fn one_failing_pair_leaves_the_rest_ranked() {
    let scene_path = write_scene(THREE_TOWERS);
    let scene = SceneFile::load(&scene_path).unwrap();
    let candidates = extract_candidates(&scene, 10.0).unwrap();

    let oracle = Arc::new(PairOutage {
        first: "north".to_string(),
        second: "west".to_string(),
    });
    let result = SearchBuilder::new(oracle, grid())
        .candidates(candidates)
        .k(2)
        .run(&SearchBudget::unlimited())
        .unwrap();
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.evaluated, 3);
    assert!(result.completed);
    let best_ids: Vec<String> = result
        .winning_sites()
        .iter()
        .map(|s| s.id.clone())
        .collect();
    assert!(!(best_ids.contains(&"north".to_string()) && best_ids.contains(&"west".to_string())));

    fs::remove_file(scene_path).unwrap();
}

#[test]
fn all_failures_aborts_with_attempt_count() {
    let scene_path = write_scene(THREE_TOWERS);
    let scene = SceneFile::load(&scene_path).unwrap();
    let candidates = extract_candidates(&scene, 10.0).unwrap();

    struct AlwaysDown;
    impl SignalOracle for AlwaysDown {
        fn name(&self) -> &str {
            "down"
        }
        fn evaluate(
            &self,
            _sites: &[&Site],
            _grid: &CoverageGrid,
        ) -> std::result::Result<Vec<CoverageSample>, OracleError> {
            Err(OracleError::Unreachable("connection refused".to_string()))
        }
    }

    let result = SearchBuilder::new(Arc::new(AlwaysDown), grid())
        .candidates(candidates)
        .k(1)
        .run(&SearchBudget::unlimited());
    assert!(matches!(
        result,
        Err(Error::AllEvaluationsFailed { attempted: 3 })
    ));

    fs::remove_file(scene_path).unwrap();
}

#[test]
fn rerunning_the_same_scene_yields_identical_csv() {
    let scene_path = write_scene(THREE_TOWERS);

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let scene = SceneFile::load(&scene_path).unwrap();
        let candidates = extract_candidates(&scene, 10.0).unwrap();
        let result = SearchBuilder::new(Arc::new(FsplOracle::default()), grid())
            .candidates(candidates)
            .k(2)
            .aggregation(Aggregation::SumClamped { floor_dbm: -120.0 })
            .run(&SearchBudget::unlimited())
            .unwrap();
        let mut csv = Vec::new();
        result.write_csv(&mut csv).unwrap();
        outputs.push(csv);
    }
    assert_eq!(outputs[0], outputs[1]);

    fs::remove_file(scene_path).unwrap();
}

#[test]
fn parallel_and_sequential_agree_end_to_end() {
    let scene_path = write_scene(THREE_TOWERS);
    let scene = SceneFile::load(&scene_path).unwrap();
    let candidates = extract_candidates(&scene, 10.0).unwrap();

    let sequential = SearchBuilder::new(Arc::new(FsplOracle::default()), grid())
        .candidates(candidates.clone())
        .k(2)
        .run(&SearchBudget::unlimited())
        .unwrap();
    let parallel = SearchBuilder::new(Arc::new(FsplOracle::default()), grid())
        .candidates(candidates)
        .k(2)
        .run_parallel(4, &SearchBudget::unlimited())
        .unwrap();

    let mut seq_csv = Vec::new();
    let mut par_csv = Vec::new();
    sequential.write_csv(&mut seq_csv).unwrap();
    parallel.write_csv(&mut par_csv).unwrap();
    assert_eq!(seq_csv, par_csv);

    fs::remove_file(scene_path).unwrap();
}

#[test]
fn ties_resolve_to_the_earliest_placement() {
    // Two candidates at the same mounting point score identically; the
    // first enumerated single-site placement must win.
    let candidates = vec![
        Site::new("tower_a", siteplan::site::Point3::new(100.0, 100.0, 30.0), 30.0),
        Site::new("tower_b", siteplan::site::Point3::new(100.0, 100.0, 30.0), 30.0),
    ];
    let result = SearchBuilder::new(Arc::new(FsplOracle::default()), grid())
        .candidates(candidates)
        .k(1)
        .run(&SearchBudget::unlimited())
        .unwrap();
    let best = result.best.unwrap();
    assert_eq!(best.enumeration_index, 0);
    assert_eq!(best.placement, Placement::new(vec![0]));
}

#[test]
fn config_file_round_trip_drives_a_run() {
    let scene_path = write_scene(THREE_TOWERS);
    let config_path = temp_path("run.toml");

    let mut config = RunConfig::example();
    config.scene = scene_path.display().to_string();
    config.height_threshold = 10.0;
    config.k = 2;
    config.grid = grid();
    config.save(&config_path).unwrap();

    let loaded = RunConfig::load(&config_path).unwrap();
    let scene = SceneFile::load(&loaded.scene).unwrap();
    let candidates = extract_candidates(&scene, loaded.height_threshold).unwrap();
    let result = SearchBuilder::new(
        Arc::new(FsplOracle::new(
            loaded.oracle.frequency_hz,
            loaded.oracle.tx_power_dbm,
        )),
        loaded.grid.clone(),
    )
    .candidates(candidates)
    .k(loaded.k)
    .aggregation(loaded.aggregation)
    .timeout_per_evaluation(loaded.timeout())
    .run_parallel(loaded.worker_count, &SearchBudget::unlimited())
    .unwrap();
    assert!(result.completed);
    assert!(result.best.is_some());

    fs::remove_file(scene_path).unwrap();
    fs::remove_file(config_path).unwrap();
}
