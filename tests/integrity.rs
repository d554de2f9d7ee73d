//! Integration tests for the read-only integrity check.

use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

use autofacts_core::dataset::verify::verify;
use autofacts_core::{
    CandidateCatalog, CollectionKind, CollectionPaths, CollectionStore, FindingCode, run,
};

fn write(paths: &CollectionPaths, kind: CollectionKind, value: Value) {
    fs_err::write(paths.get(kind), serde_json::to_vec(&value).expect("encode"))
        .expect("write collection");
}

fn seeded() -> (TempDir, CollectionPaths) {
    let dir = tempdir().expect("tempdir");
    let paths = CollectionPaths::in_dir(dir.path());
    write(
        &paths,
        CollectionKind::Models,
        json!([
            {"id": "honda_pilot_yf3", "brand": "HONDA", "model": "Pilot", "generation": "3rd Gen",
             "start_year": 2016, "end_year": 2022},
            {"id": "ford_escape_3g", "brand": "FORD", "model": "Escape", "generation": "3rd Gen",
             "start_year": 2013, "end_year": 2019}
        ]),
    );
    write(
        &paths,
        CollectionKind::Market,
        json!([{"model_id": "honda_pilot_yf3"}, {"model_id": "ford_escape_3g"}]),
    );
    write(
        &paths,
        CollectionKind::Reliability,
        json!([
            {"model_id": "honda_pilot_yf3", "best_years": [2019], "worst_years": [2016]},
            {"model_id": "ford_escape_3g", "best_years": [2019], "worst_years": [2013, 2014]}
        ]),
    );
    write(
        &paths,
        CollectionKind::Faults,
        json!([
            {"model_id_ref": "honda_pilot_yf3", "faults": [
                {"component": "VCM", "symptoms": "Misfires", "repairCost": 1800,
                 "verdictImplication": "Moderate"}
            ]},
            {"model_id_ref": "ford_escape_3g", "faults": [
                {"component": "Coolant Intrusion", "symptoms": "White smoke", "repairCost": 5000,
                 "verdictImplication": "Severe"}
            ]}
        ]),
    );
    (dir, paths)
}

#[test]
fn seeded_dataset_is_clean() {
    let (_dir, paths) = seeded();
    let report = verify(&CollectionStore::new(paths)).expect("verify");
    assert!(report.is_clean(), "{}", report.to_text());
    assert_eq!(report.lengths, [2, 2, 2, 2]);
}

#[test]
fn injected_models_keep_the_dataset_clean() {
    let (_dir, paths) = seeded();
    let raw = br#"[{
        "model_def": {"id": "subaru_forester_sj", "brand": "SUBARU", "model": "Forester",
                      "generation": "4th Gen", "start_year": 2014, "end_year": 2018},
        "market": {"model_id": "subaru_forester_sj", "jan_2026_avg_price": 10500,
                   "depreciation_rate": 0.12, "avg_annual_repair_cost": 700,
                   "depreciation_outlook": "Moderate"},
        "reliability": {"model_id": "subaru_forester_sj", "score": 66, "lifespan_miles": 200000,
                        "best_years": [2017, 2018], "worst_years": [2014],
                        "common_trouble_spots": ["Oil Consumption"]},
        "faults": {"model_id_ref": "subaru_forester_sj", "faults": [
            {"component": "FB25 Oil Burn", "symptoms": "Low oil", "repairCost": 4000,
             "verdictImplication": "Moderate"}]}
    }]"#;
    let catalog = CandidateCatalog::from_slice("batch.json", raw).expect("catalog");
    run(&paths, &catalog).expect("inject");

    let report = verify(&CollectionStore::new(paths)).expect("verify");
    assert!(report.is_clean(), "{}", report.to_text());
    assert_eq!(report.lengths, [3, 3, 3, 3]);
}

#[test]
fn hand_edited_faults_file_is_flagged() {
    let (_dir, paths) = seeded();
    write(
        &paths,
        CollectionKind::Faults,
        json!([
            {"model_id_ref": "ford_escape_3g", "faults": []},
            {"model_id_ref": "ford_escape_3g", "faults": []},
            {"model_id_ref": "chevy_cruze_j300", "faults": []}
        ]),
    );

    let report = verify(&CollectionStore::new(paths)).expect("verify");
    for code in [
        FindingCode::LengthMismatch,
        FindingCode::DuplicateKey,
        FindingCode::DanglingReference,
        FindingCode::MissingDependent,
        FindingCode::EmptyFaultList,
    ] {
        assert!(report.has_code(code), "missing {code}:\n{}", report.to_text());
    }
    assert!(report.error_count() > 0);
    let dangling = report
        .findings
        .iter()
        .find(|f| f.code == FindingCode::DanglingReference)
        .expect("dangling finding");
    assert_eq!(dangling.model_id.as_deref(), Some("chevy_cruze_j300"));
    assert_eq!(dangling.collection, CollectionKind::Faults);
}
