use super::*;
use serde_json::json;
use shared::protocol::{
    ArtifactWithConfusionMatrix, CrowdtruthScores, DefectType, FinalDefectComparison,
    FinalDefectResult, FinalDefectType, MetricsComparison, MetricsScores, WebFinalDefects,
};

fn matrix(precision: f64, recall: f64, fmeasure: f64, accuracy: f64) -> ConfusionMatrix {
    ConfusionMatrix {
        true_positives: 6,
        true_negatives: 2,
        false_positives: 4,
        false_negatives: 1,
        precision,
        recall,
        fmeasure,
        accuracy,
    }
}

fn artifact(id: &str, quality: f64) -> ArtifactWithConfusionMatrix {
    ArtifactWithConfusionMatrix {
        id: id.to_string(),
        quality,
        confusion_matrix: matrix(0.6, 0.9, 0.7, 0.75),
    }
}

fn comparison(eme_id: &str, truth: &str, verdicts: &[(&str, &str)]) -> FinalDefectComparison {
    FinalDefectComparison {
        eme_id: eme_id.to_string(),
        scenario_id: None,
        true_defect_type: truth.to_string(),
        final_defect_types: verdicts
            .iter()
            .map(|(name, verdict)| (name.to_string(), verdict.to_string()))
            .collect(),
    }
}

#[test]
fn final_defect_columns_are_union_in_first_appearance_order() {
    let records = vec![
        comparison("1", "X", &[("A", "fp")]),
        comparison("2", "Y", &[("B", "tp")]),
    ];

    let view = project_final_defect_comparison(Semester::WS2017, &records);

    assert_eq!(
        view.table.field_names,
        vec!["emeId", "trueDefectType", "A", "B"]
    );
    assert_eq!(view.table.table_header_names.len(), 4);
    assert_eq!(view.algorithms, vec!["A", "B"]);
    assert_eq!(view.table.data[0].get("A"), Some(&json!("fp")));
    assert!(!view.table.data[0].contains_key("B"));
    assert_eq!(view.table.data[1].get("B"), Some(&json!("tp")));
    assert!(!view.table.data[1].contains_key("A"));
}

#[test]
fn final_defect_comparison_keeps_scenario_column_when_present() {
    let mut with_scenario = comparison("7", "WRONG", &[("CrowdTruth", "WRONG")]);
    with_scenario.scenario_id = Some("S2".into());
    let records = vec![
        with_scenario,
        comparison(
            "8",
            "NO_DEFECT",
            &[("MajorityVoting", "NO_DEFECT"), ("CrowdTruth", "MISSING")],
        ),
    ];

    let view = project_final_defect_comparison(Semester::SS2018, &records);

    assert_eq!(
        view.table.field_names,
        vec![
            "emeId",
            "scenarioId",
            "trueDefectType",
            "CrowdTruth",
            "MajorityVoting"
        ]
    );
    assert_eq!(view.table.table_header_names[1], "Scenario");
    assert_eq!(view.table.table_header_names[4], "MajorityVoting");
    assert!(!view.table.data[1].contains_key("scenarioId"));
}

#[test]
fn box_plot_melts_each_artifact_into_five_rows() {
    let view = project_box_plot(EntityKind::Worker, Semester::WS2017, &[artifact("1", 0.8)]);

    let pairs: Vec<(String, f64)> = view
        .table
        .data
        .iter()
        .map(|row| {
            (
                row["type"].as_str().expect("type").to_string(),
                row["value"].as_f64().expect("value"),
            )
        })
        .collect();

    assert_eq!(
        pairs,
        vec![
            ("worker quality".to_string(), 0.8),
            ("fmeasure".to_string(), 0.7),
            ("precision".to_string(), 0.6),
            ("recall".to_string(), 0.9),
            ("accuracy".to_string(), 0.75),
        ]
    );
    assert_eq!(view.table.field_names, vec!["type", "value"]);
}

#[test]
fn box_plot_labels_quality_by_entity_kind() {
    let view = project_box_plot(
        EntityKind::MediaUnit,
        Semester::WS2017,
        &[artifact("m1", 0.4), artifact("m2", 0.5)],
    );
    assert_eq!(view.table.data.len(), 10);
    assert_eq!(view.table.data[5]["type"], json!("media unit quality"));
}

#[test]
fn correlation_hoists_confusion_matrix_fields() {
    let pearson = PearsonScores {
        fmeasure: Some(0.42),
        precision: Some(0.1),
        accuracy: None,
        recall: Some(-0.3),
    };
    let view = project_correlation(
        EntityKind::Worker,
        Semester::SS2018,
        &[artifact("w7", 0.55)],
        &pearson,
    );

    let row = &view.table.data[0];
    assert_eq!(row["id"], json!("w7"));
    assert_eq!(row["quality"], json!(0.55));
    assert_eq!(row["fmeasure"], json!(0.7));
    assert_eq!(row["truePositives"], json!(6));
    assert!(!row.contains_key("confusionMatrix"));
    for field in &view.table.field_names {
        assert!(row.contains_key(field), "missing {field}");
    }
    assert_eq!(view.pearson_scores, pearson);
    assert_eq!(view.table.title, "Worker Quality Correlation");
}

#[test]
fn empty_inputs_keep_static_headers() {
    let correlation = project_correlation(
        EntityKind::Annotation,
        Semester::WS2017,
        &[],
        &PearsonScores::default(),
    );
    let box_plot = project_box_plot(EntityKind::Worker, Semester::WS2017, &[]);
    let metrics = project_comparison(Semester::WS2017, &MetricsComparison::new());

    for table in [&correlation.table, &box_plot.table, &metrics.table] {
        assert!(table.data.is_empty());
        assert!(!table.field_names.is_empty());
        assert_eq!(table.field_names.len(), table.table_header_names.len());
    }
    assert_eq!(
        correlation.table.field_names,
        schema(ViewKind::Correlation).field_names()
    );

    let final_defects = project_final_defect_comparison(Semester::WS2017, &[]);
    assert!(final_defects.table.data.is_empty());
    assert_eq!(
        final_defects.table.field_names,
        vec!["emeId", "trueDefectType"]
    );
}

#[test]
fn comparison_injects_algorithm_name_per_row() {
    let mut metrics = MetricsComparison::new();
    metrics.insert("MajorityVoting".into(), matrix(0.5, 0.5, 0.5, 0.6));
    metrics.insert("CrowdTruth".into(), matrix(0.7, 0.4, 0.5091, 0.65));

    let view = project_comparison(Semester::WS2017, &metrics);

    assert_eq!(view.table.data.len(), 2);
    assert_eq!(view.table.data[0]["algorithm"], json!("CrowdTruth"));
    assert_eq!(view.table.data[0]["precision"], json!(0.7));
    assert_eq!(view.table.data[1]["algorithm"], json!("MajorityVoting"));
    assert_eq!(view.table.field_names[0], "algorithm");
    assert_eq!(
        view.table.field_names.len(),
        view.table.table_header_names.len()
    );
}

#[test]
fn algorithm_results_carry_metrics_block_and_outcomes() {
    let response = WebFinalDefects {
        confusion_matrix: matrix(0.5, 1.0, 0.6667, 0.5),
        final_defect_results: vec![FinalDefectResult {
            eme_id: "e1".into(),
            scenario_id: Some("S1".into()),
            agreement_coefficient: Some("0.8".into()),
            final_defect_type: FinalDefectType::Missing,
            true_defect_type: DefectType::NoDefect,
            eme_text: None,
            true_defect_id: Some("NA".into()),
            true_positive: false,
            false_positive: true,
            true_negative: false,
            false_negative: false,
        }],
        parameters: [("threshold".to_string(), "0.1".to_string())].into(),
        algorithm_type: AlgorithmId::AdaptiveMajorityVoting,
        worker_confusion_matrix: Vec::new(),
        worker_pearson_scores: PearsonScores::default(),
        nr_evaluated_emes: 1,
        nr_workers: 3,
        nr_judgements: 9,
        semester: Some(Semester::WS2017),
    };

    let view = project_algorithm_results(Semester::WS2017, &response);

    assert_eq!(view.table.title, "AdaptiveMajorityVoting Final Defects");
    assert_eq!(view.confusion_matrix.fmeasure, 0.6667);
    assert_eq!(view.parameters["threshold"], "0.1");
    let row = &view.table.data[0];
    assert_eq!(row["outcome"], json!("FP"));
    assert_eq!(row["falsePositive"], json!(true));
    assert_eq!(row["truePositive"], json!(false));
    assert_eq!(
        view.table.field_names,
        schema(ViewKind::AlgorithmResults).field_names()
    );
    assert_eq!(row["finalDefectType"], json!("MISSING"));
    assert_eq!(row["emeText"], Value::Null);
    assert_eq!(view.nr_judgements, 9);
}

#[test]
fn crowdtruth_evaluation_projects_three_entity_tables() {
    let scores = CrowdtruthScores {
        worker_scores: vec![artifact("w1", 0.9)],
        worker_pearson_scores: PearsonScores::default(),
        annotation_scores: vec![artifact("a1", 0.3), artifact("a2", 0.4)],
        annotation_pearson_scores: PearsonScores::default(),
        media_unit_scores: Vec::new(),
        media_unit_pearson_scores: PearsonScores::default(),
        metrics_scores: MetricsScores::default(),
    };

    let view = project_crowdtruth_evaluation(Semester::SS2018, &scores);

    let sizes: Vec<usize> = view.tables().iter().map(|t| t.table.data.len()).collect();
    assert_eq!(sizes, vec![1, 2, 0]);
    assert_eq!(view.media_units.entity, EntityKind::MediaUnit);
    assert_eq!(view.annotations.table.title, "Annotation Quality Correlation");
}

#[test]
fn table_view_serializes_with_camel_case_headers() {
    let view = project_comparison(Semester::WS2017, &MetricsComparison::new());
    let encoded = serde_json::to_value(&view).expect("encode");
    assert_eq!(encoded["title"], json!("Algorithm Comparison"));
    assert!(encoded["fieldNames"].is_array());
    assert!(encoded["tableHeaderNames"].is_array());
    assert_eq!(encoded["data"], json!([]));
    assert_eq!(encoded["semester"], json!("WS2017"));
}

#[test]
fn table_view_exports_field_columns() {
    let records = vec![
        comparison("1", "X", &[("A", "fp")]),
        comparison("2", "Y", &[("B", "tp")]),
    ];
    let view = project_final_defect_comparison(Semester::WS2017, &records);
    assert_eq!(
        view.table.to_delimited(),
        "emeId;trueDefectType;A;B\r\n1;X;fp;\r\n2;Y;;tp"
    );
}

#[test]
fn algorithm_named_like_a_static_field_is_skipped() {
    let records = vec![comparison(
        "1",
        "WRONG",
        &[("emeId", "MISSING"), ("CrowdTruth", "WRONG")],
    )];

    let view = project_final_defect_comparison(Semester::WS2017, &records);

    assert_eq!(
        view.table.field_names,
        vec!["emeId", "trueDefectType", "CrowdTruth"]
    );
    assert_eq!(view.algorithms, vec!["CrowdTruth"]);
    assert_eq!(view.table.data[0]["emeId"], json!("1"));
}

#[test]
fn metrics_scores_become_four_tables() {
    let scores = MetricsScores {
        annotation_quality_scores: [("MISSING".to_string(), Some(0.82))].into(),
        worker_quality_scores: [
            ("w2".to_string(), None),
            ("w7".to_string(), Some(0.4)),
        ]
        .into(),
        media_unit_quality_scores: [("17".to_string(), Some(0.66))].into(),
        media_unit_annotation_scores: [
            ("17/MISSING".to_string(), Some(0.5)),
            ("18".to_string(), Some(0.1)),
        ]
        .into(),
    };

    let view = project_metrics_scores(&scores);

    assert_eq!(view.worker_quality.title, "Worker Quality Score (WQS)");
    assert_eq!(view.worker_quality.field_names, vec!["workerId", "qualityScore"]);
    assert_eq!(view.worker_quality.data[0]["workerId"], json!("w2"));
    assert!(!view.worker_quality.data[0].contains_key("qualityScore"));
    assert_eq!(view.worker_quality.data[1]["qualityScore"], json!(0.4));
    assert_eq!(
        view.annotation_quality.data[0]["annotationName"],
        json!("MISSING")
    );
    assert_eq!(view.media_unit_quality.data[0]["mediaUnitId"], json!("17"));

    let uas = &view.media_unit_annotations;
    assert_eq!(
        uas.field_names,
        vec!["annotationName", "mediaUnitId", "agreementCoefficient"]
    );
    assert_eq!(uas.data[0]["annotationName"], json!("MISSING"));
    assert_eq!(uas.data[0]["mediaUnitId"], json!("17"));
    assert_eq!(uas.data[0]["agreementCoefficient"], json!(0.5));
    assert!(!uas.data[1].contains_key("annotationName"));
    assert_eq!(uas.data[1]["mediaUnitId"], json!("18"));
    assert_eq!(
        uas.to_delimited(),
        "annotationName;mediaUnitId;agreementCoefficient\r\nMISSING;17;0.5\r\n;18;0.1"
    );
}
