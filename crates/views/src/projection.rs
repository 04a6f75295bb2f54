use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};
use shared::{
    domain::Semester,
    protocol::{
        ArtifactWithConfusionMatrix, ConfusionMatrix, CrowdtruthScores, FinalDefectComparison,
        MetricsComparison, MetricsScores, Outcome, PearsonScores, WebFinalDefects,
    },
};

use crate::{
    schema::{schema, ViewKind},
    AlgorithmResultView, BoxPlotView, ComparisonView, CorrelationView, CrowdtruthEvaluationView,
    EntityKind, FinalDefectComparisonView, MetricsScoresView, Row, TableView,
};

fn insert_metrics(row: &mut Row, matrix: &ConfusionMatrix) {
    row.insert("precision".into(), json!(matrix.precision));
    row.insert("recall".into(), json!(matrix.recall));
    row.insert("fmeasure".into(), json!(matrix.fmeasure));
    row.insert("accuracy".into(), json!(matrix.accuracy));
    row.insert("truePositives".into(), json!(matrix.true_positives));
    row.insert("trueNegatives".into(), json!(matrix.true_negatives));
    row.insert("falsePositives".into(), json!(matrix.false_positives));
    row.insert("falseNegatives".into(), json!(matrix.false_negatives));
}

fn outcome_code(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::TruePositive => "TP",
        Outcome::TrueNegative => "TN",
        Outcome::FalsePositive => "FP",
        Outcome::FalseNegative => "FN",
    }
}

fn optional(value: &Option<String>) -> Value {
    value.as_deref().map_or(Value::Null, |text| json!(text))
}

/// One row per entity with the confusion-matrix block hoisted to the top level.
pub fn project_correlation(
    entity: EntityKind,
    semester: Semester,
    artifacts: &[ArtifactWithConfusionMatrix],
    pearson_scores: &PearsonScores,
) -> CorrelationView {
    let view = schema(ViewKind::Correlation);
    let data = artifacts
        .iter()
        .map(|artifact| {
            let mut row = Row::new();
            row.insert("id".into(), json!(artifact.id));
            row.insert("quality".into(), json!(artifact.quality));
            insert_metrics(&mut row, &artifact.confusion_matrix);
            row
        })
        .collect();

    CorrelationView {
        table: view.table(format!("{} {}", entity.label(), view.title), data),
        entity,
        pearson_scores: *pearson_scores,
        semester,
    }
}

/// Long format for box charts: five `{type, value}` rows per entity.
pub fn project_box_plot(
    entity: EntityKind,
    semester: Semester,
    artifacts: &[ArtifactWithConfusionMatrix],
) -> BoxPlotView {
    let view = schema(ViewKind::BoxPlot);
    let quality_label = entity.quality_label();
    let data = artifacts
        .iter()
        .flat_map(|artifact| {
            let matrix = &artifact.confusion_matrix;
            [
                (quality_label, artifact.quality),
                ("fmeasure", matrix.fmeasure),
                ("precision", matrix.precision),
                ("recall", matrix.recall),
                ("accuracy", matrix.accuracy),
            ]
        })
        .map(|(series, value)| {
            let mut row = Row::new();
            row.insert("type".into(), json!(series));
            row.insert("value".into(), json!(value));
            row
        })
        .collect();

    BoxPlotView {
        table: view.table(format!("{} {}", entity.label(), view.title), data),
        entity,
        semester,
    }
}

/// One row per algorithm name, ordered by name.
pub fn project_comparison(semester: Semester, metrics: &MetricsComparison) -> ComparisonView {
    let view = schema(ViewKind::MetricsComparison);
    let data = metrics
        .iter()
        .map(|(algorithm, matrix)| {
            let mut row = Row::new();
            row.insert("algorithm".into(), json!(algorithm));
            insert_metrics(&mut row, matrix);
            row
        })
        .collect();

    ComparisonView {
        table: view.table(view.title, data),
        semester,
    }
}

/// Columns are the union of algorithm names over all records, in order of
/// first appearance. `scenarioId` is a column only if some record has one.
/// Algorithm names that equal a static field are skipped.
pub fn project_final_defect_comparison(
    semester: Semester,
    records: &[FinalDefectComparison],
) -> FinalDefectComparisonView {
    let view = schema(ViewKind::FinalDefectComparison);

    let reserved = |name: &str| view.columns.iter().any(|column| column.field == name);

    let mut seen = HashSet::new();
    let mut algorithms = Vec::new();
    for record in records {
        for (name, _) in &record.final_defect_types {
            if !reserved(name.as_str()) && seen.insert(name.as_str()) {
                algorithms.push(name.clone());
            }
        }
    }

    let with_scenario = records.iter().any(|record| record.scenario_id.is_some());
    let mut columns: Vec<(String, String)> = view
        .columns
        .iter()
        .filter(|column| with_scenario || column.field != "scenarioId")
        .map(|column| (column.field.to_string(), column.header.to_string()))
        .collect();
    columns.extend(algorithms.iter().map(|name| (name.clone(), name.clone())));

    let data = records
        .iter()
        .map(|record| {
            let mut row = Row::new();
            row.insert("emeId".into(), json!(record.eme_id));
            if let Some(scenario_id) = &record.scenario_id {
                row.insert("scenarioId".into(), json!(scenario_id));
            }
            row.insert("trueDefectType".into(), json!(record.true_defect_type));
            for (algorithm, verdict) in &record.final_defect_types {
                if !reserved(algorithm.as_str()) {
                    row.insert(algorithm.clone(), json!(verdict));
                }
            }
            row
        })
        .collect();

    FinalDefectComparisonView {
        table: TableView::new(view.title, columns, data),
        algorithms,
        semester,
    }
}

/// Primary table for the selected algorithm with its overall metrics block.
pub fn project_algorithm_results(
    semester: Semester,
    response: &WebFinalDefects,
) -> AlgorithmResultView {
    let view = schema(ViewKind::AlgorithmResults);
    let data = response
        .final_defect_results
        .iter()
        .map(|result| {
            let mut row = Row::new();
            row.insert("emeId".into(), json!(result.eme_id));
            row.insert("scenarioId".into(), optional(&result.scenario_id));
            row.insert("emeText".into(), optional(&result.eme_text));
            row.insert("trueDefectId".into(), optional(&result.true_defect_id));
            row.insert(
                "trueDefectType".into(),
                json!(result.true_defect_type.as_str()),
            );
            row.insert(
                "finalDefectType".into(),
                json!(result.final_defect_type.as_str()),
            );
            row.insert(
                "agreementCoefficient".into(),
                optional(&result.agreement_coefficient),
            );
            row.insert("outcome".into(), json!(outcome_code(result.outcome())));
            row.insert("truePositive".into(), json!(result.true_positive));
            row.insert("trueNegative".into(), json!(result.true_negative));
            row.insert("falsePositive".into(), json!(result.false_positive));
            row.insert("falseNegative".into(), json!(result.false_negative));
            row
        })
        .collect();

    AlgorithmResultView {
        table: view.table(
            format!("{} {}", response.algorithm_type, view.title),
            data,
        ),
        algorithm: response.algorithm_type,
        parameters: response.parameters.clone(),
        confusion_matrix: response.confusion_matrix,
        nr_evaluated_emes: response.nr_evaluated_emes,
        nr_workers: response.nr_workers,
        nr_judgements: response.nr_judgements,
        semester,
    }
}

pub fn project_crowdtruth_evaluation(
    semester: Semester,
    scores: &CrowdtruthScores,
) -> CrowdtruthEvaluationView {
    CrowdtruthEvaluationView {
        workers: project_correlation(
            EntityKind::Worker,
            semester,
            &scores.worker_scores,
            &scores.worker_pearson_scores,
        ),
        annotations: project_correlation(
            EntityKind::Annotation,
            semester,
            &scores.annotation_scores,
            &scores.annotation_pearson_scores,
        ),
        media_units: project_correlation(
            EntityKind::MediaUnit,
            semester,
            &scores.media_unit_scores,
            &scores.media_unit_pearson_scores,
        ),
        metrics_scores: project_metrics_scores(&scores.metrics_scores),
        semester,
    }
}

fn quality_score_table(kind: ViewKind, scores: &BTreeMap<String, Option<f64>>) -> TableView {
    let view = schema(kind);
    let id_field = view.columns[0].field;
    let data = scores
        .iter()
        .map(|(id, score)| {
            let mut row = Row::new();
            row.insert(id_field.into(), json!(id));
            if let Some(score) = score {
                row.insert("qualityScore".into(), json!(score));
            }
            row
        })
        .collect();
    view.table(view.title, data)
}

/// Splits `"{mediaUnitId}/{annotationName}"` keys into two columns. A key
/// without a separator is taken as the media unit id.
fn media_unit_annotation_table(scores: &BTreeMap<String, Option<f64>>) -> TableView {
    let view = schema(ViewKind::MediaUnitAnnotationScores);
    let data = scores
        .iter()
        .map(|(key, score)| {
            let mut row = Row::new();
            match key.split_once('/') {
                Some((media_unit, annotation)) => {
                    row.insert("annotationName".into(), json!(annotation));
                    row.insert("mediaUnitId".into(), json!(media_unit));
                }
                None => {
                    row.insert("mediaUnitId".into(), json!(key));
                }
            }
            if let Some(score) = score {
                row.insert("agreementCoefficient".into(), json!(score));
            }
            row
        })
        .collect();
    view.table(view.title, data)
}

pub fn project_metrics_scores(scores: &MetricsScores) -> MetricsScoresView {
    MetricsScoresView {
        worker_quality: quality_score_table(
            ViewKind::WorkerQualityScores,
            &scores.worker_quality_scores,
        ),
        annotation_quality: quality_score_table(
            ViewKind::AnnotationQualityScores,
            &scores.annotation_quality_scores,
        ),
        media_unit_quality: quality_score_table(
            ViewKind::MediaUnitQualityScores,
            &scores.media_unit_quality_scores,
        ),
        media_unit_annotations: media_unit_annotation_table(&scores.media_unit_annotation_scores),
    }
}
