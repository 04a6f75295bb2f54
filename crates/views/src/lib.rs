//! Pure projections from backend artifacts to table-shaped view models.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value};
use shared::{
    domain::{AlgorithmId, Semester},
    protocol::{ConfusionMatrix, PearsonScores},
};

pub mod export;
pub mod projection;
pub mod schema;

pub use projection::{
    project_algorithm_results, project_box_plot, project_comparison, project_correlation,
    project_crowdtruth_evaluation, project_final_defect_comparison, project_metrics_scores,
};
pub use schema::{schema, Column, ViewKind, ViewSchema};

/// One table row. Sparse: a missing key means "no value", never zero.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Worker,
    Annotation,
    MediaUnit,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Worker => "Worker",
            EntityKind::Annotation => "Annotation",
            EntityKind::MediaUnit => "Media Unit",
        }
    }

    /// `type` of the quality series in box-plot rows.
    pub fn quality_label(&self) -> &'static str {
        match self {
            EntityKind::Worker => "worker quality",
            EntityKind::Annotation => "annotation quality",
            EntityKind::MediaUnit => "media unit quality",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uniform tabular view: `field_names[i]` is shown under `table_header_names[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub title: String,
    pub field_names: Vec<String>,
    pub table_header_names: Vec<String>,
    pub data: Vec<Row>,
}

impl TableView {
    pub fn new(title: impl Into<String>, columns: Vec<(String, String)>, data: Vec<Row>) -> Self {
        let (field_names, table_header_names) = columns.into_iter().unzip();
        Self {
            title: title.into(),
            field_names,
            table_header_names,
            data,
        }
    }

    pub fn to_delimited(&self) -> String {
        export::to_delimited(&self.data, &self.field_names)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationView {
    #[serde(flatten)]
    pub table: TableView,
    pub entity: EntityKind,
    pub pearson_scores: PearsonScores,
    pub semester: Semester,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxPlotView {
    #[serde(flatten)]
    pub table: TableView,
    pub entity: EntityKind,
    pub semester: Semester,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonView {
    #[serde(flatten)]
    pub table: TableView,
    pub semester: Semester,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalDefectComparisonView {
    #[serde(flatten)]
    pub table: TableView,
    /// Dynamic columns, in order of first appearance.
    pub algorithms: Vec<String>,
    pub semester: Semester,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmResultView {
    #[serde(flatten)]
    pub table: TableView,
    pub algorithm: AlgorithmId,
    pub parameters: BTreeMap<String, String>,
    pub confusion_matrix: ConfusionMatrix,
    pub nr_evaluated_emes: u64,
    pub nr_workers: u64,
    pub nr_judgements: u64,
    pub semester: Semester,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdtruthEvaluationView {
    pub workers: CorrelationView,
    pub annotations: CorrelationView,
    pub media_units: CorrelationView,
    pub metrics_scores: MetricsScoresView,
    pub semester: Semester,
}

impl CrowdtruthEvaluationView {
    pub fn tables(&self) -> [&CorrelationView; 3] {
        [&self.workers, &self.annotations, &self.media_units]
    }
}

/// Raw CrowdTruth scores: WQS, AQS, UQS and UAS tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsScoresView {
    pub worker_quality: TableView,
    pub annotation_quality: TableView,
    pub media_unit_quality: TableView,
    pub media_unit_annotations: TableView,
}

impl MetricsScoresView {
    pub fn tables(&self) -> [&TableView; 4] {
        [
            &self.worker_quality,
            &self.annotation_quality,
            &self.media_unit_quality,
            &self.media_unit_annotations,
        ]
    }
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
