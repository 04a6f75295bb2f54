//! Static field/header lists, shared by every projection that shows a view kind.

use serde::Serialize;

use crate::{Row, TableView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    AlgorithmResults,
    Correlation,
    BoxPlot,
    MetricsComparison,
    FinalDefectComparison,
    WorkerQualityScores,
    AnnotationQualityScores,
    MediaUnitQualityScores,
    MediaUnitAnnotationScores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub header: &'static str,
}

const fn column(field: &'static str, header: &'static str) -> Column {
    Column { field, header }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ViewSchema {
    pub title: &'static str,
    pub columns: &'static [Column],
}

impl ViewSchema {
    pub fn field_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.field.to_string()).collect()
    }

    pub fn header_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.to_string()).collect()
    }

    pub(crate) fn column_pairs(&self) -> Vec<(String, String)> {
        self.columns
            .iter()
            .map(|c| (c.field.to_string(), c.header.to_string()))
            .collect()
    }

    pub(crate) fn table(&self, title: impl Into<String>, data: Vec<Row>) -> TableView {
        TableView::new(title, self.column_pairs(), data)
    }
}

static ALGORITHM_RESULTS: ViewSchema = ViewSchema {
    title: "Final Defects",
    columns: &[
        column("emeId", "EME"),
        column("scenarioId", "Scenario"),
        column("emeText", "EME Text"),
        column("trueDefectId", "True Defect"),
        column("trueDefectType", "True Defect Type"),
        column("finalDefectType", "Final Defect Type"),
        column("agreementCoefficient", "Agreement Coefficient"),
        column("outcome", "Outcome"),
        column("truePositive", "TP"),
        column("trueNegative", "TN"),
        column("falsePositive", "FP"),
        column("falseNegative", "FN"),
    ],
};

static CORRELATION: ViewSchema = ViewSchema {
    title: "Quality Correlation",
    columns: &[
        column("id", "Id"),
        column("quality", "Quality"),
        column("precision", "Precision"),
        column("recall", "Recall"),
        column("fmeasure", "F-Measure"),
        column("accuracy", "Accuracy"),
        column("truePositives", "TP"),
        column("trueNegatives", "TN"),
        column("falsePositives", "FP"),
        column("falseNegatives", "FN"),
    ],
};

static BOX_PLOT: ViewSchema = ViewSchema {
    title: "Quality Distribution",
    columns: &[column("type", "Type"), column("value", "Value")],
};

static METRICS_COMPARISON: ViewSchema = ViewSchema {
    title: "Algorithm Comparison",
    columns: &[
        column("algorithm", "Algorithm"),
        column("precision", "Precision"),
        column("recall", "Recall"),
        column("fmeasure", "F-Measure"),
        column("accuracy", "Accuracy"),
        column("truePositives", "TP"),
        column("trueNegatives", "TN"),
        column("falsePositives", "FP"),
        column("falseNegatives", "FN"),
    ],
};

// Algorithm columns are appended at projection time.
static FINAL_DEFECT_COMPARISON: ViewSchema = ViewSchema {
    title: "Final Defect Comparison",
    columns: &[
        column("emeId", "EME"),
        column("scenarioId", "Scenario"),
        column("trueDefectType", "True Defect Type"),
    ],
};

static WORKER_QUALITY_SCORES: ViewSchema = ViewSchema {
    title: "Worker Quality Score (WQS)",
    columns: &[
        column("workerId", "Worker"),
        column("qualityScore", "Quality Score"),
    ],
};

static ANNOTATION_QUALITY_SCORES: ViewSchema = ViewSchema {
    title: "Annotation Quality Score (AQS)",
    columns: &[
        column("annotationName", "Annotation"),
        column("qualityScore", "Quality Score"),
    ],
};

static MEDIA_UNIT_QUALITY_SCORES: ViewSchema = ViewSchema {
    title: "Media Unit Quality Score (UQS)",
    columns: &[
        column("mediaUnitId", "Media Unit"),
        column("qualityScore", "Quality Score"),
    ],
};

static MEDIA_UNIT_ANNOTATION_SCORES: ViewSchema = ViewSchema {
    title: "Media Unit Annotation Scores (UAS)",
    columns: &[
        column("annotationName", "Annotation"),
        column("mediaUnitId", "Media Unit"),
        column("agreementCoefficient", "Agreement Coefficient"),
    ],
};

pub fn schema(kind: ViewKind) -> &'static ViewSchema {
    match kind {
        ViewKind::AlgorithmResults => &ALGORITHM_RESULTS,
        ViewKind::Correlation => &CORRELATION,
        ViewKind::BoxPlot => &BOX_PLOT,
        ViewKind::MetricsComparison => &METRICS_COMPARISON,
        ViewKind::FinalDefectComparison => &FINAL_DEFECT_COMPARISON,
        ViewKind::WorkerQualityScores => &WORKER_QUALITY_SCORES,
        ViewKind::AnnotationQualityScores => &ANNOTATION_QUALITY_SCORES,
        ViewKind::MediaUnitQualityScores => &MEDIA_UNIT_QUALITY_SCORES,
        ViewKind::MediaUnitAnnotationScores => &MEDIA_UNIT_ANNOTATION_SCORES,
    }
}
