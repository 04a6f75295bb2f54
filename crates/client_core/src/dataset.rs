use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One backend query each. A parameter change refetches the kinds it affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    AlgorithmResults,
    MetricsComparison,
    FinalDefectComparison,
    CrowdtruthEvaluation,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::AlgorithmResults,
        DatasetKind::MetricsComparison,
        DatasetKind::FinalDefectComparison,
        DatasetKind::CrowdtruthEvaluation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::AlgorithmResults => "algorithm_results",
            DatasetKind::MetricsComparison => "metrics_comparison",
            DatasetKind::FinalDefectComparison => "final_defect_comparison",
            DatasetKind::CrowdtruthEvaluation => "crowdtruth_evaluation",
        }
    }

    /// Only the primary dataset depends on the algorithm selection.
    pub fn depends_on_algorithm(&self) -> bool {
        matches!(self, DatasetKind::AlgorithmResults)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which view a presentation surface is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    AlgorithmResults,
    WorkerCorrelation,
    BoxPlot,
    MetricsComparison,
    FinalDefectComparison,
    CrowdtruthEvaluation,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::AlgorithmResults,
        Page::WorkerCorrelation,
        Page::BoxPlot,
        Page::MetricsComparison,
        Page::FinalDefectComparison,
        Page::CrowdtruthEvaluation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::AlgorithmResults => "algorithm_results",
            Page::WorkerCorrelation => "worker_correlation",
            Page::BoxPlot => "box_plot",
            Page::MetricsComparison => "metrics_comparison",
            Page::FinalDefectComparison => "final_defect_comparison",
            Page::CrowdtruthEvaluation => "crowdtruth_evaluation",
        }
    }

    pub fn dataset(&self) -> DatasetKind {
        match self {
            Page::AlgorithmResults | Page::WorkerCorrelation | Page::BoxPlot => {
                DatasetKind::AlgorithmResults
            }
            Page::MetricsComparison => DatasetKind::MetricsComparison,
            Page::FinalDefectComparison => DatasetKind::FinalDefectComparison,
            Page::CrowdtruthEvaluation => DatasetKind::CrowdtruthEvaluation,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Page::ALL
            .into_iter()
            .find(|page| page.as_str() == normalized)
            .ok_or_else(|| format!("unknown page '{value}'"))
    }
}
