//! Text summaries and CSV export of the published views.

use std::{fs, path::Path, path::PathBuf};

use anyhow::Context;
use client_core::{DashboardChannels, DatasetKind, DatasetStatus, Page, Snapshot};
use views::TableView;

fn status_label<T>(snapshot: &Snapshot<T>) -> &'static str {
    match snapshot.status {
        DatasetStatus::Idle => "idle",
        DatasetStatus::Fetching => "fetching",
        DatasetStatus::Published => "published",
        DatasetStatus::Failed if snapshot.is_stale() => "failed (showing stale data)",
        DatasetStatus::Failed => "failed",
    }
}

fn line<T>(name: &str, snapshot: &Snapshot<T>, rows: impl Fn(&T) -> usize) -> String {
    let mut text = format!("{name}: {}", status_label(snapshot));
    if let Some(value) = &snapshot.value {
        text.push_str(&format!(", {} rows", rows(&**value)));
    }
    if let Some(error) = &snapshot.error {
        text.push_str(&format!(" [{:?}: {}]", error.kind, error.message));
    }
    text
}

/// One line per dataset kind.
pub fn summary_lines(channels: &DashboardChannels) -> Vec<String> {
    DatasetKind::ALL
        .into_iter()
        .map(|dataset| match dataset {
            DatasetKind::AlgorithmResults => {
                let snapshot = channels.algorithm_results.latest();
                let mut text = line(dataset.as_str(), &snapshot, |view| view.table.data.len());
                if let Some(view) = &snapshot.value {
                    let matrix = &view.confusion_matrix;
                    text.push_str(&format!(
                        " precision={} recall={} fmeasure={} accuracy={}",
                        matrix.precision, matrix.recall, matrix.fmeasure, matrix.accuracy
                    ));
                }
                text
            }
            DatasetKind::MetricsComparison => line(
                dataset.as_str(),
                &channels.metrics_comparison.latest(),
                |view| view.table.data.len(),
            ),
            DatasetKind::FinalDefectComparison => line(
                dataset.as_str(),
                &channels.final_defect_comparison.latest(),
                |view| view.table.data.len(),
            ),
            DatasetKind::CrowdtruthEvaluation => line(
                dataset.as_str(),
                &channels.crowdtruth_evaluation.latest(),
                |view| {
                    let correlations: usize = view.tables().iter().map(|t| t.table.data.len()).sum();
                    let scores: usize = view
                        .metrics_scores
                        .tables()
                        .iter()
                        .map(|table| table.data.len())
                        .sum();
                    correlations + scores
                },
            ),
        })
        .collect()
}

/// Table shown on `page`, if its dataset has ever been published.
pub fn page_table(channels: &DashboardChannels, page: Page) -> Option<TableView> {
    match page {
        Page::AlgorithmResults => channels
            .algorithm_results
            .latest()
            .value
            .map(|view| view.table.clone()),
        Page::WorkerCorrelation => channels
            .worker_correlation
            .latest()
            .value
            .map(|view| view.table.clone()),
        Page::BoxPlot => channels
            .box_plot
            .latest()
            .value
            .map(|view| view.table.clone()),
        Page::MetricsComparison => channels
            .metrics_comparison
            .latest()
            .value
            .map(|view| view.table.clone()),
        Page::FinalDefectComparison => channels
            .final_defect_comparison
            .latest()
            .value
            .map(|view| view.table.clone()),
        Page::CrowdtruthEvaluation => channels
            .crowdtruth_evaluation
            .latest()
            .value
            .map(|view| view.workers.table.clone()),
    }
}

/// Every published table keyed by its export file stem.
pub fn collect_tables(channels: &DashboardChannels) -> Vec<(&'static str, TableView)> {
    let mut tables = Vec::new();
    for page in [
        Page::AlgorithmResults,
        Page::WorkerCorrelation,
        Page::BoxPlot,
        Page::MetricsComparison,
        Page::FinalDefectComparison,
    ] {
        if let Some(table) = page_table(channels, page) {
            tables.push((page.as_str(), table));
        }
    }
    if let Some(view) = channels.crowdtruth_evaluation.latest().value {
        tables.push(("crowdtruth_workers", view.workers.table.clone()));
        tables.push(("crowdtruth_annotations", view.annotations.table.clone()));
        tables.push(("crowdtruth_media_units", view.media_units.table.clone()));
        let scores = &view.metrics_scores;
        tables.push(("crowdtruth_worker_quality", scores.worker_quality.clone()));
        tables.push(("crowdtruth_annotation_quality", scores.annotation_quality.clone()));
        tables.push(("crowdtruth_media_unit_quality", scores.media_unit_quality.clone()));
        tables.push((
            "crowdtruth_media_unit_annotations",
            scores.media_unit_annotations.clone(),
        ));
    }
    tables
}

pub fn export_tables(
    tables: &[(&'static str, TableView)],
    export_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(tables.len());
    for (stem, table) in tables {
        let path = export_dir.join(format!("{stem}.csv"));
        fs::write(&path, table.to_delimited())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
