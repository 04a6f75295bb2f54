use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use futures::future::join_all;
use shared::{
    domain::{AlgorithmId, AlgorithmSelection, ParameterMap, Semester},
    error::{DatasetError, EvaluationError},
    protocol::{ConfusionMatrix, FinalDefectResult, WebFinalDefects},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};
use views::{
    project_algorithm_results, project_box_plot, project_comparison, project_correlation,
    project_crowdtruth_evaluation, project_final_defect_comparison, AlgorithmResultView,
    BoxPlotView, ComparisonView, CorrelationView, CrowdtruthEvaluationView, EntityKind,
    FinalDefectComparisonView,
};

use crate::{
    backend::EvaluationBackend,
    channel::{DatasetStatus, ReplayChannel},
    dataset::{DatasetKind, Page},
    params::{ParameterSnapshot, ParameterStore},
};

/// Every channel a presentation surface can subscribe to.
#[derive(Default)]
pub struct DashboardChannels {
    pub algorithm_results: ReplayChannel<AlgorithmResultView>,
    pub worker_correlation: ReplayChannel<CorrelationView>,
    pub box_plot: ReplayChannel<BoxPlotView>,
    pub metrics_comparison: ReplayChannel<ComparisonView>,
    pub final_defect_comparison: ReplayChannel<FinalDefectComparisonView>,
    pub crowdtruth_evaluation: ReplayChannel<CrowdtruthEvaluationView>,
    pub page: ReplayChannel<Page>,
}

impl DashboardChannels {
    pub fn status(&self, dataset: DatasetKind) -> DatasetStatus {
        match dataset {
            DatasetKind::AlgorithmResults => self.algorithm_results.latest().status,
            DatasetKind::MetricsComparison => self.metrics_comparison.latest().status,
            DatasetKind::FinalDefectComparison => self.final_defect_comparison.latest().status,
            DatasetKind::CrowdtruthEvaluation => self.crowdtruth_evaluation.latest().status,
        }
    }

    pub fn error(&self, dataset: DatasetKind) -> Option<DatasetError> {
        match dataset {
            DatasetKind::AlgorithmResults => self.algorithm_results.latest().error,
            DatasetKind::MetricsComparison => self.metrics_comparison.latest().error,
            DatasetKind::FinalDefectComparison => self.final_defect_comparison.latest().error,
            DatasetKind::CrowdtruthEvaluation => self.crowdtruth_evaluation.latest().error,
        }
    }

    fn begin(&self, dataset: DatasetKind, generation: u64) {
        match dataset {
            DatasetKind::AlgorithmResults => {
                self.algorithm_results.begin(generation);
                self.worker_correlation.begin(generation);
                self.box_plot.begin(generation);
            }
            DatasetKind::MetricsComparison => self.metrics_comparison.begin(generation),
            DatasetKind::FinalDefectComparison => self.final_defect_comparison.begin(generation),
            DatasetKind::CrowdtruthEvaluation => self.crowdtruth_evaluation.begin(generation),
        }
    }

    /// The primary view decides. Derived views follow whenever it was applied,
    /// even if a newer generation was issued since.
    fn publish_algorithm_results(
        &self,
        generation: u64,
        results: AlgorithmResultView,
        workers: CorrelationView,
        box_plot: BoxPlotView,
    ) -> bool {
        if !self.algorithm_results.publish(generation, Arc::new(results)) {
            return false;
        }
        self.worker_correlation
            .publish_derived(generation, Arc::new(workers));
        self.box_plot.publish_derived(generation, Arc::new(box_plot));
        true
    }

    fn fail(&self, dataset: DatasetKind, generation: u64, error: DatasetError) -> bool {
        match dataset {
            DatasetKind::AlgorithmResults => {
                let applied = self.algorithm_results.fail(generation, error.clone());
                self.worker_correlation.fail(generation, error.clone());
                self.box_plot.fail(generation, error);
                applied
            }
            DatasetKind::MetricsComparison => self.metrics_comparison.fail(generation, error),
            DatasetKind::FinalDefectComparison => {
                self.final_defect_comparison.fail(generation, error)
            }
            DatasetKind::CrowdtruthEvaluation => self.crowdtruth_evaluation.fail(generation, error),
        }
    }
}

#[derive(Default)]
struct Generations {
    algorithm_results: AtomicU64,
    metrics_comparison: AtomicU64,
    final_defect_comparison: AtomicU64,
    crowdtruth_evaluation: AtomicU64,
}

impl Generations {
    fn next(&self, dataset: DatasetKind) -> u64 {
        let counter = match dataset {
            DatasetKind::AlgorithmResults => &self.algorithm_results,
            DatasetKind::MetricsComparison => &self.metrics_comparison,
            DatasetKind::FinalDefectComparison => &self.final_defect_comparison,
            DatasetKind::CrowdtruthEvaluation => &self.crowdtruth_evaluation,
        };
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Published,
    Failed,
    /// A newer generation was issued before this response landed.
    Superseded,
}

/// Fetches started by one parameter change. Dropping it does not cancel them.
pub struct RefreshHandle {
    tasks: Vec<(DatasetKind, JoinHandle<FetchOutcome>)>,
}

impl RefreshHandle {
    pub fn datasets(&self) -> Vec<DatasetKind> {
        self.tasks.iter().map(|(dataset, _)| *dataset).collect()
    }

    pub async fn settled(self) -> Vec<(DatasetKind, FetchOutcome)> {
        let (datasets, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let results = join_all(handles).await;
        datasets
            .into_iter()
            .zip(results)
            .map(|(dataset, result)| {
                let outcome = result.unwrap_or_else(|err| {
                    error!(%dataset, %err, "dataset: fetch task aborted");
                    FetchOutcome::Failed
                });
                (dataset, outcome)
            })
            .collect()
    }
}

pub struct Orchestrator {
    backend: Arc<dyn EvaluationBackend>,
    store: Mutex<ParameterStore>,
    channels: Arc<DashboardChannels>,
    generations: Generations,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn EvaluationBackend>, initial: ParameterSnapshot) -> Arc<Self> {
        let channels = Arc::new(DashboardChannels::default());
        channels.page.replace(initial.page);
        Arc::new(Self {
            backend,
            store: Mutex::new(ParameterStore::new(initial)),
            channels,
            generations: Generations::default(),
        })
    }

    pub fn channels(&self) -> &Arc<DashboardChannels> {
        &self.channels
    }

    pub async fn snapshot(&self) -> ParameterSnapshot {
        self.store.lock().await.snapshot()
    }

    /// Rejected selections leave the store and every channel untouched.
    pub async fn set_algorithm(
        self: &Arc<Self>,
        algorithm: AlgorithmId,
        parameters: ParameterMap,
    ) -> Result<RefreshHandle, EvaluationError> {
        let mut store = self.store.lock().await;
        let change = store.set_algorithm(algorithm, parameters).map_err(|err| {
            warn!(%algorithm, error = %err, "params: selection rejected");
            err
        })?;
        let snapshot = store.snapshot();
        Ok(self.dispatch(change.affected(), &snapshot))
    }

    pub async fn set_semester(self: &Arc<Self>, semester: Semester) -> RefreshHandle {
        let mut store = self.store.lock().await;
        let change = store.set_semester(semester);
        let snapshot = store.snapshot();
        self.dispatch(change.affected(), &snapshot)
    }

    /// Only switches which channel surfaces read. Nothing is fetched.
    pub async fn set_page(&self, page: Page) {
        let mut store = self.store.lock().await;
        store.set_page(page);
        self.channels.page.replace(page);
        debug!(%page, "params: page selected");
    }

    pub async fn refresh_all(self: &Arc<Self>) -> RefreshHandle {
        let store = self.store.lock().await;
        let snapshot = store.snapshot();
        self.dispatch(DatasetKind::ALL.to_vec(), &snapshot)
    }

    /// Runs with the store locked so generations are issued in mutation order.
    fn dispatch(
        self: &Arc<Self>,
        datasets: Vec<DatasetKind>,
        snapshot: &ParameterSnapshot,
    ) -> RefreshHandle {
        let tasks = datasets
            .into_iter()
            .map(|dataset| {
                let generation = self.generations.next(dataset);
                self.channels.begin(dataset, generation);
                info!(
                    %dataset,
                    generation,
                    semester = %snapshot.semester,
                    algorithm = %snapshot.selection.algorithm(),
                    "dataset: refreshing"
                );

                let this = Arc::clone(self);
                let selection = snapshot.selection.clone();
                let semester = snapshot.semester;
                let task = tokio::spawn(async move {
                    this.fetch(dataset, generation, selection, semester).await
                });
                (dataset, task)
            })
            .collect();
        RefreshHandle { tasks }
    }

    async fn fetch(
        &self,
        dataset: DatasetKind,
        generation: u64,
        selection: AlgorithmSelection,
        semester: Semester,
    ) -> FetchOutcome {
        let result = match dataset {
            DatasetKind::AlgorithmResults => {
                self.fetch_algorithm_results(generation, &selection, semester)
                    .await
            }
            DatasetKind::MetricsComparison => {
                self.backend
                    .metrics_comparison(semester)
                    .await
                    .map(|metrics| {
                        self.channels
                            .metrics_comparison
                            .publish(generation, Arc::new(project_comparison(semester, &metrics)))
                    })
            }
            DatasetKind::FinalDefectComparison => self
                .backend
                .final_defect_comparison(semester)
                .await
                .map(|records| {
                    self.channels.final_defect_comparison.publish(
                        generation,
                        Arc::new(project_final_defect_comparison(semester, &records)),
                    )
                }),
            DatasetKind::CrowdtruthEvaluation => {
                self.backend
                    .worker_evaluation(semester)
                    .await
                    .map(|scores| {
                        self.channels.crowdtruth_evaluation.publish(
                            generation,
                            Arc::new(project_crowdtruth_evaluation(semester, &scores)),
                        )
                    })
            }
        };

        match result {
            Ok(true) => {
                info!(%dataset, generation, %semester, "dataset: published");
                FetchOutcome::Published
            }
            Ok(false) => {
                debug!(%dataset, generation, "dataset: discarding superseded response");
                FetchOutcome::Superseded
            }
            Err(err) => {
                if self.channels.fail(dataset, generation, DatasetError::from(&err)) {
                    warn!(%dataset, generation, %semester, error = %err, "dataset: refresh failed");
                    FetchOutcome::Failed
                } else {
                    debug!(%dataset, generation, error = %err, "dataset: discarding superseded failure");
                    FetchOutcome::Superseded
                }
            }
        }
    }

    /// The primary response also feeds the worker correlation and box-plot
    /// channels under the same generation.
    async fn fetch_algorithm_results(
        &self,
        generation: u64,
        selection: &AlgorithmSelection,
        semester: Semester,
    ) -> Result<bool, EvaluationError> {
        let algorithm = selection.algorithm();
        if !algorithm.available_in(semester) {
            return Err(EvaluationError::InvalidParameterSet {
                algorithm,
                reason: format!("no evaluation data for semester {semester}"),
            });
        }

        let response = self.backend.entity_scores(selection, semester).await?;
        check_primary_response(&response, algorithm, semester)?;

        let results = project_algorithm_results(semester, &response);
        let workers = project_correlation(
            EntityKind::Worker,
            semester,
            &response.worker_confusion_matrix,
            &response.worker_pearson_scores,
        );
        let box_plot = project_box_plot(
            EntityKind::Worker,
            semester,
            &response.worker_confusion_matrix,
        );

        Ok(self
            .channels
            .publish_algorithm_results(generation, results, workers, box_plot))
    }
}

fn check_primary_response(
    response: &WebFinalDefects,
    algorithm: AlgorithmId,
    semester: Semester,
) -> Result<(), EvaluationError> {
    let endpoint = format!("/algorithms/finalDefects/{algorithm}");
    if response.algorithm_type != algorithm {
        return Err(EvaluationError::MalformedResponse {
            endpoint,
            reason: format!(
                "expected results for {algorithm}, got {}",
                response.algorithm_type
            ),
        });
    }
    if let Some(answered) = response.semester {
        if answered != semester {
            return Err(EvaluationError::MalformedResponse {
                endpoint,
                reason: format!("requested semester {semester}, got {answered}"),
            });
        }
    }

    for result in &response.final_defect_results {
        if let Some(reported) = result.reported_outcome() {
            if reported != result.outcome() {
                return Err(EvaluationError::MalformedResponse {
                    endpoint,
                    reason: format!(
                        "eme {} flagged {reported:?}, verdict gives {:?}",
                        result.eme_id,
                        result.outcome()
                    ),
                });
            }
        }
    }

    let recomputed = ConfusionMatrix::from_outcomes(
        response
            .final_defect_results
            .iter()
            .map(FinalDefectResult::outcome),
    );
    if !recomputed.same_counts(&response.confusion_matrix) {
        return Err(EvaluationError::MalformedResponse {
            endpoint,
            reason: "confusion matrix does not match the final defect results".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
