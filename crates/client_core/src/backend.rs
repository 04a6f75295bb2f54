//! Read-only queries against the scoring backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{AlgorithmSelection, Semester},
    error::EvaluationError,
    protocol::{CrowdtruthScores, FinalDefectComparison, MetricsComparison, WebFinalDefects},
};
use tracing::debug;
use url::Url;

const SEMESTER_PARAM: &str = "semester";

/// One query per dataset kind. Implementations never retry and never cache.
#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    async fn entity_scores(
        &self,
        selection: &AlgorithmSelection,
        semester: Semester,
    ) -> Result<WebFinalDefects, EvaluationError>;

    async fn metrics_comparison(
        &self,
        semester: Semester,
    ) -> Result<MetricsComparison, EvaluationError>;

    async fn final_defect_comparison(
        &self,
        semester: Semester,
    ) -> Result<Vec<FinalDefectComparison>, EvaluationError>;

    async fn worker_evaluation(
        &self,
        semester: Semester,
    ) -> Result<CrowdtruthScores, EvaluationError>;
}

pub struct MissingEvaluationBackend;

fn unavailable<T>() -> Result<T, EvaluationError> {
    Err(EvaluationError::BackendUnavailable(
        "no evaluation backend configured".into(),
    ))
}

#[async_trait]
impl EvaluationBackend for MissingEvaluationBackend {
    async fn entity_scores(
        &self,
        _selection: &AlgorithmSelection,
        _semester: Semester,
    ) -> Result<WebFinalDefects, EvaluationError> {
        unavailable()
    }

    async fn metrics_comparison(
        &self,
        _semester: Semester,
    ) -> Result<MetricsComparison, EvaluationError> {
        unavailable()
    }

    async fn final_defect_comparison(
        &self,
        _semester: Semester,
    ) -> Result<Vec<FinalDefectComparison>, EvaluationError> {
        unavailable()
    }

    async fn worker_evaluation(
        &self,
        _semester: Semester,
    ) -> Result<CrowdtruthScores, EvaluationError> {
        unavailable()
    }
}

pub struct HttpEvaluationClient {
    http: Client,
    base_url: Url,
}

impl HttpEvaluationClient {
    pub fn new(base_url: &str) -> Result<Self, EvaluationError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, EvaluationError> {
        let http = Client::builder().timeout(timeout).build().map_err(|err| {
            EvaluationError::BackendUnavailable(format!("failed to build http client: {err}"))
        })?;
        Self::with_client(base_url, http)
    }

    fn with_client(base_url: &str, http: Client) -> Result<Self, EvaluationError> {
        let parsed = Url::parse(base_url).map_err(|err| {
            EvaluationError::BackendUnavailable(format!("invalid backend url '{base_url}': {err}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(EvaluationError::BackendUnavailable(format!(
                "backend url '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Every declared parameter in schema order, then the semester.
    pub fn entity_scores_url(&self, selection: &AlgorithmSelection, semester: Semester) -> Url {
        self.endpoint(
            &["finalDefects", selection.algorithm().as_str()],
            semester,
            &selection.query_pairs(),
        )
    }

    pub fn metrics_comparison_url(&self, semester: Semester) -> Url {
        self.endpoint(&["all", "metrics"], semester, &[])
    }

    pub fn final_defect_comparison_url(&self, semester: Semester) -> Url {
        self.endpoint(&["all", "finalDefects"], semester, &[])
    }

    pub fn worker_evaluation_url(&self, semester: Semester) -> Url {
        self.endpoint(&["workers"], semester, &[])
    }

    fn endpoint(&self, segments: &[&str], semester: Semester, params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("algorithms").extend(segments);
        }
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
            query.append_pair(SEMESTER_PARAM, semester.as_str());
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, EvaluationError> {
        debug!(%url, "querying evaluation backend");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| EvaluationError::BackendUnavailable(format!("GET {url}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvaluationError::BackendUnavailable(format!(
                "GET {url} returned {status}"
            )));
        }

        let body = response.bytes().await.map_err(|err| {
            EvaluationError::BackendUnavailable(format!("reading body of {url}: {err}"))
        })?;
        serde_json::from_slice(&body).map_err(|err| EvaluationError::MalformedResponse {
            endpoint: url.path().to_string(),
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl EvaluationBackend for HttpEvaluationClient {
    async fn entity_scores(
        &self,
        selection: &AlgorithmSelection,
        semester: Semester,
    ) -> Result<WebFinalDefects, EvaluationError> {
        self.get_json(self.entity_scores_url(selection, semester))
            .await
    }

    async fn metrics_comparison(
        &self,
        semester: Semester,
    ) -> Result<MetricsComparison, EvaluationError> {
        self.get_json(self.metrics_comparison_url(semester)).await
    }

    async fn final_defect_comparison(
        &self,
        semester: Semester,
    ) -> Result<Vec<FinalDefectComparison>, EvaluationError> {
        self.get_json(self.final_defect_comparison_url(semester))
            .await
    }

    async fn worker_evaluation(
        &self,
        semester: Semester,
    ) -> Result<CrowdtruthScores, EvaluationError> {
        self.get_json(self.worker_evaluation_url(semester)).await
    }
}
