//! Single source of truth for the selection, the semester and the page.

use serde::Serialize;
use shared::{
    domain::{AlgorithmId, AlgorithmSelection, ParameterMap, Semester},
    error::EvaluationError,
};

use crate::dataset::{DatasetKind, Page};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterSnapshot {
    pub selection: AlgorithmSelection,
    pub semester: Semester,
    pub page: Page,
}

/// Returned by a successful mutation that invalidates datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterChange {
    Algorithm,
    Semester,
}

impl ParameterChange {
    pub fn affected(&self) -> Vec<DatasetKind> {
        match self {
            ParameterChange::Algorithm => DatasetKind::ALL
                .into_iter()
                .filter(DatasetKind::depends_on_algorithm)
                .collect(),
            ParameterChange::Semester => DatasetKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParameterStore {
    current: ParameterSnapshot,
}

impl ParameterStore {
    pub fn new(initial: ParameterSnapshot) -> Self {
        Self { current: initial }
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        self.current.clone()
    }

    /// Replaces the whole parameter map. On error nothing changes.
    pub fn set_algorithm(
        &mut self,
        algorithm: AlgorithmId,
        parameters: ParameterMap,
    ) -> Result<ParameterChange, EvaluationError> {
        let selection = AlgorithmSelection::new(algorithm, parameters)?;
        self.current.selection = selection;
        Ok(ParameterChange::Algorithm)
    }

    pub fn set_semester(&mut self, semester: Semester) -> ParameterChange {
        self.current.semester = semester;
        ParameterChange::Semester
    }

    pub fn set_page(&mut self, page: Page) {
        self.current.page = page;
    }
}
