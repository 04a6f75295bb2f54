//! Wire shapes returned by the scoring backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AlgorithmId, Semester};

const RATIO_DECIMALS: i32 = 8;
const FMEASURE_DECIMALS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefectType {
    Missing,
    SuperfluousSyn,
    WrongRelm,
    Wrong,
    NoDefect,
    SuperfluousEme,
    WrongKey,
}

impl DefectType {
    pub fn as_str(&self) -> &'static str {
        self.to_final_defect_type().as_str()
    }

    pub fn to_final_defect_type(&self) -> FinalDefectType {
        match self {
            DefectType::Missing => FinalDefectType::Missing,
            DefectType::SuperfluousSyn => FinalDefectType::SuperfluousSyn,
            DefectType::WrongRelm => FinalDefectType::WrongRelm,
            DefectType::Wrong => FinalDefectType::Wrong,
            DefectType::NoDefect => FinalDefectType::NoDefect,
            DefectType::SuperfluousEme => FinalDefectType::SuperfluousEme,
            DefectType::WrongKey => FinalDefectType::WrongKey,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalDefectType {
    Missing,
    SuperfluousSyn,
    WrongRelm,
    Wrong,
    NoDefect,
    SuperfluousEme,
    WrongKey,
    Undecidable,
}

impl FinalDefectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalDefectType::Missing => "MISSING",
            FinalDefectType::SuperfluousSyn => "SUPERFLUOUS_SYN",
            FinalDefectType::WrongRelm => "WRONG_RELM",
            FinalDefectType::Wrong => "WRONG",
            FinalDefectType::NoDefect => "NO_DEFECT",
            FinalDefectType::SuperfluousEme => "SUPERFLUOUS_EME",
            FinalDefectType::WrongKey => "WRONG_KEY",
            FinalDefectType::Undecidable => "UNDECIDABLE",
        }
    }

    fn is_negative(&self) -> bool {
        matches!(self, FinalDefectType::NoDefect | FinalDefectType::Undecidable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    TruePositive,
    TrueNegative,
    FalsePositive,
    FalseNegative,
}

impl Outcome {
    /// Undecidable verdicts count as "no defect reported".
    pub fn classify(truth: DefectType, verdict: FinalDefectType) -> Self {
        match (truth, verdict.is_negative()) {
            (DefectType::NoDefect, true) => Outcome::TrueNegative,
            (_, true) => Outcome::FalseNegative,
            (truth, false) if truth.to_final_defect_type() == verdict => Outcome::TruePositive,
            (_, false) => Outcome::FalsePositive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMatrix {
    pub true_positives: u64,
    pub true_negatives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
    pub accuracy: f64,
}

impl ConfusionMatrix {
    /// Same rounding as the scoring backend: ratios to 8 places, F-measure to 4,
    /// zero denominators give 0.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let mut matrix = Self::default();
        for outcome in outcomes {
            match outcome {
                Outcome::TruePositive => matrix.true_positives += 1,
                Outcome::TrueNegative => matrix.true_negatives += 1,
                Outcome::FalsePositive => matrix.false_positives += 1,
                Outcome::FalseNegative => matrix.false_negatives += 1,
            }
        }

        let tp = matrix.true_positives;
        let all = tp + matrix.true_negatives + matrix.false_positives + matrix.false_negatives;
        matrix.recall = ratio(tp, tp + matrix.false_negatives);
        matrix.precision = ratio(tp, tp + matrix.false_positives);
        matrix.accuracy = ratio(tp + matrix.true_negatives, all);
        let sum = matrix.precision + matrix.recall;
        matrix.fmeasure = if sum == 0.0 {
            0.0
        } else {
            round_half_up(2.0 * matrix.precision * matrix.recall / sum, FMEASURE_DECIMALS)
        };
        matrix
    }

    pub fn same_counts(&self, other: &ConfusionMatrix) -> bool {
        self.true_positives == other.true_positives
            && self.true_negatives == other.true_negatives
            && self.false_positives == other.false_positives
            && self.false_negatives == other.false_negatives
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round_half_up(numerator as f64 / denominator as f64, RATIO_DECIMALS)
}

fn round_half_up(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Pearson correlation of entity quality against each metric. The backend
/// emits `NaN` (serialized as null) when a series has no variance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PearsonScores {
    #[serde(rename = "qualityFMeasureCorrelation", default)]
    pub fmeasure: Option<f64>,
    #[serde(rename = "qualityPrecisionCorrelation", default)]
    pub precision: Option<f64>,
    #[serde(rename = "qualityAccuracyCorrelation", default)]
    pub accuracy: Option<f64>,
    #[serde(rename = "qualityRecallCorrelation", default)]
    pub recall: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactWithConfusionMatrix {
    #[serde(deserialize_with = "wire::string_or_number")]
    pub id: String,
    pub quality: f64,
    pub confusion_matrix: ConfusionMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalDefectResult {
    #[serde(deserialize_with = "wire::string_or_number")]
    pub eme_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_coefficient: Option<String>,
    pub final_defect_type: FinalDefectType,
    pub true_defect_type: DefectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eme_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_defect_id: Option<String>,
    #[serde(default)]
    pub true_positive: bool,
    #[serde(default)]
    pub false_positive: bool,
    #[serde(default)]
    pub true_negative: bool,
    #[serde(default)]
    pub false_negative: bool,
}

impl FinalDefectResult {
    pub fn outcome(&self) -> Outcome {
        Outcome::classify(self.true_defect_type, self.final_defect_type)
    }

    /// Outcome the backend flagged, if exactly one flag is set.
    pub fn reported_outcome(&self) -> Option<Outcome> {
        let flags = [
            (self.true_positive, Outcome::TruePositive),
            (self.true_negative, Outcome::TrueNegative),
            (self.false_positive, Outcome::FalsePositive),
            (self.false_negative, Outcome::FalseNegative),
        ];
        let mut set = flags.into_iter().filter(|(flag, _)| *flag);
        match (set.next(), set.next()) {
            (Some((_, outcome)), None) => Some(outcome),
            _ => None,
        }
    }
}

/// Final defects of one algorithm run (`/algorithms/finalDefects/{algorithm}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebFinalDefects {
    pub confusion_matrix: ConfusionMatrix,
    pub final_defect_results: Vec<FinalDefectResult>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    pub algorithm_type: AlgorithmId,
    #[serde(default)]
    pub worker_confusion_matrix: Vec<ArtifactWithConfusionMatrix>,
    #[serde(default)]
    pub worker_pearson_scores: PearsonScores,
    #[serde(default)]
    pub nr_evaluated_emes: u64,
    #[serde(default)]
    pub nr_workers: u64,
    #[serde(default)]
    pub nr_judgements: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<Semester>,
}

/// One evaluated unit across every algorithm the backend ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalDefectComparison {
    #[serde(deserialize_with = "wire::string_or_number")]
    pub eme_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    pub true_defect_type: String,
    /// Algorithm name to verdict, in the order the backend emitted them.
    #[serde(with = "wire::ordered_pairs")]
    pub final_defect_types: Vec<(String, String)>,
}

/// CrowdTruth quality scores per entity kind (`/algorithms/workers`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdtruthScores {
    pub worker_scores: Vec<ArtifactWithConfusionMatrix>,
    #[serde(default)]
    pub worker_pearson_scores: PearsonScores,
    pub annotation_scores: Vec<ArtifactWithConfusionMatrix>,
    #[serde(default)]
    pub annotation_pearson_scores: PearsonScores,
    pub media_unit_scores: Vec<ArtifactWithConfusionMatrix>,
    #[serde(default)]
    pub media_unit_pearson_scores: PearsonScores,
    #[serde(default)]
    pub metrics_scores: MetricsScores,
}

/// Raw CrowdTruth scores keyed by entity id. Media unit annotation keys are
/// `"{mediaUnitId}/{annotationName}"`. A score the backend could not compute
/// arrives as null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsScores {
    #[serde(default)]
    pub annotation_quality_scores: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub worker_quality_scores: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub media_unit_quality_scores: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub media_unit_annotation_scores: BTreeMap<String, Option<f64>>,
}

pub type MetricsComparison = BTreeMap<String, ConfusionMatrix>;

mod wire {
    use std::fmt;

    use serde::{
        de::{self, MapAccess, Visitor},
        ser::SerializeMap,
        Deserialize, Deserializer, Serializer,
    };

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Integer(value) => value.to_string(),
            Raw::Float(value) => value.to_string(),
        })
    }

    pub mod ordered_pairs {
        use super::*;

        pub fn serialize<S>(pairs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(pairs.len()))?;
            for (key, value) in pairs {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(PairsVisitor)
        }

        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of algorithm name to verdict")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    if pairs.iter().any(|(existing, _)| existing == &key) {
                        return Err(de::Error::custom(format!("duplicate algorithm '{key}'")));
                    }
                    pairs.push((key, value));
                }
                Ok(pairs)
            }
        }
    }
}
