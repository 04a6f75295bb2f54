use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Academic term partitioning every backend query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Semester {
    #[default]
    WS2017,
    SS2018,
}

impl Semester {
    pub const ALL: [Semester; 2] = [Semester::WS2017, Semester::SS2018];

    pub fn as_str(&self) -> &'static str {
        match self {
            Semester::WS2017 => "WS2017",
            Semester::SS2018 => "SS2018",
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Semester {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Semester::ALL
            .into_iter()
            .find(|semester| semester.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown semester '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmId {
    CrowdTruth,
    MajorityVoting,
    AdaptiveMajorityVoting,
    MajorityVotingWithQualificationReport,
    MajorityVotingWithExperienceQuestionnaire,
}

const NO_PARAMETERS: &[ParameterSpec] = &[];

const ADAPTIVE_PARAMETERS: &[ParameterSpec] = &[ParameterSpec::number("threshold", 0.1)];

const QUALIFICATION_REPORT_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("alpha", 0.1),
    ParameterSpec::influence("qualityInfluence", QualityInfluence::Exponential),
];

const EXPERIENCE_QUESTIONNAIRE_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("alpha", 0.1),
    ParameterSpec::influence("qualityInfluence", QualityInfluence::Exponential),
    ParameterSpec::number("weightLanguage", 1.0),
    ParameterSpec::number("weightSoftwareProject", 1.0),
    ParameterSpec::number("weightQualityAssurance", 1.0),
    ParameterSpec::number("weightWorkingEnvironment", 1.0),
    ParameterSpec::number("weightDomainExperience", 1.0),
    ParameterSpec::number("weightCrowdsourcingApplications", 1.0),
];

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 5] = [
        AlgorithmId::CrowdTruth,
        AlgorithmId::MajorityVoting,
        AlgorithmId::AdaptiveMajorityVoting,
        AlgorithmId::MajorityVotingWithQualificationReport,
        AlgorithmId::MajorityVotingWithExperienceQuestionnaire,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmId::CrowdTruth => "CrowdTruth",
            AlgorithmId::MajorityVoting => "MajorityVoting",
            AlgorithmId::AdaptiveMajorityVoting => "AdaptiveMajorityVoting",
            AlgorithmId::MajorityVotingWithQualificationReport => {
                "MajorityVotingWithQualificationReport"
            }
            AlgorithmId::MajorityVotingWithExperienceQuestionnaire => {
                "MajorityVotingWithExperienceQuestionnaire"
            }
        }
    }

    /// Parameters the backend requires for this algorithm, in query order.
    pub fn schema(&self) -> &'static [ParameterSpec] {
        match self {
            AlgorithmId::CrowdTruth | AlgorithmId::MajorityVoting => NO_PARAMETERS,
            AlgorithmId::AdaptiveMajorityVoting => ADAPTIVE_PARAMETERS,
            AlgorithmId::MajorityVotingWithQualificationReport => QUALIFICATION_REPORT_PARAMETERS,
            AlgorithmId::MajorityVotingWithExperienceQuestionnaire => {
                EXPERIENCE_QUESTIONNAIRE_PARAMETERS
            }
        }
    }

    /// Qualification reports were only collected from SS2018 on.
    pub fn available_in(&self, semester: Semester) -> bool {
        match self {
            AlgorithmId::MajorityVotingWithQualificationReport => semester == Semester::SS2018,
            _ => true,
        }
    }

    fn parameter(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.schema().iter().find(|spec| spec.name == name)
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlgorithmId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown algorithm '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityInfluence {
    Linear,
    Exponential,
}

impl QualityInfluence {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityInfluence::Linear => "LINEAR",
            QualityInfluence::Exponential => "EXPONENTIAL",
        }
    }
}

impl FromStr for QualityInfluence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LINEAR" => Ok(QualityInfluence::Linear),
            "EXPONENTIAL" => Ok(QualityInfluence::Exponential),
            _ => Err(format!("unknown quality influence '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Number,
    Influence,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Influence(QualityInfluence),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Number(_) => ParameterKind::Number,
            ParameterValue::Influence(_) => ParameterKind::Influence,
        }
    }

    pub fn parse(kind: ParameterKind, raw: &str) -> Option<Self> {
        match kind {
            ParameterKind::Number => raw.trim().parse::<f64>().ok().map(ParameterValue::Number),
            ParameterKind::Influence => raw.parse().ok().map(ParameterValue::Influence),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(value) => write!(f, "{value}"),
            ParameterValue::Influence(influence) => f.write_str(influence.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterKind,
    pub default: ParameterValue,
}

impl ParameterSpec {
    const fn number(name: &'static str, default: f64) -> Self {
        Self {
            name,
            kind: ParameterKind::Number,
            default: ParameterValue::Number(default),
        }
    }

    const fn influence(name: &'static str, default: QualityInfluence) -> Self {
        Self {
            name,
            kind: ParameterKind::Influence,
            default: ParameterValue::Influence(default),
        }
    }
}

pub type ParameterMap = BTreeMap<String, ParameterValue>;

/// An algorithm together with a parameter set that matches its schema exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmSelection {
    algorithm: AlgorithmId,
    parameters: ParameterMap,
}

impl AlgorithmSelection {
    pub fn new(algorithm: AlgorithmId, parameters: ParameterMap) -> Result<Self, EvaluationError> {
        validate_parameters(algorithm, &parameters)?;
        Ok(Self {
            algorithm,
            parameters,
        })
    }

    pub fn defaults(algorithm: AlgorithmId) -> Self {
        let parameters = algorithm
            .schema()
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect();
        Self {
            algorithm,
            parameters,
        }
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.get(name).copied()
    }

    /// Every declared parameter as a query pair, in schema order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.algorithm
            .schema()
            .iter()
            .filter_map(|spec| {
                self.parameters
                    .get(spec.name)
                    .map(|value| (spec.name, value.to_string()))
            })
            .collect()
    }
}

impl Default for AlgorithmSelection {
    fn default() -> Self {
        Self::defaults(AlgorithmId::CrowdTruth)
    }
}

fn invalid(algorithm: AlgorithmId, reason: impl Into<String>) -> EvaluationError {
    EvaluationError::InvalidParameterSet {
        algorithm,
        reason: reason.into(),
    }
}

pub fn validate_parameters(
    algorithm: AlgorithmId,
    parameters: &ParameterMap,
) -> Result<(), EvaluationError> {
    let schema = algorithm.schema();

    let missing: Vec<&str> = schema
        .iter()
        .filter(|spec| !parameters.contains_key(spec.name))
        .map(|spec| spec.name)
        .collect();
    if !missing.is_empty() {
        return Err(invalid(
            algorithm,
            format!("missing parameters: {}", missing.join(", ")),
        ));
    }

    let unexpected: Vec<&str> = parameters
        .keys()
        .filter(|name| algorithm.parameter(name).is_none())
        .map(String::as_str)
        .collect();
    if !unexpected.is_empty() {
        return Err(invalid(
            algorithm,
            format!("unexpected parameters: {}", unexpected.join(", ")),
        ));
    }

    for spec in schema {
        let value = parameters[spec.name];
        if value.kind() != spec.kind {
            return Err(invalid(
                algorithm,
                format!("parameter {} expects {:?}, got {value}", spec.name, spec.kind),
            ));
        }
        if let ParameterValue::Number(number) = value {
            if !number.is_finite() {
                return Err(invalid(
                    algorithm,
                    format!("parameter {} must be finite", spec.name),
                ));
            }
        }
    }

    Ok(())
}

/// Parses raw `name=value` pairs against the schema of `algorithm`.
pub fn parse_parameters<I, K, V>(algorithm: AlgorithmId, raw: I) -> Result<ParameterMap, EvaluationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut parameters = ParameterMap::new();
    for (name, value) in raw {
        let name = name.as_ref().trim();
        let Some(spec) = algorithm.parameter(name) else {
            return Err(invalid(algorithm, format!("unexpected parameters: {name}")));
        };
        let parsed = ParameterValue::parse(spec.kind, value.as_ref()).ok_or_else(|| {
            invalid(
                algorithm,
                format!("cannot parse '{}' for parameter {name}", value.as_ref()),
            )
        })?;
        parameters.insert(name.to_string(), parsed);
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn params(pairs: &[(&str, ParameterValue)]) -> ParameterMap {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn defaults_satisfy_every_schema() {
        for algorithm in AlgorithmId::ALL {
            let defaults = AlgorithmSelection::defaults(algorithm);
            AlgorithmSelection::new(algorithm, defaults.parameters().clone())
                .expect("defaults must validate");
            assert_eq!(defaults.parameters().len(), algorithm.schema().len());
        }
    }

    #[test]
    fn rejects_missing_and_unexpected_keys_for_every_algorithm() {
        for algorithm in AlgorithmId::ALL {
            let mut extra = AlgorithmSelection::defaults(algorithm).parameters().clone();
            extra.insert("bogus".into(), ParameterValue::Number(1.0));
            let err = AlgorithmSelection::new(algorithm, extra).expect_err("extra key");
            assert_eq!(err.kind(), ErrorKind::InvalidParameterSet);

            if let Some(first) = algorithm.schema().first() {
                let mut missing = AlgorithmSelection::defaults(algorithm).parameters().clone();
                missing.remove(first.name);
                let err = AlgorithmSelection::new(algorithm, missing).expect_err("missing key");
                assert!(err.to_string().contains(first.name));
            }
        }
    }

    #[test]
    fn rejects_wrong_kind_and_non_finite_numbers() {
        let wrong_kind = params(&[(
            "threshold",
            ParameterValue::Influence(QualityInfluence::Linear),
        )]);
        assert!(AlgorithmSelection::new(AlgorithmId::AdaptiveMajorityVoting, wrong_kind).is_err());

        let nan = params(&[("threshold", ParameterValue::Number(f64::NAN))]);
        assert!(AlgorithmSelection::new(AlgorithmId::AdaptiveMajorityVoting, nan).is_err());
    }

    #[test]
    fn query_pairs_follow_schema_order() {
        let selection = AlgorithmSelection::new(
            AlgorithmId::MajorityVotingWithQualificationReport,
            params(&[
                (
                    "qualityInfluence",
                    ParameterValue::Influence(QualityInfluence::Linear),
                ),
                ("alpha", ParameterValue::Number(0.5)),
            ]),
        )
        .expect("valid");

        assert_eq!(
            selection.query_pairs(),
            vec![
                ("alpha", "0.5".to_string()),
                ("qualityInfluence", "LINEAR".to_string())
            ]
        );
    }

    #[test]
    fn parses_raw_pairs_against_schema() {
        let parsed = parse_parameters(
            AlgorithmId::MajorityVotingWithQualificationReport,
            [("alpha", "0.25"), ("qualityInfluence", "exponential")],
        )
        .expect("parse");
        assert_eq!(parsed["alpha"], ParameterValue::Number(0.25));
        assert_eq!(
            parsed["qualityInfluence"],
            ParameterValue::Influence(QualityInfluence::Exponential)
        );

        assert!(parse_parameters(AlgorithmId::CrowdTruth, [("threshold", "0.1")]).is_err());
        assert!(
            parse_parameters(AlgorithmId::AdaptiveMajorityVoting, [("threshold", "high")]).is_err()
        );
    }

    #[test]
    fn qualification_report_only_exists_from_ss2018() {
        let algorithm = AlgorithmId::MajorityVotingWithQualificationReport;
        assert!(!algorithm.available_in(Semester::WS2017));
        assert!(algorithm.available_in(Semester::SS2018));
        assert!(AlgorithmId::CrowdTruth.available_in(Semester::WS2017));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("ss2018".parse::<Semester>(), Ok(Semester::SS2018));
        assert_eq!(
            "adaptivemajorityvoting".parse::<AlgorithmId>(),
            Ok(AlgorithmId::AdaptiveMajorityVoting)
        );
        assert!("SS2019".parse::<Semester>().is_err());
    }
}
