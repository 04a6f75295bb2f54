use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{DashboardContext, FetchOutcome, Page, ParameterSnapshot};
use shared::domain::{parse_parameters, AlgorithmId, AlgorithmSelection, Semester};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod report;

#[derive(Parser, Debug)]
#[command(about = "Load crowd-annotation evaluation results and print or export the views")]
struct Args {
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    semester: Option<Semester>,
    #[arg(long)]
    algorithm: Option<AlgorithmId>,
    /// Algorithm parameter override, repeatable. Unset parameters keep their defaults.
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
    /// Table printed after loading.
    #[arg(long, default_value_t = Page::AlgorithmResults)]
    page: Page,
    /// Write every published table as `<dir>/<view>.csv`.
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

impl Args {
    fn apply(&self, settings: &mut config::Settings) {
        if let Some(url) = &self.backend_url {
            settings.backend_url = url.clone();
        }
        if let Some(semester) = self.semester {
            settings.default_semester = semester;
        }
        if let Some(algorithm) = self.algorithm {
            settings.default_algorithm = algorithm;
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout_secs = secs.max(1);
        }
        if let Some(dir) = &self.export {
            settings.export_dir = Some(dir.clone());
        }
    }

    fn selection(&self, algorithm: AlgorithmId) -> Result<AlgorithmSelection> {
        let mut parameters = AlgorithmSelection::defaults(algorithm).parameters().clone();
        let overrides = parse_parameters(
            algorithm,
            self.params
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )?;
        parameters.extend(overrides);
        Ok(AlgorithmSelection::new(algorithm, parameters)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings();
    args.apply(&mut settings);

    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let selection = args
        .selection(settings.default_algorithm)
        .context("invalid algorithm parameters")?;
    let initial = ParameterSnapshot {
        selection,
        semester: settings.default_semester,
        page: args.page,
    };
    let context = DashboardContext::connect(
        &settings.backend_url,
        Duration::from_secs(settings.request_timeout_secs),
        initial,
    )
    .context("failed to set up evaluation client")?;

    info!(
        backend = %settings.backend_url,
        semester = %settings.default_semester,
        algorithm = %settings.default_algorithm,
        "dashboard: loading datasets"
    );
    let outcomes = context.start().await.settled().await;
    let failed = outcomes
        .iter()
        .filter(|(_, outcome)| *outcome == FetchOutcome::Failed)
        .count();
    if failed > 0 {
        warn!(failed, "dashboard: some datasets could not be refreshed");
    }

    for line in report::summary_lines(context.channels()) {
        println!("{line}");
    }

    match report::page_table(context.channels(), args.page) {
        Some(table) => {
            println!();
            println!("== {} ==", table.title);
            println!("{}", table.to_delimited());
        }
        None => println!("{} has no data", args.page),
    }

    if let Some(dir) = &settings.export_dir {
        let dir = config::prepare_export_dir(dir)?;
        let tables = report::collect_tables(context.channels());
        for path in report::export_tables(&tables, &dir)? {
            info!(path = %path.display(), "dashboard: exported table");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use shared::domain::ParameterValue;

    use super::*;

    #[test]
    fn param_overrides_merge_onto_defaults() {
        let args = Args::parse_from([
            "dashboard",
            "--algorithm",
            "MajorityVotingWithExperienceQuestionnaire",
            "--param",
            "alpha=0.4",
            "--param",
            "qualityInfluence=linear",
        ]);

        let selection = args
            .selection(AlgorithmId::MajorityVotingWithExperienceQuestionnaire)
            .expect("valid overrides");

        assert_eq!(selection.get("alpha"), Some(ParameterValue::Number(0.4)));
        assert_eq!(selection.get("weightLanguage"), Some(ParameterValue::Number(1.0)));
        assert_eq!(selection.parameters().len(), 8);
    }

    #[test]
    fn unknown_param_is_rejected() {
        let args = Args::parse_from(["dashboard", "--param", "threshold=0.2"]);
        assert!(args.selection(AlgorithmId::CrowdTruth).is_err());
    }

    #[test]
    fn cli_flags_override_settings() {
        let args = Args::parse_from([
            "dashboard",
            "--backend-url",
            "http://cli",
            "--semester",
            "SS2018",
            "--page",
            "box-plot",
            "--timeout-secs",
            "0",
        ]);
        let mut settings = config::Settings::default();

        args.apply(&mut settings);

        assert_eq!(settings.backend_url, "http://cli");
        assert_eq!(settings.default_semester, Semester::SS2018);
        assert_eq!(settings.request_timeout_secs, 1);
        assert_eq!(args.page, Page::BoxPlot);
    }
}
