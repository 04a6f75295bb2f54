use super::{load_settings_from, prepare_export_dir, Settings};

use std::{
    collections::HashMap,
    env, fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use shared::domain::{AlgorithmId, Semester};

fn temp_root(label: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("crowd_dashboard_{label}_{suffix}"))
}

fn no_env(_key: &str) -> Option<String> {
    None
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(&temp_root("absent").join("dashboard.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.default_semester, Semester::WS2017);
}

#[test]
fn reads_flat_toml_file() {
    let root = temp_root("file");
    fs::create_dir_all(&root).expect("temp root");
    let path = root.join("dashboard.toml");
    fs::write(
        &path,
        r#"
backend_url = "http://scores.internal:9000"
semester = "ss2018"
algorithm = "AdaptiveMajorityVoting"
request_timeout_secs = 12
export_dir = "./out"
"#,
    )
    .expect("write config");

    let settings = load_settings_from(&path, no_env);

    assert_eq!(settings.backend_url, "http://scores.internal:9000");
    assert_eq!(settings.default_semester, Semester::SS2018);
    assert_eq!(settings.default_algorithm, AlgorithmId::AdaptiveMajorityVoting);
    assert_eq!(settings.request_timeout_secs, 12);
    assert_eq!(settings.export_dir, Some(PathBuf::from("./out")));
    assert_eq!(settings.log_filter, "info");

    fs::remove_dir_all(root).expect("cleanup");
}

#[test]
fn env_overrides_beat_file_values() {
    let root = temp_root("env");
    fs::create_dir_all(&root).expect("temp root");
    let path = root.join("dashboard.toml");
    fs::write(&path, "backend_url = \"http://from-file\"\nsemester = \"WS2017\"\n")
        .expect("write config");
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DASHBOARD_BACKEND_URL", "http://legacy"),
        ("APP__BACKEND_URL", "http://from-env"),
        ("APP__SEMESTER", "SS2018"),
        ("APP__LOG_FILTER", "client_core=debug"),
    ]);

    let settings = load_settings_from(&path, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.backend_url, "http://from-env");
    assert_eq!(settings.default_semester, Semester::SS2018);
    assert_eq!(settings.log_filter, "client_core=debug");

    fs::remove_dir_all(root).expect("cleanup");
}

#[test]
fn unparsable_values_keep_previous_setting() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP__SEMESTER", "WS2019"),
        ("APP__ALGORITHM", "Bayesian"),
        ("APP__REQUEST_TIMEOUT_SECS", "0"),
    ]);

    let settings = load_settings_from(&temp_root("bad").join("dashboard.toml"), |key| {
        vars.get(key).map(|v| v.to_string())
    });

    assert_eq!(settings, Settings::default());
}

#[test]
fn creates_export_directory() {
    let root = temp_root("export");
    let target = root.join("nested").join("csv");

    let prepared = prepare_export_dir(&target).expect("prepare export dir");

    assert_eq!(prepared, target);
    assert!(target.is_dir());
    fs::remove_dir_all(root).expect("cleanup");
}
