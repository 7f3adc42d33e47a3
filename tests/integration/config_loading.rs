//! Layered configuration: files, per-environment overrides and env vars

use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;
use treexport::config::{ChangeMemoryBackend, ConfigLoader};
use treexport::export::FailurePolicy;

/// Serializes tests that touch process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = f();
    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}

fn workspace_with(files: &[(&str, &str)]) -> TempDir {
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    for (name, contents) in files {
        std::fs::write(config_dir.join(name), contents).unwrap();
    }
    workspace
}

#[test]
fn test_environment_file_overrides_base_file() {
    let workspace = workspace_with(&[
        (
            "config.toml",
            "source = \"site/public\"\nname = \"public\"\n\n[export]\nmax_symlink_depth = 12\n",
        ),
        ("staging.toml", "name = \"staging\"\n"),
    ]);
    let home = TempDir::new().unwrap();

    let config = with_env(
        &[
            ("TREEXPORT_ENV", "staging"),
            ("HOME", home.path().to_str().unwrap()),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.source.as_deref(), Some("site/public"));
    assert_eq!(config.name.as_deref(), Some("staging"));
    assert_eq!(config.export.max_symlink_depth, 12);
}

#[test]
fn test_environment_variables_override_files() {
    let workspace = workspace_with(&[(
        "config.toml",
        "destination = \"/srv/www\"\n\n[storage]\nchange_memory = \"memory\"\n",
    )]);
    let home = TempDir::new().unwrap();

    let config = with_env(
        &[
            ("HOME", home.path().to_str().unwrap()),
            ("TREEXPORT__DESTINATION", "/var/www"),
            ("TREEXPORT__EXPORT__FAILURE_POLICY", "drain_siblings"),
            ("TREEXPORT__EXPORT__MAX_SYMLINK_DEPTH", "5"),
            ("TREEXPORT__STORAGE__CHANGE_MEMORY", "sled"),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.destination, Some(PathBuf::from("/var/www")));
    assert_eq!(config.export.failure_policy, FailurePolicy::DrainSiblings);
    assert_eq!(config.export.max_symlink_depth, 5);
    assert_eq!(config.storage.change_memory, ChangeMemoryBackend::Sled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_policy_is_rejected() {
    let workspace = workspace_with(&[(
        "config.toml",
        "[export]\nfailure_policy = \"retry_forever\"\n",
    )]);
    let home = TempDir::new().unwrap();

    let result = with_env(&[("HOME", home.path().to_str().unwrap())], || {
        ConfigLoader::load(workspace.path())
    });
    assert!(result.is_err());
}

#[test]
fn test_state_dir_config_overrides_tracked_files() {
    let workspace = workspace_with(&[("config.toml", "name = \"tracked\"\nsource = \"site\"\n")]);
    let state_dir = workspace.path().join(".treexport");
    std::fs::create_dir_all(&state_dir).unwrap();
    std::fs::write(state_dir.join("config.toml"), "name = \"local\"\n").unwrap();
    let home = TempDir::new().unwrap();

    let config = with_env(
        &[
            ("HOME", home.path().to_str().unwrap()),
            ("XDG_CONFIG_HOME", home.path().to_str().unwrap()),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.name.as_deref(), Some("local"));
    assert_eq!(config.source.as_deref(), Some("site"));
    assert_eq!(config.storage.object_db, PathBuf::from(".treexport/objects"));
}
