#![cfg(test)]

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crate::config::{ConfigFormat, LoaderConfig};
use crate::kernel::error::Error;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::loader::{CandidateSource, PluginLoader};
use crate::plugin_system::manager::PluginManager;
use crate::tests::integration::common::{names, simple};

fn write_manifest(root: &Path, dir: &str, file: &str, content: &str) {
    let plugin_dir = root.join(dir);
    fs::create_dir_all(&plugin_dir).unwrap();
    fs::write(plugin_dir.join(file), content).unwrap();
}

#[tokio::test]
async fn test_discovered_plugins_load_in_dependency_order() {
    let tmp = tempdir().unwrap();
    write_manifest(
        tmp.path(),
        "a-web",
        "plugin.toml",
        r#"
name = "web"
version = "2.1"
load_after = ["security"]
dependencies = [{ name = "core", version = "1.0 > *" }]
"#,
    );
    write_manifest(
        tmp.path(),
        "b-security",
        "plugin.json",
        r#"{ "name": "security", "version": "1.0.0", "dependencies": ["core"] }"#,
    );
    write_manifest(
        tmp.path(),
        "c-audit",
        "plugin.yaml",
        "name: audit\nversion: \"0.3\"\nobserves: [\"*\"]\n",
    );

    let loader = PluginLoader::with_dirs([tmp.path()]);
    let user = loader.candidates().await.unwrap();
    assert_eq!(names(&user), vec!["web", "security", "audit"]);

    let mut manager = PluginManager::new(Default::default());
    let report = manager.load_plugins(vec![simple("core")], user);

    // web waited for security, audit did not wait for anything
    assert_eq!(report.registered, vec!["core", "security", "audit", "web"]);
    assert_eq!(names(&manager.user_plugins()), vec!["security", "audit", "web"]);
    assert_eq!(names(&manager.observers_of("web")), vec!["audit"]);

    let source = tmp.path().join("b-security").join("plugin.json");
    let by_source = manager.get_by_source(&source.display().to_string()).unwrap();
    assert_eq!(by_source.name(), "security");
}

#[tokio::test]
async fn test_directories_without_manifest_are_ignored() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("empty")).unwrap();
    fs::write(tmp.path().join("stray.toml"), "name = 'stray'").unwrap();
    write_manifest(tmp.path(), "real", "plugin.json", r#"{ "name": "real", "version": "1.0" }"#);

    let manifests = PluginLoader::with_dirs([tmp.path()]).scan_for_manifests().await.unwrap();
    assert_eq!(manifests.len(), 1);
    assert_eq!(manifests[0].name, "real");
}

#[tokio::test]
async fn test_missing_plugin_directory_yields_nothing() {
    let tmp = tempdir().unwrap();
    let loader = PluginLoader::with_dirs([tmp.path().join("does-not-exist")]);
    assert!(loader.candidates().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unparsable_manifest_aborts_discovery() {
    let tmp = tempdir().unwrap();
    write_manifest(tmp.path(), "good", "plugin.json", r#"{ "name": "good", "version": "1.0" }"#);
    write_manifest(tmp.path(), "broken", "plugin.json", r#"{ "name": "broken", "#);

    let err = PluginLoader::with_dirs([tmp.path()]).candidates().await.unwrap_err();
    assert!(matches!(
        err,
        Error::PluginSystem(PluginSystemError::ManifestError { .. })
    ));
}

#[tokio::test]
async fn test_bad_dependency_constraint_aborts_discovery() {
    let tmp = tempdir().unwrap();
    write_manifest(
        tmp.path(),
        "bad",
        "plugin.json",
        r#"{ "name": "bad", "version": "1.0", "dependencies": [{ "name": "core", "version": "not a version" }] }"#,
    );

    let err = PluginLoader::with_dirs([tmp.path()]).candidates().await.unwrap_err();
    assert!(err.to_string().contains("not a version"));
}

#[tokio::test]
async fn test_config_excludes_filter_discovered_plugins() {
    let tmp = tempdir().unwrap();
    write_manifest(tmp.path(), "a", "plugin.json", r#"{ "name": "a", "version": "1.0" }"#);
    write_manifest(
        tmp.path(),
        "b",
        "plugin.json",
        r#"{ "name": "b", "version": "1.0", "dependencies": ["a"] }"#,
    );
    write_manifest(tmp.path(), "c", "plugin.json", r#"{ "name": "c", "version": "1.0" }"#);

    let config_text = format!(
        "plugin_dirs = [{:?}]\nexcludes = [\"a\"]\n",
        tmp.path().display().to_string()
    );
    let config = LoaderConfig::parse(&config_text, ConfigFormat::Toml).unwrap();

    let user = PluginLoader::with_dirs(&config.plugin_dirs).candidates().await.unwrap();
    let mut manager = PluginManager::from_config(&config);
    let report = manager.load_plugins(Vec::new(), user);

    assert_eq!(report.registered, vec!["c"]);
    assert!(report.failed.is_empty());
}
