use std::fs;

use assert_matches::assert_matches;

use chargepoint_datasets::config::ConfigLoader;
use chargepoint_datasets::domain::Source;
use chargepoint_datasets::error::ChargeError;

#[test]
fn resolve_reads_urls_and_cache_settings() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("cpdata.json");
    fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "openchargemap": { "url": "https://mirror.example/poi.json.gz" },
            "cache": { "enabled": false, "dir": "/tmp/cpdata-cache" }
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(
        resolved.source_url(Source::OpenChargeMap),
        "https://mirror.example/poi.json.gz"
    );
    assert_eq!(
        resolved.source_url(Source::Ireland),
        "http://www.cpinfo.ie/data/201907a.zip"
    );
    assert!(!resolved.cache.enabled);
    assert_eq!(
        resolved.cache.dir.as_ref().map(|dir| dir.as_str()),
        Some("/tmp/cpdata-cache")
    );
    assert!(resolved.response_cache().unwrap().is_none());
}

#[test]
fn explicit_missing_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, ChargeError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("cpdata.json");
    fs::write(&path, "{ \"ireland\": ").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, ChargeError::ConfigParse(_));
}

#[test]
fn configured_cache_dir_is_used() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("cpdata.json");
    let cache_dir = temp.path().join("cache");
    fs::write(
        &path,
        format!(r#"{{ "cache": {{ "dir": {:?} }} }}"#, cache_dir.to_str().unwrap()),
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    let cache = resolved.response_cache().unwrap().unwrap();
    assert_eq!(cache.root().as_std_path(), cache_dir.as_path());
}

#[test]
fn newer_schema_version_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("cpdata.json");
    fs::write(&path, r#"{ "schema_version": 2 }"#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(
        err,
        ChargeError::ConfigParse(message) if message.contains("schema_version 2")
    );
}
