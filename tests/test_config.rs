use std::fs;

use tempfile::TempDir;
use vtc_rust::vtc_common_rs::packet::core::{ByteOrder, FrameError};
use vtc_rust::vtc_common_rs::utils::{CodecConfig, ConfigLoader};

#[test]
fn test_first_existing_file_wins() {
    let dir = TempDir::new().unwrap();
    let toml_path = dir.path().join("vtc.config.toml");
    let json_path = dir.path().join("vtc.config.json");
    fs::write(&json_path, r#"{"crc": {"algorithm": "CRC-32/BZIP2"}}"#).unwrap();

    let loader = ConfigLoader::with_paths(vec![toml_path.clone(), json_path]).with_env_prefix("VTC_IT_FIRST_");
    assert_eq!(loader.load().unwrap().crc.algorithm, "CRC-32/BZIP2");

    fs::write(&toml_path, "[crc]\nalgorithm = \"CRC-8/AUTOSAR\"\nverify_on_decode = false\n").unwrap();
    let config = loader.load().unwrap();
    assert_eq!(config.crc.algorithm, "CRC-8/AUTOSAR");
    assert!(!config.crc.verify_on_decode);
}

#[test]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vtc.config.toml");
    fs::write(&path, "[frame]\nbyte_order = \"little_endian\"\n\n[logging]\nlevel = \"warn\"\n").unwrap();

    std::env::set_var("VTC_IT_ENV_BYTE_ORDER", "motorola");
    std::env::set_var("VTC_IT_ENV_LOG_LEVEL", "trace");
    let config = ConfigLoader::with_paths(vec![path]).with_env_prefix("VTC_IT_ENV_").load().unwrap();

    assert_eq!(config.frame.byte_order, ByteOrder::BigEndian);
    assert_eq!(config.logging.level, "trace");
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vtc.config.toml");
    fs::write(&path, "this is not toml = = =").unwrap();

    let loader = ConfigLoader::with_paths(vec![path.clone()]).with_env_prefix("VTC_IT_BAD_");
    assert!(matches!(loader.load_from_file(&path), Err(FrameError::Config(_))));
    assert_eq!(loader.load().unwrap(), CodecConfig::default());
}

#[test]
fn test_invalid_log_level_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vtc.config.json");
    fs::write(&path, r#"{"logging": {"level": "chatty"}}"#).unwrap();

    let result = ConfigLoader::with_paths(vec![path]).with_env_prefix("VTC_IT_LEVEL_").load();
    assert!(matches!(result, Err(FrameError::Config(_))));
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.toml");
    let mut config = CodecConfig::default();
    config.frame.byte_order = ByteOrder::BigEndian;
    config.logging.timestamps = false;

    let loader = ConfigLoader::with_paths(vec![path.clone()]).with_env_prefix("VTC_IT_SAVE_");
    loader.save_config(&config, &path).unwrap();
    assert!(fs::read_to_string(&path).unwrap().contains("big_endian"));
    assert_eq!(loader.load().unwrap(), config);
}

#[test]
fn test_named_file_must_load() {
    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new().with_env_prefix("VTC_IT_NAMED_");

    let missing = dir.path().join("does_not_exist.toml");
    assert!(matches!(loader.load_required(&missing), Err(FrameError::Io(_))));

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "this is not toml = = =").unwrap();
    assert!(matches!(loader.load_required(&bad), Err(FrameError::Config(_))));
    // the search-path loader still falls back to defaults
    let fallback = ConfigLoader::with_paths(vec![bad]).with_env_prefix("VTC_IT_NAMED_");
    assert_eq!(fallback.load().unwrap(), CodecConfig::default());
}
