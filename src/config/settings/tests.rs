use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.owner_id, "local");
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert_eq!(config.ollama.embedding_dimension, DEFAULT_EMBEDDING_DIMENSION);
    assert!(config.llm.enabled);
    assert_eq!(config.search.overfetch_factor, 2);
    assert_eq!(config.search.default_limit, 10);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.embedding_dimension = 32;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.owner_id = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.search.overfetch_factor = 1;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.search.semantic_weight = 1.5;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn disabled_llm_skips_endpoint_validation() {
    let mut config = Config::default();
    config.llm.enabled = false;
    config.llm.model = String::new();
    assert!(config.validate().is_ok());
}

#[test]
fn endpoint_url_generation() {
    let config = Config::default();
    let url = config
        .ollama
        .url()
        .expect("should generate ollama url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");

    let url = config.llm.url().expect("should generate llm url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");
    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load(temp_dir.path()).expect("should load defaults");
    config.owner_id = "alice".to_string();
    config.ollama.host = "embed-host".to_string();
    config.search.semantic_weight = 0.4;
    config.save().expect("should save config");

    let reloaded = Config::load(temp_dir.path()).expect("should reload config");
    assert_eq!(reloaded.owner_id, "alice");
    assert_eq!(reloaded.ollama.host, "embed-host");
    assert!((reloaded.search.semantic_weight - 0.4).abs() < f32::EPSILON);
}

#[test]
fn storage_paths_derive_from_base_dir() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.database_path(), temp_dir.path().join("content.db"));
    assert_eq!(
        config.vector_database_path(),
        temp_dir.path().join("vectors")
    );
}
