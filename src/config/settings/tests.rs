use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_values() {
    let config = Config::default();

    assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
    assert_eq!(config.source.min_paragraph_chars, 30);
    assert_eq!(config.source.timeout_seconds, 10);
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.embedding_model, "all-minilm");
    assert_eq!(config.ollama.generation_model, "gemma:2b");
    assert_eq!(config.ollama.request_timeout_seconds, 15);
    assert_eq!(config.ollama.max_attempts, 3);
    assert_eq!(config.ollama.retry_delay_seconds, 2);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.server.port, 5000);
    assert!(config.validate().is_ok());
}

#[test]
fn source_url_validation() {
    let mut source = SourceConfig::default();
    assert!(source.validate().is_ok());

    source.url = "ftp://example.com/page".to_string();
    assert!(matches!(
        source.validate(),
        Err(ConfigError::InvalidSourceUrl(_))
    ));

    source.url = "not a url".to_string();
    assert!(matches!(
        source.validate(),
        Err(ConfigError::InvalidSourceUrl(_))
    ));

    source.url = "http://localhost:8080/page".to_string();
    assert!(source.validate().is_ok());
}

#[test]
fn source_timeout_bounds() {
    let mut source = SourceConfig {
        timeout_seconds: 0,
        ..SourceConfig::default()
    };
    assert!(matches!(
        source.validate(),
        Err(ConfigError::InvalidTimeout(0))
    ));

    source.timeout_seconds = 301;
    assert!(source.validate().is_err());

    source.timeout_seconds = 10;
    assert_eq!(source.timeout(), Duration::from_secs(10));
}

#[test]
fn ollama_validation() {
    let mut ollama = OllamaConfig::default();
    assert!(ollama.validate().is_ok());

    ollama.protocol = "ftp".to_string();
    assert!(matches!(
        ollama.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));

    let ollama = OllamaConfig {
        generation_model: "   ".to_string(),
        ..OllamaConfig::default()
    };
    assert!(matches!(ollama.validate(), Err(ConfigError::InvalidModel(_))));

    let ollama = OllamaConfig {
        max_attempts: 0,
        ..OllamaConfig::default()
    };
    assert!(matches!(
        ollama.validate(),
        Err(ConfigError::InvalidAttempts(0))
    ));

    let ollama = OllamaConfig {
        retry_delay_seconds: 120,
        ..OllamaConfig::default()
    };
    assert!(matches!(
        ollama.validate(),
        Err(ConfigError::InvalidRetryDelay(120))
    ));
}

#[test]
fn ollama_url_generation() {
    let ollama = OllamaConfig {
        protocol: "https".to_string(),
        host: "models.internal".to_string(),
        port: 8443,
        ..OllamaConfig::default()
    };

    let url = ollama.ollama_url().expect("url should build");
    assert_eq!(url.as_str(), "https://models.internal:8443/");
    assert_eq!(ollama.request_timeout(), Duration::from_secs(15));
    assert_eq!(ollama.retry_delay(), Duration::from_secs(2));
}

#[test]
fn setters_reject_invalid_values() {
    let mut ollama = OllamaConfig::default();

    assert!(ollama.set_port(0).is_err());
    assert!(ollama.set_batch_size(0).is_err());
    assert!(ollama.set_batch_size(1001).is_err());
    assert!(ollama.set_embedding_model(String::new()).is_err());
    assert!(ollama.set_generation_model("  ".to_string()).is_err());
    assert!(ollama.set_protocol("gopher".to_string()).is_err());

    ollama
        .set_generation_model("llama3.2".to_string())
        .expect("model should be accepted");
    ollama.set_port(9999).expect("port should be accepted");
    assert_eq!(ollama.generation_model, "llama3.2");
    assert_eq!(ollama.port, 9999);
}

#[test]
fn server_socket_addr() {
    let server = ServerConfig::default();
    let addr = server.socket_addr().expect("default address should parse");
    assert_eq!(addr.to_string(), "127.0.0.1:5000");

    let server = ServerConfig {
        host: "localhost".to_string(),
        port: 5000,
    };
    assert!(matches!(
        server.socket_addr(),
        Err(ConfigError::InvalidListenAddress(_))
    ));

    let server = ServerConfig {
        host: "0.0.0.0".to_string(),
        port: 0,
    };
    assert!(matches!(
        server.socket_addr(),
        Err(ConfigError::InvalidPort(0))
    ));
}

#[test]
fn retrieval_top_k_bounds() {
    assert!(RetrievalConfig { top_k: 0 }.validate().is_err());
    assert!(RetrievalConfig { top_k: 101 }.validate().is_err());
    assert!(RetrievalConfig { top_k: 1 }.validate().is_ok());
}

#[test]
fn load_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    let config = Config::load(temp_dir.path()).expect("load should succeed");

    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.source, SourceConfig::default());
    assert_eq!(config.ollama, OllamaConfig::default());
}

#[test]
fn partial_file_fills_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[ollama]\ngeneration_model = \"mistral\"\n\n[retrieval]\ntop_k = 3\n",
    )
    .expect("should write config file");

    let config = Config::load(temp_dir.path()).expect("load should succeed");

    assert_eq!(config.ollama.generation_model, "mistral");
    assert_eq!(config.ollama.embedding_model, "all-minilm");
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.source, SourceConfig::default());
}

#[test]
fn invalid_file_is_rejected() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[retrieval]\ntop_k = 0\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let mut config = Config::load(temp_dir.path()).expect("load should succeed");
    config.source.url = "https://example.com/faq".to_string();
    config.server.port = 8080;

    config.save().expect("save should succeed");
    assert!(config.config_file_path().exists());

    let reloaded = Config::load(temp_dir.path()).expect("reload should succeed");
    assert_eq!(config, reloaded);
}

#[test]
#[serial]
fn environment_overrides() {
    // SAFETY: serialized with every other test that touches these variables
    unsafe {
        std::env::set_var(SOURCE_URL_ENV, "https://example.org/help");
        std::env::set_var(OLLAMA_PORT_ENV, "12345");
    }

    let mut config = Config::default();
    let result = config.apply_env_overrides();

    // SAFETY: see above
    unsafe {
        std::env::remove_var(SOURCE_URL_ENV);
        std::env::remove_var(OLLAMA_PORT_ENV);
    }

    result.expect("overrides should apply");
    assert_eq!(config.source.url, "https://example.org/help");
    assert_eq!(config.ollama.port, 12345);
}

#[test]
#[serial]
fn invalid_port_override() {
    // SAFETY: serialized with every other test that touches these variables
    unsafe {
        std::env::set_var(OLLAMA_PORT_ENV, "not-a-port");
    }

    let mut config = Config::default();
    let result = config.apply_env_overrides();

    // SAFETY: see above
    unsafe {
        std::env::remove_var(OLLAMA_PORT_ENV);
    }

    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvironment {
            name: OLLAMA_PORT_ENV,
            ..
        })
    ));
}
