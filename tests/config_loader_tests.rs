use apartments::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const VARS: &[&str] = &[
    "APARTMENTS_PROFILE",
    "APARTMENTS_API_BIND_ADDR",
    "APARTMENTS_LOG_LEVEL",
    "APARTMENTS_API_TOKEN",
    "APARTMENTS_API_TOKENS",
    "APARTMENTS_MAX_DOCUMENT_BYTES",
    "APARTMENTS_DB_MAX_CONNECTIONS",
    "APARTMENTS_DOCUMENT_ROOT",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn loader_for(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(PathBuf::from(dir.path()))
}

#[test]
fn loads_defaults_when_only_token_present() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    unsafe {
        env::set_var("APARTMENTS_API_TOKEN", "local-dev-token");
    }

    let cfg = loader_for(&temp_dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.api_tokens, vec!["local-dev-token".to_string()]);
    assert_eq!(cfg.max_document_bytes, 10 * 1024 * 1024);
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn missing_token_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let err = loader_for(&temp_dir).load().expect_err("tokens are required");
    assert!(matches!(err, ConfigError::MissingApiTokens));
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "APARTMENTS_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "APARTMENTS_API_BIND_ADDR=192.168.0.10:5000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "APARTMENTS_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "APARTMENTS_PROFILE=test\nAPARTMENTS_API_BIND_ADDR=127.0.0.1:4000\nAPARTMENTS_API_TOKENS=first, second ,\n",
    );

    let cfg = loader_for(&temp_dir)
        .load()
        .expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.api_tokens, vec!["first".to_string(), "second".to_string()]);
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "APARTMENTS_API_BIND_ADDR=127.0.0.1:3000\nAPARTMENTS_API_TOKEN=from-file\nAPARTMENTS_DOCUMENT_ROOT=/srv/documents\n",
    );

    unsafe {
        env::set_var("APARTMENTS_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let cfg = loader_for(&temp_dir)
        .load()
        .expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.api_tokens, vec!["from-file".to_string()]);
    assert_eq!(cfg.document_root, PathBuf::from("/srv/documents"));

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    unsafe {
        env::set_var("APARTMENTS_API_BIND_ADDR", "not-an-addr");
        env::set_var("APARTMENTS_API_TOKEN", "token");
    }
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}

#[test]
fn oversized_document_limit_is_rejected() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    unsafe {
        env::set_var("APARTMENTS_API_TOKEN", "token");
        env::set_var("APARTMENTS_MAX_DOCUMENT_BYTES", "999999999999");
    }
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("limit above the ceiling should fail");
    assert!(matches!(err, ConfigError::InvalidMaxDocumentBytes { .. }));

    clear_env();
}

#[test]
fn unparseable_numbers_are_rejected() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "APARTMENTS_DB_MAX_CONNECTIONS=ten\n");

    unsafe {
        env::set_var("APARTMENTS_API_TOKEN", "token");
        env::set_var("APARTMENTS_MAX_DOCUMENT_BYTES", "10MB");
    }

    let err = loader_for(&temp_dir)
        .load()
        .expect_err("size with a unit suffix is not a byte count");
    match err {
        ConfigError::InvalidValue { key, value } => {
            assert_eq!(key, "DB_MAX_CONNECTIONS");
            assert_eq!(value, "ten");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    write_env_file(&temp_dir, ".env", "APARTMENTS_DB_MAX_CONNECTIONS=4\n");
    let err = loader_for(&temp_dir).load().expect_err("10MB is rejected");
    assert!(matches!(
        err,
        ConfigError::InvalidValue { key: "MAX_DOCUMENT_BYTES", ref value } if value == "10MB"
    ));
    assert_eq!(
        err.to_string(),
        "invalid value '10MB' for APARTMENTS_MAX_DOCUMENT_BYTES"
    );
    clear_env();
}
