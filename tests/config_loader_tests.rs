use mare::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const KEYS: [&str; 6] = [
    "MARE_PROFILE",
    "MARE_API_BIND_ADDR",
    "MARE_LOG_LEVEL",
    "MARE_JWT_SECRET",
    "MARE_SESSION_TTL_SECONDS",
    "MARE_DB_MAX_CONNECTIONS",
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
    for key in KEYS {
        unsafe {
            env::remove_var(key);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.session_ttl_seconds, 7 * 24 * 60 * 60);
    assert!(cfg.run_migrations);
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MARE_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.local",
        "MARE_PROFILE=test\nMARE_API_BIND_ADDR=127.0.0.1:4000\n",
    );
    write_env_file(&temp_dir, ".env.test", "MARE_API_BIND_ADDR=192.168.0.10:5000\n");
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "MARE_API_BIND_ADDR=10.0.0.5:6000\nMARE_LOG_LEVEL=debug\n",
    );

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.log_level, "debug");
}

#[test]
fn process_env_overrides_files() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MARE_API_BIND_ADDR=127.0.0.1:3000\n");
    unsafe {
        env::set_var("MARE_API_BIND_ADDR", "127.0.0.1:9999");
    }

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");
    clear_env();

    assert_eq!(cfg.api_bind_addr, "127.0.0.1:9999");
}

#[test]
fn production_profile_requires_jwt_secret() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MARE_PROFILE=production\n");

    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingJwtSecret));

    write_env_file(
        &temp_dir,
        ".env.production",
        "MARE_JWT_SECRET=0123456789abcdef0123456789abcdef\n",
    );
    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads with secret");
    assert!(cfg.cookie_secure());
}

#[test]
fn invalid_numbers_are_reported_with_their_key() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MARE_SESSION_TTL_SECONDS=forever\n");

    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MARE_SESSION_TTL_SECONDS")
    );
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "MARE_API_BIND_ADDR=not-an-addr\n");

    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
}
