#![allow(clippy::float_cmp)]

use std::sync::{Mutex, MutexGuard};

use super::*;

const VARS: &[&str] = &[
    "MARINA_API_BASE_URL",
    "MARINA_API_TOKEN",
    "MARINA_REQUEST_TIMEOUT_SECS",
    "MARINA_CONNECT_TIMEOUT_SECS",
    "MARINA_SYNC_DEBOUNCE_MS",
    "MARINA_VIEWPORT_WIDTH",
    "MARINA_VIEWPORT_HEIGHT",
    "MARINA_NUDGE_STEP",
    "MARINA_ROTATE_STEP",
    "MARINA_ZOOM_MIN",
    "MARINA_ZOOM_MAX",
];

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialises env access and starts from a clean slate.
fn clean_env() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: every test touching these vars holds ENV_LOCK.
    unsafe {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
    guard
}

fn set(var: &str, value: &str) {
    // SAFETY: callers hold ENV_LOCK.
    unsafe { std::env::set_var(var, value) };
}

#[test]
fn from_env_defaults() {
    let _env = clean_env();
    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.api_token, None);
    assert_eq!(
        cfg.timeouts,
        Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg.sync_debounce, Duration::from_millis(120));
}

#[test]
fn from_env_parses_overrides() {
    let _env = clean_env();
    set("MARINA_API_BASE_URL", "https://marina.test/api/v1/");
    set("MARINA_API_TOKEN", "tok");
    set("MARINA_REQUEST_TIMEOUT_SECS", "42");
    set("MARINA_CONNECT_TIMEOUT_SECS", "7");
    set("MARINA_SYNC_DEBOUNCE_MS", "0");
    set("MARINA_VIEWPORT_WIDTH", "1024");
    set("MARINA_NUDGE_STEP", "2.5");
    set("MARINA_ZOOM_MAX", "4");

    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://marina.test/api/v1");
    assert_eq!(cfg.api_token.as_deref(), Some("tok"));
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.sync_debounce, Duration::ZERO);
    assert_eq!(cfg.viewport_width, 1024.0);
    assert_eq!(cfg.viewport_height, DEFAULT_VIEWPORT_HEIGHT);
    assert_eq!(cfg.nudge_step, 2.5);
    assert_eq!(cfg.zoom_max, 4.0);
}

#[test]
fn unparseable_numbers_fall_back() {
    let _env = clean_env();
    set("MARINA_REQUEST_TIMEOUT_SECS", "soon");
    set("MARINA_ZOOM_MIN", "tiny");
    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(cfg.zoom_min, ZOOM_MIN);
}

#[test]
fn blank_token_is_ignored() {
    let _env = clean_env();
    set("MARINA_API_TOKEN", "   ");
    assert_eq!(Config::from_env().unwrap().api_token, None);
}

#[test]
fn empty_base_url_is_rejected() {
    let _env = clean_env();
    set("MARINA_API_BASE_URL", "/");
    let err = Config::from_env().unwrap_err();
    assert_eq!(err, ConfigError::EmptyBaseUrl);
    assert_eq!(err.error_code(), "E_CONFIG_BASE_URL");
}

#[test]
fn inverted_zoom_range_is_rejected() {
    let _env = clean_env();
    set("MARINA_ZOOM_MIN", "2");
    set("MARINA_ZOOM_MAX", "1");
    let err = Config::from_env().unwrap_err();
    assert_eq!(err, ConfigError::InvertedZoomRange { min: 2.0, max: 1.0 });
}

#[test]
fn non_positive_step_is_rejected() {
    let cfg = Config { nudge_step: 0.0, ..Config::default() };
    assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { var: "MARINA_NUDGE_STEP", .. })));
}

#[test]
fn editor_config_carries_overrides() {
    let cfg = Config { nudge_step: 1.0, rotate_step: 15.0, zoom_min: 0.5, zoom_max: 2.0, ..Config::default() };
    let editor = cfg.editor();
    assert_eq!(editor.nudge_step, 1.0);
    assert_eq!(editor.rotate_step, 15.0);
    assert_eq!(editor.zoom_min, 0.5);
    assert_eq!(editor.zoom_max, 2.0);
    assert_eq!(editor.min_size, EditorConfig::default().min_size);
}
