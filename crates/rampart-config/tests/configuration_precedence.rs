//! Behaviour tests for configuration layering.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use rampart_config::{Config, LogColour, LogFormat, default_log_filter};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    file_lines: RefCell<Vec<String>>,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_lock: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let env_lock = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            file_lines: RefCell::new(Vec::new()),
            cli_args: RefCell::new(vec![OsString::from("rampart")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_lock: env_lock,
        }
    }

    fn add_file_line(&self, line: String) {
        self.file_lines.borrow_mut().push(line);
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe in edition 2024; `Drop` restores the
        // previous value and the mutex keeps scenarios from interleaving.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let mut args = self.cli_args.borrow().clone();
        let lines = self.file_lines.borrow();
        if !lines.is_empty() {
            let path = self.temp_dir.path().join("rampart.toml");
            if let Err(error) = fs::write(&path, lines.join("\n")) {
                panic!("failed to write configuration: {error}");
            }
            args.insert(1, OsString::from("--config-path"));
            args.insert(2, path.into_os_string());
        }

        match Config::load_from_iter(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            match value {
                Some(previous) => unsafe { std::env::set_var(&key, previous) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the log filter to \"{filter}\"")]
fn given_file_log_filter(harness: &Harness, filter: String) {
    harness.add_file_line(format!("log_filter = \"{filter}\""));
}

#[given("a configuration file setting the inference failure threshold to {threshold}")]
fn given_file_threshold(harness: &Harness, threshold: u32) {
    harness.add_file_line(format!("inference_failure_threshold = {threshold}"));
}

#[given("the environment overrides the log filter to \"{filter}\"")]
fn given_env_log_filter(harness: &Harness, filter: String) {
    harness.set_env("RAMPART_LOG_FILTER", &filter);
}

#[given("the environment sets the log colour to \"{colour}\"")]
fn given_env_log_colour(harness: &Harness, colour: String) {
    harness.set_env("RAMPART_LOG_COLOUR", &colour);
}

#[when("the CLI sets the log filter to \"{filter}\"")]
fn when_cli_log_filter(harness: &Harness, filter: String) {
    harness.push_cli_arg("--log-filter");
    harness.push_cli_arg(filter);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the log filter to \"{filter}\"")]
fn then_log_filter(harness: &Harness, filter: String) {
    assert_eq!(harness.config().log_filter(), filter);
}

#[then("loading the configuration resolves the inference failure threshold to {threshold}")]
fn then_threshold(harness: &Harness, threshold: u32) {
    let config = harness.config();
    assert_eq!(config.inference().failure_threshold, threshold);
    assert_eq!(config.persistence().failure_threshold, 3, "other classes keep defaults");
}

#[then("loading the configuration resolves the log colour to \"{colour}\"")]
fn then_log_colour(harness: &Harness, colour: String) {
    let expected: LogColour = colour.parse().expect("known colour policy");
    assert_eq!(harness.config().log_colour(), expected);
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.config();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), LogFormat::Json);
    assert!(config.default_actor_enabled());
    assert_eq!(config, Config::default());
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Built-in defaults apply without overrides"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "A configuration file overrides the defaults"
)]
fn file_overrides_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The environment overrides the configuration file"
)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The command line overrides the environment"
)]
fn cli_overrides_environment(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Breaker thresholds are read from the configuration file"
)]
fn thresholds_from_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The environment selects the log colour policy"
)]
fn environment_selects_colour(#[from(harness)] harness: Harness) {
    let _ = harness;
}
