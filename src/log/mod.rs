//! Logging for the simulator, the data loaders and the `seihrd` binary.
//!
//! Messages are emitted with the five macros re-exported from `log`: `error!`, `warn!`,
//! `info!`, `debug!` and `trace!`. Logging is _disabled_ by default. The `seihrd` binary
//! turns it on with `-v` (info), `-vv` (debug), `-vvv` (trace) or `--log-level`, which takes
//! either a single level or a comma separated list of `module=level` filters:
//!
//! ```text
//! seihrd --log-level debug
//! seihrd --log-level seihrd::simulator=trace,seihrd::observed=off
//! ```
//!
//! From code, use the functions in this module:
//!
//! ```rust
//! use seihrd::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Enable `info` log messages globally.
//!     set_log_level(LevelFilter::Info);
//!     // Show every step the solver rejects.
//!     set_module_filter("seihrd::ode", LevelFilter::Trace);
//! }
//! ```
//!
//! With the `logging` feature (on by default) messages go to stdout through `log4rs`.
//! Without it, only the level filter of the `log` facade is maintained.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::SeihrdError;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// Default module specific filters. Empty: every module follows the global level until a
// filter is set.
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 0] = [];

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The maximum level for log messages emitted from one module path (e.g. `"seihrd::observed"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Keeps track of the global and per-module filter levels and holds a handle to the global
/// logger. Only one instance exists; the public API are free functions that lock it.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level for modules without an explicit filter. `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    /// Handle to the `log4rs` logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .map(|(module, level)| (module.to_string(), (module, level).into()));
        let module_configurations = HashMap::from_iter(module_configurations);
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations,

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }

            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated: bool = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    set_module_filters(&[(module_path, level_filter)]);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    let mut log_configuration = get_log_configuration();
    log_configuration.remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to set
/// filters in bulk.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    let mut log_configuration = get_log_configuration();
    log_configuration.set_module_filters(module_filters);
}

/// A parsed `--log-level` argument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogSpec {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

impl FromStr for LogSpec {
    type Err = SeihrdError;

    /// Parses `"info"` or `"seihrd::ode=trace,seihrd=debug"`. A bare level sets the global
    /// level; `module=level` entries set module filters.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut parsed = LogSpec::default();
        for entry in spec.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let parse_level = |level: &str| {
                LevelFilter::from_str(level.trim()).map_err(|_| {
                    SeihrdError::invalid_input(format!("unknown log level `{level}`"))
                })
            };
            match entry.split_once('=') {
                Some((module, level)) => {
                    parsed
                        .modules
                        .push((module.trim().to_string(), parse_level(level)?));
                }
                None => parsed.global = Some(parse_level(entry)?),
            }
        }
        Ok(parsed)
    }
}

impl LogSpec {
    /// Installs these levels. Module filters without a global level turn on
    /// logging for those modules only.
    pub fn apply(&self) {
        if let Some(level) = self.global {
            set_log_level(level);
        }
        let filters: Vec<(&str, LevelFilter)> = self
            .modules
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&filters);
        for (module, level) in &filters {
            info!("Logging enabled for {module} at level {level}");
        }
    }
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
