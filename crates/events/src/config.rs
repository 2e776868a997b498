//! Emitter configuration.
//!
//! Only the failure policy is configurable. The default is
//! [`DispatchMode::FailFast`]: the first handler failure stops the emission
//! and is returned to the caller. [`DispatchMode::Isolated`] visits every
//! listener and reports all failures together.
//!
//! The mode can be taken from the environment:
//!
//! ```text
//! TOOLBOX_EVENT_DISPATCH=isolated
//! ```

use core::str::FromStr;

use serde::Deserialize;

use crate::error::{EventError, EventResult};

/// Environment variable read by [`EmitterConfig::from_env`].
pub const DISPATCH_ENV: &str = "TOOLBOX_EVENT_DISPATCH";

/// What an emission does when a handler fails.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Stop at the first failure and return it; panics unwind to the caller.
    #[default]
    FailFast,
    /// Visit every listener; collect handler errors and panics.
    Isolated,
}

impl DispatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchMode::FailFast => "fail_fast",
            DispatchMode::Isolated => "isolated",
        }
    }
}

impl FromStr for DispatchMode {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" | "failfast" => Ok(DispatchMode::FailFast),
            "isolated" => Ok(DispatchMode::Isolated),
            other => Err(EventError::invalid_config(format!(
                "unknown dispatch mode `{other}` (expected `fail_fast` or `isolated`)"
            ))),
        }
    }
}

/// Settings applied to an [`Emitter`](crate::Emitter).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub dispatch: DispatchMode,
}

impl EmitterConfig {
    pub fn isolated() -> Self {
        Self {
            dispatch: DispatchMode::Isolated,
        }
    }

    /// Read settings from the process environment; unset means default.
    pub fn from_env() -> EventResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` (used by [`from_env`](Self::from_env)).
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> EventResult<Self> {
        let dispatch = match lookup(DISPATCH_ENV) {
            Some(raw) => raw.parse()?,
            None => DispatchMode::default(),
        };
        Ok(Self { dispatch })
    }

    /// Parse settings from a JSON document, e.g. `{"dispatch": "isolated"}`.
    pub fn from_json_str(input: &str) -> EventResult<Self> {
        serde_json::from_str(input).map_err(|e| EventError::invalid_config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fail_fast() {
        assert_eq!(EmitterConfig::default().dispatch, DispatchMode::FailFast);
    }

    #[test]
    fn dispatch_mode_parses_known_names() {
        assert_eq!("isolated".parse::<DispatchMode>().unwrap(), DispatchMode::Isolated);
        assert_eq!(" Fail-Fast ".parse::<DispatchMode>().unwrap(), DispatchMode::FailFast);

        let err = "loud".parse::<DispatchMode>().unwrap_err();
        assert_eq!(err.as_label(), "config_invalid");
    }

    #[test]
    fn from_vars_reads_dispatch_variable() {
        let cfg = EmitterConfig::from_vars(|key| {
            (key == DISPATCH_ENV).then(|| "isolated".to_string())
        })
        .unwrap();
        assert_eq!(cfg, EmitterConfig::isolated());

        let cfg = EmitterConfig::from_vars(|_| None).unwrap();
        assert_eq!(cfg, EmitterConfig::default());

        assert!(EmitterConfig::from_vars(|_| Some("bogus".into())).is_err());
    }

    #[test]
    fn from_json_str_uses_snake_case_and_defaults() {
        let cfg = EmitterConfig::from_json_str(r#"{"dispatch": "isolated"}"#).unwrap();
        assert_eq!(cfg.dispatch, DispatchMode::Isolated);

        let cfg = EmitterConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.dispatch, DispatchMode::FailFast);

        assert!(EmitterConfig::from_json_str(r#"{"dispatch": "loud"}"#).is_err());
        assert_eq!(DispatchMode::Isolated.as_str(), "isolated");
    }
}
