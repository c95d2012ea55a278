//! Configuration: optional `draftloop.toml`, environment, CLI overrides

use draftloop_error::{Error, ErrorKind, Result};
use draftloop_llm::{ProviderConfig, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, OPENAI_BASE_URL};
use draftloop_workflow::{FeedbackSource, FlowConfig, FlowPreset, RejectionPolicy, ReviewRoute};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "draftloop.toml";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// The on-disk file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub provider: ProviderSection,
    pub server: ServerSection,
    pub flow: FlowSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub api_key_env: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: Option<String>,
}

/// A preset plus optional per-knob overrides
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FlowSection {
    pub preset: Option<FlowPreset>,
    pub on_rejection: Option<RejectionPolicy>,
    pub feedback: Option<FeedbackSource>,
    pub route: Option<ReviewRoute>,
}

impl FlowSection {
    fn resolve(&self) -> FlowConfig {
        let mut flow = self.preset.unwrap_or(FlowPreset::Iterative).config();
        if let Some(policy) = self.on_rejection {
            flow = flow.with_rejection(policy);
        }
        if let Some(source) = self.feedback {
            flow = flow.with_feedback(source);
        }
        if let Some(route) = self.route {
            flow = flow.with_route(route);
        }
        flow
    }
}

impl FileConfig {
    /// Load the config file.
    ///
    /// With `path` given the file must exist. Without it, `draftloop.toml` is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if explicit {
                return Err(Error::new(ErrorKind::FileNotFound, "config file not found")
                    .with_operation("config::load")
                    .with_context("path", path.display().to_string()));
            }
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            Error::from(e)
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
        })?;

        Self::parse(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            Error::config_invalid(e.message().to_string())
                .with_operation("config::parse")
                .set_source(e)
        })
    }
}

/// Values given on the command line; these beat the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub bind: Option<String>,
    pub flow: Option<FlowPreset>,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ProviderConfig,
    pub bind: SocketAddr,
    pub flow: FlowConfig,
}

impl Settings {
    /// Merge file and overrides, and look the API key up through `env`.
    ///
    /// A missing or blank key is a `CredentialMissing` error.
    pub fn resolve(
        file: &FileConfig,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let key_var = file
            .provider
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = env(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::credential_missing(key_var).with_operation("config::resolve"))?;

        let base_url = overrides
            .base_url
            .as_deref()
            .or(file.provider.base_url.as_deref())
            .unwrap_or(OPENAI_BASE_URL);
        let model = overrides
            .model
            .as_deref()
            .or(file.provider.model.as_deref())
            .unwrap_or(DEFAULT_MODEL);
        let timeout = file.provider.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let provider = if base_url == OPENAI_BASE_URL {
            ProviderConfig::openai(api_key)
        } else {
            ProviderConfig::compatible(base_url, model).with_api_key(api_key)
        }
        .with_model(model)
        .with_timeout(timeout);

        let bind = overrides
            .bind
            .as_deref()
            .or(file.server.bind.as_deref())
            .unwrap_or(DEFAULT_BIND);
        let bind = bind.parse::<SocketAddr>().map_err(|e| {
            Error::config_invalid(format!("invalid bind address '{}'", bind))
                .with_operation("config::resolve")
                .set_source(e)
        })?;

        // --flow names a preset outright; the file's knobs only refine its own preset
        let flow = match overrides.flow {
            Some(preset) => preset.config(),
            None => file.flow.resolve(),
        };

        Ok(Self { provider, bind, flow })
    }
}
