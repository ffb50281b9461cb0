use std::env;
use std::fmt::{self, Debug};

use prompt_refiner_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";
const DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
// Older `.env` files name the deployment this way.
const LEGACY_DEPLOYMENT_VAR: &str = "AZURE_model_DEPLOYMENT_NAME";

/// Error returned when the configuration is incomplete.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
}

/// Connection settings of the Azure OpenAI deployment shared by all agents.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Load any `.env` file before calling this if one should be honored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };
        let require =
            |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let deployment = match get(DEPLOYMENT_VAR) {
            Some(deployment) => deployment,
            None => {
                let deployment = get(LEGACY_DEPLOYMENT_VAR)
                    .ok_or(ConfigError::Missing(DEPLOYMENT_VAR))?;
                debug!("using deployment from {LEGACY_DEPLOYMENT_VAR}");
                deployment
            }
        };

        Ok(Self {
            endpoint: require(ENDPOINT_VAR)?,
            api_key: require(API_KEY_VAR)?,
            api_version: require(API_VERSION_VAR)?,
            deployment,
        })
    }

    /// Returns the resource endpoint.
    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the deployment name.
    #[inline]
    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    /// Returns the API version.
    #[inline]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Creates the provider configuration for this deployment.
    pub fn to_openai_config(&self) -> OpenAIConfig {
        OpenAIConfigBuilder::with_api_key(&self.api_key)
            .with_base_url(&self.endpoint)
            .with_model(&self.deployment)
            .with_api_version(&self.api_version)
            .build()
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .finish()
    }
}
