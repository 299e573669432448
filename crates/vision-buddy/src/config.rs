//! Settings of the command line program, read from environment variables.

/// Errors from reading [`CliConfig`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    /// A variable does not hold a positive integer.
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber {
        /// The variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Settings of the command line program.
#[derive(Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// `OPENAI_API_KEY`, required.
    pub api_key: String,
    /// `OPENAI_BASE_URL`, the provider default if unset.
    pub base_url: Option<String>,
    /// `OPENAI_MODEL`, the provider default if unset.
    pub model: Option<String>,
    /// `VISION_BUDDY_DOCUMENTS`, a glob of text files to index.
    pub documents: Option<String>,
    /// `VISION_BUDDY_MAX_ROUND_TRIPS`, the agent default if unset.
    pub max_round_trips: Option<usize>,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("documents", &self.documents)
            .field("max_round_trips", &self.max_round_trips)
            .finish_non_exhaustive()
    }
}

impl CliConfig {
    /// Reads the settings from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_key =
            get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let max_round_trips = match get("VISION_BUDDY_MAX_ROUND_TRIPS") {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        name: "VISION_BUDDY_MAX_ROUND_TRIPS",
                        value,
                    });
                }
            },
            None => None,
        };

        Ok(Self {
            api_key,
            base_url: get("OPENAI_BASE_URL"),
            model: get("OPENAI_MODEL"),
            documents: get("VISION_BUDDY_DOCUMENTS"),
            max_round_trips,
        })
    }
}
