use std::fmt;

/// Errors raised by a configuration registry backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    LockPoisoned(&'static str),
    Serde(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::LockPoisoned(operation) => {
                write!(f, "registry lock poisoned during {}", operation)
            }
            RegistryError::Serde(message) => write!(f, "registry entry serialization error: {}", message),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Serde(err.to_string())
    }
}

/// Setup mistakes. Fatal: the caller must fix its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingRepositoryName,
    MissingRegistryEntry { repository: String },
    Registry(RegistryError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRepositoryName => write!(f, "repository name is required"),
            ConfigError::MissingRegistryEntry { repository } => write!(
                f,
                "no published configuration for repository {}; was the build-time plugin configured for it?",
                repository
            ),
            ConfigError::Registry(err) => write!(f, "registry error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for ConfigError {
    fn from(err: RegistryError) -> Self {
        ConfigError::Registry(err)
    }
}
