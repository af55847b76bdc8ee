use formats::LoadError;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Json(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(msg) => write!(f, "invalid viewer configuration: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid viewer configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Why the map could not be brought up. Every variant is terminal: nothing is
/// retried and no partial layers are shown.
#[derive(Debug, Clone, PartialEq)]
pub enum InitError {
    Load(LoadError),
    Config(ConfigError),
    AlreadyComposed,
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::Load(e) => write!(f, "{e}"),
            InitError::Config(e) => write!(f, "{e}"),
            InitError::AlreadyComposed => write!(f, "map layers already composed"),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::Load(e) => Some(e),
            InitError::Config(e) => Some(e),
            InitError::AlreadyComposed => None,
        }
    }
}

impl From<LoadError> for InitError {
    fn from(e: LoadError) -> Self {
        InitError::Load(e)
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        InitError::Config(e)
    }
}
