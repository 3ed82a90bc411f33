use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] barflow_core::ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] barflow_core::ConfigError),

    #[error("failed to load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("no ticker succeeded ({failed} failed)")]
    NoSuccessfulTickers { failed: usize },

    #[error(transparent)]
    Persistence(#[from] barflow_core::PersistenceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Dotenv(_) => 2,
            Self::NoSuccessfulTickers { .. } => 3,
            Self::Persistence(_) => 4,
            Self::Logging(_) => 10,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use barflow_core::ConfigError;

    use super::*;

    #[test]
    fn exit_codes_distinguish_categories() {
        let config = CliError::from(ConfigError::MissingApiKey { var: "POLYGON_API" });
        assert_eq!(config.exit_code(), 2);
        assert!(config.to_string().contains("POLYGON_API"));

        assert_eq!(CliError::NoSuccessfulTickers { failed: 3 }.exit_code(), 3);
        assert_eq!(
            CliError::Io(std::io::Error::other("disk full")).exit_code(),
            10
        );
    }
}
