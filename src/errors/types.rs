use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClawscanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid skill: {0}")]
    InvalidSkill(String),

    #[error("Rule error: {0}")]
    Rule(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Attestation error: {0}")]
    Attestation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ClawscanError {
    fn from(e: reqwest::Error) -> Self {
        ClawscanError::Network(e.to_string())
    }
}

impl ClawscanError {
    /// Process exit code used by the CLI when a command fails outright.
    ///
    /// Scan verdicts use 0/1/2 themselves, so configuration problems are
    /// kept distinct at 3.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClawscanError::Config(_) => 3,
            ClawscanError::InvalidSkill(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ClawscanError::Config("x".into()).exit_code(), 3);
        assert_eq!(ClawscanError::InvalidSkill("x".into()).exit_code(), 2);
        assert_eq!(ClawscanError::Rule("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ClawscanError = io.into();
        assert!(matches!(err, ClawscanError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
