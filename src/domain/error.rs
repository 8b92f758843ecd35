//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for sipsim.
#[derive(Debug, thiserror::Error)]
pub enum SipsimError {
    #[error("invalid date range: {reason}")]
    InvalidRange { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no price available for {date}")]
    PriceUnavailable { date: NaiveDate },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SipsimError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }
}

impl From<&SipsimError> for std::process::ExitCode {
    fn from(err: &SipsimError) -> Self {
        let code: u8 = match err {
            SipsimError::Io(_) => 1,
            SipsimError::ConfigParse { .. }
            | SipsimError::ConfigMissing { .. }
            | SipsimError::ConfigInvalid { .. } => 2,
            SipsimError::Database { .. } | SipsimError::DatabaseQuery { .. } => 3,
            SipsimError::InvalidRange { .. } | SipsimError::InvalidParameter { .. } => 4,
            SipsimError::PriceUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_unavailable_names_the_date() {
        let err = SipsimError::PriceUnavailable {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert_eq!(err.to_string(), "no price available for 2024-03-01");
    }

    #[test]
    fn invalid_parameter_helper() {
        let err = SipsimError::invalid_parameter("amount", "must be positive");
        assert!(matches!(
            &err,
            SipsimError::InvalidParameter { name, .. } if name == "amount"
        ));
        assert_eq!(err.to_string(), "invalid parameter amount: must be positive");
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;
        let cases = [
            (SipsimError::invalid_range("x"), ExitCode::from(4)),
            (SipsimError::invalid_parameter("a", "b"), ExitCode::from(4)),
            (
                SipsimError::ConfigMissing {
                    section: "simulation".into(),
                    key: "start_date".into(),
                },
                ExitCode::from(2),
            ),
            (
                SipsimError::Database {
                    reason: "locked".into(),
                },
                ExitCode::from(3),
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(
                format!("{:?}", ExitCode::from(&err)),
                format!("{:?}", expected)
            );
        }
    }
}
