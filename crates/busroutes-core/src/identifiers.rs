//! SQL identifier handling. Table and column names are never spliced into
//! statements as raw text: service codes go through an allow-list and every
//! identifier is validated and backtick-quoted before it reaches a query.

use std::fmt;

use serde::Serialize;

use crate::error::{PipelineError, Result};

/// MySQL's limit for table and column names.
pub const MAX_IDENTIFIER_LEN: usize = 64;

const ROUTES_TABLE_SUFFIX: &str = "_routes";

/// A user supplied service code such as `apsrtc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServiceCode(String);

impl ServiceCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        let max_len = MAX_IDENTIFIER_LEN - ROUTES_TABLE_SUFFIX.len();
        let allowed = !code.is_empty()
            && code.len() <= max_len
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if allowed {
            Ok(Self(code.to_string()))
        } else {
            Err(PipelineError::InvalidServiceCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The service-specific destination table, `{code}_routes`.
    pub fn routes_table(&self) -> SqlIdentifier {
        SqlIdentifier(format!("{}{}", self.0, ROUTES_TABLE_SUFFIX))
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A table or column name that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SqlIdentifier(String);

impl SqlIdentifier {
    pub fn new(name: &str) -> Result<Self> {
        let reason = if name.is_empty() {
            Some("identifier is empty")
        } else if name.chars().count() > MAX_IDENTIFIER_LEN {
            Some("identifier is longer than 64 characters")
        } else if name.contains('\0') {
            Some("identifier contains a NUL character")
        } else if name.ends_with(' ') {
            Some("identifier ends with a space")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PipelineError::InvalidIdentifier {
                name: name.to_string(),
                reason,
            }),
            None => Ok(Self(name.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form, safe to place in statement text.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0.replace('`', "``"))
    }
}

impl fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_code_derives_routes_table() {
        let code = ServiceCode::parse(" apsrtc ").expect("valid code");
        assert_eq!(code.as_str(), "apsrtc");
        assert_eq!(code.routes_table().name(), "apsrtc_routes");
        assert_eq!(code.routes_table().quoted(), "`apsrtc_routes`");
    }

    #[test]
    fn service_code_rejects_sql_text() {
        for raw in ["", "ap srtc", "x; DROP TABLE bus_routes", "ksrtc`", "tsrtc-2"] {
            assert!(
                matches!(ServiceCode::parse(raw), Err(PipelineError::InvalidServiceCode(_))),
                "{raw:?} should be rejected"
            );
        }
        assert!(ServiceCode::parse(&"a".repeat(58)).is_err());
        assert!(ServiceCode::parse(&"a".repeat(57)).is_ok());
    }

    #[test]
    fn identifiers_are_quoted_with_escaping() {
        let column = SqlIdentifier::new("Seat Availability").expect("spaces are allowed");
        assert_eq!(column.quoted(), "`Seat Availability`");

        let tricky = SqlIdentifier::new("a`b").expect("backticks are escaped");
        assert_eq!(tricky.quoted(), "`a``b`");
    }

    #[test]
    fn identifiers_reject_unusable_names() {
        assert!(SqlIdentifier::new("").is_err());
        assert!(SqlIdentifier::new("trailing ").is_err());
        assert!(SqlIdentifier::new("nul\0byte").is_err());
        assert!(SqlIdentifier::new(&"c".repeat(65)).is_err());
    }
}
