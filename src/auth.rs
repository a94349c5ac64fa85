/// Compares the shared webhook secret against the token supplied on each
/// request. The expected token is resolved once at startup and held for the
/// lifetime of the process.
#[derive(Clone)]
pub struct TokenValidator {
    token: String,
}

impl TokenValidator {
    pub fn new(token: impl Into<String>) -> Self {
        TokenValidator {
            token: token.into(),
        }
    }

    /// Exact string equality. An absent token never matches.
    pub fn validate(&self, supplied: Option<&str>) -> bool {
        supplied.is_some_and(|t| t == self.token)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate_matching_token() {
        let validator = TokenValidator::new("s3cr3t");
        assert!(validator.validate(Some("s3cr3t")));
    }

    #[test]
    fn test_validate_rejects_mismatch() {
        let validator = TokenValidator::new("s3cr3t");
        assert!(!validator.validate(Some("S3cr3t")));
        assert!(!validator.validate(Some("s3cr3t ")));
        assert!(!validator.validate(Some("")));
        assert!(!validator.validate(None));
    }

    #[test]
    fn test_validate_empty_secret_only_matches_empty() {
        let validator = TokenValidator::new("");
        assert!(validator.validate(Some("")));
        assert!(!validator.validate(Some("anything")));
        assert!(!validator.validate(None));
    }
}
