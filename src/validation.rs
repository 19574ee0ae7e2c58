use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("subdomain is empty")]
    Empty,
    #[error("subdomain too long (max 63 characters)")]
    TooLong,
    #[error("invalid subdomain: only \"a-z\", \"0-9\" and \"-\" is allowed")]
    InvalidCharacters,
    #[error("subdomain must not start or end with '-'")]
    LeadingOrTrailingHyphen,
    #[error("subdomain must not contain '.'")]
    ContainsDot,
    #[error("invalid update key: must be base64 ({0})")]
    InvalidUpdateKey(base64::DecodeError),
}

lazy_static::lazy_static! {
    /// A single DNS label: lowercase letters, digits and interior '-'.
    static ref SUBDOMAIN_RE: Regex = Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap();
}

/// Validate a candidate subdomain label. Dots are rejected explicitly so a
/// claim can never span more than one label; the fqdn/host mapping relies on
/// that.
pub fn validate_subdomain_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    if name.len() > 63 {
        return Err(ValidationError::TooLong);
    }
    if name.contains('.') {
        return Err(ValidationError::ContainsDot);
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(ValidationError::LeadingOrTrailingHyphen);
    }
    if !SUBDOMAIN_RE.is_match(name) {
        return Err(ValidationError::InvalidCharacters);
    }

    Ok(())
}

/// Validate a nameserver update key: it must decode as base64, since it is
/// handed to the TSIG signer as raw key bytes.
pub fn validate_update_key(key: &str) -> Result<(), ValidationError> {
    BASE64
        .decode(key)
        .map(|_| ())
        .map_err(ValidationError::InvalidUpdateKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_labels() {
        for name in ["a", "my-host", "host1", "0x0", "a-b-c"] {
            assert!(validate_subdomain_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_bad_labels() {
        assert!(matches!(
            validate_subdomain_name(""),
            Err(ValidationError::Empty)
        ));
        assert!(matches!(
            validate_subdomain_name(&"a".repeat(64)),
            Err(ValidationError::TooLong)
        ));
        assert!(matches!(
            validate_subdomain_name("-host"),
            Err(ValidationError::LeadingOrTrailingHyphen)
        ));
        assert!(matches!(
            validate_subdomain_name("host-"),
            Err(ValidationError::LeadingOrTrailingHyphen)
        ));
        assert!(matches!(
            validate_subdomain_name("my.host"),
            Err(ValidationError::ContainsDot)
        ));
        assert!(matches!(
            validate_subdomain_name("MyHost"),
            Err(ValidationError::InvalidCharacters)
        ));
        assert!(matches!(
            validate_subdomain_name("my_host"),
            Err(ValidationError::InvalidCharacters)
        ));
    }

    #[test]
    fn update_key_must_be_base64() {
        assert!(validate_update_key("bm90YXJlYWxrZXk=").is_ok());
        assert!(validate_update_key("not base64!!").is_err());
    }
}
