//! Label sets and their validation.
//!
//! A label set is a complete assignment of text values to a metric's declared
//! label names. Keys are kept ordered so a resolved label set doubles as a
//! stable value-store key. Validation is split in two, matching where the
//! cost belongs: name well-formedness is checked once at definition time,
//! schema-exact match once per observation.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::LabelError;

/// A mapping from label name to text value, ordered by name.
pub type LabelSet = BTreeMap<String, String>;

/// Build a [`LabelSet`] from `name => value` pairs.
///
/// Values are stringified, so numeric status codes and the like can be passed
/// directly:
///
/// ```
/// use turnstile::labels;
///
/// let set = labels! { "code" => 200, "method" => "get" };
/// assert_eq!(set["code"], "200");
/// ```
#[macro_export]
macro_rules! labels {
    () => { $crate::labels::LabelSet::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut set = $crate::labels::LabelSet::new();
        $( set.insert($name.to_string(), $value.to_string()); )+
        set
    }};
}

fn label_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*$").expect("label token pattern"))
}

fn metric_name_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("metric name pattern"))
}

/// Whether `name` is a well-formed label name.
pub(crate) fn is_label_token(name: &str) -> bool {
    label_token().is_match(name)
}

/// Whether `name` is a well-formed metric name.
pub(crate) fn is_metric_name(name: &str) -> bool {
    metric_name_token().is_match(name)
}

/// Validates candidate label mappings against a declared schema and a set of
/// names the metric kind reserves for itself.
///
/// Built once per metric definition and shared by every observation on it.
#[derive(Debug, Clone)]
pub struct LabelSetValidator {
    /// Declared label names, sorted and deduplicated
    expected: Vec<String>,
    reserved: &'static [&'static str],
}

impl LabelSetValidator {
    /// Build a validator for the given declared labels.
    ///
    /// The declared names themselves are validated, so a schema containing a
    /// malformed or reserved name fails here rather than at first use.
    pub(crate) fn new(
        declared: &[String],
        reserved: &'static [&'static str],
    ) -> Result<Self, LabelError> {
        let mut expected = declared.to_vec();
        expected.sort();
        expected.dedup();
        let validator = Self { expected, reserved };
        validator.validate_names(declared.iter().map(String::as_str))?;
        Ok(validator)
    }

    /// Check that every name is a valid token and none collides with a
    /// reserved name. Side-effect free, O(number of names).
    pub fn validate_names<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), LabelError> {
        for name in names {
            if !is_label_token(name) {
                return Err(LabelError::InvalidName(name.to_string()));
            }
            if self.reserved.contains(&name) {
                return Err(LabelError::Reserved(name.to_string()));
            }
        }
        Ok(())
    }

    /// Check that the key set of `labels` exactly equals the declared schema.
    ///
    /// Returns the mapping unchanged on success so calls can be chained.
    pub fn validate_labelset<'a>(&self, labels: &'a LabelSet) -> Result<&'a LabelSet, LabelError> {
        if labels.len() == self.expected.len()
            && labels.keys().zip(self.expected.iter()).all(|(a, b)| a == b)
        {
            return Ok(labels);
        }
        Err(LabelError::Mismatch {
            expected: self.expected.clone(),
            got: labels.keys().cloned().collect(),
        })
    }

    /// Declared label names, sorted.
    pub(crate) fn expected(&self) -> &[String] {
        &self.expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(declared: &[&str]) -> LabelSetValidator {
        let declared: Vec<String> = declared.iter().map(|s| s.to_string()).collect();
        LabelSetValidator::new(&declared, &["le"]).unwrap()
    }

    #[test]
    fn test_labels_macro_stringifies() {
        let set = labels! { "code" => 200, "method" => "get" };
        assert_eq!(set["code"], "200");
        assert_eq!(set["method"], "get");
        assert!(labels! {}.is_empty());
    }

    #[test]
    fn test_valid_tokens() {
        for name in ["method", "_private", "HTTP_code", "a1"] {
            assert!(is_label_token(name), "{name} should be valid");
        }
        for name in ["", "1abc", "with-dash", "with space", "with:colon"] {
            assert!(!is_label_token(name), "{name} should be invalid");
        }
    }

    #[test]
    fn test_metric_name_allows_colons() {
        assert!(is_metric_name("http:requests_total"));
        assert!(is_metric_name(":leading"));
        assert!(!is_metric_name("9starts_with_digit"));
        assert!(!is_metric_name("has-dash"));
    }

    #[test]
    fn test_validate_names_rejects_reserved() {
        let v = validator(&["method"]);
        assert_eq!(
            v.validate_names(["le"]),
            Err(LabelError::Reserved("le".to_string()))
        );
        assert_eq!(
            v.validate_names(["not a token"]),
            Err(LabelError::InvalidName("not a token".to_string()))
        );
        assert!(v.validate_names(["method", "path"]).is_ok());
    }

    #[test]
    fn test_validator_rejects_bad_schema() {
        let declared = vec!["le".to_string()];
        assert_eq!(
            LabelSetValidator::new(&declared, &["le"]).unwrap_err(),
            LabelError::Reserved("le".to_string())
        );
    }

    #[test]
    fn test_validate_labelset_exact_match() {
        let v = validator(&["method", "path"]);
        let full = labels! { "method" => "get", "path" => "/" };
        // Identity passthrough on success.
        assert_eq!(v.validate_labelset(&full).unwrap(), &full);

        let missing = labels! { "method" => "get" };
        assert!(matches!(
            v.validate_labelset(&missing),
            Err(LabelError::Mismatch { .. })
        ));

        let extra = labels! { "method" => "get", "path" => "/", "host" => "a" };
        assert!(matches!(
            v.validate_labelset(&extra),
            Err(LabelError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_mismatch_reports_both_sides() {
        let v = validator(&["method"]);
        let got = labels! { "path" => "/" };
        match v.validate_labelset(&got) {
            Err(LabelError::Mismatch { expected, got }) => {
                assert_eq!(expected, vec!["method".to_string()]);
                assert_eq!(got, vec!["path".to_string()]);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }
}
