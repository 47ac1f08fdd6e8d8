//! Dictionary (string-keyed map) detection.
//!
//! Decided once per object occurrence from its keys and the types already
//! observed for its values. An occurrence classified as an object is never
//! revisited, so the same position can end up `Anything` if some samples
//! look like maps and others like records.
use once_cell::sync::Lazy;
use regex::Regex;

use super::classify::DateFormats;
use super::unify::{join, ObjectRepr, Ty};
use crate::config::DictionaryDetection;

static INTEGER_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("static regex"));

static UUID_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static regex")
});

// shorter hex keys are too easily real words ("add", "cafe", "a1")
static HEX_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{8,}$").expect("static regex"));

fn looks_like_identifier(key: &str, dates: &DateFormats) -> bool {
    INTEGER_KEY.is_match(key)
        || UUID_KEY.is_match(key)
        || (HEX_KEY.is_match(key) && key.bytes().any(|b| b.is_ascii_digit()))
        || dates.matches(key)
}

/// Returns the unified value type when the object should be a dictionary.
pub fn detect<'a, O, I>(
    policy: &DictionaryDetection,
    dates: &DateFormats,
    entries: I,
) -> Option<Ty<O>>
where
    O: ObjectRepr + 'a,
    I: IntoIterator<Item = (&'a str, &'a Ty<O>)> + Clone,
{
    if !policy.enabled {
        return None;
    }
    let key_count = entries.clone().into_iter().count();
    if key_count == 0 {
        return None;
    }
    let many_keys = key_count > policy.max_fields;
    let id_keys = policy.identifier_keys
        && entries.clone().into_iter().all(|(key, _)| looks_like_identifier(key, dates));
    if !many_keys && !id_keys {
        return None;
    }
    let value = entries
        .into_iter()
        .fold(Ty::Unknown, |acc, (_, ty)| join(acc, ty.clone()));
    tracing::trace!(key_count, many_keys, id_keys, uniform = !value.is_anything(), "dictionary candidate");
    (!value.is_anything()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::inference::obj::Shape;
    use crate::inference::unify::Scalar;

    fn dates() -> DateFormats {
        DateFormats::new(&Config::default().date_formats)
    }

    fn run(policy: &DictionaryDetection, entries: &[(&str, Ty<Shape>)]) -> Option<Ty<Shape>> {
        let pairs: Vec<(&str, &Ty<Shape>)> = entries.iter().map(|(k, t)| (*k, t)).collect();
        detect(policy, &dates(), pairs.iter().copied())
    }

    #[test]
    fn identifier_keys() {
        let d = dates();
        assert!(looks_like_identifier("42", &d));
        assert!(looks_like_identifier("550e8400-e29b-41d4-a716-446655440000", &d));
        assert!(looks_like_identifier("9f86d081884c7d65", &d));
        assert!(looks_like_identifier("2024-03-01", &d));
        assert!(!looks_like_identifier("name", &d));
        assert!(!looks_like_identifier("cafe", &d));
        assert!(!looks_like_identifier("a1", &d));
        assert!(!looks_like_identifier("firstName", &d));
    }

    #[test]
    fn numeric_keys_with_uniform_values_become_a_map() {
        let policy = DictionaryDetection::default();
        let int = Ty::scalar(Scalar::Integer);
        let value = run(&policy, &[("1", int.clone()), ("2", Ty::scalar(Scalar::Float))]);
        assert_eq!(value, Some(Ty::scalar(Scalar::Float)));
        assert_eq!(run(&policy, &[("1", int.clone()), ("2", Ty::scalar(Scalar::String))]), None);
        assert_eq!(run(&policy, &[("id", int.clone()), ("count", int)]), None);
    }

    #[test]
    fn cardinality_threshold() {
        let policy = DictionaryDetection { max_fields: 2, ..DictionaryDetection::default() };
        let entries = [
            ("alpha", Ty::scalar(Scalar::Boolean)),
            ("beta", Ty::scalar(Scalar::Boolean)),
            ("gamma", Ty::Null),
        ];
        let value = run(&policy, &entries).unwrap();
        assert_eq!(value, Ty::Scalar { kind: Scalar::Boolean, nullable: true });
        assert_eq!(run(&policy, &entries[..2]), None);
    }

    #[test]
    fn disabled_policy_never_detects() {
        let policy = DictionaryDetection { enabled: false, ..DictionaryDetection::default() };
        assert_eq!(run(&policy, &[("1", Ty::scalar(Scalar::Integer))]), None);
    }
}
