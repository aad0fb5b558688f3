use serde_json::{Map, Value};

use crate::compat::Aliases;
use crate::normalization::normalize_text;

/// A loosely-typed request body. Lookups go through alias tables so
/// that code past this point only deals with canonical fields.
#[derive(Clone, Debug)]
pub struct Payload<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Payload<'a> {
    /// Wraps a request body; anything other than an object behaves as
    /// an empty object.
    pub fn new(value: &'a Value) -> Self {
        Payload {
            fields: value.as_object(),
        }
    }

    /// The first aliased value that is present and not `null`.
    pub fn value(&self, aliases: Aliases) -> Option<&'a Value> {
        let fields = self.fields?;

        aliases
            .iter()
            .filter_map(|name| fields.get(*name))
            .find(|value| !value.is_null())
    }

    /// The first aliased value that is a string.
    pub fn string(&self, aliases: Aliases) -> Option<&'a str> {
        let fields = self.fields?;

        aliases
            .iter()
            .filter_map(|name| fields.get(*name))
            .find_map(Value::as_str)
    }

    /// The first aliased string, trimmed, or empty if there is none.
    pub fn trimmed(&self, aliases: Aliases) -> String {
        self.string(aliases).map(normalize_text).unwrap_or_default()
    }

    /// The aliased value coerced to a number; `NaN` if absent.
    pub fn number(&self, aliases: Aliases) -> f64 {
        self.value(aliases).map(to_number).unwrap_or(f64::NAN)
    }

    /// Like [`Payload::number`], but an explicit `null` under the primary
    /// name counts as zero when no alias carries a value.
    pub fn number_or_null(&self, aliases: Aliases) -> f64 {
        let primary = || {
            let name = aliases.first()?;
            self.fields?.get(*name)
        };

        self.value(aliases)
            .or_else(primary)
            .map(to_number)
            .unwrap_or(f64::NAN)
    }

    /// The aliased value's truthiness; `false` if absent.
    pub fn truthy(&self, aliases: Aliases) -> bool {
        self.value(aliases).map(is_truthy).unwrap_or(false)
    }
}

/// Coerces a JSON value to a number the way a JavaScript client would
/// expect `Number(value)` to behave.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();

            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// JavaScript truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0 && !n.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{is_truthy, to_number, Payload};

    const NAMES: &[&str] = &["rating", "puntuacion"];

    #[test]
    fn first_present_alias_wins() {
        let body = json!({ "puntuacion": 2, "rating": 4 });
        assert_eq!(Payload::new(&body).number(NAMES), 4.0);

        let body = json!({ "puntuacion": 2, "rating": null });
        assert_eq!(Payload::new(&body).number(NAMES), 2.0);
    }

    #[test]
    fn explicit_null_counts_as_zero() {
        let body = json!({ "rating": null });
        assert!(Payload::new(&body).number(NAMES).is_nan());
        assert_eq!(Payload::new(&body).number_or_null(NAMES), 0.0);

        let body = json!({ "puntuacion": null });
        assert!(Payload::new(&body).number_or_null(NAMES).is_nan());

        let body = json!({ "rating": null, "puntuacion": 2 });
        assert_eq!(Payload::new(&body).number_or_null(NAMES), 2.0);
    }

    #[test]
    fn string_lookup_skips_non_strings() {
        let body = json!({ "rating": 4, "puntuacion": " five " });
        let payload = Payload::new(&body);

        assert_eq!(payload.string(NAMES), Some(" five "));
        assert_eq!(payload.trimmed(NAMES), "five");
        assert_eq!(payload.trimmed(&["missing"]), "");
    }

    #[test]
    fn non_objects_behave_as_empty() {
        let body = json!([1, 2, 3]);
        let payload = Payload::new(&body);

        assert!(payload.value(NAMES).is_none());
        assert!(payload.number(NAMES).is_nan());
        assert!(!payload.truthy(NAMES));
    }

    #[test]
    fn numbers_coerce_like_javascript() {
        assert_eq!(to_number(&json!("1995")), 1995.0);
        assert_eq!(to_number(&json!(" 12.5 ")), 12.5);
        assert_eq!(to_number(&json!("")), 0.0);
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!(null)), 0.0);
        assert!(to_number(&json!("abc")).is_nan());
        assert!(to_number(&json!({})).is_nan());
    }

    #[test]
    fn truthiness_matches_javascript() {
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!([])));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(null)));
    }
}
