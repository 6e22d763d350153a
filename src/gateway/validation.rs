//! Field-level request body validation.
//!
//! A [`Schema`] is a static list of [`FieldRule`]s. Validation collects the
//! first failure of every field and reports them all at once under
//! `details.errors`.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::ApiError;

/// `^https?://.+$`
pub static HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+$").expect("valid URL pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldKind {
    fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<&'static LazyLock<Regex>>,
    pub allowed: &'static [&'static str],
    pub message: Option<&'static str>,
}

impl FieldRule {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            pattern: None,
            allowed: &[],
            message: None,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub const fn object(name: &'static str) -> Self {
        Self::new(name, FieldKind::Object)
    }

    pub const fn array(name: &'static str) -> Self {
        Self::new(name, FieldKind::Array)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn min_len(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub const fn max_len(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub const fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub const fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }

    pub const fn pattern(mut self, re: &'static LazyLock<Regex>) -> Self {
        self.pattern = Some(re);
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = values;
        self
    }

    /// Replace the format/enum failure message.
    pub const fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// First failure for this field, if any.
    fn check(&self, value: Option<&Value>) -> Option<String> {
        let name = self.name;
        let present = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        };

        let Some(value) = present else {
            if self.required {
                return Some(
                    self.message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Le champ '{name}' est requis")),
                );
            }
            return None;
        };

        if !self.kind.matches(value) {
            return Some(format!(
                "Le champ '{name}' doit être de type {}",
                self.kind.label()
            ));
        }

        let length = match value {
            Value::String(s) => Some((s.chars().count(), "caractères")),
            Value::Array(items) => Some((items.len(), "éléments")),
            _ => None,
        };
        if let Some((len, unit)) = length {
            if let Some(min) = self.min_length
                && len < min
            {
                return Some(format!(
                    "Le champ '{name}' doit contenir au moins {min} {unit}"
                ));
            }
            if let Some(max) = self.max_length
                && len > max
            {
                return Some(format!(
                    "Le champ '{name}' ne peut pas dépasser {max} {unit}"
                ));
            }
        }

        if let Value::String(s) = value {
            if let Some(re) = self.pattern
                && !re.is_match(s)
            {
                return Some(
                    self.message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Le format du champ '{name}' est invalide")),
                );
            }
            if !self.allowed.is_empty() && !self.allowed.contains(&s.as_str()) {
                return Some(self.message.map(str::to_string).unwrap_or_else(|| {
                    format!("La valeur '{s}' n'est pas autorisée pour le champ '{name}'")
                }));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min
                && n < min
            {
                return Some(format!(
                    "Le champ '{name}' doit être supérieur ou égal à {min}"
                ));
            }
            if let Some(max) = self.max
                && n > max
            {
                return Some(format!(
                    "Le champ '{name}' doit être inférieur ou égal à {max}"
                ));
            }
        }

        None
    }
}

pub struct Schema {
    pub fields: &'static [FieldRule],
}

impl Schema {
    /// Check `body` and return it as an object.
    pub fn validate(&self, body: &Value) -> Result<Map<String, Value>, ApiError> {
        let Value::Object(object) = body else {
            return Err(ApiError::validation(
                "Le corps de la requête doit être un objet JSON",
            ));
        };

        let mut errors = Map::new();
        for rule in self.fields {
            if let Some(message) = rule.check(object.get(rule.name)) {
                errors.insert(rule.name.to_string(), Value::String(message));
            }
        }

        if errors.is_empty() {
            Ok(object.clone())
        } else {
            Err(ApiError::validation("Validation des données échouée")
                .with_details(json!({ "errors": errors })))
        }
    }

    /// Validate then deserialize into the upstream parameter type.
    pub fn parse<T: DeserializeOwned>(&self, body: &Value) -> Result<T, ApiError> {
        let object = self.validate(body)?;
        serde_json::from_value(Value::Object(object)).map_err(|e| {
            ApiError::validation("Validation des données échouée")
                .with_details(json!({ "errors": { "body": e.to_string() } }))
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    static SAMPLE: Schema = Schema {
        fields: &[
            FieldRule::string("name").required().min_len(3).max_len(10),
            FieldRule::string("url").pattern(&HTTP_URL),
            FieldRule::string("role").one_of(&["user", "assistant"]),
            FieldRule::array("ids").min_len(1),
            FieldRule::number("score").min(0.0).max(1.0),
            FieldRule::boolean("enabled"),
            FieldRule::string("hook")
                .pattern(&HTTP_URL)
                .message("URL invalide"),
        ],
    };

    fn errors(body: Value) -> Value {
        let err = SAMPLE.validate(&body).expect_err("should fail");
        err.details.expect("details")["errors"].clone()
    }

    #[test]
    fn accepts_valid_body() {
        let body = json!({ "name": "Marco", "url": "https://x.fr", "ids": ["a"], "score": 0.5 });
        assert!(SAMPLE.validate(&body).is_ok());
    }

    #[test]
    fn reports_every_failing_field() {
        let errors = errors(json!({
            "name": "Ge",
            "url": "ftp://x",
            "role": "robot",
            "ids": [],
            "score": 2,
            "enabled": "yes",
            "hook": "nope"
        }));
        assert_eq!(
            errors,
            json!({
                "name": "Le champ 'name' doit contenir au moins 3 caractères",
                "url": "Le format du champ 'url' est invalide",
                "role": "La valeur 'robot' n'est pas autorisée pour le champ 'role'",
                "ids": "Le champ 'ids' doit contenir au moins 1 éléments",
                "score": "Le champ 'score' doit être inférieur ou égal à 1",
                "enabled": "Le champ 'enabled' doit être de type boolean",
                "hook": "URL invalide"
            })
        );
    }

    #[test]
    fn empty_string_counts_as_missing() {
        assert_eq!(
            errors(json!({ "name": "" })),
            json!({ "name": "Le champ 'name' est requis" })
        );
    }

    #[test]
    fn rejects_non_object_bodies() {
        let err = SAMPLE.validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.message, "Le corps de la requête doit être un objet JSON");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(SAMPLE.validate(&json!({ "name": "Éléa" })).is_ok());
        assert_eq!(
            errors(json!({ "name": "ééééééééééé" })),
            json!({ "name": "Le champ 'name' ne peut pas dépasser 10 caractères" })
        );
    }
}
