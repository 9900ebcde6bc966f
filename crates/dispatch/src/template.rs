//! Path templates and parameter extraction.
//!
//! A template is a `/`-separated pattern where each segment is either a
//! literal token or a parameter token `<name>` / `<type:name>`. Supported
//! type tags are `int` and `float`; no tag means the field is kept as a
//! string. An unrecognised tag is rejected when the template is parsed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{DispatchError, Result};

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

/// One segment of a template.
#[derive(Debug, Clone)]
enum Segment {
    /// Must equal the path field exactly.
    Literal(String),
    /// Captures the path field under `name`, cast per `cast`.
    Param { name: String, cast: Cast },
}

/// Cast applied to a captured path field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cast {
    Str,
    Int,
    Float,
}

impl Cast {
    /// Cast a path field. A field that does not parse under the declared
    /// cast makes the template a non-match rather than an error.
    fn apply(self, field: &str) -> Option<Value> {
        match self {
            Cast::Str => Some(Value::String(field.to_string())),
            Cast::Int => field.parse::<i64>().ok().map(Value::from),
            Cast::Float => field
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
        }
    }
}

impl PathTemplate {
    /// Parse a template string.
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |message: String| DispatchError::InvalidTemplate {
            template: template.to_string(),
            message,
        };

        let mut segments = Vec::new();
        for token in template.split('/') {
            if token.starts_with('<') && token.ends_with('>') && token.len() >= 2 {
                let inner = &token[1..token.len() - 1];
                let (cast, name) = match inner.split_once(':') {
                    Some(("int", name)) => (Cast::Int, name),
                    Some(("float", name)) => (Cast::Float, name),
                    Some((tag, _)) => {
                        return Err(invalid(format!("unknown type tag '{}'", tag)));
                    }
                    None => (Cast::Str, inner),
                };
                if name.is_empty() {
                    return Err(invalid("empty parameter name".to_string()));
                }
                segments.push(Segment::Param {
                    name: name.to_string(),
                    cast,
                });
            } else {
                segments.push(Segment::Literal(token.to_string()));
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a path against this template, extracting typed parameters.
    ///
    /// Fields are paired positionally up to the shorter of the two lengths;
    /// trailing unmatched fields on either side are ignored. This leniency
    /// is what lets an ancestor directory declare one rule that covers many
    /// descendant paths. A single linear pass, first mismatch fails.
    pub fn match_path(&self, path: &str) -> Option<ParamSet> {
        let mut params = ParamSet::new();

        for (field, segment) in path.split('/').zip(self.segments.iter()) {
            match segment {
                Segment::Literal(literal) => {
                    if field != literal {
                        return None;
                    }
                }
                Segment::Param { name, cast } => {
                    let value = cast.apply(field)?;
                    params.insert(name.clone(), value);
                }
            }
        }

        Some(params)
    }
}

/// An ordered set of named parameter values.
///
/// Holds the parameters extracted from a path match with the matched rule's
/// extra metadata fields merged on top. Values are JSON values so integer
/// and float casts survive intact alongside arbitrary rule metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(Map<String, Value>);

impl ParamSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merge `fields` on top of this set; incoming fields win on collision.
    pub fn merge(&mut self, fields: &Map<String, Value>) {
        for (name, value) in fields {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Get a string parameter.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| DispatchError::InvalidParameter {
                param: name.to_string(),
                message: "expected a string".to_string(),
            })
    }

    /// Get an integer parameter.
    pub fn get_i64(&self, name: &str) -> Result<i64> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| DispatchError::InvalidParameter {
                param: name.to_string(),
                message: "expected an integer".to_string(),
            })
    }

    /// Get a float parameter; integer values are widened.
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| DispatchError::InvalidParameter {
                param: name.to_string(),
                message: "expected a number".to_string(),
            })
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.0
            .get(name)
            .ok_or_else(|| DispatchError::MissingParameter(name.to_string()))
    }

    /// Expand `{name}` placeholders in `template` with parameter values.
    ///
    /// Used for rule metadata like a source-path template `raw/{field}`.
    /// Strings substitute verbatim, numbers via their decimal rendering.
    pub fn expand(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after
                .find('}')
                .ok_or_else(|| DispatchError::InvalidParameter {
                    param: template.to_string(),
                    message: "unterminated '{' in template".to_string(),
                })?;
            let name = &after[..end];
            match self.require(name)? {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}
