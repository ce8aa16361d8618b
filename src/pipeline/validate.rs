//! Output validation: model text → [`StructuredResume`].
//!
//! The hosted model is untrusted for exact output shape. Validation runs in
//! three steps:
//!
//! 1. **Locate** the JSON object: strip an outer Markdown code fence if the
//!    model added one, otherwise start at the first `{`. Parsing stops after
//!    the first complete value, so trailing prose is ignored.
//! 2. **Normalise** it against a [`SchemaDescriptor`]: fill declared defaults
//!    for omitted optional fields, stringify scalar numbers and booleans, drop
//!    unknown keys, and record every required field that is absent or `null`
//!    and every value of the wrong type.
//! 3. **Deserialise** the normalised value into [`StructuredResume`].
//!
//! Problems are collected rather than reported one at a time, so a single
//! [`Cv2JsonError::SchemaValidation`] names every offending field path
//! (`education[1].organization`).

use crate::error::Cv2JsonError;
use crate::output::StructuredResume;
use crate::schema::{FieldKind, Requirement, SchemaDescriptor, RESUME_SCHEMA};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse and validate a model response into a résumé.
pub fn validate_response(raw: &str) -> Result<StructuredResume, Cv2JsonError> {
    let value = parse_json_payload(raw)?;
    let normalised = normalise(&value, &RESUME_SCHEMA)?;
    serde_json::from_value(normalised)
        .map_err(|e| Cv2JsonError::Internal(format!("normalised résumé does not deserialise: {e}")))
}

/// Parse the JSON object embedded in a model response.
pub fn parse_json_payload(raw: &str) -> Result<Value, Cv2JsonError> {
    let candidate = locate_json(raw);
    if candidate.is_empty() {
        return Err(Cv2JsonError::invalid_response("model returned an empty response"));
    }

    // Only the first value counts; notes the model appends after it are ignored.
    let value: Value = serde_json::Deserializer::from_str(candidate)
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| Cv2JsonError::invalid_response("model returned an empty response"))?
        .map_err(|e| Cv2JsonError::invalid_response(format!("response is not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(Cv2JsonError::invalid_response(format!(
            "expected a JSON object, got {}",
            type_name(&value)
        )));
    }
    Ok(value)
}

/// Check `value` against `schema` and return the normalised object.
pub fn normalise(value: &Value, schema: &SchemaDescriptor) -> Result<Value, Cv2JsonError> {
    let mut problems = Vec::new();
    let normalised = normalise_object(value, schema, "", &mut problems);

    if problems.is_empty() {
        return Ok(normalised);
    }

    debug!("Schema validation failed: {:?}", problems);
    let detail = problems
        .iter()
        .map(|p| format!("{}: {}", p.path, p.reason))
        .collect::<Vec<_>>()
        .join("; ");
    let mut fields: Vec<String> = problems.into_iter().map(|p| p.path).collect();
    fields.dedup();
    Err(Cv2JsonError::SchemaValidation { fields, detail })
}

// ── Locating the payload ─────────────────────────────────────────────────

static RE_FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").unwrap());

fn locate_json(raw: &str) -> &str {
    let trimmed = raw.trim().trim_start_matches('\u{feff}');

    if trimmed.starts_with('{') {
        return trimmed;
    }

    if let Some(caps) = RE_FENCED_JSON.captures(trimmed) {
        if let Some(body) = caps.get(1) {
            return body.as_str().trim();
        }
    }

    // Prose before a bare object.
    match trimmed.find('{') {
        Some(start) => &trimmed[start..],
        None => trimmed,
    }
}

// ── Normalisation ────────────────────────────────────────────────────────

#[derive(Debug)]
struct Problem {
    path: String,
    reason: String,
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn normalise_object(
    value: &Value,
    schema: &SchemaDescriptor,
    prefix: &str,
    problems: &mut Vec<Problem>,
) -> Value {
    let Some(object) = value.as_object() else {
        problems.push(Problem {
            path: if prefix.is_empty() { "$".to_string() } else { prefix.to_string() },
            reason: format!("expected an object, got {}", type_name(value)),
        });
        return Value::Null;
    };

    let mut out = Map::new();
    for field in schema.fields {
        let path = join_path(prefix, field.name);
        let present = object.get(field.name).filter(|v| !v.is_null());

        let normalised = match (present, field.requirement) {
            (None, Requirement::Required) => {
                problems.push(Problem {
                    path,
                    reason: "required field is missing".to_string(),
                });
                continue;
            }
            (None, Requirement::Optional) => field.kind.default_value(),
            (Some(v), _) => match field.kind {
                FieldKind::Text => normalise_text(v, &path, problems),
                FieldKind::List(item) => normalise_list(v, item, &path, problems),
            },
        };
        out.insert(field.name.to_string(), normalised);
    }

    Value::Object(out)
}

fn normalise_text(value: &Value, path: &str, problems: &mut Vec<Problem>) -> Value {
    match value {
        Value::String(_) => value.clone(),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => {
            problems.push(Problem {
                path: path.to_string(),
                reason: format!("expected a string, got {}", type_name(other)),
            });
            Value::Null
        }
    }
}

fn normalise_list(
    value: &Value,
    item: &SchemaDescriptor,
    path: &str,
    problems: &mut Vec<Problem>,
) -> Value {
    let Some(elements) = value.as_array() else {
        problems.push(Problem {
            path: path.to_string(),
            reason: format!("expected a list, got {}", type_name(value)),
        });
        return Value::Null;
    };

    let items = elements
        .iter()
        .enumerate()
        .map(|(i, element)| normalise_object(element, item, &format!("{path}[{i}]"), problems))
        .collect();
    Value::Array(items)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
