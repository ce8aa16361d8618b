//! Static description of the résumé record.
//!
//! [`RESUME_SCHEMA`] is the single definition of the output shape. The prompt
//! builder renders it into format instructions for the model, and the
//! validator walks the same descriptor to check and normalise the response.
//! [`crate::output::StructuredResume`] mirrors it field for field; a unit test
//! keeps the two in sync.

use serde_json::{json, Map, Value};

/// Whether a field must be supplied by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Absent or `null` is a validation failure.
    Required,
    /// Absent or `null` is replaced by the kind's default.
    Optional,
}

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string. Default: `""`.
    Text,
    /// An ordered list of sub-records. Default: `[]`.
    List(&'static SchemaDescriptor),
}

impl FieldKind {
    /// The value substituted when an optional field is omitted.
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::List(_) => Value::Array(Vec::new()),
        }
    }
}

/// One field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
    pub requirement: Requirement,
}

impl FieldSpec {
    const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            description,
            requirement: Requirement::Required,
        }
    }

    const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            description,
            requirement: Requirement::Optional,
        }
    }

    const fn list(
        name: &'static str,
        item: &'static SchemaDescriptor,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::List(item),
            description,
            requirement: Requirement::Optional,
        }
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

/// A record: a title and its ordered fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SchemaDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the required fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.name)
    }

    /// Render this descriptor as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            let property = match field.kind {
                FieldKind::Text => json!({
                    "title": field.name,
                    "description": field.description,
                    "type": "string",
                }),
                FieldKind::List(item) => json!({
                    "title": field.name,
                    "description": field.description,
                    "type": "array",
                    "items": item.to_json_schema(),
                }),
            };
            properties.insert(field.name.to_string(), property);
        }

        json!({
            "title": self.title,
            "type": "object",
            "properties": properties,
            "required": self.required_fields().collect::<Vec<_>>(),
        })
    }

    /// Instructions telling the model exactly which JSON shape to emit.
    pub fn format_instructions(&self) -> String {
        let schema = serde_json::to_string(&self.to_json_schema())
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\n\
As an example, for the schema {{\"properties\": {{\"foo\": {{\"title\": \"Foo\", \"description\": \"a list of strings\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. \
The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\n\
Fields listed under \"required\" must always be present and must not be null. \
Other fields may be omitted when the résumé does not contain the information; \
use an empty string or an empty list rather than inventing a value.\n\n\
Respond with the JSON object only.\n\n\
Here is the output schema:\n```\n{schema}\n```"
        )
    }
}

// ── Résumé schema ────────────────────────────────────────────────────────

pub static EDUCATION_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    title: "Education",
    fields: &[
        FieldSpec::required(
            "organization",
            "School, university or training organization",
        ),
        FieldSpec::optional("degree", "Degree or qualification obtained, e.g. Bachelor, Master"),
        FieldSpec::optional("major", "Field of study or major"),
        FieldSpec::optional("graduation_year", "Year of graduation, e.g. 2021"),
    ],
};

pub static COURSE_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    title: "Course",
    fields: &[
        FieldSpec::required("course_name", "Name of the course or certificate"),
        FieldSpec::optional("organization", "Organization that delivered the course"),
        FieldSpec::optional("finish_date", "Completion date of the course"),
    ],
};

pub static SKILL_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    title: "Skill",
    fields: &[
        FieldSpec::required("skill_name", "Name of the skill, tool or language"),
        FieldSpec::optional("description", "Level, experience or context for the skill"),
    ],
};

/// The résumé record returned by the pipeline.
pub static RESUME_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    title: "Resume",
    fields: &[
        FieldSpec::required("name", "Full name of the candidate"),
        FieldSpec::optional(
            "desired_title",
            "Desired job title or position, e.g. Software Engineer, AI Engineer, Project Manager",
        ),
        FieldSpec::optional(
            "summary",
            "Summary of the candidate: background, experience and career goals",
        ),
        FieldSpec::optional("birth_date", "Date of birth"),
        FieldSpec::optional("gender", "Gender"),
        FieldSpec::optional("email", "Email address"),
        FieldSpec::optional("phone", "Phone number"),
        FieldSpec::optional("address", "Postal address or city of residence"),
        FieldSpec::list(
            "education",
            &EDUCATION_SCHEMA,
            "Education history: schools, degrees and majors",
        ),
        FieldSpec::list(
            "courses",
            &COURSE_SCHEMA,
            "Additional courses and certificates",
        ),
        FieldSpec::list(
            "skills",
            &SKILL_SCHEMA,
            "Professional skills, soft skills and programming languages",
        ),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_required_fields() {
        assert_eq!(RESUME_SCHEMA.required_fields().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(
            EDUCATION_SCHEMA.required_fields().collect::<Vec<_>>(),
            vec!["organization"]
        );
        assert_eq!(
            COURSE_SCHEMA.required_fields().collect::<Vec<_>>(),
            vec!["course_name"]
        );
        assert_eq!(
            SKILL_SCHEMA.required_fields().collect::<Vec<_>>(),
            vec!["skill_name"]
        );
    }

    #[test]
    fn json_schema_nests_list_items() {
        let schema = RESUME_SCHEMA.to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["email"]["type"], "string");
        assert_eq!(schema["properties"]["education"]["type"], "array");
        assert_eq!(
            schema["properties"]["education"]["items"]["required"],
            json!(["organization"])
        );
        assert_eq!(
            schema["properties"]["skills"]["items"]["properties"]["description"]["type"],
            "string"
        );
    }

    #[test]
    fn json_schema_lists_every_field() {
        let schema = RESUME_SCHEMA.to_json_schema();
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(properties.len(), RESUME_SCHEMA.fields.len());
        for field in RESUME_SCHEMA.fields {
            assert!(properties.contains_key(field.name), "missing {}", field.name);
        }
    }

    #[test]
    fn format_instructions_embed_schema() {
        let text = RESUME_SCHEMA.format_instructions();
        assert!(text.contains("JSON schema"));
        assert!(text.contains("\"graduation_year\""));
        assert!(text.contains("\"course_name\""));
        assert!(text.contains("\"required\":[\"name\"]"));
    }

    #[test]
    fn defaults_per_kind() {
        assert_eq!(FieldKind::Text.default_value(), json!(""));
        assert_eq!(FieldKind::List(&SKILL_SCHEMA).default_value(), json!([]));
    }

    #[test]
    fn lookup_by_name() {
        let field = RESUME_SCHEMA.field("skills").expect("skills field");
        assert_eq!(field.kind, FieldKind::List(&SKILL_SCHEMA));
        assert!(RESUME_SCHEMA.field("experience").is_none());
    }
}
