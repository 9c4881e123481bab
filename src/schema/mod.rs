//! Stage Schema Registry
//!
//! Declarative shape descriptions for every stage's output. A schema is a
//! tree of named fields - scalar, list-of-scalar, object, or
//! list-of-object - each either required or optional-with-default.
//!
//! Validation is structural (types and required-field presence), not
//! semantic. Every optional field carries a default, so a
//! partially-populated recovered value still validates: missing optional
//! sections simply render empty downstream instead of blocking the
//! pipeline. Each schema's required fields form the minimal subtree its
//! stage fallback must satisfy.
//!
//! Validation returns a corrected copy with defaults filled in; running it
//! twice is a no-op.

use serde_json::{Map, Value, json};

use crate::types::SchemaError;

// =============================================================================
// Field Kinds
// =============================================================================

/// The type of one schema field
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Number,
    Bool,
    /// List of strings
    StringList,
    /// Nested object with its own field specs. Unknown keys are preserved.
    Object(Vec<FieldSpec>),
    /// List of objects, each validated against the same specs
    ObjectList(Vec<FieldSpec>),
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::StringList => "array of strings",
            Self::Object(_) => "object",
            Self::ObjectList(_) => "array of objects",
        }
    }

    /// Built-in default when an optional field declares none explicitly
    fn empty_default(&self) -> Value {
        match self {
            Self::String => json!(""),
            Self::Number => json!(0),
            Self::Bool => json!(false),
            Self::StringList | Self::ObjectList(_) => json!([]),
            Self::Object(specs) => {
                let mut map = Map::new();
                for spec in specs {
                    map.insert(spec.name.to_string(), spec.default_value());
                }
                Value::Object(map)
            }
        }
    }
}

// =============================================================================
// Field Spec
// =============================================================================

/// One named field in a stage schema
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    default: Option<Value>,
    pub description: &'static str,
}

impl FieldSpec {
    /// A field that must be present for the stage output to validate
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            description: "",
        }
    }

    /// A field filled from its default when the model omits it
    pub fn optional(name: &'static str, kind: FieldKind, default: Value) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
            description: "",
        }
    }

    /// An optional field defaulting to the empty value of its kind
    pub fn optional_empty(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            description: "",
        }
    }

    /// Attach a description, surfaced in the prompt's schema rendering
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn default_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.kind.empty_default())
    }
}

// =============================================================================
// Stage Schema
// =============================================================================

/// Declarative description of one stage's expected output
#[derive(Debug, Clone)]
pub struct StageSchema {
    pub name: &'static str,
    fields: Vec<FieldSpec>,
}

impl StageSchema {
    pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { name, fields }
    }

    /// Structurally validate `value`, filling optional-field defaults.
    ///
    /// Returns the corrected value on success. Idempotent: validating the
    /// returned value yields it unchanged.
    pub fn validate(&self, value: &Value) -> Result<Value, SchemaError> {
        let map = value.as_object().ok_or_else(|| {
            SchemaError::new("stage output must be a JSON object")
                .at(self.name)
                .with_comparison("object", json_kind(value))
        })?;

        let corrected = validate_object(&self.fields, map, self.name)?;
        Ok(Value::Object(corrected))
    }

    /// Render the schema as a JSON Schema object for prompt embedding
    pub fn to_json_schema(&self) -> Value {
        object_schema(&self.fields)
    }

    /// Prompt suffix instructing the model to match this schema
    pub fn format_instructions(&self) -> String {
        let schema = self.to_json_schema();
        let rendered = serde_json::to_string_pretty(&schema)
            .unwrap_or_else(|_| schema.to_string());
        format!(
            "Respond with valid JSON matching this schema:\n\n{}\n\nReturn ONLY the JSON object. \
             No markdown code blocks, no explanations, no text before or after.",
            rendered
        )
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_object(
    specs: &[FieldSpec],
    map: &Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>, SchemaError> {
    // Unknown keys pass through untouched: open-ended sections (e.g. page
    // maps) carry keys no schema can enumerate.
    let mut corrected = map.clone();

    for spec in specs {
        let field_path = format!("{}.{}", path, spec.name);
        match map.get(spec.name) {
            Some(value) => {
                let checked = validate_field(spec, value, &field_path)?;
                corrected.insert(spec.name.to_string(), checked);
            }
            None if spec.required => {
                return Err(SchemaError::new("missing required field").at(field_path));
            }
            None => {
                corrected.insert(spec.name.to_string(), spec.default_value());
            }
        }
    }

    Ok(corrected)
}

fn validate_field(spec: &FieldSpec, value: &Value, path: &str) -> Result<Value, SchemaError> {
    let mismatch = || {
        SchemaError::new("wrong type")
            .at(path)
            .with_comparison(spec.kind.name(), json_kind(value))
    };

    match &spec.kind {
        FieldKind::String => value.is_string().then(|| value.clone()).ok_or_else(mismatch),
        FieldKind::Number => value.is_number().then(|| value.clone()).ok_or_else(mismatch),
        FieldKind::Bool => value.is_boolean().then(|| value.clone()).ok_or_else(mismatch),
        FieldKind::StringList => {
            let items = value.as_array().ok_or_else(mismatch)?;
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(SchemaError::new("list element is not a string")
                        .at(format!("{}[{}]", path, i))
                        .with_comparison("string", json_kind(item)));
                }
            }
            Ok(value.clone())
        }
        FieldKind::Object(inner) => {
            let map = value.as_object().ok_or_else(mismatch)?;
            Ok(Value::Object(validate_object(inner, map, path)?))
        }
        FieldKind::ObjectList(inner) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            let mut corrected = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                let map = item.as_object().ok_or_else(|| {
                    SchemaError::new("list element is not an object")
                        .at(&item_path)
                        .with_comparison("object", json_kind(item))
                })?;
                corrected.push(Value::Object(validate_object(inner, map, &item_path)?));
            }
            Ok(Value::Array(corrected))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// JSON Schema rendering
// =============================================================================

fn object_schema(specs: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for spec in specs {
        properties.insert(spec.name.to_string(), field_schema(spec));
        if spec.required {
            required.push(json!(spec.name));
        }
    }

    json!({
        "type": "object",
        "required": required,
        "properties": properties,
    })
}

fn field_schema(spec: &FieldSpec) -> Value {
    let mut schema = match &spec.kind {
        FieldKind::String => json!({"type": "string"}),
        FieldKind::Number => json!({"type": "number"}),
        FieldKind::Bool => json!({"type": "boolean"}),
        FieldKind::StringList => json!({"type": "array", "items": {"type": "string"}}),
        FieldKind::Object(inner) => object_schema(inner),
        FieldKind::ObjectList(inner) => json!({"type": "array", "items": object_schema(inner)}),
    };

    if !spec.description.is_empty()
        && let Some(map) = schema.as_object_mut()
    {
        map.insert("description".to_string(), json!(spec.description));
    }

    schema
}

// =============================================================================
// Tests
// =============================================================================
