mod defs;

use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;

/// Primitive or nested type of a schema field. Closed set: the validator and
/// the JSON-schema renderer both match exhaustively over it.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object(Vec<Field>),
    Array(Box<FieldType>),
}

/// One named field of a schema, with the human-readable hint that guides the
/// model provider's structured output.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub hint: &'static str,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, ty: FieldType, hint: &'static str) -> Self {
        Self {
            name,
            ty,
            hint,
            required: true,
        }
    }

    pub fn optional(name: &'static str, ty: FieldType, hint: &'static str) -> Self {
        Self {
            name,
            ty,
            hint,
            required: false,
        }
    }
}

/// Declarative description of a structured object. Immutable after
/// registration; used both to validate model output and to constrain
/// generation.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub fields: Vec<Field>,
}

/// A single validation failure: where it happened and why. Wrong types are
/// reported, never silently coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl Schema {
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        Self { name, fields }
    }

    /// Checks that `value` structurally conforms: every required field is
    /// present and every present field has the declared type. Unknown extra
    /// fields are permitted.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        validate_object(&self.fields, value, self.name)
    }

    /// Renders the schema as a JSON Schema object for the provider's
    /// structured-output mode, embedding the field hints as descriptions.
    pub fn to_json_schema(&self) -> Value {
        object_json_schema(&self.fields)
    }
}

fn validate_object(fields: &[Field], value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let Some(map) = value.as_object() else {
        return Err(SchemaViolation {
            path: path.to_string(),
            reason: format!("expected an object, got {}", type_name(value)),
        });
    };

    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        match map.get(field.name) {
            Some(v) => validate_type(&field.ty, v, &field_path)?,
            None if field.required => {
                return Err(SchemaViolation {
                    path: field_path,
                    reason: "missing required field".to_string(),
                });
            }
            None => {}
        }
    }

    Ok(())
}

fn validate_type(ty: &FieldType, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let mismatch = |expected: &str| SchemaViolation {
        path: path.to_string(),
        reason: format!("expected {}, got {}", expected, type_name(value)),
    };

    match ty {
        FieldType::String => value.is_string().then_some(()).ok_or_else(|| mismatch("a string")),
        FieldType::Number => value.is_number().then_some(()).ok_or_else(|| mismatch("a number")),
        FieldType::Integer => (value.is_i64() || value.is_u64())
            .then_some(())
            .ok_or_else(|| mismatch("an integer")),
        FieldType::Boolean => value
            .is_boolean()
            .then_some(())
            .ok_or_else(|| mismatch("a boolean")),
        FieldType::Object(fields) => validate_object(fields, value, path),
        FieldType::Array(inner) => {
            let Some(items) = value.as_array() else {
                return Err(mismatch("an array"));
            };
            for (i, item) in items.iter().enumerate() {
                validate_type(inner, item, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn object_json_schema(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        let mut prop = type_json_schema(&field.ty);
        if !field.hint.is_empty() {
            if let Some(obj) = prop.as_object_mut() {
                obj.insert("description".to_string(), json!(field.hint));
            }
        }
        properties.insert(field.name.to_string(), prop);
        if field.required {
            required.push(json!(field.name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn type_json_schema(ty: &FieldType) -> Value {
    match ty {
        FieldType::String => json!({"type": "string"}),
        FieldType::Number => json!({"type": "number"}),
        FieldType::Integer => json!({"type": "integer"}),
        FieldType::Boolean => json!({"type": "boolean"}),
        FieldType::Object(fields) => object_json_schema(fields),
        FieldType::Array(inner) => json!({"type": "array", "items": type_json_schema(inner)}),
    }
}

/// Read-only map of every schema the extractor may be asked for. Built once
/// at startup and shared; nothing mutates it afterwards.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, Schema>,
}

impl SchemaRegistry {
    pub fn bootstrap() -> Self {
        let mut schemas = HashMap::new();
        for schema in defs::all() {
            schemas.insert(schema.name, schema);
        }
        Self { schemas }
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

pub use defs::LOAN_APPLICATION_SCHEMA;
