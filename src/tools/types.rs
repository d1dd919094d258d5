//! Declarative parameter schemas for tools.

use serde_json::{json, Map, Value};

/// Type tag for a single tool input field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<FieldType>),
    Object(ToolParameters),
}

impl FieldType {
    pub fn array_of(items: FieldType) -> Self {
        Self::Array(Box::new(items))
    }

    /// Name used in validation messages and JSON Schema.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            Self::Array(items) => json!({ "type": "array", "items": items.json_schema() }),
            Self::Object(params) => params.json_schema(),
            other => json!({ "type": other.type_name() }),
        }
    }
}

/// One named field of a tool's input.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    pub field_type: FieldType,
    pub required: bool,
}

/// Input schema of a tool: an object with named fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolParameters {
    fields: Vec<FieldSpec>,
}

impl ToolParameters {
    /// A schema with no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder: create an object schema with fields.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render as a JSON Schema object for advertising to the model.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut schema = field.field_type.json_schema();
            if let Some(obj) = schema.as_object_mut() {
                obj.insert("description".into(), field.description.clone().into());
            }
            properties.insert(field.name.clone(), schema);
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Builder for constructing tool parameter schemas.
pub struct ParameterBuilder {
    fields: Vec<FieldSpec>,
}

impl ParameterBuilder {
    /// Add a field of any type.
    pub fn field(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        field_type: FieldType,
        required: bool,
    ) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            description: description.into(),
            field_type,
            required,
        });
        self
    }

    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.field(name, description, FieldType::String, required)
    }

    pub fn integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.field(name, description, FieldType::Integer, required)
    }

    pub fn number(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.field(name, description, FieldType::Number, required)
    }

    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.field(name, description, FieldType::Boolean, required)
    }

    /// Add a list-of-strings field.
    pub fn string_list(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.field(
            name,
            description,
            FieldType::array_of(FieldType::String),
            required,
        )
    }

    /// Add a nested object field.
    pub fn object(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        nested: ToolParameters,
        required: bool,
    ) -> Self {
        self.field(name, description, FieldType::Object(nested), required)
    }

    pub fn build(self) -> ToolParameters {
        ToolParameters {
            fields: self.fields,
        }
    }
}
