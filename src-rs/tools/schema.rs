use serde_json::{json, Map, Value};

use crate::error::ToolError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl ParamKind {
    fn from_json_type(raw: Option<&str>) -> Self {
        match raw {
            Some("string") => ParamKind::String,
            Some("integer") => ParamKind::Integer,
            Some("number") => ParamKind::Number,
            Some("boolean") => ParamKind::Boolean,
            Some("object") => ParamKind::Object,
            Some("array") => ParamKind::Array,
            _ => ParamKind::Any,
        }
    }

    fn json_type(&self) -> Option<&'static str> {
        match self {
            ParamKind::String => Some("string"),
            ParamKind::Integer => Some("integer"),
            ParamKind::Number => Some("number"),
            ParamKind::Boolean => Some("boolean"),
            ParamKind::Object => Some("object"),
            ParamKind::Array => Some("array"),
            ParamKind::Any => None,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
            ParamKind::Any => true,
        }
    }
}

/// One named parameter of a tool's input.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    pub allowed: Option<Vec<Value>>,
    pub case_insensitive: bool,
}

impl ParamSpec {
    pub fn new(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: false,
            allowed: None,
            case_insensitive: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restricts a string parameter to a fixed set of values.
    pub fn one_of(mut self, values: &[&str], case_insensitive: bool) -> Self {
        self.allowed = Some(values.iter().map(|v| Value::String(v.to_string())).collect());
        self.case_insensitive = case_insensitive;
        self
    }

    fn check(&self, value: &Value) -> Result<(), ToolError> {
        if !self.kind.accepts(value) {
            return Err(ToolError::InvalidArgument(format!(
                "'{}' must be of type {}",
                self.name,
                self.kind.json_type().unwrap_or("any")
            )));
        }
        let allowed = match &self.allowed {
            Some(allowed) => allowed,
            None => return Ok(()),
        };
        let matched = allowed.iter().any(|item| enum_matches(item, value, self.case_insensitive));
        if matched {
            Ok(())
        } else {
            let listed: Vec<String> = allowed
                .iter()
                .map(|item| match item.as_str() {
                    Some(text) => text.to_string(),
                    None => item.to_string(),
                })
                .collect();
            Err(ToolError::InvalidArgument(format!(
                "'{}' must be one of [{}], got {}",
                self.name,
                listed.join(", "),
                value
            )))
        }
    }
}

/// Values are compared as-is, without trimming. Numbers compare by value so
/// `3` matches `3.0`.
fn enum_matches(item: &Value, value: &Value, case_insensitive: bool) -> bool {
    match (item, value) {
        (Value::String(expected), Value::String(raw)) if case_insensitive => {
            expected.eq_ignore_ascii_case(raw)
        }
        (Value::Number(expected), Value::Number(raw)) => match (expected.as_f64(), raw.as_f64()) {
            (Some(expected), Some(raw)) => expected == raw,
            _ => expected == raw,
        },
        _ => item == value,
    }
}

/// Typed description of the arguments a tool accepts.
#[derive(Clone, Debug, PartialEq)]
pub struct InputSchema {
    pub params: Vec<ParamSpec>,
    pub allow_additional: bool,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            allow_additional: false,
        }
    }
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Checks `args` against the declared parameters.
    ///
    /// `null` is treated the same as an absent argument, since models commonly
    /// emit explicit nulls for optional parameters.
    pub fn validate(&self, args: &Value) -> Result<(), ToolError> {
        let empty = Map::new();
        let object = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ToolError::InvalidArgument(format!(
                    "arguments must be an object, got {}",
                    other
                )))
            }
        };

        for spec in &self.params {
            match object.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(ToolError::InvalidArgument(format!(
                            "missing required argument '{}'",
                            spec.name
                        )));
                    }
                }
                Some(value) => spec.check(value)?,
            }
        }

        if !self.allow_additional {
            if let Some(unknown) = object.keys().find(|key| self.get(key).is_none()) {
                return Err(ToolError::InvalidArgument(format!(
                    "unexpected argument '{}'",
                    unknown
                )));
            }
        }
        Ok(())
    }

    /// Renders the schema as a JSON Schema object for the model.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.params {
            let mut prop = Map::new();
            if let Some(kind) = spec.kind.json_type() {
                prop.insert("type".to_string(), json!(kind));
            }
            if !spec.description.is_empty() {
                prop.insert("description".to_string(), json!(spec.description));
            }
            if let Some(allowed) = &spec.allowed {
                prop.insert("enum".to_string(), json!(allowed));
            }
            properties.insert(spec.name.clone(), Value::Object(prop));
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.allow_additional,
        })
    }

    /// Reads the subset of JSON Schema that remote providers publish.
    ///
    /// Nested schemas are not descended into; a nested object parameter is only
    /// checked for being an object.
    pub fn from_json_schema(raw: &Value) -> Self {
        let required: Vec<&str> = raw
            .get("required")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let mut params = Vec::new();
        if let Some(props) = raw.get("properties").and_then(|v| v.as_object()) {
            for (name, prop) in props {
                let kind = ParamKind::from_json_type(prop.get("type").and_then(|v| v.as_str()));
                let description = prop
                    .get("description")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let allowed = prop.get("enum").and_then(|v| v.as_array()).cloned();
                params.push(ParamSpec {
                    name: name.clone(),
                    kind,
                    description: description.to_string(),
                    required: required.contains(&name.as_str()),
                    allowed,
                    case_insensitive: false,
                });
            }
        }

        let allow_additional = raw
            .get("additionalProperties")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        Self {
            params,
            allow_additional,
        }
    }
}
