// SPDX-License-Identifier: MIT

//! Template loader - JSON and YAML documents
//!
//! YAML short-form intrinsics (`!Ref`, `!Equals`, `!Condition`, ...) are
//! rewritten to their long JSON form so the rest of the crate only ever sees
//! one shape.

use super::Template;
use crate::error::TemplateError;
use serde_json::{Map, Number, Value};
use serde_yaml::value::TaggedValue;
use std::fs;
use std::path::Path;

/// Loads templates from files or strings
pub struct TemplateLoader;

impl TemplateLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a template file, picking the format from the extension or content
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Template, TemplateError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| TemplateError::io(path.display().to_string(), e))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        log::debug!("Loading template {}", path.display());
        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Parse either format; JSON documents start with `{`
    pub fn parse(content: &str) -> Result<Template, TemplateError> {
        if content.trim_start().starts_with('{') {
            Self::parse_json(content)
        } else {
            Self::parse_yaml(content)
        }
    }

    pub fn parse_json(content: &str) -> Result<Template, TemplateError> {
        let root: Value = serde_json::from_str(content)?;
        Template::from_value(root)
    }

    pub fn parse_yaml(content: &str) -> Result<Template, TemplateError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
        Template::from_value(yaml_to_json(yaml)?)
    }
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, TemplateError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(mapping_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => short_form(*tagged)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        // NaN and infinities have no JSON number; keep their text
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

fn mapping_key(key: serde_yaml::Value) -> Result<String, TemplateError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        other => Err(TemplateError::UnsupportedKey(format!("{:?}", other))),
    }
}

/// `!Name value` → long-form intrinsic
fn short_form(tagged: TaggedValue) -> Result<Value, TemplateError> {
    let tag = tagged.tag.to_string();
    let name = tag.trim_start_matches('!').to_string();
    let value = yaml_to_json(tagged.value)?;

    let (key, value) = match name.as_str() {
        "Ref" | "Condition" => (name, value),
        "GetAtt" => {
            let value = match value {
                Value::String(s) => match s.split_once('.') {
                    Some((resource, attribute)) => Value::Array(vec![
                        Value::String(resource.to_string()),
                        Value::String(attribute.to_string()),
                    ]),
                    None => Value::String(s),
                },
                other => other,
            };
            ("Fn::GetAtt".to_string(), value)
        }
        _ => (format!("Fn::{}", name), value),
    };

    let mut map = Map::new();
    map.insert(key, value);
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_template() {
        let template = TemplateLoader::parse(
            r#"{"Conditions": {"IsProd": {"Fn::Equals": [{"Ref": "Env"}, "prod"]}}}"#,
        )
        .unwrap();
        assert_eq!(
            template.condition("IsProd"),
            Some(&json!({"Fn::Equals": [{"Ref": "Env"}, "prod"]}))
        );
    }

    #[test]
    fn test_parse_yaml_long_form() {
        let yaml = r#"
Parameters:
  Env:
    Type: String
Conditions:
  IsProd:
    Fn::Equals:
      - Ref: Env
      - prod
"#;
        let template = TemplateLoader::parse_yaml(yaml).unwrap();
        assert_eq!(
            template.condition("IsProd"),
            Some(&json!({"Fn::Equals": [{"Ref": "Env"}, "prod"]}))
        );
        assert_eq!(template.parameter_names(), vec!["Env"]);
    }

    #[test]
    fn test_parse_yaml_short_form() {
        let yaml = r#"
Conditions:
  IsProd: !Equals [!Ref Env, prod]
  IsNotProd: !Not [!Condition IsProd]
  Both: !And
    - !Condition IsProd
    - !Condition IsNotProd
"#;
        let template = TemplateLoader::parse_yaml(yaml).unwrap();
        assert_eq!(
            template.condition("IsProd"),
            Some(&json!({"Fn::Equals": [{"Ref": "Env"}, "prod"]}))
        );
        assert_eq!(
            template.condition("IsNotProd"),
            Some(&json!({"Fn::Not": [{"Condition": "IsProd"}]}))
        );
        assert_eq!(
            template.condition("Both"),
            Some(&json!({"Fn::And": [{"Condition": "IsProd"}, {"Condition": "IsNotProd"}]}))
        );
    }

    #[test]
    fn test_parse_yaml_get_att() {
        let yaml = r#"
Outputs:
  Arn:
    Value: !GetAtt Bucket.Arn
"#;
        let template = TemplateLoader::parse_yaml(yaml).unwrap();
        assert_eq!(
            template.root()["Outputs"]["Arn"]["Value"],
            json!({"Fn::GetAtt": ["Bucket", "Arn"]})
        );
    }

    #[test]
    fn test_yaml_numbers_and_keys() {
        let yaml = r#"
Conditions:
  IsOne: !Equals [!Ref Count, 1]
Mappings:
  Sizes:
    1: small
"#;
        let template = TemplateLoader::parse_yaml(yaml).unwrap();
        assert_eq!(
            template.condition("IsOne"),
            Some(&json!({"Fn::Equals": [{"Ref": "Count"}, 1]}))
        );
        assert_eq!(template.root()["Mappings"]["Sizes"]["1"], json!("small"));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            TemplateLoader::parse_yaml("- a\n- b\n"),
            Err(TemplateError::NotAMapping(_))
        ));
        assert!(matches!(
            TemplateLoader::parse_json("{not json"),
            Err(TemplateError::Json(_))
        ));
        assert!(matches!(
            TemplateLoader::parse_yaml("Conditions: [unclosed"),
            Err(TemplateError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = TemplateLoader::new().load("/nonexistent/template.yaml");
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }
}
