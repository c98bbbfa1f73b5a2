// SPDX-License-Identifier: MIT

//! Shape parsers for condition intrinsics
//!
//! Each parser returns the reason it rejected a value instead of failing,
//! so the resolver can degrade the node and report why.

use super::ast::{Comparand, EqualsClause};
use super::reference::Reference;
use crate::template::value_kind;
use serde_json::Value;

pub const FN_EQUALS: &str = "Fn::Equals";
pub const FN_AND: &str = "Fn::And";
pub const FN_OR: &str = "Fn::Or";
pub const FN_NOT: &str = "Fn::Not";

/// One side of an `Fn::Equals`
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Literal(String),
    Reference(Reference),
}

/// Parse the operand list of an `Fn::Equals`
///
/// `None` for any shape other than two scalar-or-`Ref` operands with at
/// least one `Ref`.
pub fn parse_equals(value: &Value) -> Option<EqualsClause> {
    equals_clause(value).ok()
}

/// Why `parse_equals` rejects `value`, if it does
pub fn equals_rejection(value: &Value) -> Option<&'static str> {
    equals_clause(value).err()
}

pub(crate) fn equals_clause(value: &Value) -> Result<EqualsClause, &'static str> {
    let items = value
        .as_array()
        .ok_or("expected a sequence of two operands")?;
    let [left, right] = items.as_slice() else {
        return Err("expected exactly two operands");
    };

    match (operand(left)?, operand(right)?) {
        (Operand::Reference(subject), Operand::Reference(other)) => Ok(EqualsClause {
            subject: subject.token(),
            comparand: Comparand::Reference(other.token()),
        }),
        (Operand::Reference(subject), Operand::Literal(literal))
        | (Operand::Literal(literal), Operand::Reference(subject)) => Ok(EqualsClause {
            subject: subject.token(),
            comparand: Comparand::Literal(literal),
        }),
        (Operand::Literal(_), Operand::Literal(_)) => Err("neither operand is a Ref"),
    }
}

fn operand(value: &Value) -> Result<Operand, &'static str> {
    match value {
        Value::String(s) => Ok(Operand::Literal(s.clone())),
        Value::Number(n) => Ok(Operand::Literal(n.to_string())),
        Value::Bool(b) => Ok(Operand::Literal(b.to_string())),
        Value::Null => Err("operand is null"),
        Value::Array(_) => Err("operand is a sequence"),
        Value::Object(map) => {
            if let Some(reference) = Reference::from_expression(value) {
                Ok(Operand::Reference(reference))
            } else if map.len() != 1 {
                Err("operand mapping must have exactly one key")
            } else if !map.contains_key("Ref") {
                Err("only Ref is supported inside Fn::Equals")
            } else {
                Err("Ref value must be a string")
            }
        }
    }
}

/// Target name of a `{"Condition": name}` child
pub(crate) fn condition_reference(value: &Value) -> Result<&str, String> {
    let map = value
        .as_object()
        .ok_or_else(|| format!("expected a Condition mapping, found {}", value_kind(value)))?;
    if map.len() != 1 {
        return Err(format!(
            "Condition mapping must have exactly one key, found {}",
            map.len()
        ));
    }

    match map.get("Condition") {
        Some(Value::String(target)) => Ok(target.as_str()),
        Some(other) => Err(format!(
            "Condition name must be a string, found {}",
            value_kind(other)
        )),
        None => Err("child must be a {\"Condition\": name} reference".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::reference::ReferenceToken;
    use serde_json::json;

    #[test]
    fn test_reference_and_literal() {
        let clause = parse_equals(&json!([{"Ref": "AWS::Region"}, "us-east-1"])).unwrap();
        assert_eq!(clause.subject, ReferenceToken::of("AWS::Region"));
        assert_eq!(clause.comparand, Comparand::from("us-east-1"));
    }

    #[test]
    fn test_operand_order_does_not_matter() {
        let left = parse_equals(&json!([{"Ref": "myParameter"}, 1])).unwrap();
        let right = parse_equals(&json!([1, {"Ref": "myParameter"}])).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.comparand, Comparand::from("1"));
    }

    #[test]
    fn test_scalar_literals() {
        let clause = parse_equals(&json!([{"Ref": "Flag"}, true])).unwrap();
        assert_eq!(clause.comparand, Comparand::from("true"));

        let clause = parse_equals(&json!([{"Ref": "Ratio"}, 1.5])).unwrap();
        assert_eq!(clause.comparand, Comparand::from("1.5"));

        let clause = parse_equals(&json!([{"Ref": "Env"}, ""])).unwrap();
        assert_eq!(clause.comparand, Comparand::from(""));
    }

    #[test]
    fn test_two_references() {
        let clause = parse_equals(&json!([{"Ref": "AWS::Region"}, {"Ref": "PrimaryRegion"}]))
            .unwrap();
        assert_eq!(clause.subject, ReferenceToken::of("AWS::Region"));
        assert_eq!(
            clause.comparand,
            Comparand::Reference(ReferenceToken::of("PrimaryRegion"))
        );
    }

    #[test]
    fn test_rejected_shapes() {
        let rejected = [
            json!([[{"Ref": "Env"}], "prod"]),
            json!([{"Ref": "Env"}]),
            json!([{"Ref": "Env"}, "Value", "prod"]),
            json!([]),
            json!([{"Ref": "Env", "Ref1": "Env"}, "prod"]),
            json!({"Ref": "Env", "Value": "prod"}),
            json!([{"Ref1": "Env"}, "prod"]),
            json!([{"Ref": {"Fn::Sub": "x"}}, "prod"]),
            json!([{"Fn::FindInMap": ["a", "b", "c"]}, "prod"]),
            json!([{"Ref": "Env"}, null]),
            json!(["prod", "prod"]),
            json!("prod"),
        ];
        for value in &rejected {
            assert!(parse_equals(value).is_none(), "accepted {}", value);
            assert!(equals_rejection(value).is_some());
        }
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(
            equals_rejection(&json!({"Ref": "Env"})),
            Some("expected a sequence of two operands")
        );
        assert_eq!(
            equals_rejection(&json!([{"Ref": "Env"}])),
            Some("expected exactly two operands")
        );
        assert_eq!(
            equals_rejection(&json!([{"Ref": "Env", "Ref1": "Env"}, "prod"])),
            Some("operand mapping must have exactly one key")
        );
        assert_eq!(equals_rejection(&json!([{"Ref": "Env"}, "prod"])), None);
    }

    #[test]
    fn test_condition_reference() {
        assert_eq!(condition_reference(&json!({"Condition": "IsProd"})), Ok("IsProd"));
        assert!(condition_reference(&json!({"Condition": 1})).is_err());
        assert!(condition_reference(&json!({"Condition": "A", "Other": "B"})).is_err());
        assert!(condition_reference(&json!({"Fn::Equals": ["a", "b"]})).is_err());
        assert!(condition_reference(&json!("IsProd")).is_err());
    }
}
