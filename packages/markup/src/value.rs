use crate::ast::*;
use easel_common::NodeAllocator;
use serde_json::Value;

/// Conversions between JSON-described values coming from callers and the
/// literal nodes the tree stores. Everything built here carries a synthetic
/// span and prints canonically.

/// Attribute value for a JSON value; `None` means the attribute should be
/// written bare (or skipped).
pub fn attr_value_from_json(alloc: &mut NodeAllocator, value: &Value) -> Option<AttrValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(AttrValue::String(StringLit {
            value: s.clone(),
            span: alloc.synthetic_span(),
        })),
        Value::Object(map) => {
            let mut properties = Vec::new();
            for (key, entry) in map {
                if let Some(prop) = prop_value_from_json(alloc, entry) {
                    properties.push(ObjectProp {
                        key: key.clone(),
                        value: prop,
                        span: alloc.synthetic_span(),
                    });
                }
            }
            let object = ObjectLit {
                properties,
                span: alloc.synthetic_span(),
            };
            Some(AttrValue::Container(ExprContainer {
                expr: Expr::Object(object),
                span: alloc.synthetic_span(),
            }))
        }
        other => Some(raw_container(alloc, &other.to_string())),
    }
}

/// Object property value for a JSON value; `None` for null.
pub fn prop_value_from_json(alloc: &mut NodeAllocator, value: &Value) -> Option<PropValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(PropValue::String(StringLit {
            value: s.clone(),
            span: alloc.synthetic_span(),
        })),
        Value::Bool(b) => Some(PropValue::Bool {
            value: *b,
            span: alloc.synthetic_span(),
        }),
        Value::Number(n) => Some(PropValue::Number(NumberLit {
            raw: n.to_string(),
            span: alloc.synthetic_span(),
        })),
        other => Some(PropValue::Raw(RawExpr {
            text: other.to_string(),
            span: alloc.synthetic_span(),
        })),
    }
}

fn raw_container(alloc: &mut NodeAllocator, text: &str) -> AttrValue {
    AttrValue::Container(ExprContainer {
        expr: Expr::Raw(RawExpr {
            text: text.to_string(),
            span: alloc.synthetic_span(),
        }),
        span: alloc.synthetic_span(),
    })
}

/// Textual form of a statically-literal property value. Strings yield their
/// content, numbers their source text; anything else is `None`.
pub fn literal_text(value: &PropValue) -> Option<String> {
    match value {
        PropValue::String(lit) => Some(lit.value.clone()),
        PropValue::Number(num) => Some(num.raw.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alloc() -> NodeAllocator {
        NodeAllocator::starting_at(0)
    }

    #[test]
    fn strings_become_quoted_attribute_values() {
        let mut alloc = alloc();
        let value = attr_value_from_json(&mut alloc, &json!("hero")).unwrap();
        assert!(matches!(value, AttrValue::String(lit) if lit.value == "hero"));
    }

    #[test]
    fn booleans_and_numbers_become_containers() {
        let mut alloc = alloc();
        let value = attr_value_from_json(&mut alloc, &json!(true)).unwrap();
        let AttrValue::Container(container) = value else {
            panic!("Expected a container");
        };
        assert!(matches!(&container.expr, Expr::Raw(raw) if raw.text == "true"));
    }

    #[test]
    fn objects_become_object_literals() {
        let mut alloc = alloc();
        let value =
            attr_value_from_json(&mut alloc, &json!({ "display": "flex", "opacity": 0.5 }))
                .unwrap();
        let AttrValue::Container(container) = value else {
            panic!("Expected a container");
        };
        let Expr::Object(object) = &container.expr else {
            panic!("Expected an object literal");
        };
        assert_eq!(object.properties.len(), 2);
        assert_eq!(object.properties[0].key, "display");
        assert_eq!(
            literal_text(&object.properties[0].value),
            Some("flex".to_string())
        );
        assert_eq!(object.properties[1].key, "opacity");
        assert_eq!(
            literal_text(&object.properties[1].value),
            Some("0.5".to_string())
        );
    }

    #[test]
    fn null_yields_no_value() {
        let mut alloc = alloc();
        assert!(attr_value_from_json(&mut alloc, &Value::Null).is_none());
    }
}
