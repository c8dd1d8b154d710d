//! Conversion of TOML arg values into graph values.

use fixgen_graph::{NodeId, Symbol, Value};
use indexmap::IndexMap;

/// Keys that turn a one-entry table into a special value.
pub const SPECIAL_KEYS: &[&str] = &["ref", "symbol", "tuple", "none", "dict", "bytes"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueError {
    UnknownReference(String),
    Malformed(String),
}

/// The special key and its payload, if `table` is a special table.
fn special(table: &toml::Table) -> Option<(&str, &toml::Value)> {
    if table.len() != 1 {
        return None;
    }
    let (key, value) = table.iter().next()?;
    SPECIAL_KEYS
        .contains(&key.as_str())
        .then_some((key.as_str(), value))
}

/// Node keys referenced anywhere inside `value`, in order of appearance.
pub(crate) fn references(value: &toml::Value) -> Vec<&str> {
    let mut refs = Vec::new();
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            toml::Value::Array(items) => stack.extend(items.iter().rev()),
            toml::Value::Table(table) => match special(table) {
                Some(("ref", toml::Value::String(key))) => refs.push(key.as_str()),
                Some(("ref", _)) => {}
                Some((_, payload)) => stack.push(payload),
                None => {
                    let items: Vec<&toml::Value> = table.values().collect();
                    stack.extend(items.into_iter().rev());
                }
            },
            _ => {}
        }
    }
    refs
}

/// Convert a TOML value, resolving references through `ids`.
pub(crate) fn convert(
    value: &toml::Value,
    ids: &IndexMap<String, NodeId>,
) -> Result<Value, ValueError> {
    match value {
        toml::Value::String(s) => Ok(Value::Str(s.clone())),
        toml::Value::Integer(i) => Ok(Value::Int(*i)),
        toml::Value::Float(f) => Ok(Value::Float(*f)),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Datetime(dt) => Err(ValueError::Malformed(format!(
            "datetime '{}' has no fixture value",
            dt
        ))),
        toml::Value::Array(items) => convert_all(items, ids).map(Value::List),
        toml::Value::Table(table) => match special(table) {
            Some((key, payload)) => convert_special(key, payload, ids),
            None => string_dict(table, ids),
        },
    }
}

fn convert_all(
    items: &[toml::Value],
    ids: &IndexMap<String, NodeId>,
) -> Result<Vec<Value>, ValueError> {
    items.iter().map(|item| convert(item, ids)).collect()
}

fn string_dict(table: &toml::Table, ids: &IndexMap<String, NodeId>) -> Result<Value, ValueError> {
    table
        .iter()
        .map(|(key, item)| Ok((Value::Str(key.clone()), convert(item, ids)?)))
        .collect::<Result<_, _>>()
        .map(Value::Dict)
}

fn convert_special(
    key: &str,
    payload: &toml::Value,
    ids: &IndexMap<String, NodeId>,
) -> Result<Value, ValueError> {
    let malformed = |message: &str| Err(ValueError::Malformed(message.to_string()));
    match (key, payload) {
        ("ref", toml::Value::String(name)) => ids
            .get(name)
            .map(|&id| Value::Node(id))
            .ok_or_else(|| ValueError::UnknownReference(name.clone())),
        ("ref", _) => malformed("`ref` takes a node key string"),

        ("symbol", toml::Value::String(path)) if path.is_empty() => {
            malformed("`symbol` cannot be empty")
        }
        ("symbol", toml::Value::String(path)) => Ok(Value::Symbol(Symbol::parse(path))),
        ("symbol", _) => malformed("`symbol` takes a dotted path string"),

        ("tuple", toml::Value::Array(items)) => convert_all(items, ids).map(Value::Tuple),
        ("tuple", _) => malformed("`tuple` takes an array"),

        ("none", toml::Value::Boolean(true)) => Ok(Value::None),
        ("none", _) => malformed("`none` only accepts `true`"),

        ("dict", toml::Value::Table(table)) => string_dict(table, ids),
        ("dict", toml::Value::Array(pairs)) => pairs
            .iter()
            .map(|pair| match pair {
                toml::Value::Array(kv) if kv.len() == 2 => {
                    Ok((convert(&kv[0], ids)?, convert(&kv[1], ids)?))
                }
                _ => Err(ValueError::Malformed(
                    "`dict` entries must be [key, value] pairs".to_string(),
                )),
            })
            .collect::<Result<_, _>>()
            .map(Value::Dict),
        ("dict", _) => malformed("`dict` takes a table or an array of [key, value] pairs"),

        ("bytes", toml::Value::String(s)) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        ("bytes", toml::Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                toml::Value::Integer(b) => u8::try_from(*b).map_err(|_| {
                    ValueError::Malformed(format!("byte {} is out of range 0..=255", b))
                }),
                _ => Err(ValueError::Malformed(
                    "`bytes` arrays only hold integers".to_string(),
                )),
            })
            .collect::<Result<_, _>>()
            .map(Value::Bytes),
        ("bytes", _) => malformed("`bytes` takes a string or an array of integers"),

        _ => Err(ValueError::Malformed(format!("unknown special key `{}`", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(src: &str) -> toml::Value {
        let table: toml::Table = toml::from_str(&format!("v = {}", src)).unwrap();
        table["v"].clone()
    }

    fn ids() -> IndexMap<String, NodeId> {
        IndexMap::from([("enc".to_string(), NodeId(0)), ("dec".to_string(), NodeId(1))])
    }

    #[test]
    fn test_plain_values() {
        assert_eq!(convert(&arg("3"), &ids()), Ok(Value::Int(3)));
        assert_eq!(convert(&arg("0.5"), &ids()), Ok(Value::Float(0.5)));
        assert_eq!(convert(&arg("'hi'"), &ids()), Ok(Value::Str("hi".into())));
        assert_eq!(
            convert(&arg("[1, true]"), &ids()),
            Ok(Value::List(vec![Value::Int(1), Value::Bool(true)]))
        );
    }

    #[test]
    fn test_special_tables() {
        assert_eq!(convert(&arg("{ ref = 'dec' }"), &ids()), Ok(Value::Node(NodeId(1))));
        assert_eq!(
            convert(&arg("{ symbol = 'jax.nn.relu' }"), &ids()),
            Ok(Value::Symbol(Symbol::new("jax.nn", "relu")))
        );
        assert_eq!(
            convert(&arg("{ tuple = [1, 2] }"), &ids()),
            Ok(Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(convert(&arg("{ none = true }"), &ids()), Ok(Value::None));
        assert_eq!(
            convert(&arg("{ bytes = [0, 255] }"), &ids()),
            Ok(Value::Bytes(vec![0, 255]))
        );
        assert_eq!(
            convert(&arg("{ bytes = 'ab' }"), &ids()),
            Ok(Value::Bytes(b"ab".to_vec()))
        );
    }

    #[test]
    fn test_dict_forms() {
        assert_eq!(
            convert(&arg("{ b = 1, a = { ref = 'enc' } }"), &ids()),
            Ok(Value::Dict(vec![
                (Value::Str("b".into()), Value::Int(1)),
                (Value::Str("a".into()), Value::Node(NodeId(0))),
            ]))
        );
        // A special key as the only dict key needs the explicit form.
        assert_eq!(
            convert(&arg("{ dict = { ref = 1 } }"), &ids()),
            Ok(Value::Dict(vec![(Value::Str("ref".into()), Value::Int(1))]))
        );
        assert_eq!(
            convert(&arg("{ dict = [[{ tuple = [1, 2] }, 'x']] }"), &ids()),
            Ok(Value::Dict(vec![(
                Value::Tuple(vec![Value::Int(1), Value::Int(2)]),
                Value::Str("x".into())
            )]))
        );
    }

    #[test]
    fn test_two_keys_is_a_plain_dict() {
        let value = convert(&arg("{ ref = 'enc', none = true }"), &ids()).unwrap();
        assert!(matches!(value, Value::Dict(entries) if entries.len() == 2));
    }

    #[test]
    fn test_malformed_special_tables() {
        for src in [
            "{ ref = 1 }",
            "{ none = false }",
            "{ tuple = 'x' }",
            "{ symbol = '' }",
            "{ bytes = [256] }",
            "{ dict = [[1]] }",
            "1979-05-27T07:32:00Z",
        ] {
            assert!(
                matches!(convert(&arg(src), &ids()), Err(ValueError::Malformed(_))),
                "{src} should be malformed"
            );
        }
    }

    #[test]
    fn test_unknown_reference() {
        assert_eq!(
            convert(&arg("[{ ref = 'missing' }]"), &ids()),
            Err(ValueError::UnknownReference("missing".into()))
        );
    }

    #[test]
    fn test_references_in_order() {
        let value = arg("{ a = [{ ref = 'x' }, { tuple = [{ ref = 'y' }] }], b = { ref = 'x' } }");
        assert_eq!(references(&value), vec!["x", "y", "x"]);
    }
}
