//! Structural equality of two DAGs, up to aliasing.

use std::collections::{HashMap, HashSet};

use crate::{Graph, NodeId, Value};

/// The first difference found by [`dag_eq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Path from the root to the differing value, e.g. `encoder.embedders['tokens']`.
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl std::error::Error for Mismatch {}

/// Compare the DAG rooted at `lhs_root` with the one rooted at `rhs_root`.
///
/// Non-fresh nodes must correspond one to one: if a node is reachable along
/// two paths on the left, the right side must reach a single node along the
/// same paths, and vice versa. Per-call-fresh nodes are compared by
/// structure only.
pub fn dag_eq(
    lhs: &Graph,
    lhs_root: NodeId,
    rhs: &Graph,
    rhs_root: NodeId,
) -> Result<(), Mismatch> {
    let mut forward: HashMap<NodeId, NodeId> = HashMap::new();
    let mut backward: HashMap<NodeId, NodeId> = HashMap::new();
    let mut fresh_pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut pending = vec![(lhs_root, rhs_root, String::from("<root>"))];

    while let Some((a, b, path)) = pending.pop() {
        let left = lhs.get(a).ok_or_else(|| mismatch(&path, "missing on the left"))?;
        let right = rhs.get(b).ok_or_else(|| mismatch(&path, "missing on the right"))?;

        if left.kind != right.kind {
            return Err(mismatch(
                &path,
                format!("kind {} != {}", left.kind, right.kind),
            ));
        }

        if left.kind.is_fresh() {
            if !fresh_pairs.insert((a, b)) {
                continue;
            }
        } else {
            match (forward.get(&a), backward.get(&b)) {
                (Some(mapped), _) if *mapped == b => continue,
                (None, None) => {
                    forward.insert(a, b);
                    backward.insert(b, a);
                }
                _ => return Err(mismatch(&path, "object sharing differs")),
            }
        }

        if left.target != right.target {
            return Err(mismatch(
                &path,
                format!("target {} != {}", left.target, right.target),
            ));
        }

        let left_names: HashSet<&str> = left.args().map(|(name, _)| name).collect();
        let right_names: HashSet<&str> = right.args().map(|(name, _)| name).collect();
        if left_names != right_names {
            let mut only: Vec<&str> = left_names
                .symmetric_difference(&right_names)
                .copied()
                .collect();
            only.sort_unstable();
            return Err(mismatch(
                &path,
                format!("argument sets differ on {}", only.join(", ")),
            ));
        }

        let mut children = Vec::new();
        for (name, field) in &left.fields {
            let Some(lhs_value) = &field.value else {
                continue;
            };
            let other = &right.fields[name.as_str()];
            let field_path = if path == "<root>" {
                name.clone()
            } else {
                format!("{}.{}", path, name)
            };
            if field.tags != other.tags {
                return Err(mismatch(&field_path, "tags differ"));
            }
            if let Some(rhs_value) = &other.value {
                compare_values(lhs_value, rhs_value, field_path, &mut children)?;
            }
        }
        pending.extend(children.into_iter().rev());
    }

    Ok(())
}

fn compare_values(
    lhs: &Value,
    rhs: &Value,
    path: String,
    children: &mut Vec<(NodeId, NodeId, String)>,
) -> Result<(), Mismatch> {
    let mut stack = vec![(lhs, rhs, path)];
    while let Some((a, b, path)) = stack.pop() {
        match (a, b) {
            (Value::Node(x), Value::Node(y)) => children.push((*x, *y, path)),
            (Value::Float(x), Value::Float(y)) => {
                if x.to_bits() != y.to_bits() {
                    return Err(mismatch(&path, format!("{} != {}", x, y)));
                }
            }
            (Value::List(xs), Value::List(ys)) | (Value::Tuple(xs), Value::Tuple(ys)) => {
                if xs.len() != ys.len() {
                    return Err(mismatch(
                        &path,
                        format!("length {} != {}", xs.len(), ys.len()),
                    ));
                }
                for (i, (x, y)) in xs.iter().zip(ys).enumerate().rev() {
                    stack.push((x, y, format!("{}[{}]", path, i)));
                }
            }
            (Value::Dict(xs), Value::Dict(ys)) => {
                if xs.len() != ys.len() {
                    return Err(mismatch(
                        &path,
                        format!("length {} != {}", xs.len(), ys.len()),
                    ));
                }
                for (i, ((xk, xv), (yk, yv))) in xs.iter().zip(ys).enumerate().rev() {
                    stack.push((xv, yv, format!("{}[{}]", path, key_label(xk, i))));
                    stack.push((xk, yk, format!("{}.keys[{}]", path, i)));
                }
            }
            (Value::Node(_), _)
            | (_, Value::Node(_))
            | (Value::List(_), _)
            | (Value::Tuple(_), _)
            | (Value::Dict(_), _) => {
                return Err(mismatch(
                    &path,
                    format!("{} != {}", a.kind_name(), b.kind_name()),
                ));
            }
            _ => {
                if a != b {
                    return Err(mismatch(&path, format!("{:?} != {:?}", a, b)));
                }
            }
        }
    }
    Ok(())
}

fn key_label(key: &Value, index: usize) -> String {
    match key {
        Value::Str(s) => format!("'{}'", s),
        Value::Int(i) => i.to_string(),
        _ => format!("#{}", index),
    }
}

fn mismatch(path: &str, reason: impl Into<String>) -> Mismatch {
    Mismatch {
        path: path.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;

    fn diamond(shared: bool) -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let a = graph.add(Node::config("m.Leaf").with_arg("x", 1)).unwrap();
        let b = if shared {
            a
        } else {
            graph.add(Node::config("m.Leaf").with_arg("x", 1)).unwrap()
        };
        let root = graph
            .add(Node::config("m.Root").with_arg("a", a).with_arg("b", b))
            .unwrap();
        (graph, root)
    }

    #[test]
    fn test_identical_graphs() {
        let (g1, r1) = diamond(true);
        let (g2, r2) = diamond(true);
        assert_eq!(dag_eq(&g1, r1, &g2, r2), Ok(()));
    }

    #[test]
    fn test_sharing_is_significant() {
        let (shared, r1) = diamond(true);
        let (split, r2) = diamond(false);
        let err = dag_eq(&shared, r1, &split, r2).unwrap_err();
        assert_eq!(err.path, "b");
        assert_eq!(err.reason, "object sharing differs");
        assert!(dag_eq(&split, r2, &shared, r1).is_err());
    }

    #[test]
    fn test_fresh_nodes_compare_structurally() {
        let mut g1 = Graph::new();
        let f = g1.add(Node::arg_factory("m.init")).unwrap();
        let r1 = g1
            .add(Node::partial("m.Layer").with_arg("a", f).with_arg("b", f))
            .unwrap();

        let mut g2 = Graph::new();
        let f1 = g2.add(Node::arg_factory("m.init")).unwrap();
        let f2 = g2.add(Node::arg_factory("m.init")).unwrap();
        let r2 = g2
            .add(Node::partial("m.Layer").with_arg("a", f1).with_arg("b", f2))
            .unwrap();

        assert_eq!(dag_eq(&g1, r1, &g2, r2), Ok(()));
    }

    #[test]
    fn test_value_mismatch_path() {
        let mut g1 = Graph::new();
        let r1 = g1
            .add(Node::config("m.Foo").with_arg("xs", Value::List(vec![1.into(), 2.into()])))
            .unwrap();
        let mut g2 = Graph::new();
        let r2 = g2
            .add(Node::config("m.Foo").with_arg("xs", Value::List(vec![1.into(), 3.into()])))
            .unwrap();

        let err = dag_eq(&g1, r1, &g2, r2).unwrap_err();
        assert_eq!(err.path, "xs[1]");
    }

    #[test]
    fn test_tags_compared() {
        let mut g1 = Graph::new();
        let r1 = g1
            .add(Node::config("m.Foo").with_arg("a", 1).with_tag("a", "m.ATag"))
            .unwrap();
        let mut g2 = Graph::new();
        let r2 = g2.add(Node::config("m.Foo").with_arg("a", 1)).unwrap();

        assert_eq!(dag_eq(&g1, r1, &g2, r2).unwrap_err().reason, "tags differ");
    }
}
