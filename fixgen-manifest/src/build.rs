//! Building a [`Graph`] from a parsed manifest.
//!
//! Node tables may appear in any order and reference each other by key. The
//! graph only accepts references to nodes it already holds, so nodes are
//! added in dependency order; a reference cycle is reported with its path.

use fixgen_codegen::{CodegenOptions, options::DEFAULT_INDENT};
use fixgen_graph::{Graph, Node, NodeId, NodeKind, Symbol};
use indexmap::IndexMap;

use crate::{
    Manifest, NodeSpec, Result,
    error::SourceContext,
    value::{self, ValueError},
};

/// A graph ready for compilation, together with its options.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub graph: Graph,
    pub root: NodeId,
    pub options: CodegenOptions,
    /// Manifest key of every node, in file order.
    pub node_ids: IndexMap<String, NodeId>,
}

impl Fixture {
    /// Manifest key of the node with `id`.
    pub fn key_of(&self, id: NodeId) -> Option<&str> {
        self.node_ids
            .iter()
            .find(|(_, node)| **node == id)
            .map(|(key, _)| key.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Build the fixture described by `manifest`.
pub fn build_fixture(manifest: &Manifest, ctx: &SourceContext) -> Result<Fixture> {
    let section = &manifest.fixture;
    if !manifest.nodes.contains_key(section.root.get_ref()) {
        return Err(ctx.unknown_root(section.root.get_ref(), section.root.span()));
    }
    for (name, target) in &section.sub_fixtures {
        if !manifest.nodes.contains_key(target.get_ref()) {
            return Err(ctx.unknown_sub_fixture_node(name, target.get_ref(), target.span()));
        }
    }

    let entries: Vec<(&String, &NodeSpec)> = manifest.nodes.iter().collect();
    let kinds = entries
        .iter()
        .map(|(_, spec)| node_kind(spec, ctx))
        .collect::<Result<Vec<_>>>()?;
    let deps = dependencies(manifest, ctx)?;
    let order = dependency_order(&entries, &deps, ctx)?;

    let mut graph = Graph::new();
    let mut ids = IndexMap::with_capacity(entries.len());
    for index in order {
        let (key, spec) = entries[index];
        let node = build_node(kinds[index], spec, &ids, key, ctx)?;
        let id = graph
            .add(node)
            .map_err(|e| ctx.validation_error(format!("node '{}': {}", key, e)))?;
        ids.insert(key.clone(), id);
    }

    // Report nodes in file order rather than build order.
    let node_ids: IndexMap<String, NodeId> = manifest
        .nodes
        .keys()
        .filter_map(|key| ids.get(key).map(|&id| (key.clone(), id)))
        .collect();

    let mut options = CodegenOptions {
        max_expression_complexity: section.max_expression_complexity,
        indent: section.indent.unwrap_or(DEFAULT_INDENT),
        ..CodegenOptions::default()
    };
    if let Some(name) = &section.name {
        options.top_level_fixture_name = name.clone();
    }
    for (name, target) in &section.sub_fixtures {
        options.sub_fixtures.insert(name.clone(), node_ids[target.get_ref()]);
    }

    tracing::debug!(
        nodes = node_ids.len(),
        sub_fixtures = options.sub_fixtures.len(),
        "built fixture graph"
    );

    Ok(Fixture {
        graph,
        root: node_ids[section.root.get_ref()],
        options,
        node_ids,
    })
}

fn node_kind(spec: &NodeSpec, ctx: &SourceContext) -> Result<NodeKind> {
    let Some(kind) = &spec.kind else {
        return Ok(NodeKind::Config);
    };
    match kind.get_ref().as_str() {
        "config" => Ok(NodeKind::Config),
        "partial" => Ok(NodeKind::Partial),
        "arg_factory" => Ok(NodeKind::ArgFactory),
        other => Err(ctx.unknown_kind(other, kind.span())),
    }
}

/// Indices of the nodes each node references, with multiplicity.
fn dependencies(manifest: &Manifest, ctx: &SourceContext) -> Result<Vec<Vec<usize>>> {
    manifest
        .nodes
        .iter()
        .map(|(key, spec)| {
            let mut deps = Vec::new();
            for arg in spec.args.values() {
                for target in value::references(arg.get_ref()) {
                    let index = manifest
                        .nodes
                        .get_index_of(target)
                        .ok_or_else(|| ctx.unknown_reference(key, target, arg.span()))?;
                    deps.push(index);
                }
            }
            Ok(deps)
        })
        .collect()
}

/// Post-order over all nodes, children before parents.
fn dependency_order(
    entries: &[(&String, &NodeSpec)],
    deps: &[Vec<usize>],
    ctx: &SourceContext,
) -> Result<Vec<usize>> {
    let mut marks = vec![Mark::New; entries.len()];
    let mut order = Vec::with_capacity(entries.len());

    for start in 0..entries.len() {
        if marks[start] != Mark::New {
            continue;
        }
        marks[start] = Mark::Active;
        let mut stack = vec![(start, 0usize)];

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let Some(&child) = deps[node].get(next) else {
                marks[node] = Mark::Done;
                order.push(node);
                stack.pop();
                continue;
            };
            top.1 += 1;

            match marks[child] {
                Mark::New => {
                    marks[child] = Mark::Active;
                    stack.push((child, 0));
                }
                Mark::Active => {
                    let from = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                    let mut path: Vec<&str> =
                        stack[from..].iter().map(|&(n, _)| entries[n].0.as_str()).collect();
                    path.push(entries[child].0.as_str());
                    return Err(ctx.cycle(&path));
                }
                Mark::Done => {}
            }
        }
    }

    Ok(order)
}

fn build_node(
    kind: NodeKind,
    spec: &NodeSpec,
    ids: &IndexMap<String, NodeId>,
    key: &str,
    ctx: &SourceContext,
) -> Result<Node> {
    let target = spec.target.get_ref();
    if target.is_empty() {
        return Err(ctx.malformed_value("target cannot be empty", spec.target.span()));
    }

    let mut node = Node::new(kind, Symbol::parse(target));
    for (field, arg) in &spec.args {
        let value = value::convert(arg.get_ref(), ids).map_err(|e| match e {
            ValueError::UnknownReference(name) => ctx.unknown_reference(key, &name, arg.span()),
            ValueError::Malformed(message) => ctx.malformed_value(message, arg.span()),
        })?;
        node.set_arg(field.clone(), value);
    }
    for (field, tags) in &spec.tags {
        for tag in tags {
            node = node.with_tag(field.clone(), tag.as_str());
        }
    }
    Ok(node)
}
