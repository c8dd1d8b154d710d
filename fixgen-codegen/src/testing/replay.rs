//! Replay interpreter for compiled programs.
//!
//! Executes a [`Program`] the way the generated Python would run under
//! `auto_config`: every constructor call records a new node, variables bind
//! the node they were assigned, and calling a sub-fixture runs its body with
//! the caller's arguments. The rebuilt graph can then be checked against the
//! input with [`dag_eq`](fixgen_graph::dag_eq).

use std::collections::{BTreeSet, HashMap, HashSet};

use eyre::{Result, bail, eyre};
use fixgen_graph::{Field, Graph, Node, NodeId, Symbol, Value};

use crate::program::{Expr, ExprId, Program, Unit};

/// Run the top-level fixture and return the graph it builds.
///
/// # Errors
///
/// Fails if the default unit takes parameters or the program refers to an
/// unbound name.
pub fn run_default(program: &Program) -> Result<(Graph, NodeId)> {
    let unit = program.default_unit();
    if !unit.params.is_empty() {
        bail!("top level fixture '{}' takes parameters", unit.name);
    }
    let mut replay = Replay::new(program);
    let output = replay.run(0, HashMap::new())?;
    replay.finish(output)
}

/// Run the unit named `name` on its own.
///
/// Parameters are bound to copies of the nodes they stand for in `original`,
/// so the result can be compared with the subgraph below the unit's root.
pub fn run_unit(program: &Program, name: &str, original: &Graph) -> Result<(Graph, NodeId)> {
    let index = program
        .units
        .iter()
        .position(|u| u.name == name)
        .ok_or_else(|| eyre!("no unit named '{}'", name))?;
    let unit = &program.units[index];

    let mut replay = Replay::new(program);
    let copies = replay.copy_from(original, unit.params.iter().map(|p| p.node))?;
    let env = unit
        .params
        .iter()
        .map(|p| (p.name.clone(), Value::Node(copies[&p.node])))
        .collect();

    let output = replay.run(index, env)?;
    replay.finish(output)
}

#[derive(Clone, Copy)]
enum Step {
    Eval(ExprId),
    Finish(ExprId),
}

struct Replay<'p> {
    program: &'p Program,
    graph: Graph,
}

impl<'p> Replay<'p> {
    fn new(program: &'p Program) -> Self {
        Self {
            program,
            graph: Graph::new(),
        }
    }

    fn finish(self, output: Value) -> Result<(Graph, NodeId)> {
        match output {
            Value::Node(root) => Ok((self.graph, root)),
            other => bail!("fixture returned a {} instead of a node", other.kind_name()),
        }
    }

    /// Copy every node reachable from `roots` into the replay graph.
    ///
    /// Nodes are copied in ascending id order through one map, so sharing
    /// between the copied subgraphs is preserved.
    fn copy_from(
        &mut self,
        original: &Graph,
        roots: impl IntoIterator<Item = NodeId>,
    ) -> Result<HashMap<NodeId, NodeId>> {
        let mut reachable = HashSet::new();
        for root in roots {
            reachable.extend(original.descendants(root)?);
        }
        let mut ids: Vec<NodeId> = reachable.into_iter().collect();
        ids.sort();

        let mut map = HashMap::with_capacity(ids.len());
        for id in ids {
            let mut node = original.node(id)?.clone();
            for field in node.fields.values_mut() {
                if let Some(value) = &mut field.value {
                    remap(value, &map)?;
                }
            }
            map.insert(id, self.graph.add(node)?);
        }
        Ok(map)
    }

    fn run(&mut self, index: usize, mut env: HashMap<String, Value>) -> Result<Value> {
        let program = self.program;
        let unit = program
            .units
            .get(index)
            .ok_or_else(|| eyre!("unit {} does not exist", index))?;
        for param in &unit.params {
            if !env.contains_key(&param.name) {
                bail!("'{}' called without argument '{}'", unit.name, param.name);
            }
        }
        for decl in &unit.decls {
            let value = self.eval(unit, decl.value, &env)?;
            env.insert(decl.name.clone(), value);
        }
        self.eval(unit, unit.output, &env)
    }

    fn eval(&mut self, unit: &'p Unit, root: ExprId, env: &HashMap<String, Value>) -> Result<Value> {
        let mut steps = vec![Step::Eval(root)];
        let mut done: Vec<Value> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Eval(id) => match unit.expr(id) {
                    Expr::None => done.push(Value::None),
                    Expr::Bool(v) => done.push(Value::Bool(*v)),
                    Expr::Int(v) => done.push(Value::Int(*v)),
                    Expr::Float(v) => done.push(Value::Float(*v)),
                    Expr::Str(v) => done.push(Value::Str(v.clone())),
                    Expr::Bytes(v) => done.push(Value::Bytes(v.clone())),
                    Expr::Symbol(symbol) => done.push(Value::Symbol(symbol.symbol.clone())),
                    Expr::Var(name) => {
                        let value = env
                            .get(name)
                            .ok_or_else(|| eyre!("'{}' is not bound in '{}'", name, unit.name))?;
                        done.push(value.clone());
                    }
                    Expr::List(items) | Expr::Tuple(items) => {
                        steps.push(Step::Finish(id));
                        steps.extend(items.iter().rev().map(|&item| Step::Eval(item)));
                    }
                    Expr::Dict(entries) => {
                        steps.push(Step::Finish(id));
                        for &(key, item) in entries.iter().rev() {
                            steps.push(Step::Eval(item));
                            steps.push(Step::Eval(key));
                        }
                    }
                    Expr::Construct { args, .. } => {
                        steps.push(Step::Finish(id));
                        for arg in args.iter().rev() {
                            steps.push(Step::Eval(untag(unit, arg.value).1));
                        }
                    }
                    Expr::Call { args, .. } => {
                        steps.push(Step::Finish(id));
                        steps.extend(args.iter().rev().map(|&(_, value)| Step::Eval(value)));
                    }
                    Expr::Tagged { .. } => {
                        bail!("tagged value outside of a field in '{}'", unit.name);
                    }
                },
                Step::Finish(id) => match unit.expr(id) {
                    Expr::List(items) => {
                        let items = take(&mut done, items.len())?;
                        done.push(Value::List(items));
                    }
                    Expr::Tuple(items) => {
                        let items = take(&mut done, items.len())?;
                        done.push(Value::Tuple(items));
                    }
                    Expr::Dict(entries) => {
                        let flat = take(&mut done, 2 * entries.len())?;
                        let mut flat = flat.into_iter();
                        let mut pairs = Vec::with_capacity(entries.len());
                        while let (Some(key), Some(value)) = (flat.next(), flat.next()) {
                            pairs.push((key, value));
                        }
                        done.push(Value::Dict(pairs));
                    }
                    Expr::Construct {
                        kind, target, args, ..
                    } => {
                        let values = take(&mut done, args.len())?;
                        let mut node = Node::new(*kind, target.symbol.clone());
                        for (arg, value) in args.iter().zip(values) {
                            let (tags, _) = untag(unit, arg.value);
                            node.fields.insert(
                                arg.name.clone(),
                                Field {
                                    value: Some(value),
                                    tags,
                                },
                            );
                        }
                        done.push(Value::Node(self.graph.add(node)?));
                    }
                    Expr::Call { unit: callee, args } => {
                        let values = take(&mut done, args.len())?;
                        let env = args
                            .iter()
                            .map(|(name, _)| name.clone())
                            .zip(values)
                            .collect();
                        done.push(self.run(*callee, env)?);
                    }
                    _ => bail!("nothing to finish for expression {}", id.0),
                },
            }
        }

        done.pop()
            .ok_or_else(|| eyre!("expression {} produced no value", root.0))
    }
}

/// Strip the tag wrappers from a field value.
fn untag(unit: &Unit, mut id: ExprId) -> (BTreeSet<Symbol>, ExprId) {
    let mut tags = BTreeSet::new();
    while let Expr::Tagged { tags: outer, value } = unit.expr(id) {
        tags.extend(outer.iter().map(|t| t.symbol.clone()));
        id = *value;
    }
    (tags, id)
}

fn take(done: &mut Vec<Value>, n: usize) -> Result<Vec<Value>> {
    if done.len() < n {
        bail!("expected {} values, found {}", n, done.len());
    }
    Ok(done.split_off(done.len() - n))
}

fn remap(value: &mut Value, map: &HashMap<NodeId, NodeId>) -> Result<()> {
    match value {
        Value::Node(id) => {
            *id = *map
                .get(id)
                .ok_or_else(|| eyre!("node {} was not copied before its parent", id))?;
        }
        Value::List(items) | Value::Tuple(items) => {
            for item in items {
                remap(item, map)?;
            }
        }
        Value::Dict(entries) => {
            for (key, item) in entries {
                remap(key, map)?;
                remap(item, map)?;
            }
        }
        _ => {}
    }
    Ok(())
}
