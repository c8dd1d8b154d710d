//! Lowering of the analysed graph into a [`Program`].

use std::collections::{HashMap, HashSet};

use fixgen_graph::{Graph, Node, NodeId, Symbol, Value};

use super::{Arg, Decl, Expr, ExprId, Param, Program, SymbolRef, Unit};
use crate::{
    CompileError,
    analysis::{HoistPlan, Partition, Traversal},
    generation::ImportCollector,
    naming::{Namer, sanitize_identifier},
};

/// Build the program for an analysed graph.
///
/// # Errors
///
/// [`CompileError::UnsupportedConstruct`] for input the generated code
/// cannot express and [`CompileError::InvariantViolation`] if the analyses
/// disagree with each other.
pub fn lower(
    graph: &Graph,
    traversal: &Traversal,
    hoisting: &HoistPlan,
    partition: &Partition,
) -> Result<Program, CompileError> {
    check_supported(graph, traversal, partition)?;

    let mut namer = Namer::python();
    for plan in &partition.units {
        let name = sanitize_identifier(&plan.name);
        if !namer.reserve(&name) {
            return Err(CompileError::unsupported(
                format!("fixture '{}'", plan.name),
                format!("function name '{}' is already in use", name),
            ));
        }
    }

    let mut imports = ImportCollector::new();
    let mut referenced: Vec<&Symbol> = Vec::new();
    for &id in &traversal.order {
        let node = node(graph, id)?;
        if node.kind.accepts_factories() {
            imports.use_functools();
        }
        if node.kind.is_fresh() {
            imports.use_arg_factory();
        }
        referenced.push(&node.target);
        for field in node.fields.values() {
            referenced.extend(&field.tags);
            if let Some(value) = &field.value {
                referenced.extend(symbols(value));
            }
        }
    }
    // Builtins first: a module alias must not take a builtin's name either.
    for symbol in referenced.iter().filter(|s| s.is_builtin()) {
        imports.add(symbol, &mut namer);
    }
    for symbol in referenced {
        imports.add(symbol, &mut namer);
    }

    let mut names: Vec<Option<String>> = vec![None; traversal.arena_len()];
    for &id in &traversal.order {
        if hoisting.is_hoisted(id) && id != traversal.root && partition.home(id).is_some() {
            let position = traversal.position(id).unwrap_or_default();
            names[id.index()] = Some(namer.claim(traversal.name_hint(id), position));
        }
    }

    let lowering = Lowering {
        graph,
        traversal,
        hoisting,
        partition,
        imports: &imports,
        names: &names,
    };
    let units = (0..partition.units.len())
        .map(|unit| lowering.unit(unit))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Program {
        units,
        order: partition.emission_order(),
        imports,
    })
}

fn node(graph: &Graph, id: NodeId) -> Result<&Node, CompileError> {
    graph
        .node(id)
        .map_err(|e| CompileError::invariant(e.to_string()))
}

fn location(id: NodeId, node: &Node) -> String {
    format!("node {} ({})", id, node.target)
}

/// Every symbol value inside `value`.
fn symbols(value: &Value) -> Vec<&Symbol> {
    let mut out = Vec::new();
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Symbol(symbol) => out.push(symbol),
            Value::List(items) | Value::Tuple(items) => stack.extend(items.iter().rev()),
            Value::Dict(entries) => {
                for (key, item) in entries.iter().rev() {
                    stack.push(item);
                    stack.push(key);
                }
            }
            _ => {}
        }
    }
    out
}

fn is_hashable(value: &Value) -> bool {
    match value {
        Value::None
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Str(_)
        | Value::Bytes(_)
        | Value::Symbol(_) => true,
        Value::Tuple(items) => items.iter().all(is_hashable),
        _ => false,
    }
}

/// Reject node shapes that have no emission form.
fn check_supported(
    graph: &Graph,
    traversal: &Traversal,
    partition: &Partition,
) -> Result<(), CompileError> {
    let root = node(graph, traversal.root)?;
    if root.kind.is_fresh() {
        return Err(CompileError::unsupported(
            location(traversal.root, root),
            "a per-call-fresh node cannot be the fixture root",
        ));
    }
    for plan in partition.units.iter().skip(1) {
        let sub_root = node(graph, plan.root)?;
        if sub_root.kind.is_fresh() {
            return Err(CompileError::unsupported(
                location(plan.root, sub_root),
                format!("per-call-fresh nodes are not supported as sub-fixture roots ('{}')", plan.name),
            ));
        }
    }

    for &id in &traversal.order {
        let parent = node(graph, id)?;
        for (name, field) in &parent.fields {
            let at = || format!("{} field '{}'", location(id, parent), name);
            if sanitize_identifier(name) != *name {
                return Err(CompileError::unsupported(
                    at(),
                    "field name is not a valid keyword argument",
                ));
            }
            let Some(value) = &field.value else {
                if !field.tags.is_empty() {
                    return Err(CompileError::unsupported(at(), "tagged field has no value"));
                }
                continue;
            };
            match value {
                Value::Node(child) if node(graph, *child)?.kind.is_fresh() => {
                    if !parent.kind.accepts_factories() {
                        return Err(CompileError::unsupported(
                            at(),
                            format!(
                                "per-call-fresh value under a {} node; only partial and arg_factory nodes accept them",
                                parent.kind
                            ),
                        ));
                    }
                    if !field.tags.is_empty() {
                        return Err(CompileError::unsupported(
                            at(),
                            "per-call-fresh values cannot be tagged",
                        ));
                    }
                }
                Value::Node(_) => {}
                nested => {
                    for child in nested.node_refs() {
                        if node(graph, child)?.kind.is_fresh() {
                            return Err(CompileError::unsupported(
                                at(),
                                "per-call-fresh values are only supported as direct field values",
                            ));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

struct Lowering<'a> {
    graph: &'a Graph,
    traversal: &'a Traversal,
    hoisting: &'a HoistPlan,
    partition: &'a Partition,
    imports: &'a ImportCollector,
    names: &'a [Option<String>],
}

impl<'a> Lowering<'a> {
    fn unit(&self, unit: usize) -> Result<Unit, CompileError> {
        let plan = &self.partition.units[unit];
        let mut builder = UnitBuilder {
            lowering: self,
            unit,
            exprs: Vec::new(),
            scope: HashSet::new(),
            inline: HashMap::new(),
            consumed: HashSet::new(),
        };

        let mut params = Vec::with_capacity(plan.params.len());
        for &id in &plan.params {
            params.push(Param {
                name: self.variable(id)?.to_string(),
                node: id,
            });
            builder.scope.insert(id);
        }

        let mut decls = Vec::new();
        for &id in &self.traversal.order {
            if id == plan.root {
                continue;
            }
            let is_fresh = node(self.graph, id)?.kind.is_fresh();
            if is_fresh {
                if self.partition.is_emitted_in(id, unit) {
                    let expr = builder.construct(id)?;
                    builder.inline.insert(id, expr);
                }
                continue;
            }
            if self.partition.home(id) != Some(unit) {
                continue;
            }

            let callee = self.callee(id);
            let hoisted = self.hoisting.is_hoisted(id);
            let value = match callee {
                Some(callee) if hoisted => builder.call(callee)?,
                Some(_) => continue,
                None => builder.construct(id)?,
            };
            if hoisted {
                decls.push(Decl {
                    name: self.variable(id)?.to_string(),
                    node: id,
                    value,
                });
                builder.scope.insert(id);
            } else {
                builder.inline.insert(id, value);
            }
        }

        let output = match self.callee(plan.root) {
            Some(callee) if callee != unit => builder.call(callee)?,
            _ => builder.construct(plan.root)?,
        };

        Ok(Unit {
            name: sanitize_identifier(&plan.name),
            root: plan.root,
            params,
            decls,
            output,
            exprs: builder.exprs,
        })
    }

    /// The sub-fixture unit rooted at `id`, if any.
    fn callee(&self, id: NodeId) -> Option<usize> {
        self.partition.unit_of_root(id)
    }

    fn variable(&self, id: NodeId) -> Result<&'a str, CompileError> {
        self.names
            .get(id.index())
            .and_then(Option::as_deref)
            .ok_or_else(|| CompileError::invariant(format!("node {} has no variable name", id)))
    }

    fn symbol(&self, symbol: &Symbol) -> Result<SymbolRef, CompileError> {
        let rendered = self.imports.reference(symbol).ok_or_else(|| {
            CompileError::invariant(format!("module of '{}' was never imported", symbol))
        })?;
        Ok(SymbolRef {
            symbol: symbol.clone(),
            rendered,
        })
    }
}

struct UnitBuilder<'l, 'a> {
    lowering: &'l Lowering<'a>,
    unit: usize,
    exprs: Vec<Expr>,
    /// Nodes bound to a name in this unit.
    scope: HashSet<NodeId>,
    /// Nodes built but not named, waiting for their single use site.
    inline: HashMap<NodeId, ExprId>,
    consumed: HashSet<NodeId>,
}

enum Work<'v> {
    Visit(&'v Value),
    List(usize),
    Tuple(usize),
    Dict(usize),
}

impl UnitBuilder<'_, '_> {
    fn push(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    fn unit_name(&self) -> &str {
        &self.lowering.partition.units[self.unit].name
    }

    /// Expression standing for node `id` at a use site in this unit.
    fn reference(&mut self, id: NodeId) -> Result<ExprId, CompileError> {
        let lowering = self.lowering;
        if self.scope.contains(&id) {
            let name = lowering.variable(id)?.to_string();
            return Ok(self.push(Expr::Var(name)));
        }
        if let Some(callee) = lowering.callee(id) {
            if callee != self.unit && lowering.partition.home(id) == Some(self.unit) {
                return self.call(callee);
            }
        }
        if let Some(&expr) = self.inline.get(&id) {
            let fresh = node(lowering.graph, id)?.kind.is_fresh();
            if !fresh && !self.consumed.insert(id) {
                return Err(CompileError::invariant(format!(
                    "node {} is inlined twice in '{}' without a variable",
                    id,
                    self.unit_name()
                )));
            }
            return Ok(expr);
        }
        Err(CompileError::invariant(format!(
            "node {} is used before it is declared in '{}'",
            id,
            self.unit_name()
        )))
    }

    fn call(&mut self, callee: usize) -> Result<ExprId, CompileError> {
        let lowering = self.lowering;
        let mut args = Vec::new();
        for &param in &lowering.partition.units[callee].params {
            if !self.scope.contains(&param) {
                return Err(CompileError::invariant(format!(
                    "argument {} for '{}' is not bound in '{}'",
                    param,
                    lowering.partition.units[callee].name,
                    self.unit_name()
                )));
            }
            let name = lowering.variable(param)?.to_string();
            let value = self.push(Expr::Var(name.clone()));
            args.push((name, value));
        }
        Ok(self.push(Expr::Call { unit: callee, args }))
    }

    fn construct(&mut self, id: NodeId) -> Result<ExprId, CompileError> {
        let lowering = self.lowering;
        let node = node(lowering.graph, id)?;
        let target = lowering.symbol(&node.target)?;
        let mut args = Vec::with_capacity(node.fields.len());
        for (name, field) in &node.fields {
            let Some(value) = &field.value else { continue };
            let at = || format!("{} field '{}'", location(id, node), name);
            let mut value = self.value(value, &at)?;
            if !field.tags.is_empty() {
                let tags = field
                    .tags
                    .iter()
                    .map(|tag| lowering.symbol(tag))
                    .collect::<Result<Vec<_>, _>>()?;
                value = self.push(Expr::Tagged { tags, value });
            }
            args.push(Arg {
                name: name.clone(),
                value,
            });
        }
        Ok(self.push(Expr::Construct {
            node: id,
            kind: node.kind,
            target,
            args,
        }))
    }

    fn value(&mut self, value: &Value, at: &dyn Fn() -> String) -> Result<ExprId, CompileError> {
        let mut work = vec![Work::Visit(value)];
        let mut done: Vec<ExprId> = Vec::new();
        while let Some(item) = work.pop() {
            match item {
                Work::Visit(value) => match value {
                    Value::List(items) => {
                        work.push(Work::List(items.len()));
                        work.extend(items.iter().rev().map(Work::Visit));
                    }
                    Value::Tuple(items) => {
                        work.push(Work::Tuple(items.len()));
                        work.extend(items.iter().rev().map(Work::Visit));
                    }
                    Value::Dict(entries) => {
                        if let Some((key, _)) = entries.iter().find(|(key, _)| !is_hashable(key)) {
                            return Err(CompileError::unsupported(
                                at(),
                                format!("{} is not a supported dict key", key.kind_name()),
                            ));
                        }
                        work.push(Work::Dict(entries.len()));
                        for (key, item) in entries.iter().rev() {
                            work.push(Work::Visit(item));
                            work.push(Work::Visit(key));
                        }
                    }
                    Value::Node(id) => {
                        let expr = self.reference(*id)?;
                        done.push(expr);
                    }
                    Value::Opaque { type_name } => {
                        return Err(CompileError::unsupported(
                            at(),
                            format!("value of type '{}' has no source representation", type_name),
                        ));
                    }
                    Value::Symbol(symbol) => {
                        let symbol = self.lowering.symbol(symbol)?;
                        done.push(self.push(Expr::Symbol(symbol)));
                    }
                    Value::None => done.push(self.push(Expr::None)),
                    Value::Bool(v) => done.push(self.push(Expr::Bool(*v))),
                    Value::Int(v) => done.push(self.push(Expr::Int(*v))),
                    Value::Float(v) => done.push(self.push(Expr::Float(*v))),
                    Value::Str(v) => done.push(self.push(Expr::Str(v.clone()))),
                    Value::Bytes(v) => done.push(self.push(Expr::Bytes(v.clone()))),
                },
                Work::List(n) => {
                    let items = done.split_off(done.len() - n);
                    done.push(self.push(Expr::List(items)));
                }
                Work::Tuple(n) => {
                    let items = done.split_off(done.len() - n);
                    done.push(self.push(Expr::Tuple(items)));
                }
                Work::Dict(n) => {
                    let flat = done.split_off(done.len() - 2 * n);
                    let entries = flat.chunks(2).map(|pair| (pair[0], pair[1])).collect();
                    done.push(self.push(Expr::Dict(entries)));
                }
            }
        }
        done.pop()
            .ok_or_else(|| CompileError::invariant(format!("empty value at {}", at())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CodegenOptions,
        analysis::{Complexity, HoistPlan, Partition},
        testing::fixtures,
    };

    fn lower_with(graph: &Graph, root: NodeId, options: &CodegenOptions) -> Result<Program, CompileError> {
        let traversal = Traversal::walk(graph, root, options).unwrap();
        let complexity = Complexity::compute(graph, &traversal).unwrap();
        let mut hoisting = HoistPlan::compute(graph, &traversal, &complexity, options).unwrap();
        let partition = Partition::compute(graph, &traversal, &mut hoisting, options)?;
        lower(graph, &traversal, &hoisting, &partition)
    }

    #[test]
    fn test_chain_has_no_declarations() {
        let (graph, root) = fixtures::linear_chain(3);
        let program = lower_with(&graph, root, &CodegenOptions::default()).unwrap();

        assert_eq!(program.units.len(), 1);
        assert!(program.default_unit().decls.is_empty());
        assert_eq!(program.default_unit().name, "config_fixture");
    }

    #[test]
    fn test_diamond_declares_leaf_once() {
        let (graph, root) = fixtures::diamond();
        let program = lower_with(&graph, root, &CodegenOptions::default()).unwrap();
        let unit = program.default_unit();

        assert_eq!(unit.decls.len(), 1);
        assert_eq!(unit.decls[0].name, "a");
        let vars = unit
            .exprs
            .iter()
            .filter(|e| matches!(e, Expr::Var(name) if name == "a"))
            .count();
        assert_eq!(vars, 2);
    }

    #[test]
    fn test_shared_embedder_becomes_parameter() {
        let fixture = fixtures::fake_encoder_decoder();
        let options = CodegenOptions::default()
            .with_sub_fixture("fake_encoder", fixture.encoder)
            .with_sub_fixture("fake_decoder", fixture.decoder);
        let program = lower_with(&fixture.graph, fixture.root, &options).unwrap();

        let encoder = program.unit("fake_encoder").unwrap();
        assert_eq!(encoder.params.len(), 1);
        assert_eq!(encoder.params[0].name, "embedders_tokens");
        assert_eq!(program.default_unit().decls[0].name, "embedders_tokens");
    }

    #[test]
    fn test_opaque_value_is_unsupported() {
        let mut graph = Graph::new();
        let root = graph
            .add(Node::config("m.Foo").with_arg("x", Value::Opaque { type_name: "Lock".into() }))
            .unwrap();
        let err = lower_with(&graph, root, &CodegenOptions::default()).unwrap_err();

        assert!(matches!(err, CompileError::UnsupportedConstruct { .. }));
        assert!(err.to_string().contains("field 'x'"));
    }

    #[test]
    fn test_fresh_value_under_eager_node_is_unsupported() {
        let mut graph = Graph::new();
        let buffer = graph.add(Node::arg_factory("m.Buffer")).unwrap();
        let root = graph.add(Node::config("m.Foo").with_arg("b", buffer)).unwrap();
        let err = lower_with(&graph, root, &CodegenOptions::default()).unwrap_err();

        assert!(err.to_string().contains("only partial and arg_factory nodes"));
    }

    #[test]
    fn test_fresh_value_inside_list_is_unsupported() {
        let mut graph = Graph::new();
        let buffer = graph.add(Node::arg_factory("m.Buffer")).unwrap();
        let root = graph
            .add(Node::partial("m.Foo").with_arg("bs", Value::List(vec![buffer.into()])))
            .unwrap();
        let err = lower_with(&graph, root, &CodegenOptions::default()).unwrap_err();

        assert!(err.to_string().contains("direct field values"));
    }

    #[test]
    fn test_unhashable_dict_key_is_unsupported() {
        let mut graph = Graph::new();
        let root = graph
            .add(Node::config("m.Foo").with_arg(
                "table",
                Value::Dict(vec![(Value::List(vec![]), 1.into())]),
            ))
            .unwrap();
        let err = lower_with(&graph, root, &CodegenOptions::default()).unwrap_err();

        assert!(err.to_string().contains("not a supported dict key"));
    }

    #[test]
    fn test_field_name_must_be_an_identifier() {
        let mut graph = Graph::new();
        let root = graph.add(Node::config("m.Foo").with_arg("class", 1)).unwrap();
        let err = lower_with(&graph, root, &CodegenOptions::default()).unwrap_err();

        assert!(matches!(err, CompileError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_variable_never_shadows_referenced_builtin() {
        let mut graph = Graph::new();
        let leaf = graph
            .add(Node::config("models.Leaf").with_arg("kind", Symbol::parse("Exception")))
            .unwrap();
        let root = graph
            .add(Node::config("models.Root").with_arg("Exception", leaf).with_arg("b", leaf))
            .unwrap();
        let program = lower_with(&graph, root, &CodegenOptions::default()).unwrap();
        let unit = program.default_unit();

        assert_eq!(unit.decls.len(), 1);
        assert_ne!(unit.decls[0].name, "Exception");
        assert!(unit.decls[0].name.starts_with("Exception_"));
    }

    #[test]
    fn test_names_never_shadow_unlisted_builtin_symbol() {
        let mut graph = Graph::new();
        let leaf = graph.add(Node::config("models.Leaf").with_arg("x", 1)).unwrap();
        let root = graph
            .add(
                Node::config("pkg.gelu.Block")
                    .with_arg("activation", Symbol::parse("gelu"))
                    .with_arg("gelu", leaf)
                    .with_arg("b", leaf),
            )
            .unwrap();
        let program = lower_with(&graph, root, &CodegenOptions::default()).unwrap();
        let decl = &program.default_unit().decls[0];

        assert_eq!(program.imports.alias("pkg.gelu"), Some("gelu_2"));
        assert!(decl.name.starts_with("gelu_"));
        assert_ne!(decl.name, "gelu_2");
    }

    #[test]
    fn test_sub_fixture_name_collides_with_top_level() {
        let (graph, root) = fixtures::diamond();
        let leaf = graph.node(root).unwrap().references()[0];
        let options = CodegenOptions::default().with_sub_fixture("config_fixture", leaf);
        let err = lower_with(&graph, root, &options).unwrap_err();

        assert!(err.to_string().contains("already in use"));
    }
}
