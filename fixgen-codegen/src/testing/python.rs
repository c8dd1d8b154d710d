//! Execution of rendered modules under `python3`.
//!
//! [`replay`](super::replay) interprets the lowered program; this runs the
//! text itself. A harness script stubs `fiddle` and every imported module,
//! turns each public builtin into a symbol, calls one fixture function and
//! prints the graph it built. Name resolution, indentation and the partial
//! forms are all exercised the way a real interpreter would.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    io::Write,
    process::{Command, Stdio},
    sync::OnceLock,
};

use eyre::{Context, Result, bail, eyre};
use fixgen_graph::{Field, Graph, Node, NodeId, NodeKind, Symbol, Value};
use serde::{Deserialize, Serialize};

use super::{PythonSyntaxChecker, write_to_temp};
use crate::program::{Expr, Program, SymbolRef};

const HARNESS: &str = include_str!("harness.py");

/// Returns true if `python3` can run the harness. Checked once per process.
pub fn available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(PythonSyntaxChecker::available)
}

/// Run the top-level fixture of `source` and return the graph it builds.
pub fn run_default(program: &Program, source: &str) -> Result<(Graph, NodeId)> {
    let unit = program.default_unit();
    execute(program, source, &unit.name, &[], &Graph::new())
}

/// Run the unit named `name`, with parameters bound to copies of the nodes
/// they stand for in `original`.
pub fn run_unit(
    program: &Program,
    source: &str,
    name: &str,
    original: &Graph,
) -> Result<(Graph, NodeId)> {
    let unit = program
        .unit(name)
        .ok_or_else(|| eyre!("no unit named '{}'", name))?;
    let params: Vec<(String, NodeId)> = unit
        .params
        .iter()
        .map(|p| (p.name.clone(), p.node))
        .collect();
    execute(program, source, &unit.name, &params, original)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Encoded {
    None,
    Bool(bool),
    Int(i64),
    /// Python `repr` of the float, so infinities and NaN survive.
    Float(String),
    Str(String),
    Bytes(Vec<u8>),
    Symbol(String),
    List(Vec<Encoded>),
    Tuple(Vec<Encoded>),
    Dict(Vec<(Encoded, Encoded)>),
    /// Index into the node list.
    Node(usize),
}

#[derive(Debug, Serialize, Deserialize)]
struct EncodedField {
    name: String,
    value: Option<Encoded>,
    tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EncodedNode {
    kind: NodeKind,
    target: String,
    fields: Vec<EncodedField>,
}

#[derive(Serialize)]
struct Request<'a> {
    module: String,
    modules: Vec<&'a str>,
    /// Dotless symbols the program references, real builtins or not.
    builtins: BTreeSet<&'a str>,
    function: &'a str,
    nodes: Vec<EncodedNode>,
    params: BTreeMap<String, Encoded>,
}

#[derive(Deserialize)]
struct Response {
    nodes: Vec<EncodedNode>,
    root: Encoded,
}

fn execute(
    program: &Program,
    source: &str,
    function: &str,
    params: &[(String, NodeId)],
    original: &Graph,
) -> Result<(Graph, NodeId)> {
    let (dir, module) = write_to_temp("fixture_module", source)?;
    let harness = dir.path().join("harness.py");
    std::fs::write(&harness, HARNESS)?;

    let (nodes, index) = encode_subgraph(original, params.iter().map(|(_, id)| *id))?;
    let params = params
        .iter()
        .map(|(name, id)| Ok((name.clone(), Encoded::Node(lookup(&index, *id)?))))
        .collect::<Result<BTreeMap<_, _>>>()?;
    let request = Request {
        module: module.display().to_string(),
        modules: program.imports.iter().map(|(module, _)| module).collect(),
        builtins: builtin_names(program),
        function,
        nodes,
        params,
    };

    let mut child = Command::new("python3")
        .arg(&harness)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .wrap_err("Failed to start python3")?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| eyre!("python3 stdin is not piped"))?;
    stdin.write_all(&serde_json::to_vec(&request)?)?;
    drop(stdin);

    let output = child.wait_with_output()?;
    if !output.status.success() {
        bail!(
            "'{}' failed under python3:\n{}",
            function,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    let response: Response =
        serde_json::from_slice(&output.stdout).wrap_err("Harness printed malformed JSON")?;
    decode_graph(response)
}

fn builtin_names(program: &Program) -> BTreeSet<&str> {
    let mut names = BTreeSet::new();
    for expr in program.units.iter().flat_map(|unit| &unit.exprs) {
        let symbols: Vec<&SymbolRef> = match expr {
            Expr::Symbol(symbol) => vec![symbol],
            Expr::Construct { target, .. } => vec![target],
            Expr::Tagged { tags, .. } => tags.iter().collect(),
            _ => Vec::new(),
        };
        names.extend(
            symbols
                .into_iter()
                .filter(|s| s.symbol.is_builtin())
                .map(|s| s.symbol.name.as_str()),
        );
    }
    names
}

fn lookup(index: &HashMap<NodeId, usize>, id: NodeId) -> Result<usize> {
    index
        .get(&id)
        .copied()
        .ok_or_else(|| eyre!("node {} was not encoded before its parent", id))
}

/// Encode every node reachable from `roots`, children first.
fn encode_subgraph(
    graph: &Graph,
    roots: impl IntoIterator<Item = NodeId>,
) -> Result<(Vec<EncodedNode>, HashMap<NodeId, usize>)> {
    let mut reachable = HashSet::new();
    for root in roots {
        reachable.extend(graph.descendants(root)?);
    }
    // Ids are assigned in insertion order, so children sort first.
    let mut ids: Vec<NodeId> = reachable.into_iter().collect();
    ids.sort();

    let mut nodes = Vec::with_capacity(ids.len());
    let mut index = HashMap::with_capacity(ids.len());
    for id in ids {
        let node = graph.node(id)?;
        let fields = node
            .fields
            .iter()
            .map(|(name, field)| {
                Ok(EncodedField {
                    name: name.clone(),
                    value: field
                        .value
                        .as_ref()
                        .map(|value| encode(value, &index))
                        .transpose()?,
                    tags: field.tags.iter().map(Symbol::to_string).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        index.insert(id, nodes.len());
        nodes.push(EncodedNode {
            kind: node.kind,
            target: node.target.to_string(),
            fields,
        });
    }
    Ok((nodes, index))
}

fn encode(value: &Value, index: &HashMap<NodeId, usize>) -> Result<Encoded> {
    let encode_all = |items: &[Value]| {
        items
            .iter()
            .map(|item| encode(item, index))
            .collect::<Result<Vec<_>>>()
    };
    Ok(match value {
        Value::None => Encoded::None,
        Value::Bool(v) => Encoded::Bool(*v),
        Value::Int(v) => Encoded::Int(*v),
        Value::Float(v) => Encoded::Float(python_float_repr(*v)),
        Value::Str(v) => Encoded::Str(v.clone()),
        Value::Bytes(v) => Encoded::Bytes(v.clone()),
        Value::Symbol(symbol) => Encoded::Symbol(symbol.to_string()),
        Value::List(items) => Encoded::List(encode_all(items)?),
        Value::Tuple(items) => Encoded::Tuple(encode_all(items)?),
        Value::Dict(entries) => Encoded::Dict(
            entries
                .iter()
                .map(|(key, item)| Ok((encode(key, index)?, encode(item, index)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Node(id) => Encoded::Node(lookup(index, *id)?),
        Value::Opaque { type_name } => bail!("opaque '{}' cannot be passed to python3", type_name),
    })
}

/// A float spelling both `float()` in Python and `f64::from_str` accept.
fn python_float_repr(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:?}", v)
    }
}

fn decode_graph(response: Response) -> Result<(Graph, NodeId)> {
    let mut graph = Graph::new();
    let mut ids: Vec<NodeId> = Vec::with_capacity(response.nodes.len());
    for encoded in response.nodes {
        let mut node = Node::new(encoded.kind, Symbol::parse(&encoded.target));
        for field in encoded.fields {
            let value = field.value.map(|v| decode(v, &ids)).transpose()?;
            let tags: BTreeSet<Symbol> = field.tags.iter().map(|t| Symbol::parse(t)).collect();
            node.fields.insert(field.name, Field { value, tags });
        }
        ids.push(graph.add(node)?);
    }
    match decode(response.root, &ids)? {
        Value::Node(root) => Ok((graph, root)),
        other => bail!("fixture returned a {} instead of a node", other.kind_name()),
    }
}

fn decode(encoded: Encoded, ids: &[NodeId]) -> Result<Value> {
    let decode_all = |items: Vec<Encoded>| {
        items
            .into_iter()
            .map(|item| decode(item, ids))
            .collect::<Result<Vec<_>>>()
    };
    Ok(match encoded {
        Encoded::None => Value::None,
        Encoded::Bool(v) => Value::Bool(v),
        Encoded::Int(v) => Value::Int(v),
        Encoded::Float(v) => Value::Float(
            v.parse()
                .map_err(|e| eyre!("float '{}' from python3: {}", v, e))?,
        ),
        Encoded::Str(v) => Value::Str(v),
        Encoded::Bytes(v) => Value::Bytes(v),
        Encoded::Symbol(path) => Value::Symbol(Symbol::parse(&path)),
        Encoded::List(items) => Value::List(decode_all(items)?),
        Encoded::Tuple(items) => Value::Tuple(decode_all(items)?),
        Encoded::Dict(entries) => Value::Dict(
            entries
                .into_iter()
                .map(|(key, item)| Ok((decode(key, ids)?, decode(item, ids)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
        Encoded::Node(index) => Value::Node(
            *ids.get(index)
                .ok_or_else(|| eyre!("node {} is used before it is listed", index))?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use fixgen_graph::dag_eq;

    use super::*;
    use crate::{
        CodegenOptions,
        testing::{compile_program, fixtures},
    };

    #[test]
    fn test_python_float_repr() {
        assert_eq!(python_float_repr(0.5), "0.5");
        assert_eq!(python_float_repr(f64::NEG_INFINITY), "-inf");
        assert_eq!(python_float_repr(f64::NAN), "nan");
    }

    #[test]
    fn test_arg_factory_module_runs() {
        if !available() {
            return;
        }
        let fixture = fixtures::arg_factory_config();
        let (program, source) =
            compile_program(&fixture.graph, fixture.root, CodegenOptions::default()).unwrap();
        let (rebuilt, root) = run_default(&program, &source).unwrap();

        dag_eq(&fixture.graph, fixture.root, &rebuilt, root).unwrap();
    }

    #[test]
    fn test_unit_with_parameters_runs_alone() {
        if !available() {
            return;
        }
        let fixture = fixtures::fake_encoder_decoder();
        let options = CodegenOptions::default()
            .with_sub_fixture("fake_encoder", fixture.encoder)
            .with_sub_fixture("fake_decoder", fixture.decoder);
        let (program, source) = compile_program(&fixture.graph, fixture.root, options).unwrap();

        let (rebuilt, root) = run_unit(&program, &source, "fake_encoder", &fixture.graph).unwrap();
        dag_eq(&fixture.graph, fixture.encoder, &rebuilt, root).unwrap();
    }

    #[test]
    fn test_shadowed_builtin_fails_at_runtime() {
        if !available() {
            return;
        }
        let (graph, root) = fixtures::diamond();
        let (program, source) =
            compile_program(&graph, root, CodegenOptions::default()).unwrap();
        let name = &program.default_unit().decls[0].name;
        let broken = source
            .replace(&format!("{} = ", name), "Exception = ")
            .replace(&format!("={}", name), "=Exception")
            .replace("(x=1)", "(x=Exception)");

        let err = run_default(&program, &broken).unwrap_err();
        assert!(err.to_string().contains("UnboundLocalError"), "{err}");
    }

    #[test]
    fn test_unindented_body_fails() {
        if !available() {
            return;
        }
        let (graph, root) = fixtures::diamond();
        let (program, source) =
            compile_program(&graph, root, CodegenOptions::default()).unwrap();
        let flat = source.replace("    ", "");

        assert!(run_default(&program, &flat).is_err());
    }
}
