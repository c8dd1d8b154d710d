//! Inputs the compiler must reject, and how it reports them.

use fixgen_codegen::{CodegenOptions, CompileError, compile, testing::fixtures};
use fixgen_graph::{Graph, Node, NodeId, Value};

fn compile_error(graph: &Graph, root: NodeId, options: CodegenOptions) -> CompileError {
    let report = compile(graph, root, options).expect_err("compilation should fail");
    match report.downcast::<CompileError>() {
        Ok(err) => err,
        Err(report) => panic!("not a compile error: {:?}", report),
    }
}

#[test]
fn test_dangling_tag_is_a_validation_error() {
    let (graph, root) = fixtures::dangling_tag();
    let err = compile_error(&graph, root, CodegenOptions::default());

    let CompileError::Validation { count, summary } = err else {
        panic!("expected a validation error, got {err}");
    };
    assert_eq!(count, 1);
    assert!(summary.contains("models.tags.ActivationDType"));
}

#[test]
fn test_zero_indent_is_rejected_before_rendering() {
    let (graph, root) = fixtures::diamond();
    let err = compile_error(&graph, root, CodegenOptions::default().with_indent(0));

    let CompileError::Validation { count, summary } = err else {
        panic!("expected a validation error, got {err}");
    };
    assert_eq!(count, 1);
    assert!(summary.contains("indent is 0"));
}

#[test]
fn test_unknown_root() {
    let (graph, _) = fixtures::diamond();
    let err = compile_error(&graph, NodeId(42), CodegenOptions::default());
    assert!(err.to_string().contains("is not in the graph"));
}

#[test]
fn test_errors_are_collected_before_failing() {
    let fixture = fixtures::arg_factory_config();
    let mut graph = fixture.graph.clone();
    let orphan = graph.add(Node::config("models.Orphan")).unwrap();
    let options = CodegenOptions::default()
        .with_sub_fixture("buffer", fixture.buffer)
        .with_sub_fixture("orphan", orphan)
        .with_sub_fixture("again", orphan)
        .with_max_expression_complexity(0);

    let err = compile_error(&graph, fixture.root, options);
    // unreachable twice, fresh root, duplicate, budget
    assert!(matches!(err, CompileError::Validation { count: 5, .. }));
}

#[test]
fn test_opaque_value() {
    let mut graph = Graph::new();
    let root = graph
        .add(Node::config("models.Cache").with_arg(
            "lock",
            Value::Opaque {
                type_name: "threading.Lock".into(),
            },
        ))
        .unwrap();
    let err = compile_error(&graph, root, CodegenOptions::default());

    assert!(matches!(err, CompileError::UnsupportedConstruct { .. }));
    assert!(err.to_string().contains("threading.Lock"));
}

#[test]
fn test_fresh_root() {
    let mut graph = Graph::new();
    let root = graph.add(Node::arg_factory("models.Buffer")).unwrap();
    let err = compile_error(&graph, root, CodegenOptions::default());
    assert!(err.to_string().contains("cannot be the fixture root"));
}

#[test]
fn test_fresh_value_under_config() {
    let mut graph = Graph::new();
    let buffer = graph.add(Node::arg_factory("models.Buffer")).unwrap();
    let root = graph
        .add(Node::config("models.Trainer").with_arg("buffer", buffer))
        .unwrap();
    let err = compile_error(&graph, root, CodegenOptions::default());
    assert!(err.to_string().contains("only partial and arg_factory nodes accept them"));
}

#[test]
fn test_tagged_fresh_value() {
    let mut graph = Graph::new();
    let buffer = graph.add(Node::arg_factory("models.Buffer")).unwrap();
    let root = graph
        .add(
            Node::partial("models.Trainer")
                .with_arg("buffer", buffer)
                .with_tag("buffer", "models.tags.Buffer"),
        )
        .unwrap();
    let err = compile_error(&graph, root, CodegenOptions::default());
    assert!(err.to_string().contains("cannot be tagged"));
}

#[test]
fn test_keyword_field_name() {
    let mut graph = Graph::new();
    let root = graph
        .add(Node::config("models.Layer").with_arg("lambda", 0.5))
        .unwrap();
    let err = compile_error(&graph, root, CodegenOptions::default());
    assert!(err.to_string().contains("field 'lambda'"));
}

#[test]
fn test_function_name_taken_by_module_alias_is_not_an_error() {
    // Function names are reserved first, so the module gets a suffixed alias.
    let mut graph = Graph::new();
    let root = graph.add(Node::config("models.layers.Dense")).unwrap();
    let options = CodegenOptions::default().with_top_level_fixture_name("layers");
    let source = compile(&graph, root, options).unwrap();

    assert!(source.contains("from models import layers as layers_2\n"));
    assert!(source.contains("def layers():\n    return layers_2.Dense()\n"));
}
