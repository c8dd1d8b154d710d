//! Compiled fixtures must rebuild the graph they were compiled from.

use fixgen_codegen::{
    CodegenOptions,
    testing::{
        PythonSyntaxChecker, assert_round_trip, assert_valid_source, compile_program, fixtures,
    },
};
use fixgen_graph::{Graph, Node, Symbol, Value};

#[test]
fn test_diamond() {
    let (graph, root) = fixtures::diamond();
    let program = assert_round_trip(&graph, root, CodegenOptions::default());
    assert_eq!(program.variable_count(), 1);
}

#[test]
fn test_chain_under_every_budget() {
    let (graph, root) = fixtures::linear_chain(10);
    assert_round_trip(&graph, root, CodegenOptions::default());
    for max in 1..=20 {
        let options = CodegenOptions::default().with_max_expression_complexity(max);
        assert_round_trip(&graph, root, options);
    }
}

#[test]
fn test_tight_budget_names_more_nodes() {
    let (graph, root) = fixtures::linear_chain(10);
    let loose = assert_round_trip(
        &graph,
        root,
        CodegenOptions::default().with_max_expression_complexity(12),
    );
    let tight = assert_round_trip(
        &graph,
        root,
        CodegenOptions::default().with_max_expression_complexity(3),
    );
    assert!(tight.variable_count() > loose.variable_count());
}

#[test]
fn test_deep_chain() {
    let (graph, root) = fixtures::linear_chain(10_000);
    assert_round_trip(&graph, root, CodegenOptions::default());
}

#[test]
fn test_encoder_decoder_every_sub_fixture_choice() {
    let fixture = fixtures::fake_encoder_decoder();
    let candidates = [
        ("fake_encoder", fixture.encoder),
        ("fake_decoder", fixture.decoder),
        ("encoder_attention", fixture.encoder_attention),
        ("token_embedder", fixture.token_embedder),
        ("whole", fixture.root),
    ];

    for mask in 0u32..(1 << candidates.len()) {
        let mut options = CodegenOptions::default();
        for (i, (name, root)) in candidates.iter().enumerate() {
            if mask & (1 << i) != 0 {
                options = options.with_sub_fixture(*name, *root);
            }
        }
        assert_round_trip(&fixture.graph, fixture.root, options.clone());
        assert_round_trip(
            &fixture.graph,
            fixture.root,
            options.with_max_expression_complexity(4),
        );
    }
}

#[test]
fn test_fresh_values_keep_their_shared_child() {
    let fixture = fixtures::arg_factory_config();
    assert_round_trip(&fixture.graph, fixture.root, CodegenOptions::default());
    assert_round_trip(
        &fixture.graph,
        fixture.root,
        CodegenOptions::default().with_sub_fixture("trainer", fixture.trainer),
    );
    assert_round_trip(
        &fixture.graph,
        fixture.root,
        CodegenOptions::default()
            .with_sub_fixture("trainer", fixture.trainer)
            .with_sub_fixture("shared", fixture.shared),
    );
}

#[test]
fn test_literals_survive() {
    let mut graph = Graph::new();
    let inner = graph
        .add(Node::config("models.layers.Inner").with_arg("name", "it's \"quoted\"\n"))
        .unwrap();
    let root = graph
        .add(
            Node::config("models.layers.Outer")
                .with_arg("flag", false)
                .with_arg("neg", -7)
                .with_arg("big", i64::MAX)
                .with_arg("ratio", 1e-12)
                .with_arg("limit", f64::INFINITY)
                .with_arg("raw", Value::Bytes(vec![0, b'\'', 0xff]))
                .with_arg("nothing", Value::None)
                .with_arg("empty", Value::Tuple(vec![]))
                .with_arg("single", Value::Tuple(vec![inner.into()]))
                .with_arg(
                    "table",
                    Value::Dict(vec![
                        (Value::Int(1), Value::List(vec![inner.into(), 2.5.into()])),
                        (
                            Value::Tuple(vec!["a".into(), Value::None]),
                            Value::Symbol(Symbol::parse("jax.nn.relu")),
                        ),
                    ]),
                )
                .with_arg("kind", Value::Symbol(Symbol::parse("dict")))
                .with_arg("scale", 2.0)
                .with_tag("scale", "models.tags.Scale")
                .with_tag("scale", "models.tags.Learnable"),
        )
        .unwrap();

    let program = assert_round_trip(&graph, root, CodegenOptions::default());
    assert_eq!(program.variable_count(), 1);
}

#[test]
fn test_module_alias_collisions() {
    let mut graph = Graph::new();
    let a = graph.add(Node::config("models.layers.Dense")).unwrap();
    let b = graph.add(Node::config("other.layers.Conv")).unwrap();
    let c = graph.add(Node::config("third.layers.Pool")).unwrap();
    let root = graph
        .add(
            Node::config("models.Stack")
                .with_arg("layers", Value::List(vec![a.into(), b.into(), c.into()])),
        )
        .unwrap();

    let (_, source) = compile_program(&graph, root, CodegenOptions::default()).unwrap();
    assert!(source.contains("from other import layers as layers_2\n"));
    assert!(source.contains("from third import layers as layers_3\n"));
    assert!(source.contains("layers=[layers.Dense(), layers_2.Conv(), layers_3.Pool()]"));
    assert_round_trip(&graph, root, CodegenOptions::default());
}

#[test]
fn test_variable_names_avoid_reserved_words() {
    let mut graph = Graph::new();
    let leaf = graph.add(Node::config("models.Leaf")).unwrap();
    let root = graph
        .add(
            Node::config("models.Root")
                .with_arg("list", leaf)
                .with_arg("other", leaf),
        )
        .unwrap();

    let (program, source) = compile_program(&graph, root, CodegenOptions::default()).unwrap();
    let name = &program.default_unit().decls[0].name;
    assert_ne!(name, "list");
    assert!(source.contains(&format!("return models.Root(list={name}, other={name})")));
    assert_round_trip(&graph, root, CodegenOptions::default());
}

#[test]
fn test_variable_names_avoid_referenced_builtins() {
    for builtin in ["Exception", "complex", "relu"] {
        let mut graph = Graph::new();
        let leaf = graph
            .add(Node::config("models.Leaf").with_arg("kind", Symbol::parse(builtin)))
            .unwrap();
        let root = graph
            .add(
                Node::config("models.Root")
                    .with_arg(builtin, leaf)
                    .with_arg("b", leaf),
            )
            .unwrap();

        let (program, source) =
            compile_program(&graph, root, CodegenOptions::default()).unwrap();
        let name = &program.default_unit().decls[0].name;
        assert_ne!(name, builtin);
        assert!(source.contains(&format!("{name} = models.Leaf(kind={builtin})")));
        assert_round_trip(&graph, root, CodegenOptions::default());
    }
}

#[test]
fn test_generated_modules_parse() {
    if !PythonSyntaxChecker::available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let fixture = fixtures::fake_encoder_decoder();
    let options = CodegenOptions::default()
        .with_sub_fixture("fake_encoder", fixture.encoder)
        .with_sub_fixture("fake_decoder", fixture.decoder)
        .with_max_expression_complexity(4);
    let (_, source) = compile_program(&fixture.graph, fixture.root, options).unwrap();
    assert_valid_source(&source, &PythonSyntaxChecker).unwrap();

    let fixture = fixtures::arg_factory_config();
    let (_, source) =
        compile_program(&fixture.graph, fixture.root, CodegenOptions::default()).unwrap();
    assert_valid_source(&source, &PythonSyntaxChecker).unwrap();
}

#[test]
fn test_output_is_deterministic() {
    let fixture = fixtures::fake_encoder_decoder();
    let options = CodegenOptions::default()
        .with_sub_fixture("fake_encoder", fixture.encoder)
        .with_max_expression_complexity(5);
    let first = compile_program(&fixture.graph, fixture.root, options.clone()).unwrap().1;
    for _ in 0..5 {
        let again = compile_program(&fixture.graph, fixture.root, options.clone()).unwrap().1;
        assert_eq!(first, again);
    }
}

#[test]
fn test_unreachable_nodes_are_ignored() {
    let mut graph = Graph::new();
    let _orphan = graph.add(Node::config("unused.Orphan").with_arg("x", 1)).unwrap();
    let root = graph.add(Node::config("models.Leaf").with_arg("x", 2)).unwrap();

    let (_, source) = compile_program(&graph, root, CodegenOptions::default()).unwrap();
    assert!(!source.contains("unused"));
    assert_eq!(source.lines().last(), Some("    return models.Leaf(x=2)"));
}
