//! Small graphs shaped like real model configs.

use fixgen_graph::{Graph, Node, NodeId, Symbol, Value};

fn add(graph: &mut Graph, node: Node) -> NodeId {
    graph.add(node).expect("fixture nodes only reference earlier nodes")
}

/// `models.Leaf(x=0)` wrapped `n - 1` times in `models.Wrap(depth=i, inner=...)`.
pub fn linear_chain(n: usize) -> (Graph, NodeId) {
    assert!(n > 0, "a chain needs at least one node");
    let mut graph = Graph::new();
    let mut prev = add(&mut graph, Node::config("models.Leaf").with_arg("x", 0));
    for depth in 1..n {
        let node = Node::config("models.Wrap")
            .with_arg("depth", depth as i64)
            .with_arg("inner", prev);
        prev = add(&mut graph, node);
    }
    (graph, prev)
}

/// A root whose two fields reference the same leaf.
pub fn diamond() -> (Graph, NodeId) {
    let mut graph = Graph::new();
    let leaf = add(&mut graph, Node::config("models.Leaf").with_arg("x", 1));
    let root = add(
        &mut graph,
        Node::config("models.Root").with_arg("a", leaf).with_arg("b", leaf),
    );
    (graph, root)
}

/// An encoder-decoder whose halves share one token embedder.
pub struct EncoderDecoder {
    pub graph: Graph,
    pub root: NodeId,
    pub encoder: NodeId,
    pub decoder: NodeId,
    pub token_embedder: NodeId,
    pub encoder_attention: NodeId,
    pub decoder_attention: NodeId,
    pub encoder_mlp: NodeId,
}

pub fn fake_encoder_decoder() -> EncoderDecoder {
    let mut graph = Graph::new();
    let float32 = Value::Symbol(Symbol::parse("jax.numpy.float32"));

    let token_embedder = add(
        &mut graph,
        Node::config("models.layers.TokenEmbedder")
            .with_arg("num_embeddings", 32_000)
            .with_arg("features", 512)
            .with_arg("dtype", float32.clone())
            .with_tag("dtype", "models.tags.ActivationDType"),
    );
    let embedders = || {
        Value::Dict(vec![
            (Value::from("tokens"), Value::Node(token_embedder)),
            (Value::from("position"), Value::None),
        ])
    };

    let encoder_attention = add(
        &mut graph,
        Node::config("models.layers.Attention")
            .with_arg("num_heads", 8)
            .with_arg("dropout", 0.1)
            .with_arg("dtype", float32.clone()),
    );
    let encoder_mlp = add(
        &mut graph,
        Node::config("models.layers.Mlp")
            .with_arg("hidden", Value::List(vec![2048.into(), 512.into()]))
            .with_arg("activation", Value::Symbol(Symbol::parse("jax.nn.gelu"))),
    );
    let encoder = add(
        &mut graph,
        Node::config("models.layers.FakeEncoder")
            .with_arg("embedders", embedders())
            .with_arg("attention", encoder_attention)
            .with_arg("mlp", encoder_mlp),
    );

    let decoder_attention = add(
        &mut graph,
        Node::config("models.layers.Attention")
            .with_arg("num_heads", 8)
            .with_arg("dropout", 0.1)
            .with_arg("causal", true)
            .with_arg("dtype", float32),
    );
    let decoder_mlp = add(
        &mut graph,
        Node::config("models.layers.Mlp")
            .with_arg("hidden", Value::Tuple(vec![2048.into(), 512.into()]))
            .with_arg("activation", Value::Symbol(Symbol::parse("jax.nn.relu"))),
    );
    let decoder = add(
        &mut graph,
        Node::config("models.layers.FakeDecoder")
            .with_arg("embedders", embedders())
            .with_arg("self_attention", decoder_attention)
            .with_arg("mlp", decoder_mlp)
            .with_arg("name", "decoder"),
    );

    let root = add(
        &mut graph,
        Node::config("models.FakeEncoderDecoder")
            .with_arg("encoder", encoder)
            .with_arg("decoder", decoder),
    );

    EncoderDecoder {
        graph,
        root,
        encoder,
        decoder,
        token_embedder,
        encoder_attention,
        decoder_attention,
        encoder_mlp,
    }
}

/// A trainer holding two references to one per-call-fresh buffer.
pub struct ArgFactoryConfig {
    pub graph: Graph,
    pub root: NodeId,
    pub trainer: NodeId,
    pub buffer: NodeId,
    pub shared: NodeId,
}

pub fn arg_factory_config() -> ArgFactoryConfig {
    let mut graph = Graph::new();
    let shared = add(&mut graph, Node::config("models.Shared").with_arg("size", 3));
    let buffer = add(
        &mut graph,
        Node::arg_factory("models.Buffer")
            .with_arg("fill", 0.0)
            .with_arg("source", shared),
    );
    let trainer = add(
        &mut graph,
        Node::partial("models.Trainer")
            .with_arg("lr", 0.1)
            .with_arg("buffer", buffer)
            .with_arg("other_buffer", buffer),
    );
    let root = add(
        &mut graph,
        Node::config("models.Experiment").with_arg("trainer", trainer),
    );

    ArgFactoryConfig {
        graph,
        root,
        trainer,
        buffer,
        shared,
    }
}

/// A layer whose `dtype` field is tagged but never set.
pub fn dangling_tag() -> (Graph, NodeId) {
    let mut graph = Graph::new();
    let root = add(
        &mut graph,
        Node::config("models.layers.Dense")
            .with_arg("features", 16)
            .with_tag("dtype", "models.tags.ActivationDType"),
    );
    (graph, root)
}
