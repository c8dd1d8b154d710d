//! Rendering of a [`Program`] as an `auto_config` Python module.

use fixgen_graph::NodeKind;

use super::{
    CodeBuilder,
    literal::{python_bool, python_bytes, python_float, python_str},
};
use crate::program::{Arg, Expr, ExprId, Program, Unit};

const DECORATOR: &str = "@auto_config.auto_config";

/// Prints programs as Python source.
///
/// Output depends only on the program and the indent width.
#[derive(Debug, Clone, Copy)]
pub struct PythonRenderer {
    indent: usize,
}

impl Default for PythonRenderer {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

enum Piece {
    Expr(ExprId),
    Text(String),
}

impl From<&str> for Piece {
    fn from(s: &str) -> Self {
        Piece::Text(s.to_string())
    }
}

impl PythonRenderer {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    /// Render the whole module: imports, then every unit with callees first.
    pub fn render(&self, program: &Program) -> String {
        let mut code = CodeBuilder::new(self.indent);
        for line in program.imports.lines() {
            code.push_line(&line);
        }
        for unit in program.emitted_units() {
            code.push_blank().push_blank();
            self.render_unit(&mut code, program, unit);
        }
        code.build()
    }

    fn render_unit(&self, code: &mut CodeBuilder, program: &Program, unit: &Unit) {
        let params: Vec<&str> = unit.params.iter().map(|p| p.name.as_str()).collect();
        code.push_line(DECORATOR)
            .push_line(&format!("def {}({}):", unit.name, params.join(", ")))
            .push_indent();
        for decl in &unit.decls {
            let value = self.render_expr(program, unit, decl.value);
            code.push_line(&format!("{} = {}", decl.name, value));
        }
        let output = self.render_expr(program, unit, unit.output);
        code.push_line(&format!("return {}", output)).push_dedent();
    }

    /// Render one expression of `unit` on a single line.
    pub fn render_expr(&self, program: &Program, unit: &Unit, id: ExprId) -> String {
        let mut out = String::new();
        let mut stack = vec![Piece::Expr(id)];
        while let Some(piece) = stack.pop() {
            match piece {
                Piece::Text(text) => out.push_str(&text),
                Piece::Expr(id) => {
                    let pieces = expand(program, unit, unit.expr(id));
                    stack.extend(pieces.into_iter().rev());
                }
            }
        }
        out
    }
}

/// One level of an expression: its own text with child expressions left as
/// placeholders.
fn expand(program: &Program, unit: &Unit, expr: &Expr) -> Vec<Piece> {
    match expr {
        Expr::None => vec!["None".into()],
        Expr::Bool(v) => vec![python_bool(*v).into()],
        Expr::Int(v) => vec![Piece::Text(v.to_string())],
        Expr::Float(v) => vec![Piece::Text(python_float(*v))],
        Expr::Str(v) => vec![Piece::Text(python_str(v))],
        Expr::Bytes(v) => vec![Piece::Text(python_bytes(v))],
        Expr::Symbol(symbol) => vec![Piece::Text(symbol.rendered.clone())],
        Expr::Var(name) => vec![Piece::Text(name.clone())],
        Expr::List(items) => {
            let mut pieces = vec!["[".into()];
            separated(&mut pieces, items.iter().map(|id| vec![Piece::Expr(*id)]));
            pieces.push("]".into());
            pieces
        }
        Expr::Tuple(items) => match items.as_slice() {
            [] => vec!["()".into()],
            [single] => vec!["(".into(), Piece::Expr(*single), ",)".into()],
            _ => {
                let mut pieces = vec!["(".into()];
                separated(&mut pieces, items.iter().map(|id| vec![Piece::Expr(*id)]));
                pieces.push(")".into());
                pieces
            }
        },
        Expr::Dict(entries) => {
            let mut pieces = vec!["{".into()];
            separated(
                &mut pieces,
                entries
                    .iter()
                    .map(|(k, v)| vec![Piece::Expr(*k), ": ".into(), Piece::Expr(*v)]),
            );
            pieces.push("}".into());
            pieces
        }
        Expr::Tagged { tags, value } => {
            let mut pieces: Vec<Piece> = tags
                .iter()
                .map(|tag| Piece::Text(format!("{}.new(", tag.rendered)))
                .collect();
            pieces.push(Piece::Expr(*value));
            pieces.push(Piece::Text(")".repeat(tags.len())));
            pieces
        }
        Expr::Call { unit: callee, args } => {
            let name = program
                .units
                .get(*callee)
                .map_or("<missing>", |u| u.name.as_str());
            let mut pieces = vec![Piece::Text(format!("{}(", name))];
            separated(
                &mut pieces,
                args.iter()
                    .map(|(k, v)| vec![Piece::Text(format!("{}=", k)), Piece::Expr(*v)]),
            );
            pieces.push(")".into());
            pieces
        }
        Expr::Construct {
            kind, target, args, ..
        } => match kind {
            NodeKind::Config => {
                let mut pieces = vec![Piece::Text(format!("{}(", target.rendered))];
                separated(&mut pieces, args.iter().map(keyword));
                pieces.push(")".into());
                pieces
            }
            NodeKind::Partial | NodeKind::ArgFactory => {
                let (factories, plain): (Vec<&Arg>, Vec<&Arg>) =
                    args.iter().partition(|arg| is_factory(unit, arg));
                let mut pieces = Vec::new();
                if !plain.is_empty() || factories.is_empty() {
                    pieces.push("functools.partial(".into());
                }
                if factories.is_empty() {
                    pieces.push(Piece::Text(target.rendered.clone()));
                } else {
                    pieces.push(Piece::Text(format!("arg_factory.partial({}", target.rendered)));
                    for arg in &factories {
                        pieces.push(", ".into());
                        pieces.extend(keyword(arg));
                    }
                    pieces.push(")".into());
                }
                for arg in &plain {
                    pieces.push(", ".into());
                    pieces.extend(keyword(arg));
                }
                if !plain.is_empty() || factories.is_empty() {
                    pieces.push(")".into());
                }
                pieces
            }
        },
    }
}

fn keyword(arg: &Arg) -> Vec<Piece> {
    vec![Piece::Text(format!("{}=", arg.name)), Piece::Expr(arg.value)]
}

fn is_factory(unit: &Unit, arg: &Arg) -> bool {
    matches!(
        unit.expr(arg.value),
        Expr::Construct {
            kind: NodeKind::ArgFactory,
            ..
        }
    )
}

fn separated(pieces: &mut Vec<Piece>, items: impl Iterator<Item = Vec<Piece>>) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            pieces.push(", ".into());
        }
        pieces.extend(item);
    }
}

#[cfg(test)]
mod tests {
    use fixgen_graph::{NodeId, Symbol};

    use super::*;
    use crate::{
        generation::ImportCollector,
        program::{Decl, Param, SymbolRef},
    };

    fn symbol(path: &str, rendered: &str) -> SymbolRef {
        SymbolRef {
            symbol: Symbol::parse(path),
            rendered: rendered.to_string(),
        }
    }

    fn unit(exprs: Vec<Expr>, output: u32) -> Unit {
        Unit {
            name: "config_fixture".to_string(),
            root: NodeId(0),
            params: Vec::new(),
            decls: Vec::new(),
            output: ExprId(output),
            exprs,
        }
    }

    fn program(units: Vec<Unit>) -> Program {
        let order = (0..units.len()).rev().collect();
        Program {
            imports: ImportCollector::new(),
            units,
            order,
        }
    }

    fn render_output(exprs: Vec<Expr>, output: u32) -> String {
        let program = program(vec![unit(exprs, output)]);
        let unit = program.default_unit();
        PythonRenderer::default().render_expr(&program, unit, unit.output)
    }

    #[test]
    fn test_containers() {
        let exprs = vec![
            Expr::Int(1),
            Expr::Str("a".into()),
            Expr::Tuple(vec![ExprId(0)]),
            Expr::Tuple(vec![]),
            Expr::Dict(vec![(ExprId(1), ExprId(2))]),
            Expr::List(vec![ExprId(4), ExprId(3), ExprId(0)]),
        ];
        assert_eq!(render_output(exprs, 5), "[{'a': (1,)}, (), 1]");
    }

    #[test]
    fn test_nested_tags() {
        let exprs = vec![
            Expr::Float(2.0),
            Expr::Tagged {
                tags: vec![symbol("m.ATag", "m.ATag"), symbol("m.BTag", "m.BTag")],
                value: ExprId(0),
            },
        ];
        assert_eq!(render_output(exprs, 1), "m.ATag.new(m.BTag.new(2.0))");
    }

    #[test]
    fn test_partial_forms() {
        let construct = |kind, args: Vec<(&str, u32)>| Expr::Construct {
            node: NodeId(0),
            kind,
            target: symbol("m.Foo", "m.Foo"),
            args: args
                .into_iter()
                .map(|(name, value)| Arg {
                    name: name.to_string(),
                    value: ExprId(value),
                })
                .collect(),
        };
        let exprs = vec![
            Expr::Int(1),
            construct(NodeKind::ArgFactory, vec![("x", 0)]),
            construct(NodeKind::Partial, vec![("a", 0)]),
            construct(NodeKind::Partial, vec![("f", 1)]),
            construct(NodeKind::Partial, vec![("f", 1), ("a", 0)]),
        ];

        assert_eq!(render_output(exprs.clone(), 2), "functools.partial(m.Foo, a=1)");
        assert_eq!(
            render_output(exprs.clone(), 3),
            "arg_factory.partial(m.Foo, f=functools.partial(m.Foo, x=1))"
        );
        assert_eq!(
            render_output(exprs, 4),
            "functools.partial(arg_factory.partial(m.Foo, f=functools.partial(m.Foo, x=1)), a=1)"
        );
    }

    #[test]
    fn test_units_with_parameters_and_calls() {
        let callee = Unit {
            name: "fake_encoder".to_string(),
            root: NodeId(1),
            params: vec![Param {
                name: "embedder".to_string(),
                node: NodeId(0),
            }],
            decls: Vec::new(),
            output: ExprId(1),
            exprs: vec![
                Expr::Var("embedder".into()),
                Expr::Construct {
                    node: NodeId(1),
                    kind: NodeKind::Config,
                    target: symbol("m.Encoder", "m.Encoder"),
                    args: vec![Arg {
                        name: "embedder".into(),
                        value: ExprId(0),
                    }],
                },
            ],
        };
        let default = Unit {
            name: "config_fixture".to_string(),
            root: NodeId(2),
            params: Vec::new(),
            decls: vec![Decl {
                name: "embedder".to_string(),
                node: NodeId(0),
                value: ExprId(0),
            }],
            output: ExprId(2),
            exprs: vec![
                Expr::Construct {
                    node: NodeId(0),
                    kind: NodeKind::Config,
                    target: symbol("m.Embedder", "m.Embedder"),
                    args: Vec::new(),
                },
                Expr::Var("embedder".into()),
                Expr::Call {
                    unit: 1,
                    args: vec![("embedder".into(), ExprId(1))],
                },
            ],
        };
        let program = program(vec![default, callee]);
        let code = PythonRenderer::default().render(&program);

        assert_eq!(
            code,
            "from fiddle.experimental import auto_config\n\
             \n\
             \n\
             @auto_config.auto_config\n\
             def fake_encoder(embedder):\n    \
             return m.Encoder(embedder=embedder)\n\
             \n\
             \n\
             @auto_config.auto_config\n\
             def config_fixture():\n    \
             embedder = m.Embedder()\n    \
             return fake_encoder(embedder=embedder)\n"
        );
    }
}
