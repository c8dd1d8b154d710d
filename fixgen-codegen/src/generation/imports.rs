//! Import collection for the generated module.

use fixgen_graph::Symbol;
use indexmap::IndexMap;
use serde::Serialize;

use crate::naming::{Namer, sanitize_identifier};

/// Tracks which modules the generated code needs and the alias each one is
/// bound to.
///
/// Maintains insertion order for deterministic output.
///
/// # Example
///
/// ```
/// use fixgen_codegen::{generation::ImportCollector, naming::Namer};
/// use fixgen_graph::Symbol;
///
/// let mut namer = Namer::python();
/// let mut imports = ImportCollector::new();
/// imports.add(&Symbol::parse("models.layers.Dense"), &mut namer);
/// imports.add(&Symbol::parse("other.layers.Conv"), &mut namer);
///
/// assert_eq!(imports.reference(&Symbol::parse("models.layers.Dense")).unwrap(), "layers.Dense");
/// assert_eq!(imports.reference(&Symbol::parse("other.layers.Conv")).unwrap(), "layers_2.Conv");
/// assert_eq!(imports.lines()[2], "from other import layers as layers_2");
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportCollector {
    /// Module path -> local alias
    modules: IndexMap<String, String>,
    functools: bool,
    arg_factory: bool,
}

impl ImportCollector {
    /// Create a new empty import collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module of `symbol`, allocating an alias on first sight.
    ///
    /// A builtin needs no import, but its name is reserved so no variable or
    /// alias shadows it.
    pub fn add(&mut self, symbol: &Symbol, namer: &mut Namer) {
        if symbol.is_builtin() {
            namer.reserve(&symbol.name);
            return;
        }
        if self.modules.contains_key(&symbol.module) {
            return;
        }
        let last = symbol
            .module
            .rsplit('.')
            .next()
            .unwrap_or(symbol.module.as_str());
        let base = sanitize_identifier(last);
        let alias = if namer.reserve(&base) {
            base
        } else {
            let mut n = 2;
            loop {
                let candidate = format!("{}_{}", base, n);
                if namer.reserve(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        };
        self.modules.insert(symbol.module.clone(), alias);
    }

    /// Mark `functools` as used.
    pub fn use_functools(&mut self) {
        self.functools = true;
    }

    /// Mark `fiddle.arg_factory` as used.
    pub fn use_arg_factory(&mut self) {
        self.arg_factory = true;
    }

    /// Get the alias bound to a module.
    pub fn alias(&self, module: &str) -> Option<&str> {
        self.modules.get(module).map(String::as_str)
    }

    /// The expression that names `symbol` in generated code.
    ///
    /// Returns `None` for a symbol whose module was never added.
    pub fn reference(&self, symbol: &Symbol) -> Option<String> {
        if symbol.is_builtin() {
            return Some(symbol.name.clone());
        }
        self.alias(&symbol.module)
            .map(|alias| format!("{}.{}", alias, symbol.name))
    }

    /// Import statements, support modules first, then user modules in the
    /// order they were added.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.modules.len() + 3);
        if self.functools {
            lines.push("import functools".to_string());
        }
        if self.arg_factory {
            lines.push("from fiddle import arg_factory".to_string());
        }
        lines.push("from fiddle.experimental import auto_config".to_string());

        for (module, alias) in &self.modules {
            let line = match module.rsplit_once('.') {
                Some((package, last)) if last == alias => {
                    format!("from {} import {}", package, last)
                }
                Some((package, last)) => format!("from {} import {} as {}", package, last, alias),
                None if module == alias => format!("import {}", module),
                None => format!("import {} as {}", module, alias),
            };
            lines.push(line);
        }
        lines
    }

    /// Iterate over `(module, alias)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules.iter().map(|(m, a)| (m.as_str(), a.as_str()))
    }

    /// Get the number of user modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_module() {
        let mut namer = Namer::python();
        let mut imports = ImportCollector::new();
        imports.add(&Symbol::parse("numpy.float32"), &mut namer);

        assert_eq!(
            imports.reference(&Symbol::parse("numpy.float32")).as_deref(),
            Some("numpy.float32")
        );
        assert_eq!(
            imports.lines(),
            vec!["from fiddle.experimental import auto_config", "import numpy"]
        );
    }

    #[test]
    fn test_builtins_need_no_import() {
        let mut namer = Namer::python();
        let mut imports = ImportCollector::new();
        imports.add(&Symbol::parse("print"), &mut namer);

        assert!(imports.is_empty());
        assert_eq!(imports.reference(&Symbol::parse("print")).as_deref(), Some("print"));
    }

    #[test]
    fn test_builtin_reference_reserves_its_name() {
        let mut namer = Namer::python();
        let mut imports = ImportCollector::new();
        imports.add(&Symbol::parse("gelu"), &mut namer);

        assert!(namer.is_taken("gelu"));
        assert_eq!(namer.claim("gelu", 4), "gelu_4");
    }

    #[test]
    fn test_alias_avoids_reserved_names() {
        let mut namer = Namer::python();
        namer.reserve("model");
        let mut imports = ImportCollector::new();
        imports.add(&Symbol::parse("pkg.model.Encoder"), &mut namer);
        imports.add(&Symbol::parse("lib.functools.Thing"), &mut namer);

        assert_eq!(imports.alias("pkg.model"), Some("model_2"));
        assert_eq!(imports.alias("lib.functools"), Some("functools_2"));
        assert!(namer.is_taken("model_2"));
    }

    #[test]
    fn test_support_imports() {
        let mut imports = ImportCollector::new();
        imports.use_arg_factory();
        imports.use_functools();

        assert_eq!(
            imports.lines(),
            vec![
                "import functools",
                "from fiddle import arg_factory",
                "from fiddle.experimental import auto_config",
            ]
        );
    }

    #[test]
    fn test_unknown_module() {
        let imports = ImportCollector::new();
        assert_eq!(imports.reference(&Symbol::parse("m.X")), None);
    }
}
