use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::class::ClassId;
use crate::graph::TypeGraph;

pub(crate) mod attributes;

// Backend modules are generated by build.rs from src/emit/*/mod.rs.
include!(concat!(env!("OUT_DIR"), "/emit_modules.rs"));

/// Metadata describing an emission backend.
#[derive(Clone, Debug)]
pub(crate) struct BackendMetadata {
    pub(crate) id: &'static str,
    /// File extension appended to the default output path.
    pub(crate) extension: &'static str,
    pub(crate) description: &'static str,
}

/// The module being produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ModuleSpec {
    pub(crate) name: String,
    /// Output path; `-` means stdout.
    pub(crate) output: PathBuf,
    pub(crate) references: Vec<String>,
}

/// Two-phase target-runtime emitter.
///
/// Every type is declared before any type is defined, so definitions may
/// reference types in any order, including cyclically.
pub(crate) trait Backend {
    fn metadata(&self) -> BackendMetadata;
    fn begin_module(&mut self, module: &ModuleSpec) -> Result<()>;
    /// Declare a placeholder for `class`.
    fn declare_type(&mut self, graph: &TypeGraph, class: ClassId) -> Result<()>;
    /// Populate a declared placeholder with base types and members.
    fn define_type(&mut self, graph: &TypeGraph, class: ClassId) -> Result<()>;
    /// Finalize all defined types.
    fn seal_types(&mut self, graph: &TypeGraph) -> Result<()>;
    /// Persist the module.
    fn end_module(&mut self) -> Result<()>;
}

/// Wrapper struct for backend factory functions to enable inventory collection.
pub(crate) struct BackendFactory(pub fn() -> Box<dyn Backend>);

inventory::collect!(BackendFactory);

/// Macro to register a backend implementation.
///
/// Usage: `register_backend!(BackendName);`
#[macro_export]
macro_rules! register_backend {
    ($backend_type:ty) => {
        inventory::submit! {
            $crate::emit::BackendFactory(|| Box::new(<$backend_type>::default()))
        }
    };
}

/// Returns all registered backends, ordered by id.
pub(crate) fn all_backends() -> Vec<Box<dyn Backend>> {
    let mut backends: Vec<Box<dyn Backend>> = inventory::iter::<BackendFactory>
        .into_iter()
        .map(|factory| (factory.0)())
        .collect();
    backends.sort_by_key(|backend| backend.metadata().id);
    backends
}

pub(crate) fn backend_by_id(id: &str) -> Result<Box<dyn Backend>> {
    let backends = all_backends();
    let available: Vec<&'static str> = backends
        .iter()
        .map(|backend| backend.metadata().id)
        .collect();
    match backends
        .into_iter()
        .find(|backend| backend.metadata().id == id)
    {
        Some(backend) => Ok(backend),
        None => bail!("unknown target `{id}` (available: {})", available.join(", ")),
    }
}

/// Counts reported after a module has been written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EmitSummary {
    pub(crate) types: usize,
    pub(crate) fields: usize,
    pub(crate) methods: usize,
}

/// Drive `backend` over every defined class of `graph`.
pub(crate) fn emit_module(
    backend: &mut dyn Backend,
    graph: &TypeGraph,
    module: &ModuleSpec,
) -> Result<EmitSummary> {
    let metadata = backend.metadata();
    let classes = graph.defined_classes();
    info!(
        target_backend = metadata.id,
        module = %module.name,
        types = classes.len(),
        "emitting module"
    );

    backend
        .begin_module(module)
        .with_context(|| format!("failed to begin module {}", module.name))?;
    for id in &classes {
        backend
            .declare_type(graph, *id)
            .with_context(|| format!("failed to declare {}", graph.class(*id)))?;
    }
    let mut summary = EmitSummary::default();
    for id in &classes {
        let class = graph.class(*id);
        debug!(class = %class, "defining type");
        backend
            .define_type(graph, *id)
            .with_context(|| format!("failed to define {class}"))?;
        summary.types += 1;
        summary.fields += class.fields().len();
        summary.methods += class.methods().len();
    }
    backend.seal_types(graph).context("failed to seal types")?;
    backend
        .end_module()
        .with_context(|| format!("failed to write {}", module.output.display()))?;
    Ok(summary)
}

/// Writer for `path`; `-` means stdout.
pub(crate) fn output_writer(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout()));
    }
    Ok(Box::new(
        File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
    ))
}

/// Types of `graph` emitted at top level: defined classes without a defined declaring class.
pub(crate) fn is_top_level(graph: &TypeGraph, class: ClassId) -> bool {
    match graph.class(class).declaring_class() {
        Some(declaring) => !graph.class(declaring).is_defined(),
        None => true,
    }
}
