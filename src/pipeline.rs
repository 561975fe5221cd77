use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use tracing::{info, warn};

use crate::archive::{ClassFileTable, merge, read_archive};
use crate::emit::{ModuleSpec, backend_by_id, emit_module};
use crate::error::Error;
use crate::graph::TypeGraph;
use crate::telemetry::{Telemetry, with_span};

/// Reference module used when none is given.
pub(crate) const DEFAULT_REFERENCE: &str = "rt";
/// Emission backend used when none is given.
pub(crate) const DEFAULT_TARGET: &str = "json";

/// Settings for one conversion run.
#[derive(Clone, Debug)]
pub(crate) struct ConversionOptions {
    pub(crate) archives: Vec<PathBuf>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) references: Vec<String>,
    pub(crate) target: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            archives: Vec::new(),
            output: None,
            references: vec![DEFAULT_REFERENCE.to_string()],
            target: DEFAULT_TARGET.to_string(),
        }
    }
}

impl ConversionOptions {
    /// Module name and output path: an explicit output wins, otherwise the
    /// first archive's name without `.jar`/`.zip`, next to that archive.
    pub(crate) fn module_spec(&self, extension: &str) -> Result<ModuleSpec> {
        let (name, output) = match &self.output {
            Some(output) => (module_name(output), output.clone()),
            None => {
                let first = self
                    .archives
                    .first()
                    .context("at least one archive is required")?;
                let name = module_name(first);
                let output = first.with_file_name(format!("{name}.{extension}"));
                (name, output)
            }
        };
        Ok(ModuleSpec {
            name,
            output,
            references: self.references.clone(),
        })
    }
}

fn module_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = file_name.to_ascii_lowercase();
    let stripped = [".jar", ".zip", ".json", ".il", ".dll"]
        .iter()
        .find(|suffix| lower.ends_with(*suffix) && lower.len() > suffix.len())
        .map(|suffix| file_name[..file_name.len() - suffix.len()].to_string());
    stripped.unwrap_or(file_name)
}

/// Merged class files of all readable archives.
#[derive(Debug, Default)]
pub(crate) struct LoadedArchives {
    pub(crate) class_files: ClassFileTable,
    pub(crate) archives_read: usize,
    pub(crate) skipped: Vec<PathBuf>,
}

/// Read archives in order; later archives win on name clashes.
///
/// Archives that cannot be opened or inflated are logged and skipped.
pub(crate) fn load_archives(
    paths: &[PathBuf],
    telemetry: Option<&Telemetry>,
) -> Result<LoadedArchives> {
    let mut loaded = LoadedArchives::default();
    for path in paths {
        let attributes = [KeyValue::new(
            "caffeinator.archive",
            path.display().to_string(),
        )];
        let result = with_span(telemetry, "archive.read", &attributes, || read_archive(path));
        match result {
            Ok(table) => {
                let count = table.len();
                for name in merge(&mut loaded.class_files, table) {
                    warn!(
                        class = %name,
                        archive = %path.display(),
                        "class replaced by later archive"
                    );
                }
                info!(archive = %path.display(), classes = count, "read archive");
                loaded.archives_read += 1;
            }
            Err(err @ Error::MissingReference { .. }) => {
                warn!("skipping archive: {err}");
                loaded.skipped.push(path.clone());
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(loaded)
}

/// Load every class of `class_files` into a new graph and link nested classes.
pub(crate) fn build_graph(
    class_files: ClassFileTable,
    telemetry: Option<&Telemetry>,
) -> Result<TypeGraph> {
    let names: Vec<String> = class_files.keys().cloned().collect();
    let mut graph = TypeGraph::new(class_files);
    with_span(telemetry, "graph.load", &[], || -> Result<()> {
        for name in &names {
            graph
                .load_class(name)
                .with_context(|| format!("failed to load class {name}"))?;
        }
        Ok(())
    })?;
    with_span(telemetry, "graph.inner_classes", &[], || {
        graph.resolve_inner_classes()
    });
    info!(classes = names.len(), nodes = graph.len(), "built type graph");
    Ok(graph)
}

/// Outcome of a conversion run.
#[derive(Clone, Debug)]
pub(crate) struct ConversionSummary {
    pub(crate) module: ModuleSpec,
    pub(crate) archives_read: usize,
    pub(crate) archives_skipped: usize,
    pub(crate) class_files: usize,
    pub(crate) graph_nodes: usize,
    pub(crate) emitted_types: usize,
    pub(crate) emitted_fields: usize,
    pub(crate) emitted_methods: usize,
    pub(crate) load_ms: u128,
    pub(crate) graph_ms: u128,
    pub(crate) emit_ms: u128,
}

/// Read the archives, build the type graph and emit the module.
pub(crate) fn convert(
    options: &ConversionOptions,
    telemetry: Option<&Telemetry>,
) -> Result<ConversionSummary> {
    for archive in &options.archives {
        if !archive.exists() {
            return Err(Error::MissingArchive(archive.clone()).into());
        }
    }
    let mut backend = backend_by_id(&options.target)?;
    let module = options.module_spec(backend.metadata().extension)?;

    let started_at = Instant::now();
    let loaded = load_archives(&options.archives, telemetry)?;
    let load_ms = started_at.elapsed().as_millis();
    let class_files = loaded.class_files.len();

    let started_at = Instant::now();
    let graph = build_graph(loaded.class_files, telemetry)?;
    let graph_ms = started_at.elapsed().as_millis();

    let started_at = Instant::now();
    let attributes = [KeyValue::new("caffeinator.target", options.target.clone())];
    let emitted = with_span(telemetry, "emit", &attributes, || {
        emit_module(backend.as_mut(), &graph, &module)
    })?;
    let emit_ms = started_at.elapsed().as_millis();

    Ok(ConversionSummary {
        module,
        archives_read: loaded.archives_read,
        archives_skipped: loaded.skipped.len(),
        class_files,
        graph_nodes: graph.len(),
        emitted_types: emitted.types,
        emitted_fields: emitted.fields,
        emitted_methods: emitted.methods,
        load_ms,
        graph_ms,
        emit_ms,
    })
}
