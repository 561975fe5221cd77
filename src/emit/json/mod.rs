use std::collections::HashMap;
use std::io::Write;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::class::{Class, ClassId};
use crate::emit::attributes::{field_attributes, method_attributes, type_attributes};
use crate::emit::{Backend, BackendMetadata, ModuleSpec, is_top_level, output_writer};
use crate::graph::TypeGraph;

/// Writes the module as a JSON manifest of its types and members.
#[derive(Default)]
pub(crate) struct JsonBackend {
    module: Option<ModuleSpec>,
    types: Vec<TypeEntry>,
    slots: HashMap<ClassId, usize>,
    sealed: bool,
}

#[derive(Debug, Serialize)]
struct ModuleDocument<'a> {
    module: &'a str,
    references: &'a [String],
    types: &'a [TypeEntry],
}

#[derive(Debug, Serialize)]
struct TypeEntry {
    name: String,
    namespace: String,
    short_name: String,
    internal_name: String,
    declaring_type: Option<String>,
    attributes: Vec<&'static str>,
    base_types: Vec<TypeReference>,
    fields: Vec<FieldEntry>,
    methods: Vec<MethodEntry>,
    nested_types: Vec<String>,
    #[serde(skip)]
    defined: bool,
}

#[derive(Debug, Serialize)]
struct TypeReference {
    name: String,
    external: bool,
}

#[derive(Debug, Serialize)]
struct FieldEntry {
    name: String,
    signature: String,
    #[serde(rename = "type")]
    field_type: String,
    attributes: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct MethodEntry {
    name: String,
    signature: String,
    parameters: Vec<String>,
    return_type: String,
    attributes: Vec<&'static str>,
}

impl TypeEntry {
    fn placeholder(class: &Class) -> Self {
        Self {
            name: class.fully_qualified_name().to_string(),
            namespace: class.namespace(),
            short_name: class.name().to_string(),
            internal_name: class.internal_name().to_string(),
            declaring_type: None,
            attributes: Vec::new(),
            base_types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            nested_types: Vec::new(),
            defined: false,
        }
    }
}

impl Backend for JsonBackend {
    fn metadata(&self) -> BackendMetadata {
        BackendMetadata {
            id: "json",
            extension: "json",
            description: "JSON manifest of the module's types and members",
        }
    }

    fn begin_module(&mut self, module: &ModuleSpec) -> Result<()> {
        if self.module.is_some() {
            bail!("module already begun");
        }
        self.module = Some(module.clone());
        Ok(())
    }

    fn declare_type(&mut self, graph: &TypeGraph, class: ClassId) -> Result<()> {
        let node = graph.class(class);
        if self.slots.contains_key(&class) {
            bail!("type {node} declared twice");
        }
        self.slots.insert(class, self.types.len());
        self.types.push(TypeEntry::placeholder(node));
        Ok(())
    }

    fn define_type(&mut self, graph: &TypeGraph, class: ClassId) -> Result<()> {
        let node = graph.class(class);
        let Some(slot) = self.slots.get(&class).copied() else {
            bail!("type {node} was not declared");
        };
        let entry = &mut self.types[slot];
        if entry.defined {
            bail!("type {node} defined twice");
        }
        let nested = !is_top_level(graph, class);
        entry.declaring_type = node
            .declaring_class()
            .filter(|_| nested)
            .map(|declaring| graph.class(declaring).fully_qualified_name().to_string());
        entry.attributes = type_attributes(node, nested)
            .into_iter()
            .map(|attribute| attribute.name())
            .collect();
        entry.base_types = node
            .base_types()
            .iter()
            .map(|base| {
                let base = graph.class(*base);
                TypeReference {
                    name: base.fully_qualified_name().to_string(),
                    external: base.is_external(),
                }
            })
            .collect();
        entry.fields = node
            .fields()
            .iter()
            .map(|field| FieldEntry {
                name: field.name().to_string(),
                signature: field.signature().to_string(),
                field_type: field.descriptor().display(graph).to_string(),
                attributes: field_attributes(field)
                    .into_iter()
                    .map(|attribute| attribute.name())
                    .collect(),
            })
            .collect();
        entry.methods = node
            .methods()
            .iter()
            .map(|method| MethodEntry {
                name: method.name().to_string(),
                signature: method.signature().to_string(),
                parameters: method
                    .arguments()
                    .iter()
                    .map(|argument| argument.display(graph).to_string())
                    .collect(),
                return_type: method.return_type().display(graph).to_string(),
                attributes: method_attributes(method)
                    .into_iter()
                    .map(|attribute| attribute.name())
                    .collect(),
            })
            .collect();
        entry.nested_types = node
            .inner_classes()
            .iter()
            .map(|inner| graph.class(*inner).fully_qualified_name().to_string())
            .collect();
        entry.defined = true;
        Ok(())
    }

    fn seal_types(&mut self, _graph: &TypeGraph) -> Result<()> {
        if let Some(entry) = self.types.iter().find(|entry| !entry.defined) {
            bail!("type {} was declared but never defined", entry.name);
        }
        self.sealed = true;
        Ok(())
    }

    fn end_module(&mut self) -> Result<()> {
        let Some(module) = self.module.take() else {
            bail!("module was never begun");
        };
        if !self.sealed {
            bail!("types of module {} were not sealed", module.name);
        }
        let document = ModuleDocument {
            module: &module.name,
            references: &module.references,
            types: &self.types,
        };
        let mut writer = output_writer(&module.output)?;
        serde_json::to_writer_pretty(&mut writer, &document)
            .context("failed to serialize module manifest")?;
        writer
            .write_all(b"\n")
            .context("failed to write module manifest")?;
        writer.flush().context("failed to write module manifest")?;
        Ok(())
    }
}

crate::register_backend!(JsonBackend);
