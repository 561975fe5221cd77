use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::io::Write;

use anyhow::{Context, Result, bail};

use crate::class::{ClassId, Field, Method};
use crate::descriptor::Descriptor;
use crate::emit::attributes::{field_attributes, method_attributes, type_attributes};
use crate::emit::{Backend, BackendMetadata, ModuleSpec, is_top_level, output_writer};
use crate::graph::TypeGraph;

/// Writes CLR assembler source declaring the module's types with stub bodies.
#[derive(Default)]
pub(crate) struct IlasmBackend {
    module: Option<ModuleSpec>,
    declared: Vec<ClassId>,
    bodies: HashMap<ClassId, TypeBody>,
    rendered: Option<String>,
}

struct TypeBody {
    header: String,
    members: Vec<String>,
}

impl IlasmBackend {
    fn reference_assembly(&self) -> Option<&str> {
        self.module
            .as_ref()
            .and_then(|module| module.references.first())
            .map(String::as_str)
    }

    fn type_reference(&self, graph: &TypeGraph, id: ClassId) -> String {
        let class = graph.class(id);
        if class.is_primitive() {
            return primitive_keyword(class.internal_name()).to_string();
        }
        let path = nesting_path(graph, id);
        match self.reference_assembly() {
            Some(assembly) if class.is_external() => format!("[{}]{path}", quote(assembly)),
            _ => path,
        }
    }

    fn signature_type(&self, graph: &TypeGraph, descriptor: &Descriptor) -> String {
        let element = descriptor.element_class();
        let mut text = self.type_reference(graph, element);
        if !graph.class(element).is_primitive() {
            text.insert_str(0, "class ");
        }
        text.push_str(&"[]".repeat(descriptor.array_rank()));
        text
    }

    fn field_lines(&self, graph: &TypeGraph, field: &Field) -> Vec<String> {
        let keywords = field_attributes(field)
            .into_iter()
            .map(|attribute| attribute.keyword())
            .collect::<Vec<_>>()
            .join(" ");
        vec![format!(
            ".field {keywords} {} {}",
            self.signature_type(graph, field.descriptor()),
            quote(field.name())
        )]
    }

    fn method_lines(&self, graph: &TypeGraph, method: &Method) -> Vec<String> {
        let parameters = method
            .arguments()
            .iter()
            .map(|argument| self.signature_type(graph, argument))
            .collect::<Vec<_>>()
            .join(", ");
        let keywords = method_attributes(method)
            .into_iter()
            .map(|attribute| attribute.keyword())
            .collect::<Vec<_>>()
            .join(" ");
        let header = if method.is_constructor() {
            format!(
                ".method {keywords} hidebysig specialname rtspecialname \
                 instance void .ctor({parameters}) cil managed"
            )
        } else {
            let instance = if method.is_static() { "" } else { "instance " };
            format!(
                ".method {keywords} hidebysig {instance}{} {}({parameters}) cil managed",
                self.signature_type(graph, method.return_type()),
                quote(method.name())
            )
        };
        let mut lines = vec![header, "{".to_string()];
        if !method.is_abstract() {
            lines.push("  ldnull".to_string());
            lines.push("  throw".to_string());
        }
        lines.push("}".to_string());
        lines
    }

    fn render_module(&self, graph: &TypeGraph, module: &ModuleSpec) -> Result<String, fmt::Error> {
        let mut out = String::new();
        writeln!(out, "// module {}", module.name)?;
        for reference in &module.references {
            writeln!(out, ".assembly extern {} {{ }}", quote(reference))?;
        }
        writeln!(out, ".assembly {} {{ }}", quote(&module.name))?;
        writeln!(out, ".module {}", quote(&format!("{}.dll", module.name)))?;
        for id in &self.declared {
            if is_top_level(graph, *id) {
                out.push('\n');
                self.render_type(graph, *id, 0, &mut out)?;
            }
        }
        Ok(out)
    }

    fn render_type(
        &self,
        graph: &TypeGraph,
        id: ClassId,
        depth: usize,
        out: &mut String,
    ) -> fmt::Result {
        let Some(body) = self.bodies.get(&id) else {
            return Ok(());
        };
        let indent = "  ".repeat(depth);
        writeln!(out, "{indent}{}", body.header)?;
        writeln!(out, "{indent}{{")?;
        for line in &body.members {
            writeln!(out, "{indent}  {line}")?;
        }
        for inner in graph.class(id).inner_classes() {
            if graph.class(*inner).is_defined() {
                self.render_type(graph, *inner, depth + 1, out)?;
            }
        }
        writeln!(out, "{indent}}}")
    }
}

impl Backend for IlasmBackend {
    fn metadata(&self) -> BackendMetadata {
        BackendMetadata {
            id: "ilasm",
            extension: "il",
            description: "CLR assembler source with stub method bodies",
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
        if self.declared.contains(&class) {
            bail!("type {} declared twice", graph.class(class));
        }
        self.declared.push(class);
        Ok(())
    }

    fn define_type(&mut self, graph: &TypeGraph, class: ClassId) -> Result<()> {
        let node = graph.class(class);
        if !self.declared.contains(&class) {
            bail!("type {node} was not declared");
        }
        let top_level = is_top_level(graph, class);
        let keywords = type_attributes(node, !top_level)
            .into_iter()
            .map(|attribute| attribute.keyword())
            .collect::<Vec<_>>()
            .join(" ");
        let name = if top_level {
            quote(node.fully_qualified_name())
        } else {
            quote(node.name())
        };
        let mut header = format!(".class {keywords} auto ansi {name}");

        let mut bases = node.base_types().iter().copied();
        if !node.is_interface() {
            if let Some(superclass) = bases.next() {
                header.push_str(" extends ");
                header.push_str(&self.type_reference(graph, superclass));
            }
        }
        let interfaces: Vec<String> = bases
            .filter(|base| graph.class(*base).internal_name() != "java/lang/Object")
            .map(|base| self.type_reference(graph, base))
            .collect();
        if !interfaces.is_empty() {
            header.push_str(" implements ");
            header.push_str(&interfaces.join(", "));
        }

        let mut members = Vec::new();
        for field in node.fields() {
            members.extend(self.field_lines(graph, field));
        }
        for method in node.methods() {
            if method.is_class_initializer() {
                continue;
            }
            members.extend(self.method_lines(graph, method));
        }
        self.bodies.insert(class, TypeBody { header, members });
        Ok(())
    }

    fn seal_types(&mut self, graph: &TypeGraph) -> Result<()> {
        let Some(module) = self.module.as_ref() else {
            bail!("module was never begun");
        };
        if let Some(missing) = self.declared.iter().find(|id| !self.bodies.contains_key(id)) {
            bail!("type {} was declared but never defined", graph.class(*missing));
        }
        let rendered = self
            .render_module(graph, module)
            .context("failed to render assembler source")?;
        self.rendered = Some(rendered);
        Ok(())
    }

    fn end_module(&mut self) -> Result<()> {
        let Some(module) = self.module.take() else {
            bail!("module was never begun");
        };
        let Some(rendered) = self.rendered.take() else {
            bail!("types of module {} were not sealed", module.name);
        };
        let mut writer = output_writer(&module.output)?;
        writer
            .write_all(rendered.as_bytes())
            .and_then(|()| writer.flush())
            .context("failed to write assembler source")?;
        Ok(())
    }
}

crate::register_backend!(IlasmBackend);

fn primitive_keyword(letter: &str) -> &'static str {
    match letter {
        "B" => "int8",
        "C" => "char",
        "D" => "float64",
        "F" => "float32",
        "I" => "int32",
        "J" => "int64",
        "S" => "int16",
        "Z" => "bool",
        _ => "void",
    }
}

// Outer types first, nested names joined with `/`.
fn nesting_path(graph: &TypeGraph, id: ClassId) -> String {
    let class = graph.class(id);
    match class.declaring_class() {
        Some(declaring) if graph.class(declaring).is_defined() == class.is_defined() => {
            format!("{}/{}", nesting_path(graph, declaring), quote(class.name()))
        }
        _ => quote(class.fully_qualified_name()),
    }
}

fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
}
