use std::fmt;

use crate::class::ClassId;
use crate::error::{Error, Result};
use crate::graph::TypeGraph;

/// A resolved field or method-part descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Descriptor {
    /// Primitive letter (or `V`), bound to its pseudo-class.
    Basic(ClassId),
    /// `L<name>;`
    Object(ClassId),
    /// `[<component>`
    Array(Box<Descriptor>),
}

impl Descriptor {
    /// Number of array dimensions: 2 for `[[I`, 0 for `I`.
    pub(crate) fn array_rank(&self) -> usize {
        let mut rank = 0;
        let mut current = self;
        while let Descriptor::Array(component) = current {
            rank += 1;
            current = component;
        }
        rank
    }

    /// Class bound by the innermost non-array descriptor.
    pub(crate) fn element_class(&self) -> ClassId {
        match self {
            Descriptor::Basic(id) | Descriptor::Object(id) => *id,
            Descriptor::Array(component) => component.element_class(),
        }
    }

    /// Characters this descriptor occupies in its textual form.
    pub(crate) fn width(&self, graph: &TypeGraph) -> usize {
        match self {
            Descriptor::Basic(_) => 1,
            Descriptor::Object(id) => graph.class(*id).internal_name().len() + 2,
            Descriptor::Array(component) => 1 + component.width(graph),
        }
    }

    /// Java-style rendering, e.g. `java.lang.String[]`.
    pub(crate) fn display<'a>(&'a self, graph: &'a TypeGraph) -> DescriptorDisplay<'a> {
        DescriptorDisplay {
            descriptor: self,
            graph,
        }
    }
}

pub(crate) struct DescriptorDisplay<'a> {
    descriptor: &'a Descriptor,
    graph: &'a TypeGraph,
}

impl fmt::Display for DescriptorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.descriptor {
            Descriptor::Basic(id) | Descriptor::Object(id) => {
                f.write_str(self.graph.class(*id).fully_qualified_name())
            }
            Descriptor::Array(component) => write!(f, "{}[]", component.display(self.graph)),
        }
    }
}

/// Parsed method descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MethodDescriptor {
    pub(crate) arguments: Vec<Descriptor>,
    pub(crate) return_type: Descriptor,
}

/// Resolve a field descriptor such as `[Ljava/lang/String;`, loading named classes.
pub(crate) fn parse_field_descriptor(graph: &mut TypeGraph, value: &str) -> Result<Descriptor> {
    let descriptor = parse_type(graph, value, value, false)?;
    if descriptor.width(graph) != value.len() {
        return Err(Error::descriptor(value, "trailing characters"));
    }
    Ok(descriptor)
}

/// Resolve a method descriptor such as `(I[JLjava/lang/String;)V`.
///
/// Arguments are split by the width each one consumes.
pub(crate) fn parse_method_descriptor(
    graph: &mut TypeGraph,
    value: &str,
) -> Result<MethodDescriptor> {
    let Some(mut rest) = value.strip_prefix('(') else {
        return Err(Error::descriptor(value, "method descriptor must start with `(`"));
    };
    let mut arguments = Vec::new();
    loop {
        match rest.as_bytes().first() {
            None => return Err(Error::descriptor(value, "missing `)`")),
            Some(b')') => break,
            Some(_) => {
                let argument = parse_type(graph, rest, value, false)?;
                rest = &rest[argument.width(graph)..];
                arguments.push(argument);
            }
        }
    }
    let return_text = &rest[1..];
    let return_type = parse_type(graph, return_text, value, true)?;
    if return_type.width(graph) != return_text.len() {
        return Err(Error::descriptor(value, "trailing characters after return type"));
    }
    Ok(MethodDescriptor {
        arguments,
        return_type,
    })
}

// Parses one descriptor from the start of `text`; `whole` is used for errors.
fn parse_type(
    graph: &mut TypeGraph,
    text: &str,
    whole: &str,
    allow_void: bool,
) -> Result<Descriptor> {
    let Some(first) = text.chars().next() else {
        return Err(Error::descriptor(whole, "unexpected end"));
    };
    match first {
        'L' => {
            let Some(end) = text.find(';') else {
                return Err(Error::descriptor(whole, "object type is missing `;`"));
            };
            let name = &text[1..end];
            if name.is_empty() {
                return Err(Error::descriptor(whole, "empty class name"));
            }
            Ok(Descriptor::Object(graph.load_class(name)?))
        }
        '[' => {
            let component = parse_type(graph, &text[1..], whole, false)?;
            Ok(Descriptor::Array(Box::new(component)))
        }
        'V' if !allow_void => Err(Error::descriptor(whole, "`V` is only valid as a return type")),
        letter => match graph.primitive(letter) {
            Some(id) => Ok(Descriptor::Basic(id)),
            None => Err(Error::descriptor(
                whole,
                format!("unknown type letter `{letter}`"),
            )),
        },
    }
}
