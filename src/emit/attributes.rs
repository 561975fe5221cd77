//! Mapping of JVM access flags onto target-runtime type and member attributes.

use crate::class::{Class, Field, Method};
use crate::flags::{FieldAccessFlags, MethodAccessFlags};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TypeAttribute {
    Public,
    NotPublic,
    NestedPublic,
    NestedFamily,
    Interface,
    Abstract,
    Sealed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MethodAttribute {
    Public,
    Family,
    Private,
    Assembly,
    Abstract,
    Static,
    Virtual,
    Final,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FieldAttribute {
    Public,
    Family,
    Private,
    Assembly,
    Static,
    InitOnly,
    NotSerialized,
}

impl TypeAttribute {
    pub(crate) fn name(self) -> &'static str {
        match self {
            TypeAttribute::Public => "Public",
            TypeAttribute::NotPublic => "NotPublic",
            TypeAttribute::NestedPublic => "NestedPublic",
            TypeAttribute::NestedFamily => "NestedFamily",
            TypeAttribute::Interface => "Interface",
            TypeAttribute::Abstract => "Abstract",
            TypeAttribute::Sealed => "Sealed",
        }
    }

    /// Assembler keyword for this attribute.
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            TypeAttribute::Public => "public",
            TypeAttribute::NotPublic => "private",
            TypeAttribute::NestedPublic => "nested public",
            TypeAttribute::NestedFamily => "nested family",
            TypeAttribute::Interface => "interface",
            TypeAttribute::Abstract => "abstract",
            TypeAttribute::Sealed => "sealed",
        }
    }
}

impl MethodAttribute {
    pub(crate) fn name(self) -> &'static str {
        match self {
            MethodAttribute::Public => "Public",
            MethodAttribute::Family => "Family",
            MethodAttribute::Private => "Private",
            MethodAttribute::Assembly => "Assembly",
            MethodAttribute::Abstract => "Abstract",
            MethodAttribute::Static => "Static",
            MethodAttribute::Virtual => "Virtual",
            MethodAttribute::Final => "Final",
        }
    }

    pub(crate) fn keyword(self) -> &'static str {
        match self {
            MethodAttribute::Public => "public",
            MethodAttribute::Family => "family",
            MethodAttribute::Private => "private",
            MethodAttribute::Assembly => "assembly",
            MethodAttribute::Abstract => "abstract",
            MethodAttribute::Static => "static",
            MethodAttribute::Virtual => "virtual",
            MethodAttribute::Final => "final",
        }
    }
}

impl FieldAttribute {
    pub(crate) fn name(self) -> &'static str {
        match self {
            FieldAttribute::Public => "Public",
            FieldAttribute::Family => "Family",
            FieldAttribute::Private => "Private",
            FieldAttribute::Assembly => "Assembly",
            FieldAttribute::Static => "Static",
            FieldAttribute::InitOnly => "InitOnly",
            FieldAttribute::NotSerialized => "NotSerialized",
        }
    }

    pub(crate) fn keyword(self) -> &'static str {
        match self {
            FieldAttribute::Public => "public",
            FieldAttribute::Family => "family",
            FieldAttribute::Private => "private",
            FieldAttribute::Assembly => "assembly",
            FieldAttribute::Static => "static",
            FieldAttribute::InitOnly => "initonly",
            FieldAttribute::NotSerialized => "notserialized",
        }
    }
}

/// Visibility, kind and inheritance attributes of a type.
///
/// `nested` is true when the type is emitted inside its enclosing type; nested
/// types only distinguish public from everything else.
pub(crate) fn type_attributes(class: &Class, nested: bool) -> Vec<TypeAttribute> {
    let mut attributes = Vec::new();
    attributes.push(match (nested, class.is_public()) {
        (false, true) => TypeAttribute::Public,
        (false, false) => TypeAttribute::NotPublic,
        (true, true) => TypeAttribute::NestedPublic,
        (true, false) => TypeAttribute::NestedFamily,
    });
    if class.is_interface() {
        attributes.push(TypeAttribute::Interface);
    }
    if class.is_abstract() || class.is_interface() {
        attributes.push(TypeAttribute::Abstract);
    }
    if class.is_final() {
        attributes.push(TypeAttribute::Sealed);
    }
    attributes
}

pub(crate) fn method_attributes(method: &Method) -> Vec<MethodAttribute> {
    let flags = method.access_flags();
    let mut attributes = vec![method_visibility(flags)];
    if flags.contains(MethodAccessFlags::ABSTRACT) {
        attributes.push(MethodAttribute::Abstract);
    }
    if flags.contains(MethodAccessFlags::STATIC) {
        attributes.push(MethodAttribute::Static);
    } else if !method.is_constructor() {
        attributes.push(MethodAttribute::Virtual);
        if flags.contains(MethodAccessFlags::FINAL) {
            attributes.push(MethodAttribute::Final);
        }
    }
    attributes
}

pub(crate) fn field_attributes(field: &Field) -> Vec<FieldAttribute> {
    let flags = field.access_flags();
    let visibility = if flags.contains(FieldAccessFlags::PUBLIC) {
        FieldAttribute::Public
    } else if flags.contains(FieldAccessFlags::PROTECTED) {
        FieldAttribute::Family
    } else if flags.contains(FieldAccessFlags::PRIVATE) {
        FieldAttribute::Private
    } else {
        FieldAttribute::Assembly
    };
    let mut attributes = vec![visibility];
    if flags.contains(FieldAccessFlags::STATIC) {
        attributes.push(FieldAttribute::Static);
    }
    if flags.contains(FieldAccessFlags::FINAL) {
        attributes.push(FieldAttribute::InitOnly);
    }
    if flags.contains(FieldAccessFlags::TRANSIENT) {
        attributes.push(FieldAttribute::NotSerialized);
    }
    attributes
}

fn method_visibility(flags: MethodAccessFlags) -> MethodAttribute {
    if flags.contains(MethodAccessFlags::PUBLIC) {
        MethodAttribute::Public
    } else if flags.contains(MethodAccessFlags::PROTECTED) {
        MethodAttribute::Family
    } else if flags.contains(MethodAccessFlags::PRIVATE) {
        MethodAttribute::Private
    } else {
        MethodAttribute::Assembly
    }
}
