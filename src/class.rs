use std::fmt;

use crate::descriptor::Descriptor;
use crate::error::{Error, MemberKind, Result};
use crate::flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

/// Handle of a class node inside a [`crate::graph::TypeGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ClassId(pub(crate) usize);

/// Where a class node came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClassKind {
    /// Pseudo-class standing for a primitive descriptor letter.
    Primitive,
    /// Referenced but not present in any loaded archive.
    External,
    /// Populated from a class file.
    Defined,
}

/// A class node of the type graph.
#[derive(Clone, Debug)]
pub(crate) struct Class {
    internal_name: String,
    fully_qualified_name: String,
    kind: ClassKind,
    access_flags: ClassAccessFlags,
    base_types: Vec<ClassId>,
    fields: Vec<Field>,
    methods: Vec<Method>,
    inner_classes: Vec<ClassId>,
    declaring_class: Option<ClassId>,
}

impl Class {
    /// Empty node for `internal_name`, e.g. `java/util/Map$Entry`.
    pub(crate) fn stub(internal_name: &str) -> Self {
        Self::with_names(
            internal_name.to_string(),
            fully_qualified_name(internal_name),
            ClassKind::External,
        )
    }

    pub(crate) fn primitive(letter: char, keyword: &str) -> Self {
        Self::with_names(letter.to_string(), keyword.to_string(), ClassKind::Primitive)
    }

    fn with_names(internal_name: String, fully_qualified_name: String, kind: ClassKind) -> Self {
        Self {
            internal_name,
            fully_qualified_name,
            kind,
            access_flags: ClassAccessFlags::empty(),
            base_types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            declaring_class: None,
        }
    }

    pub(crate) fn internal_name(&self) -> &str {
        &self.internal_name
    }

    /// Dotted name with `+` separating nested classes: `java.util.Map+Entry`.
    pub(crate) fn fully_qualified_name(&self) -> &str {
        &self.fully_qualified_name
    }

    /// Simple name: `Entry` for `java.util.Map+Entry`, `Object` for `java.lang.Object`.
    pub(crate) fn name(&self) -> &str {
        let fqn = self.fully_qualified_name.as_str();
        match fqn.rfind('+') {
            Some(index) => &fqn[index + 1..],
            None => fqn.rsplit('.').next().unwrap_or(fqn),
        }
    }

    /// Dotted package: `java.util` for `java/util/Map$Entry`; empty in the default package.
    pub(crate) fn namespace(&self) -> String {
        match self.internal_name.rfind('/') {
            Some(index) => self.internal_name[..index].replace('/', "."),
            None => String::new(),
        }
    }

    pub(crate) fn is_primitive(&self) -> bool {
        self.kind == ClassKind::Primitive
    }

    pub(crate) fn is_external(&self) -> bool {
        self.kind == ClassKind::External
    }

    pub(crate) fn is_defined(&self) -> bool {
        self.kind == ClassKind::Defined
    }

    pub(crate) fn is_public(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::PUBLIC)
    }

    pub(crate) fn is_final(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::FINAL)
    }

    pub(crate) fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub(crate) fn is_abstract(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::ABSTRACT)
    }

    /// Superclass first, then interfaces in declaration order.
    pub(crate) fn base_types(&self) -> &[ClassId] {
        &self.base_types
    }

    pub(crate) fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub(crate) fn inner_classes(&self) -> &[ClassId] {
        &self.inner_classes
    }

    pub(crate) fn declaring_class(&self) -> Option<ClassId> {
        self.declaring_class
    }

    pub(crate) fn mark_defined(&mut self, access_flags: ClassAccessFlags) {
        self.kind = ClassKind::Defined;
        self.access_flags = access_flags;
    }

    pub(crate) fn add_base_type(&mut self, base: ClassId) -> Result<()> {
        if self.base_types.contains(&base) {
            return Err(self.duplicate(MemberKind::BaseType, format!("#{}", base.0)));
        }
        self.base_types.push(base);
        Ok(())
    }

    pub(crate) fn add_field(&mut self, field: Field) -> Result<()> {
        if self.fields.contains(&field) {
            return Err(self.duplicate(MemberKind::Field, field.to_string()));
        }
        self.fields.push(field);
        Ok(())
    }

    pub(crate) fn add_method(&mut self, method: Method) -> Result<()> {
        if self.methods.contains(&method) {
            return Err(self.duplicate(MemberKind::Method, method.to_string()));
        }
        self.methods.push(method);
        Ok(())
    }

    /// Returns false when `inner` was already linked.
    pub(crate) fn add_inner_class(&mut self, inner: ClassId) -> bool {
        if self.inner_classes.contains(&inner) {
            return false;
        }
        self.inner_classes.push(inner);
        true
    }

    pub(crate) fn set_declaring_class(&mut self, declaring: ClassId) {
        self.declaring_class = Some(declaring);
    }

    fn duplicate(&self, kind: MemberKind, member: String) -> Error {
        Error::DuplicateMember {
            class: self.internal_name.clone(),
            kind,
            member,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name)
    }
}

fn fully_qualified_name(internal_name: &str) -> String {
    internal_name.replace('/', ".").replace('$', "+")
}

/// A field declared by a class.
#[derive(Clone, Debug)]
pub(crate) struct Field {
    access_flags: FieldAccessFlags,
    name: String,
    signature: String,
    descriptor: Descriptor,
    declaring_class: ClassId,
}

impl Field {
    pub(crate) fn new(
        access_flags: FieldAccessFlags,
        name: impl Into<String>,
        signature: impl Into<String>,
        descriptor: Descriptor,
        declaring_class: ClassId,
    ) -> Self {
        Self {
            access_flags,
            name: name.into(),
            signature: signature.into(),
            descriptor,
            declaring_class,
        }
    }

    pub(crate) fn access_flags(&self) -> FieldAccessFlags {
        self.access_flags
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Raw descriptor string, e.g. `[Ljava/lang/String;`.
    pub(crate) fn signature(&self) -> &str {
        &self.signature
    }

    pub(crate) fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[allow(dead_code)]
    pub(crate) fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }
}

// Member identity within a class is name plus descriptor.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.signature == other.signature
    }
}

impl Eq for Field {}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.signature)
    }
}

/// A method declared by a class.
#[derive(Clone, Debug)]
pub(crate) struct Method {
    access_flags: MethodAccessFlags,
    name: String,
    signature: String,
    arguments: Vec<Descriptor>,
    return_type: Descriptor,
    declaring_class: ClassId,
}

impl Method {
    pub(crate) fn new(
        access_flags: MethodAccessFlags,
        name: impl Into<String>,
        signature: impl Into<String>,
        arguments: Vec<Descriptor>,
        return_type: Descriptor,
        declaring_class: ClassId,
    ) -> Self {
        Self {
            access_flags,
            name: name.into(),
            signature: signature.into(),
            arguments,
            return_type,
            declaring_class,
        }
    }

    pub(crate) fn access_flags(&self) -> MethodAccessFlags {
        self.access_flags
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Raw descriptor string, e.g. `([I)I`.
    pub(crate) fn signature(&self) -> &str {
        &self.signature
    }

    pub(crate) fn arguments(&self) -> &[Descriptor] {
        &self.arguments
    }

    pub(crate) fn return_type(&self) -> &Descriptor {
        &self.return_type
    }

    #[allow(dead_code)]
    pub(crate) fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    pub(crate) fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub(crate) fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }

    pub(crate) fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub(crate) fn is_class_initializer(&self) -> bool {
        self.name == "<clinit>"
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.signature == other.signature
    }
}

impl Eq for Method {}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}
