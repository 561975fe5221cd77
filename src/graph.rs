use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, warn};

use crate::archive::ClassFileTable;
use crate::class::{Class, ClassId, Field, Method};
use crate::classfile::ClassFile;
use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
use crate::error::Result;
use crate::flags::{FieldAccessFlags, MethodAccessFlags};

/// Pseudo-classes registered for every descriptor letter.
pub(crate) const PRIMITIVES: [(char, &str); 9] = [
    ('B', "byte"),
    ('C', "char"),
    ('D', "double"),
    ('F', "float"),
    ('I', "int"),
    ('J', "long"),
    ('S', "short"),
    ('Z', "boolean"),
    ('V', "void"),
];

/// Arena of class nodes with a name cache guaranteeing one node per internal name.
///
/// Primitive pseudo-classes live in the arena but not in the name cache, so a
/// class named `B` or `I` is never confused with `byte` or `int`.
pub(crate) struct TypeGraph {
    classes: Vec<Class>,
    names: BTreeMap<String, ClassId>,
    primitives: BTreeMap<char, ClassId>,
    class_files: ClassFileTable,
    pending: VecDeque<(ClassId, ClassFile)>,
    populating: bool,
}

impl TypeGraph {
    /// Create a graph over the given class-file table, seeded with the primitives.
    pub(crate) fn new(class_files: ClassFileTable) -> Self {
        let mut graph = Self {
            classes: Vec::new(),
            names: BTreeMap::new(),
            primitives: BTreeMap::new(),
            class_files,
            pending: VecDeque::new(),
            populating: false,
        };
        for (letter, keyword) in PRIMITIVES {
            let id = ClassId(graph.classes.len());
            graph.classes.push(Class::primitive(letter, keyword));
            graph.primitives.insert(letter, id);
        }
        graph
    }

    /// Return the node for `name`, creating and populating it on first use.
    ///
    /// The node is cached before population starts, so cyclic references resolve
    /// to the same node. Classes absent from the table stay external stubs.
    pub(crate) fn load_class(&mut self, name: &str) -> Result<ClassId> {
        if let Some(id) = self.names.get(name) {
            return Ok(*id);
        }
        let id = self.insert(Class::stub(name));
        match self.class_files.remove(name) {
            Some(class_file) => {
                debug!(
                    class = name,
                    major = class_file.major_version,
                    minor = class_file.minor_version,
                    attributes = class_file.attributes.len(),
                    "loading class"
                );
                self.pending.push_back((id, class_file));
            }
            None => debug!(class = name, "external class"),
        }
        if !self.populating {
            self.populating = true;
            let result = self.drain_pending();
            self.populating = false;
            if result.is_err() {
                self.pending.clear();
            }
            result?;
        }
        Ok(id)
    }

    /// Link every cached `Outer$Inner` to `Outer`.
    ///
    /// Missing enclosing classes are logged and skipped; existing links are kept.
    pub(crate) fn resolve_inner_classes(&mut self) {
        let nested: Vec<(String, ClassId)> = self
            .names
            .iter()
            .filter(|(name, _)| name.contains('$'))
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        for (name, inner) in nested {
            let Some((enclosing_name, _)) = name.rsplit_once('$') else {
                continue;
            };
            let Some(enclosing) = self.names.get(enclosing_name).copied() else {
                warn!(class = %name, enclosing = enclosing_name, "enclosing class not loaded");
                continue;
            };
            if self.classes[enclosing.0].add_inner_class(inner) {
                self.classes[inner.0].set_declaring_class(enclosing);
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<ClassId> {
        self.names.get(name).copied()
    }

    pub(crate) fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    /// Pseudo-class for a primitive descriptor letter.
    pub(crate) fn primitive(&self, letter: char) -> Option<ClassId> {
        self.primitives.get(&letter).copied()
    }

    /// All nodes in creation order.
    /// Nodes populated from class files, in internal-name order.
    pub(crate) fn defined_classes(&self) -> Vec<ClassId> {
        self.names
            .values()
            .copied()
            .filter(|id| self.classes[id.0].is_defined())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.classes.len()
    }

    fn insert(&mut self, class: Class) -> ClassId {
        let id = ClassId(self.classes.len());
        self.names.insert(class.internal_name().to_string(), id);
        self.classes.push(class);
        id
    }

    fn drain_pending(&mut self) -> Result<()> {
        while let Some((id, class_file)) = self.pending.pop_front() {
            self.populate(id, &class_file)?;
        }
        Ok(())
    }

    fn populate(&mut self, id: ClassId, class_file: &ClassFile) -> Result<()> {
        let this_name = class_file.name()?;
        if this_name != self.classes[id.0].internal_name() {
            warn!(
                class = self.classes[id.0].internal_name(),
                declared = this_name,
                "class file declares a different name"
            );
        }
        self.classes[id.0].mark_defined(class_file.access_flags);

        if let Some(super_name) = class_file.super_class_name()? {
            let super_id = self.load_class(super_name)?;
            self.classes[id.0].add_base_type(super_id)?;
        }
        for interface in class_file.interface_names()? {
            let interface_id = self.load_class(interface)?;
            self.classes[id.0].add_base_type(interface_id)?;
        }

        let pool = &class_file.constant_pool;
        for info in &class_file.fields {
            let signature = info.descriptor(pool)?;
            let descriptor = parse_field_descriptor(self, signature)?;
            let field = Field::new(
                FieldAccessFlags::from_bits_retain(info.access_flags),
                info.name(pool)?,
                signature,
                descriptor,
                id,
            );
            self.classes[id.0].add_field(field)?;
        }
        for info in &class_file.methods {
            let signature = info.descriptor(pool)?;
            let descriptor = parse_method_descriptor(self, signature)?;
            let method = Method::new(
                MethodAccessFlags::from_bits_retain(info.access_flags),
                info.name(pool)?,
                signature,
                descriptor.arguments,
                descriptor.return_type,
                id,
            );
            self.classes[id.0].add_method(method)?;
        }
        Ok(())
    }
}
