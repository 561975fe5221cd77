use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

/// Minimal class file writer for tests.
pub(crate) struct ClassFileBuilder {
    cp: Vec<CpEntry>,
    major_version: u16,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<MemberSpec>,
    methods: Vec<MemberSpec>,
    attributes: Vec<AttributeSpec>,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str, super_name: Option<&str>) -> Self {
        let mut builder = Self {
            cp: Vec::new(),
            major_version: 48,
            access_flags: 0x0021,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.add_class(class_name);
        if let Some(super_name) = super_name {
            builder.super_class = builder.add_class(super_name);
        }
        builder
    }

    pub(crate) fn version(&mut self, major: u16) -> &mut Self {
        self.major_version = major;
        self
    }

    pub(crate) fn access(&mut self, flags: u16) -> &mut Self {
        self.access_flags = flags;
        self
    }

    pub(crate) fn add_utf8(&mut self, value: &str) -> u16 {
        self.cp.push(CpEntry::Utf8(value.to_string()));
        self.cp.len() as u16
    }

    pub(crate) fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.cp.push(CpEntry::Class(name_index));
        self.cp.len() as u16
    }

    /// Adds a Long constant; the returned index is followed by a reserved slot.
    pub(crate) fn add_long(&mut self, value: i64) -> u16 {
        self.cp.push(CpEntry::Long(value));
        let index = self.cp.len() as u16;
        self.cp.push(CpEntry::Reserved);
        index
    }

    pub(crate) fn add_interface(&mut self, name: &str) -> &mut Self {
        let index = self.add_class(name);
        self.interfaces.push(index);
        self
    }

    pub(crate) fn add_field(&mut self, flags: u16, name: &str, descriptor: &str) -> &mut Self {
        let member = self.member(flags, name, descriptor, None);
        self.fields.push(member);
        self
    }

    pub(crate) fn add_method(&mut self, flags: u16, name: &str, descriptor: &str) -> &mut Self {
        let member = self.member(flags, name, descriptor, None);
        self.methods.push(member);
        self
    }

    pub(crate) fn add_method_with_attribute(
        &mut self,
        flags: u16,
        name: &str,
        descriptor: &str,
        attribute: &str,
        info: &[u8],
    ) -> &mut Self {
        let member = self.member(flags, name, descriptor, Some((attribute, info)));
        self.methods.push(member);
        self
    }

    pub(crate) fn add_class_attribute(&mut self, name: &str, info: &[u8]) -> &mut Self {
        let name_index = self.add_utf8(name);
        self.attributes.push(AttributeSpec {
            name_index,
            info: info.to_vec(),
        });
        self
    }

    fn member(
        &mut self,
        flags: u16,
        name: &str,
        descriptor: &str,
        attribute: Option<(&str, &[u8])>,
    ) -> MemberSpec {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        let attributes = attribute
            .map(|(attribute, info)| {
                vec![AttributeSpec {
                    name_index: self.add_utf8(attribute),
                    info: info.to_vec(),
                }]
            })
            .unwrap_or_default();
        MemberSpec {
            access_flags: flags,
            name_index,
            descriptor_index,
            attributes,
        }
    }

    pub(crate) fn finish(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0xCAFEBABE);
        write_u16(&mut bytes, 0);
        write_u16(&mut bytes, self.major_version);
        write_u16(&mut bytes, (self.cp.len() + 1) as u16);
        for entry in &self.cp {
            entry.write(&mut bytes);
        }
        write_u16(&mut bytes, self.access_flags);
        write_u16(&mut bytes, self.this_class);
        write_u16(&mut bytes, self.super_class);
        write_u16(&mut bytes, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            write_u16(&mut bytes, *interface);
        }
        for members in [&self.fields, &self.methods] {
            write_u16(&mut bytes, members.len() as u16);
            for member in members {
                write_u16(&mut bytes, member.access_flags);
                write_u16(&mut bytes, member.name_index);
                write_u16(&mut bytes, member.descriptor_index);
                write_attributes(&mut bytes, &member.attributes);
            }
        }
        write_attributes(&mut bytes, &self.attributes);
        bytes
    }
}

/// Member definition for generated class files.
struct MemberSpec {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<AttributeSpec>,
}

struct AttributeSpec {
    name_index: u16,
    info: Vec<u8>,
}

/// Constant pool entries needed by test class files.
enum CpEntry {
    Utf8(String),
    Class(u16),
    Long(i64),
    Reserved,
}

impl CpEntry {
    fn write(&self, bytes: &mut Vec<u8>) {
        match self {
            CpEntry::Utf8(value) => {
                bytes.push(1);
                write_u16(bytes, value.len() as u16);
                bytes.extend_from_slice(value.as_bytes());
            }
            CpEntry::Class(name_index) => {
                bytes.push(7);
                write_u16(bytes, *name_index);
            }
            CpEntry::Long(value) => {
                bytes.push(5);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            CpEntry::Reserved => {}
        }
    }
}

fn write_attributes(bytes: &mut Vec<u8>, attributes: &[AttributeSpec]) {
    write_u16(bytes, attributes.len() as u16);
    for attribute in attributes {
        write_u16(bytes, attribute.name_index);
        write_u32(bytes, attribute.info.len() as u32);
        bytes.extend_from_slice(&attribute.info);
    }
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

/// Write a jar at `path` holding the given entries.
pub(crate) fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).expect("create jar");
    let mut writer = zip::ZipWriter::new(file);
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start jar entry");
        writer.write_all(data).expect("write jar entry");
    }
    writer.finish().expect("finish jar");
}

/// Class file bytes for `name` extending `java/lang/Object`, without members.
pub(crate) fn empty_class(name: &str) -> Vec<u8> {
    ClassFileBuilder::new(name, Some("java/lang/Object")).finish()
}
