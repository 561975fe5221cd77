use std::io::Read;
use std::ops::RangeInclusive;

use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::flags::ClassAccessFlags;
use crate::reader::ClassReader;

pub(crate) const CLASS_MAGIC: u32 = 0xCAFEBABE;

/// Major versions accepted by the parser.
pub(crate) const SUPPORTED_MAJOR_VERSIONS: RangeInclusive<u16> = 45..=48;

/// Structural view of one class file. Constant pool indices are not resolved.
#[derive(Clone, Debug)]
pub(crate) struct ClassFile {
    pub(crate) minor_version: u16,
    pub(crate) major_version: u16,
    pub(crate) constant_pool: ConstantPool,
    pub(crate) access_flags: ClassAccessFlags,
    pub(crate) this_class: u16,
    pub(crate) super_class: u16,
    pub(crate) interfaces: Vec<u16>,
    pub(crate) fields: Vec<MemberInfo>,
    pub(crate) methods: Vec<MemberInfo>,
    pub(crate) attributes: Vec<AttributeInfo>,
}

/// A `field_info` or `method_info` record.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MemberInfo {
    pub(crate) access_flags: u16,
    pub(crate) name_index: u16,
    pub(crate) descriptor_index: u16,
    #[allow(dead_code)]
    pub(crate) attributes: Vec<AttributeInfo>,
}

/// An attribute whose payload is kept as raw bytes.
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AttributeInfo {
    pub(crate) name_index: u16,
    pub(crate) info: Vec<u8>,
}

impl ClassFile {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut ClassReader::new(bytes))
    }

    pub(crate) fn read<R: Read>(reader: &mut ClassReader<R>) -> Result<Self> {
        let magic = reader.read_u4()?;
        if magic != CLASS_MAGIC {
            return Err(Error::malformed(format!("bad magic 0x{magic:08x}")));
        }
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        if !SUPPORTED_MAJOR_VERSIONS.contains(&major_version) {
            return Err(Error::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        let constant_pool = ConstantPool::read(reader)?;
        let access_flags = ClassAccessFlags::from_bits_retain(reader.read_u2()?);
        let this_class = reader.read_u2()?;
        let super_class = reader.read_u2()?;

        let interface_count = reader.read_u2()?;
        let mut interfaces = Vec::with_capacity(usize::from(interface_count));
        for _ in 0..interface_count {
            interfaces.push(reader.read_u2()?);
        }
        let fields = read_members(reader)?;
        let methods = read_members(reader)?;
        let attributes = read_attributes(reader)?;

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Internal name of this class, e.g. `java/util/Map$Entry`.
    pub(crate) fn name(&self) -> Result<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Internal name of the superclass; `None` for `java/lang/Object`.
    pub(crate) fn super_class_name(&self) -> Result<Option<&str>> {
        self.constant_pool.optional_class_name(self.super_class)
    }

    pub(crate) fn interface_names(&self) -> Result<Vec<&str>> {
        self.interfaces
            .iter()
            .map(|index| self.constant_pool.class_name(*index))
            .collect()
    }
}

impl MemberInfo {
    pub(crate) fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.name_index)
    }

    pub(crate) fn descriptor<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.descriptor_index)
    }
}

impl AttributeInfo {
    #[cfg(test)]
    pub(crate) fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Result<&'a str> {
        constant_pool.utf8(self.name_index)
    }
}

fn read_members<R: Read>(reader: &mut ClassReader<R>) -> Result<Vec<MemberInfo>> {
    let count = reader.read_u2()?;
    let mut members = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes = read_attributes(reader)?;
        members.push(MemberInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(members)
}

fn read_attributes<R: Read>(reader: &mut ClassReader<R>) -> Result<Vec<AttributeInfo>> {
    let count = reader.read_u2()?;
    let mut attributes = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()?;
        let info = reader.read_bytes(length as usize)?;
        attributes.push(AttributeInfo { name_index, info });
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant_pool::ConstantPoolEntry;
    use crate::test_support::ClassFileBuilder;

    #[test]
    fn parses_structure_and_resolves_names() {
        let mut builder = ClassFileBuilder::new("pkg/Widget", Some("pkg/Base"));
        builder.add_interface("java/lang/Runnable");
        builder.add_interface("java/io/Serializable");
        builder.add_field(0x0002, "size", "I");
        builder.add_method(0x0001, "run", "()V");
        builder.add_class_attribute("SourceFile", &[0x00, 0x01]);
        let class_file = ClassFile::parse(&builder.finish()).expect("parse class");

        assert_eq!(class_file.major_version, 48);
        assert_eq!(class_file.name().expect("name"), "pkg/Widget");
        assert_eq!(class_file.super_class_name().expect("super"), Some("pkg/Base"));
        assert_eq!(
            class_file.interface_names().expect("interfaces"),
            vec!["java/lang/Runnable", "java/io/Serializable"]
        );
        assert_eq!(class_file.fields.len(), 1);
        assert_eq!(class_file.fields[0].access_flags, 0x0002);
        let pool = &class_file.constant_pool;
        assert_eq!(class_file.fields[0].name(pool).expect("field name"), "size");
        assert_eq!(class_file.methods[0].descriptor(pool).expect("desc"), "()V");
        assert_eq!(class_file.attributes[0].name(pool).expect("attr"), "SourceFile");
        assert_eq!(class_file.attributes[0].info, vec![0x00, 0x01]);
    }

    #[test]
    fn long_constant_shifts_later_pool_indices() {
        let mut builder = ClassFileBuilder::new("pkg/Counter", Some("java/lang/Object"));
        let long_index = builder.add_long(0x0123_4567_89ab_cdef);
        builder.add_interface("java/lang/Runnable");
        builder.add_field(0x0019, "LIMIT", "J");
        let class_file = ClassFile::parse(&builder.finish()).expect("parse class");

        let pool = &class_file.constant_pool;
        assert!(matches!(
            pool.get(long_index),
            Ok(ConstantPoolEntry::Long(0x0123_4567_89ab_cdef))
        ));
        assert!(pool.get(long_index + 1).is_err());
        assert_eq!(
            class_file.interface_names().expect("interfaces"),
            vec!["java/lang/Runnable"]
        );
        assert_eq!(class_file.fields[0].name(pool).expect("field name"), "LIMIT");
        assert_eq!(class_file.fields[0].descriptor(pool).expect("desc"), "J");
    }

    #[test]
    fn object_has_no_super_class() {
        let builder = ClassFileBuilder::new("java/lang/Object", None);
        let class_file = ClassFile::parse(&builder.finish()).expect("parse class");
        assert_eq!(class_file.super_class_name().expect("super"), None);
    }

    #[test]
    fn member_attributes_stay_opaque() {
        let mut builder = ClassFileBuilder::new("A", Some("java/lang/Object"));
        builder.add_method_with_attribute(0x0001, "f", "()V", "Code", &[1, 2, 3, 4, 5]);
        let class_file = ClassFile::parse(&builder.finish()).expect("parse class");
        let attribute = &class_file.methods[0].attributes[0];
        assert_eq!(attribute.name(&class_file.constant_pool).expect("name"), "Code");
        assert_eq!(attribute.info, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = ClassFileBuilder::new("A", None).finish();
        bytes[0] = 0xde;
        let err = ClassFile::parse(&bytes).expect_err("bad magic");
        assert!(matches!(err, Error::MalformedClassFile(message) if message.contains("magic")));
    }

    #[test]
    fn unsupported_version_is_reported_before_the_pool() {
        // Header only: a parser that went past the version would hit end of stream.
        let mut bytes = CLASS_MAGIC.to_be_bytes().to_vec();
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&52u16.to_be_bytes());
        let err = ClassFile::parse(&bytes).expect_err("version 52");
        assert!(matches!(
            err,
            Error::UnsupportedVersion {
                major: 52,
                minor: 0
            }
        ));
    }

    #[test]
    fn accepts_the_whole_version_range() {
        for major in SUPPORTED_MAJOR_VERSIONS {
            let mut builder = ClassFileBuilder::new("A", None);
            builder.version(major);
            ClassFile::parse(&builder.finish()).expect("supported version");
        }
        let mut builder = ClassFileBuilder::new("A", None);
        builder.version(44);
        assert!(matches!(
            ClassFile::parse(&builder.finish()),
            Err(Error::UnsupportedVersion { major: 44, .. })
        ));
    }

    #[test]
    fn truncated_member_table_is_malformed() {
        let mut builder = ClassFileBuilder::new("A", None);
        builder.add_field(0, "x", "I");
        let bytes = builder.finish();
        let err = ClassFile::parse(&bytes[..bytes.len() - 6]).expect_err("truncated");
        assert!(matches!(
            err,
            Error::MalformedClassFile(message) if message.contains("unexpected end")
        ));
    }
}
