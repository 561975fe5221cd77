use std::io::Read;

use crate::error::{Error, Result};
use crate::reader::ClassReader;

/// Constant pool tags understood by the parser.
pub(crate) mod tag {
    pub(crate) const UTF8: u8 = 1;
    pub(crate) const INTEGER: u8 = 3;
    pub(crate) const FLOAT: u8 = 4;
    pub(crate) const LONG: u8 = 5;
    pub(crate) const DOUBLE: u8 = 6;
    pub(crate) const CLASS: u8 = 7;
    pub(crate) const STRING: u8 = 8;
    pub(crate) const FIELDREF: u8 = 9;
    pub(crate) const METHODREF: u8 = 10;
    pub(crate) const INTERFACE_METHODREF: u8 = 11;
    pub(crate) const NAME_AND_TYPE: u8 = 12;
}

/// One decoded constant pool entry. Index operands are kept unresolved.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ConstantPoolEntry {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    Fieldref {
        class_index: u16,
        name_and_type_index: u16,
    },
    Methodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
}

impl ConstantPoolEntry {
    #[cfg(test)]
    pub(crate) fn tag(&self) -> u8 {
        match self {
            ConstantPoolEntry::Utf8(_) => tag::UTF8,
            ConstantPoolEntry::Integer(_) => tag::INTEGER,
            ConstantPoolEntry::Float(_) => tag::FLOAT,
            ConstantPoolEntry::Long(_) => tag::LONG,
            ConstantPoolEntry::Double(_) => tag::DOUBLE,
            ConstantPoolEntry::Class { .. } => tag::CLASS,
            ConstantPoolEntry::String { .. } => tag::STRING,
            ConstantPoolEntry::Fieldref { .. } => tag::FIELDREF,
            ConstantPoolEntry::Methodref { .. } => tag::METHODREF,
            ConstantPoolEntry::InterfaceMethodref { .. } => tag::INTERFACE_METHODREF,
            ConstantPoolEntry::NameAndType { .. } => tag::NAME_AND_TYPE,
        }
    }

    /// Human-readable kind used in error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ConstantPoolEntry::Utf8(_) => "Utf8",
            ConstantPoolEntry::Integer(_) => "Integer",
            ConstantPoolEntry::Float(_) => "Float",
            ConstantPoolEntry::Long(_) => "Long",
            ConstantPoolEntry::Double(_) => "Double",
            ConstantPoolEntry::Class { .. } => "Class",
            ConstantPoolEntry::String { .. } => "String",
            ConstantPoolEntry::Fieldref { .. } => "Fieldref",
            ConstantPoolEntry::Methodref { .. } => "Methodref",
            ConstantPoolEntry::InterfaceMethodref { .. } => "InterfaceMethodref",
            ConstantPoolEntry::NameAndType { .. } => "NameAndType",
        }
    }

    /// Long and Double constants occupy two pool slots.
    pub(crate) fn is_wide(&self) -> bool {
        matches!(
            self,
            ConstantPoolEntry::Long(_) | ConstantPoolEntry::Double(_)
        )
    }

    fn read<R: Read>(reader: &mut ClassReader<R>, index: u16) -> Result<Self> {
        let offset = reader.position();
        let entry = match reader.read_u1()? {
            tag::UTF8 => {
                let len = reader.read_u2()?;
                ConstantPoolEntry::Utf8(reader.read_modified_utf8(usize::from(len))?)
            }
            tag::INTEGER => ConstantPoolEntry::Integer(reader.read_i4()?),
            tag::FLOAT => ConstantPoolEntry::Float(reader.read_f4()?),
            tag::LONG => ConstantPoolEntry::Long(reader.read_i8()?),
            tag::DOUBLE => ConstantPoolEntry::Double(reader.read_f8()?),
            tag::CLASS => ConstantPoolEntry::Class {
                name_index: reader.read_u2()?,
            },
            tag::STRING => ConstantPoolEntry::String {
                string_index: reader.read_u2()?,
            },
            tag::FIELDREF => ConstantPoolEntry::Fieldref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::METHODREF => ConstantPoolEntry::Methodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::INTERFACE_METHODREF => ConstantPoolEntry::InterfaceMethodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            tag::NAME_AND_TYPE => ConstantPoolEntry::NameAndType {
                name_index: reader.read_u2()?,
                descriptor_index: reader.read_u2()?,
            },
            other => {
                return Err(Error::malformed(format!(
                    "unknown constant pool tag {other} for entry #{index} at byte {offset}"
                )));
            }
        };
        Ok(entry)
    }

    #[cfg(test)]
    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.tag());
        match self {
            ConstantPoolEntry::Utf8(value) => {
                let bytes = crate::mutf8::encode(value);
                out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                out.extend_from_slice(&bytes);
            }
            ConstantPoolEntry::Integer(value) => out.extend_from_slice(&value.to_be_bytes()),
            ConstantPoolEntry::Float(value) => {
                out.extend_from_slice(&value.to_bits().to_be_bytes())
            }
            ConstantPoolEntry::Long(value) => out.extend_from_slice(&value.to_be_bytes()),
            ConstantPoolEntry::Double(value) => {
                out.extend_from_slice(&value.to_bits().to_be_bytes())
            }
            ConstantPoolEntry::Class { name_index } => {
                out.extend_from_slice(&name_index.to_be_bytes())
            }
            ConstantPoolEntry::String { string_index } => {
                out.extend_from_slice(&string_index.to_be_bytes())
            }
            ConstantPoolEntry::Fieldref {
                class_index,
                name_and_type_index,
            }
            | ConstantPoolEntry::Methodref {
                class_index,
                name_and_type_index,
            }
            | ConstantPoolEntry::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => {
                out.extend_from_slice(&class_index.to_be_bytes());
                out.extend_from_slice(&name_and_type_index.to_be_bytes());
            }
            ConstantPoolEntry::NameAndType {
                name_index,
                descriptor_index,
            } => {
                out.extend_from_slice(&name_index.to_be_bytes());
                out.extend_from_slice(&descriptor_index.to_be_bytes());
            }
        }
    }
}

/// 1-indexed constant pool. Slot 0 and the slot after each wide constant are empty.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ConstantPool {
    count: u16,
    slots: Vec<Option<ConstantPoolEntry>>,
}

impl ConstantPool {
    /// Read `constant_pool_count` followed by its entries.
    pub(crate) fn read<R: Read>(reader: &mut ClassReader<R>) -> Result<Self> {
        let count = reader.read_u2()?;
        let mut slots = Vec::with_capacity(usize::from(count));
        slots.push(None);
        let mut index: u16 = 1;
        while index < count {
            let entry = ConstantPoolEntry::read(reader, index)?;
            let wide = entry.is_wide();
            slots.push(Some(entry));
            index += 1;
            if wide {
                slots.push(None);
                index = index.saturating_add(1);
            }
        }
        Ok(Self { count, slots })
    }

    /// Entry at `index`, failing for index 0, reserved slots and out-of-range indices.
    pub(crate) fn get(&self, index: u16) -> Result<&ConstantPoolEntry> {
        match self.slots.get(usize::from(index)) {
            Some(Some(entry)) => Ok(entry),
            Some(None) if index == 0 => {
                Err(Error::malformed("constant pool index 0 is not usable"))
            }
            Some(None) => Err(Error::malformed(format!(
                "constant pool index {index} is the second slot of a wide constant"
            ))),
            None => Err(Error::malformed(format!(
                "constant pool index {index} out of range (count {})",
                self.count
            ))),
        }
    }

    /// Populated entries with their indices, in pool order.
    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = (u16, &ConstantPoolEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entry| (index as u16, entry)))
    }

    /// Number of slots left empty behind wide constants.
    #[cfg(test)]
    pub(crate) fn reserved_slots(&self) -> usize {
        self.slots.iter().skip(1).filter(|slot| slot.is_none()).count()
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            ConstantPoolEntry::Utf8(value) => Ok(value),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    /// Internal name referenced by the Class entry at `index`.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            ConstantPoolEntry::Class { name_index } => self.utf8(*name_index),
            other => Err(mismatch(index, "Class", other)),
        }
    }

    /// Like [`ConstantPool::class_name`], but index 0 means "no class".
    pub(crate) fn optional_class_name(&self, index: u16) -> Result<Option<&str>> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    /// Append the binary form of the pool, count included.
    #[cfg(test)]
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.count.to_be_bytes());
        for entry in self.slots.iter().flatten() {
            entry.write(out);
        }
    }
}

fn mismatch(index: u16, expected: &str, found: &ConstantPoolEntry) -> Error {
    Error::malformed(format!(
        "constant pool index {index} is {}, expected {expected}",
        found.kind()
    ))
}
