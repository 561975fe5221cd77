use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::classfile::ClassFile;
use crate::error::{Error, Result};

/// Class files keyed by internal name (entry name without `.class`).
pub(crate) type ClassFileTable = BTreeMap<String, ClassFile>;

/// Read every class file in the jar or zip at `path`.
///
/// Failures to open or inflate the archive are reported as
/// [`Error::MissingReference`]; decoding failures of a class file are not.
pub(crate) fn read_archive(path: &Path) -> Result<ClassFileTable> {
    let file = fs::File::open(path).map_err(|err| Error::missing_reference(path, err))?;
    read_archive_from(file, path)
}

/// Read class files from an already opened archive; `path` is used for reporting.
pub(crate) fn read_archive_from<R: Read + Seek>(reader: R, path: &Path) -> Result<ClassFileTable> {
    let mut archive = ZipArchive::new(reader).map_err(|err| Error::missing_reference(path, err))?;

    let mut entry_names = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|err| Error::missing_reference(path, err))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if class_key(&name).is_some() {
            entry_names.push(name);
        } else if name.ends_with(".class") {
            debug!(archive = %path.display(), entry = %name, "skipping class entry");
        }
    }
    entry_names.sort();

    let mut table = ClassFileTable::new();
    for name in entry_names {
        let Some(key) = class_key(&name) else {
            continue;
        };
        let mut entry = archive
            .by_name(&name)
            .map_err(|err| Error::missing_reference(path, err))?;
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|err| Error::missing_reference(path, err))?;
        let class_file = ClassFile::parse(&data).map_err(|err| match err {
            Error::MalformedClassFile(message) => {
                Error::MalformedClassFile(format!("{}:{name}: {message}", path.display()))
            }
            other => other,
        })?;
        debug!(archive = %path.display(), class = key, "read class file");
        table.insert(key.to_string(), class_file);
    }
    Ok(table)
}

/// Merge `incoming` into `table`; later archives replace earlier entries.
///
/// Returns the names that were replaced.
pub(crate) fn merge(table: &mut ClassFileTable, incoming: ClassFileTable) -> Vec<String> {
    let mut replaced = Vec::new();
    for (name, class_file) in incoming {
        if table.insert(name.clone(), class_file).is_some() {
            replaced.push(name);
        }
    }
    replaced
}

// Multi-release and module descriptors are outside the supported version range.
fn class_key(entry_name: &str) -> Option<&str> {
    if entry_name.starts_with("META-INF/versions/") || entry_name.ends_with("module-info.class")
    {
        return None;
    }
    entry_name.strip_suffix(".class")
}
