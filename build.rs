use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Backends are the subdirectories of `src/emit/` holding a `mod.rs`.
fn discover_backends(emit_dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut backends = Vec::new();
    for entry in fs::read_dir(emit_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let module = entry.path().join("mod.rs");
        if !module.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_module_name(&name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("backend directory `{name}` is not a valid module name"),
            ));
        }
        backends.push((name, module));
    }
    backends.sort();
    Ok(backends)
}

fn is_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some('a'..='z' | '_'))
        && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
}

fn render(backends: &[(String, PathBuf)]) -> String {
    let mut content: String = backends
        .iter()
        .map(|(name, module)| format!("#[path = {module:?}]\npub(crate) mod {name};\n"))
        .collect();
    let names: Vec<String> = backends.iter().map(|(name, _)| format!("{name:?}")).collect();
    content.push_str(&format!(
        "\n#[cfg(test)]\npub(crate) const BACKEND_MODULES: &[&str] = &[{}];\n",
        names.join(", ")
    ));
    content
}

fn main() -> io::Result<()> {
    let manifest_dir = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("CARGO_MANIFEST_DIR is not set"))?;
    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("OUT_DIR is not set"))?;
    let emit_dir = manifest_dir.join("src").join("emit");

    println!("cargo:rerun-if-changed={}", emit_dir.display());
    let backends = discover_backends(&emit_dir)?;
    for (_, module) in &backends {
        println!("cargo:rerun-if-changed={}", module.display());
    }

    fs::write(out_dir.join("emit_modules.rs"), render(&backends))
}
