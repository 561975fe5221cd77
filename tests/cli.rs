use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use zip::write::SimpleFileOptions;

fn caffeinator() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_caffeinator")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push("target");
            path.push("debug");
            path.push("caffeinator");
            if cfg!(windows) {
                path.set_extension("exe");
            }
            path
        })
}

fn run(args: &[&OsStr]) -> Output {
    Command::new(caffeinator())
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("run caffeinator")
}

/// Class file with a superclass and the given fields; no methods or attributes.
fn class_bytes(major: u16, name: &str, super_name: &str, fields: &[(u16, &str, &str)]) -> Vec<u8> {
    let mut pool: Vec<Vec<u8>> = Vec::new();
    let utf8 = |pool: &mut Vec<Vec<u8>>, text: &str| -> u16 {
        let mut entry = vec![1];
        entry.extend_from_slice(&(text.len() as u16).to_be_bytes());
        entry.extend_from_slice(text.as_bytes());
        pool.push(entry);
        pool.len() as u16
    };
    let name_index = utf8(&mut pool, name);
    pool.push([vec![7], name_index.to_be_bytes().to_vec()].concat());
    let this_class = pool.len() as u16;
    let super_index = utf8(&mut pool, super_name);
    pool.push([vec![7], super_index.to_be_bytes().to_vec()].concat());
    let super_class = pool.len() as u16;
    let field_indices: Vec<(u16, u16, u16)> = fields
        .iter()
        .map(|(flags, field_name, descriptor)| {
            let name_index = utf8(&mut pool, field_name);
            let descriptor_index = utf8(&mut pool, descriptor);
            (*flags, name_index, descriptor_index)
        })
        .collect();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&major.to_be_bytes());
    bytes.extend_from_slice(&(pool.len() as u16 + 1).to_be_bytes());
    for entry in &pool {
        bytes.extend_from_slice(entry);
    }
    bytes.extend_from_slice(&0x0021u16.to_be_bytes());
    bytes.extend_from_slice(&this_class.to_be_bytes());
    bytes.extend_from_slice(&super_class.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&(field_indices.len() as u16).to_be_bytes());
    for (flags, name_index, descriptor_index) in field_indices {
        bytes.extend_from_slice(&flags.to_be_bytes());
        bytes.extend_from_slice(&name_index.to_be_bytes());
        bytes.extend_from_slice(&descriptor_index.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
    }
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes
}

fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).expect("create jar");
    let mut zip = zip::ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        zip.write_all(data).expect("write entry");
    }
    zip.finish().expect("finish jar");
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read output");
    serde_json::from_str(&text).expect("parse output")
}

fn type_named<'a>(document: &'a Value, name: &str) -> &'a Value {
    document["types"]
        .as_array()
        .expect("types")
        .iter()
        .find(|entry| entry["name"] == name)
        .unwrap_or_else(|| panic!("type {name} missing from {document}"))
}

#[test]
fn converts_jar_to_json_manifest_next_to_archive() {
    let dir = tempfile::tempdir().expect("temp dir");
    let archive = dir.path().join("shapes.jar");
    write_jar(
        &archive,
        &[
            (
                "demo/Shape.class",
                class_bytes(48, "demo/Shape", "java/lang/Object", &[]),
            ),
            (
                "demo/Circle.class",
                class_bytes(
                    48,
                    "demo/Circle",
                    "demo/Shape",
                    &[(0x0002, "radius", "D"), (0x0001, "points", "[[I")],
                ),
            ),
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
        ],
    );

    let output = run(&[archive.as_os_str()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let document = read_json(&dir.path().join("shapes.json"));
    assert_eq!(document["module"], "shapes");
    assert_eq!(document["references"], serde_json::json!(["rt"]));
    assert_eq!(document["types"].as_array().expect("types").len(), 2);

    let circle = type_named(&document, "demo.Circle");
    assert_eq!(circle["base_types"][0]["name"], "demo.Shape");
    assert_eq!(circle["base_types"][0]["external"], false);
    assert_eq!(circle["fields"][0]["name"], "radius");
    assert_eq!(circle["fields"][0]["type"], "double");
    assert_eq!(circle["fields"][1]["type"], "int[][]");

    let shape = type_named(&document, "demo.Shape");
    assert_eq!(shape["base_types"][0]["name"], "java.lang.Object");
    assert_eq!(shape["base_types"][0]["external"], true);
}

#[test]
fn later_archive_replaces_earlier_class() {
    let dir = tempfile::tempdir().expect("temp dir");
    let first = dir.path().join("first.jar");
    let second = dir.path().join("second.jar");
    write_jar(
        &first,
        &[(
            "demo/Config.class",
            class_bytes(48, "demo/Config", "java/lang/Object", &[(0x0001, "old", "I")]),
        )],
    );
    write_jar(
        &second,
        &[(
            "demo/Config.class",
            class_bytes(48, "demo/Config", "java/lang/Object", &[(0x0001, "new", "J")]),
        )],
    );
    let out = dir.path().join("merged.json");

    let output = run(&[
        OsStr::new("-o"),
        out.as_os_str(),
        first.as_os_str(),
        second.as_os_str(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let document = read_json(&out);
    assert_eq!(document["module"], "merged");
    let config = type_named(&document, "demo.Config");
    assert_eq!(config["fields"].as_array().expect("fields").len(), 1);
    assert_eq!(config["fields"][0]["name"], "new");
    assert_eq!(config["fields"][0]["type"], "long");
}

#[test]
fn unreadable_archive_is_skipped_with_warning() {
    let dir = tempfile::tempdir().expect("temp dir");
    let broken = dir.path().join("broken.jar");
    fs::write(&broken, b"this is not a zip archive").expect("write broken");
    let good = dir.path().join("good.jar");
    write_jar(
        &good,
        &[(
            "demo/Ok.class",
            class_bytes(46, "demo/Ok", "java/lang/Object", &[]),
        )],
    );
    let out = dir.path().join("out.json");

    let output = run(&[
        OsStr::new("-o"),
        out.as_os_str(),
        broken.as_os_str(),
        good.as_os_str(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 archive(s) could not be read"), "stderr: {stderr}");

    let document = read_json(&out);
    type_named(&document, "demo.Ok");
}

#[test]
fn unsupported_class_version_aborts_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let archive = dir.path().join("modern.jar");
    write_jar(
        &archive,
        &[(
            "demo/Modern.class",
            class_bytes(52, "demo/Modern", "java/lang/Object", &[]),
        )],
    );
    let out = dir.path().join("modern.json");

    let output = run(&[OsStr::new("-o"), out.as_os_str(), archive.as_os_str()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported class file version 52.0"), "stderr: {stderr}");
    assert!(!out.exists());
}

#[test]
fn ilasm_target_writes_assembler_source() {
    let dir = tempfile::tempdir().expect("temp dir");
    let archive = dir.path().join("lib.jar");
    write_jar(
        &archive,
        &[(
            "demo/Point.class",
            class_bytes(48, "demo/Point", "java/lang/Object", &[(0x0001, "x", "I")]),
        )],
    );

    let output = run(&[
        OsStr::new("--target"),
        OsStr::new("ilasm"),
        OsStr::new("--reference"),
        OsStr::new("mscorlib"),
        archive.as_os_str(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = fs::read_to_string(dir.path().join("lib.il")).expect("read il");
    assert!(text.contains(".assembly extern 'mscorlib' { }"));
    assert!(text.contains(
        ".class public auto ansi 'demo.Point' extends ['mscorlib']'java.lang.Object'"
    ));
    assert!(text.contains(".field public int32 'x'"));
}

#[test]
fn list_targets_prints_registered_backends() {
    let output = run(&[OsStr::new("--list-targets")]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let ids: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(ids, vec!["ilasm", "json"]);
}

#[test]
fn timing_line_reports_counts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let archive = dir.path().join("t.jar");
    write_jar(
        &archive,
        &[(
            "demo/A.class",
            class_bytes(48, "demo/A", "java/lang/Object", &[]),
        )],
    );

    let output = run(&[OsStr::new("--timing"), archive.as_os_str()]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .find(|line| line.starts_with("timing:"))
        .expect("timing line");
    assert!(line.contains("archives=1"));
    assert!(line.contains("classes=1"));
}
