//! Fixture runner.
//!
//! Every directory under `fixtures/` is one case: `samples/*.json` are fed to
//! a single inference run (in file-name order), an optional `config.json`
//! configures it, and `expect.json` lists the classes the run must produce
//! with a rendered type per field. Pass a regex to run matching cases only.
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use json_classgen::{Config, FieldInfo, Inference, TypeKind, TypeModel, TypeNode};
use regex::Regex;
use serde::Deserialize;

type BoxResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Expectation {
    /// class name → field key → rendered type
    classes: BTreeMap<String, BTreeMap<String, String>>,
}

fn main() -> ExitCode {
    let filter = match std::env::args().nth(1).map(|src| Regex::new(&src)).transpose() {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("invalid case filter: {error}");
            return ExitCode::FAILURE;
        }
    };
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures");
    let cases = match list_dirs(&fixtures) {
        Ok(cases) => cases,
        Err(error) => {
            eprintln!("failed to list {}: {error}", fixtures.display());
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0usize;
    let mut ran = 0usize;
    for case in cases {
        let name = case.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if filter.as_ref().is_some_and(|f| !f.is_match(&name)) {
            continue;
        }
        ran += 1;
        match run_case(&case) {
            Ok(problems) if problems.is_empty() => println!("ok    {name}"),
            Ok(problems) => {
                failed += 1;
                println!("FAIL  {name}");
                for problem in problems {
                    println!("      {problem}");
                }
            }
            Err(error) => {
                failed += 1;
                println!("ERROR {name}: {error}");
            }
        }
    }

    println!("\n{} passed, {failed} failed", ran - failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run_case(dir: &Path) -> BoxResult<Vec<String>> {
    let config_path = dir.join("config.json");
    let config = if config_path.exists() { Config::load(&config_path)? } else { Config::default() };

    let mut inference = Inference::new(&config);
    for sample in list_files(&dir.join("samples"), "json")? {
        let src = std::fs::read_to_string(&sample)?;
        inference.observe_str(&sample.display().to_string(), &src)?;
    }
    let model = inference.solve();

    let expectation: Expectation = json_classgen::path_de::from_slice_with_path(&std::fs::read(dir.join("expect.json"))?)?;
    Ok(compare(&model, &expectation))
}

fn compare(model: &TypeModel, expectation: &Expectation) -> Vec<String> {
    let mut problems = Vec::new();
    for class in model.classes() {
        if !expectation.classes.contains_key(&class.name) {
            problems.push(format!("unexpected class {}", class.name));
        }
    }
    for (class_name, fields) in &expectation.classes {
        let Some(class) = model.class_by_name(class_name) else {
            problems.push(format!("missing class {class_name}"));
            continue;
        };
        for field in &class.fields {
            if !fields.contains_key(&field.source_name) {
                problems.push(format!("{class_name}.{}: unexpected field", field.source_name));
            }
        }
        for (key, expected) in fields {
            match class.field(key) {
                None => problems.push(format!("{class_name}.{key}: missing field")),
                Some(field) => {
                    let actual = render_field(model, field);
                    if &actual != expected {
                        problems.push(format!("{class_name}.{key}: expected {expected}, got {actual}"));
                    }
                }
            }
        }
    }
    problems
}

fn render_field(model: &TypeModel, field: &FieldInfo) -> String {
    let ty = render_type(model, &field.ty);
    if field.nullable && !field.ty.kind.is_nullable() { format!("{ty}?") } else { ty }
}

fn render_type(model: &TypeModel, node: &TypeNode) -> String {
    let element = || node.element().map(|e| render_type(model, e)).unwrap_or_default();
    match node.kind {
        TypeKind::Object => model.assigned_name(node).unwrap_or("Object").to_string(),
        TypeKind::Array => format!("Array<{}>", element()),
        TypeKind::Dictionary => format!("Dictionary<{}>", element()),
        kind => kind.to_string(),
    }
}

fn list_dirs(dir: &Path) -> BoxResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn list_files(dir: &Path, extension: &str) -> BoxResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == extension) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
