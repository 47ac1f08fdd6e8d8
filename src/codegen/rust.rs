use std::collections::HashSet;
use std::fmt::{self, Write};

use super::{CodeWriter, FILE_HEADER};
use crate::config::Config;
use crate::ir::{ClassDef, ClassId, FieldInfo, TypeKind, TypeModel, TypeNode};

const STRICT_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn", "else", "enum",
    "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "macro", "match", "mod",
    "move", "mut", "override", "priv", "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

// Cannot be raw identifiers.
const PATH_KEYWORDS: &[&str] = &["crate", "self", "super", "Self"];

/// serde-annotated Rust structs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustWriter;

impl RustWriter {
    fn visibility(config: &Config) -> &'static str {
        if config.internal_visibility { "pub(crate) " } else { "pub " }
    }

    fn field_type(&self, model: &TypeModel, class: &ClassDef, field: &FieldInfo, config: &Config) -> String {
        let mut ty = self.plain_name(model, &field.ty, config);
        if field.ty.kind == TypeKind::Object && field.ty.class.is_some_and(|to| reaches(model, to, class.id)) {
            ty = format!("Box<{ty}>");
        }
        if (field.nullable || field.ty.kind.is_nullable()) && !is_dynamic(field.ty.kind) {
            ty = format!("Option<{ty}>");
        }
        ty
    }

    /// Type name without the `Option` a null at this position calls for.
    fn plain_name(&self, model: &TypeModel, ty: &TypeNode, config: &Config) -> String {
        let element = || match ty.element() {
            Some(element) => self.type_name(model, element, config),
            None => "serde_json::Value".to_string(),
        };
        match ty.kind {
            TypeKind::Anything | TypeKind::NullableSomething | TypeKind::NonConstrained => {
                "serde_json::Value".to_string()
            }
            // Dates stay textual; the accepted formats are configurable.
            TypeKind::String | TypeKind::Date | TypeKind::NullableDate => "String".to_string(),
            TypeKind::Boolean | TypeKind::NullableBoolean => "bool".to_string(),
            TypeKind::Integer | TypeKind::NullableInteger => "i32".to_string(),
            TypeKind::Long | TypeKind::NullableLong => "i64".to_string(),
            TypeKind::Float | TypeKind::NullableFloat => "f64".to_string(),
            TypeKind::Object => match model.assigned_name(ty) {
                Some(name) => name.to_string(),
                None => "serde_json::Value".to_string(),
            },
            TypeKind::Array => format!("Vec<{}>", element()),
            TypeKind::Dictionary => format!("std::collections::HashMap<String, {}>", element()),
        }
    }

    fn write_accessors(
        &self,
        model: &TypeModel,
        config: &Config,
        out: &mut dyn Write,
        class: &ClassDef,
        idents: &[String],
        prefix: &str,
    ) -> fmt::Result {
        let vis = Self::visibility(config);
        writeln!(out)?;
        writeln!(out, "{prefix}impl {} {{", class.name)?;
        for (i, (field, ident)) in class.fields.iter().zip(idents).enumerate() {
            let ty = self.field_type(model, class, field, config);
            let getter = ident.trim_start_matches("r#");
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "{prefix}    {vis}fn {ident}(&self) -> &{ty} {{")?;
            writeln!(out, "{prefix}        &self.{ident}")?;
            writeln!(out, "{prefix}    }}")?;
            writeln!(out)?;
            writeln!(out, "{prefix}    {vis}fn set_{getter}(&mut self, value: {ty}) {{")?;
            writeln!(out, "{prefix}        self.{ident} = value;")?;
            writeln!(out, "{prefix}    }}")?;
        }
        writeln!(out, "{prefix}}}")
    }
}

impl CodeWriter for RustWriter {
    fn file_extension(&self) -> &'static str {
        "rs"
    }

    fn display_name(&self) -> &'static str {
        "Rust"
    }

    fn type_name(&self, model: &TypeModel, ty: &TypeNode, config: &Config) -> String {
        let plain = self.plain_name(model, ty, config);
        if (ty.nullable || ty.kind.is_nullable()) && !is_dynamic(ty.kind) {
            format!("Option<{plain}>")
        } else {
            plain
        }
    }

    fn write_type(&self, model: &TypeModel, config: &Config, out: &mut dyn Write, class: &ClassDef) -> fmt::Result {
        let prefix = if config.namespace_for(class.is_root).is_some() { "    " } else { "" };
        let vis = Self::visibility(config);
        let field_vis = if config.use_properties { "" } else { vis };
        let idents = field_idents(class);

        writeln!(out, "{prefix}#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]")?;
        writeln!(out, "{prefix}{vis}struct {} {{", class.name)?;
        for (field, ident) in class.fields.iter().zip(&idents) {
            if config.examples_in_documentation && !field.examples.is_empty() {
                let examples: Vec<String> =
                    field.examples.iter().take(config.example_limit).map(|v| v.to_string()).collect();
                writeln!(out, "{prefix}    /// Examples: {}", examples.join(", "))?;
            }
            if ident.trim_start_matches("r#") != field.source_name {
                writeln!(out, "{prefix}    #[serde(rename = {:?})]", field.source_name)?;
            }
            let ty = self.field_type(model, class, field, config);
            if ty.starts_with("Option<") {
                writeln!(out, "{prefix}    #[serde(default, skip_serializing_if = \"Option::is_none\")]")?;
            } else if field.nullable {
                writeln!(out, "{prefix}    #[serde(default)]")?;
            }
            writeln!(out, "{prefix}    {field_vis}{ident}: {ty},")?;
        }
        writeln!(out, "{prefix}}}")?;
        if config.use_properties && !class.fields.is_empty() {
            self.write_accessors(model, config, out, class, &idents, prefix)?;
        }
        writeln!(out)
    }

    fn write_file_start(&self, _config: &Config, out: &mut dyn Write) -> fmt::Result {
        for line in FILE_HEADER {
            writeln!(out, "// {line}")?;
        }
        writeln!(out)?;
        writeln!(out, "use serde::{{Deserialize, Serialize}};")?;
        writeln!(out)
    }

    fn write_file_end(&self, _config: &Config, _out: &mut dyn Write) -> fmt::Result {
        Ok(())
    }

    fn write_namespace_start(&self, config: &Config, out: &mut dyn Write, root: bool) -> fmt::Result {
        let secondary = config.secondary_namespace.as_deref().map(module_name);
        let own = config.namespace_for(root).map(module_name);
        if let Some(module) = &own {
            writeln!(out, "{}mod {module} {{", Self::visibility(config))?;
            writeln!(out, "    use super::*;")?;
        }
        // The root block needs the classes split off into the secondary module.
        if let Some(secondary) = secondary.filter(|s| root && own.as_ref() != Some(s)) {
            let indent = if own.is_some() { "    " } else { "" };
            let path = if own.is_some() { "super" } else { "self" };
            writeln!(out, "{indent}#[allow(unused_imports)]")?;
            writeln!(out, "{indent}use {path}::{secondary}::*;")?;
        }
        writeln!(out)
    }

    fn write_namespace_end(&self, config: &Config, out: &mut dyn Write, root: bool) -> fmt::Result {
        match config.namespace_for(root) {
            Some(_) => {
                writeln!(out, "}}")?;
                writeln!(out)
            }
            None => Ok(()),
        }
    }
}

fn is_dynamic(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Anything | TypeKind::NullableSomething | TypeKind::NonConstrained)
}

/// Whether `from` reaches `target` through plain object fields. Such a
/// field would make the struct infinitely sized without a `Box`.
fn reaches(model: &TypeModel, from: ClassId, target: ClassId) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(id) = stack.pop() {
        if id == target {
            return true;
        }
        if !seen.insert(id) {
            continue;
        }
        for field in &model.class(id).fields {
            if field.ty.kind == TypeKind::Object {
                stack.extend(field.ty.class);
            }
        }
    }
    false
}

/// Distinct snake_case identifiers for the fields of `class`.
fn field_idents(class: &ClassDef) -> Vec<String> {
    let mut taken = HashSet::new();
    class
        .fields
        .iter()
        .map(|field| {
            let base = snake_case(&field.source_name);
            let base = if base.is_empty() { "field".to_string() } else { base };
            let mut candidate = base.clone();
            let mut suffix = 2u64;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            escape_keyword(candidate)
        })
        .collect()
}

fn escape_keyword(ident: String) -> String {
    if PATH_KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else if STRICT_KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

/// `firstName`, `First-Name`, `HTTPStatus` → `first_name`, `first_name`,
/// `http_status`.
pub fn snake_case(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn module_name(namespace: &str) -> String {
    let name = escape_keyword(snake_case(namespace));
    if name.is_empty() { "generated".to_string() } else { name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::render;
    use crate::inference::infer_from_values;
    use serde_json::json;
    use test_case::test_case;

    fn generate(docs: &[serde_json::Value], config: &Config) -> String {
        let model = infer_from_values(docs, config);
        render(&RustWriter, &model, config).unwrap()
    }

    #[test_case("id", "id")]
    #[test_case("firstName", "first_name")]
    #[test_case("First-Name", "first_name")]
    #[test_case("HTTPStatus", "http_status")]
    #[test_case("user_id2", "user_id2")]
    #[test_case("2fa", "_2fa")]
    #[test_case("--", "")]
    fn snake(raw: &str, expected: &str) {
        assert_eq!(snake_case(raw), expected);
    }

    #[test]
    fn structs_with_renames_and_options() {
        let src = generate(
            &[json!({"userName": "a", "age": 3, "type": "x", "owner": {"id": 1}}), json!({"userName": "b", "age": null})],
            &Config::default(),
        );
        assert!(src.contains("use serde::{Deserialize, Serialize};"));
        assert!(src.contains("pub struct Owner {\n    pub id: i32,\n}"));
        assert!(src.contains("    #[serde(rename = \"userName\")]\n    pub user_name: String,\n"));
        assert!(src.contains("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n    pub age: Option<i32>,\n"));
        assert!(src.contains("    pub r#type: Option<String>,\n"));
        assert!(src.contains("    pub owner: Option<Owner>,\n"));
        assert!(src.find("struct Owner").unwrap() < src.find("struct Root").unwrap());
    }

    #[test]
    fn direct_recursion_is_boxed() {
        let src = generate(&[json!({"value": 1, "next": {"value": 2, "next": null}})], &Config::default());
        assert!(src.contains("pub next: Option<Box<Root>>,"), "{src}");
    }

    #[test]
    fn colliding_idents_are_suffixed() {
        let src = generate(&[json!({"firstName": "a", "first_name": "b"})], &Config::default());
        assert!(src.contains("pub first_name: String,"));
        assert!(src.contains("#[serde(rename = \"first_name\")]\n    pub first_name_2: String,"));
    }

    #[test]
    fn accessors_and_internal_visibility() {
        let config = Config { use_properties: true, internal_visibility: true, ..Config::default() };
        let src = generate(&[json!({"tags": ["a"]})], &config);
        assert!(src.contains("pub(crate) struct Root {\n    tags: Vec<String>,\n}"));
        assert!(src.contains("    pub(crate) fn tags(&self) -> &Vec<String> {"));
        assert!(src.contains("    pub(crate) fn set_tags(&mut self, value: Vec<String>) {"));
    }

    #[test]
    fn namespaces_become_modules() {
        let config = Config {
            namespace: Some("Api".into()),
            secondary_namespace: Some("ApiModels".into()),
            ..Config::default()
        };
        let src = generate(&[json!({"items": [{"sku": "a"}]})], &config);
        assert!(src.contains("pub mod api_models {\n    use super::*;\n\n    #[derive("));
        assert!(src.contains("pub mod api {\n    use super::*;\n    #[allow(unused_imports)]\n    use super::api_models::*;\n"));
        assert!(src.contains("        pub items: Vec<Item>,"));
    }

    #[test]
    fn dynamic_values_are_not_wrapped() {
        let src = generate(&[json!({"x": null, "y": [1, "a"]}), json!({})], &Config::default());
        assert!(src.contains("    #[serde(default)]\n    pub x: serde_json::Value,"));
        assert!(src.contains("pub y: Option<Vec<serde_json::Value>>,"));
    }

    #[test]
    fn nullable_elements_become_options() {
        let src = generate(
            &[json!({"xs": ["a", null], "orders": [{"k": 1}, null], "m": {"1": 2, "2": null}})],
            &Config::default(),
        );
        assert!(src.contains("    pub xs: Vec<Option<String>>,"), "{src}");
        assert!(src.contains("    pub orders: Vec<Option<Order>>,"));
        assert!(src.contains("    pub m: std::collections::HashMap<String, Option<i32>>,"));
    }

    #[test]
    fn recursive_root_with_namespaces_needs_no_secondary_import() {
        let config = Config {
            namespace: Some("Api".into()),
            secondary_namespace: Some("ApiModels".into()),
            ..Config::default()
        };
        let src = generate(&[json!({"name": "a", "children": [{"name": "b", "children": []}]})], &config);
        assert!(src.contains("        pub children: Vec<Root>,"), "{src}");
        assert!(!src.contains("api_models"));
    }

    #[test]
    fn missing_conflicting_key_defaults() {
        let src = generate(&[json!({"x": 1}), json!({"x": "a"}), json!({})], &Config::default());
        assert!(src.contains("    #[serde(default)]\n    pub x: serde_json::Value,"), "{src}");
    }
}
