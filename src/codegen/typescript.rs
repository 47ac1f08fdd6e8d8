use std::fmt::{self, Write};

use super::{CodeWriter, FILE_HEADER};
use crate::config::Config;
use crate::ir::{ClassDef, FieldInfo, TypeKind, TypeModel, TypeNode};

/// TypeScript classes with a `data?` constructor and a `toService()`
/// serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptWriter;

impl TypeScriptWriter {
    /// `scope` is the namespace that non-root classes live in, when it has
    /// to be spelled out.
    fn qualified_name(&self, model: &TypeModel, ty: &TypeNode, scope: Option<&str>) -> String {
        match ty.kind {
            TypeKind::Anything | TypeKind::NullableSomething | TypeKind::NonConstrained => "any".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::Boolean | TypeKind::NullableBoolean => "boolean".to_string(),
            TypeKind::Integer
            | TypeKind::Long
            | TypeKind::Float
            | TypeKind::NullableInteger
            | TypeKind::NullableLong
            | TypeKind::NullableFloat => "number".to_string(),
            TypeKind::Date | TypeKind::NullableDate => "Date".to_string(),
            TypeKind::Object => match (ty.class, model.assigned_name(ty)) {
                (Some(id), Some(name)) => match scope {
                    Some(namespace) if !model.class(id).is_root => format!("{namespace}.{name}"),
                    _ => name.to_string(),
                },
                _ => "any".to_string(),
            },
            TypeKind::Array => format!("Array<{}>", self.element_name(model, ty, scope)),
            TypeKind::Dictionary => format!("{{ [key: string]: {}; }}", self.element_name(model, ty, scope)),
        }
    }

    fn element_name(&self, model: &TypeModel, ty: &TypeNode, scope: Option<&str>) -> String {
        match ty.element() {
            Some(element) if element.nullable && !is_dynamic(element.kind) => {
                format!("{} | null", self.qualified_name(model, element, scope))
            }
            Some(element) => self.qualified_name(model, element, scope),
            None => "any".to_string(),
        }
    }

    /// Root classes reference non-root classes across the namespace split.
    fn scope<'c>(&self, config: &'c Config, class: &ClassDef) -> Option<&'c str> {
        let secondary = config.secondary_namespace.as_deref()?;
        (class.is_root && config.namespace.as_deref() != Some(secondary)).then_some(secondary)
    }

    fn write_constructor(
        &self,
        model: &TypeModel,
        config: &Config,
        out: &mut dyn Write,
        class: &ClassDef,
        prefix: &str,
    ) -> fmt::Result {
        writeln!(out)?;
        writeln!(out, "{prefix}    constructor(data?: any) {{")?;
        let scope = self.scope(config, class);
        for field in &class.fields {
            let default = if field.nullable {
                "null".to_string()
            } else {
                self.default_value(model, &field.ty, scope)
            };
            writeln!(
                out,
                "{prefix}        this{} = data?{} ?? {default};",
                member_access(&field.source_name),
                optional_access(&field.source_name),
            )?;
        }
        writeln!(out, "{prefix}    }}")
    }

    fn write_to_service(&self, out: &mut dyn Write, class: &ClassDef, prefix: &str) -> fmt::Result {
        writeln!(out)?;
        writeln!(out, "{prefix}    public toService(): any {{")?;
        writeln!(out, "{prefix}        const obj: any = {{}};")?;
        for field in &class.fields {
            let access = member_access(&field.source_name);
            writeln!(out, "{prefix}        obj{access} = this{access};")?;
        }
        writeln!(out, "{prefix}        return obj;")?;
        writeln!(out, "{prefix}    }}")
    }

    fn default_value(&self, model: &TypeModel, ty: &TypeNode, scope: Option<&str>) -> String {
        match ty.kind {
            TypeKind::String => "''".to_string(),
            TypeKind::Integer | TypeKind::Long | TypeKind::Float => "0".to_string(),
            TypeKind::Boolean => "false".to_string(),
            TypeKind::Date => "new Date()".to_string(),
            TypeKind::Array => "[]".to_string(),
            TypeKind::Dictionary => "{}".to_string(),
            TypeKind::Object => format!("new {}()", self.qualified_name(model, ty, scope)),
            _ => "null".to_string(),
        }
    }
}

impl CodeWriter for TypeScriptWriter {
    fn file_extension(&self) -> &'static str {
        "ts"
    }

    fn display_name(&self) -> &'static str {
        "TypeScript"
    }

    fn type_name(&self, model: &TypeModel, ty: &TypeNode, _config: &Config) -> String {
        self.qualified_name(model, ty, None)
    }

    fn write_type(&self, model: &TypeModel, config: &Config, out: &mut dyn Write, class: &ClassDef) -> fmt::Result {
        let prefix = if config.namespace_for(class.is_root).is_some() { "    " } else { "" };
        let export = if !config.internal_visibility || config.secondary_namespace.is_some() { "export " } else { "" };

        let scope = self.scope(config, class);
        writeln!(out, "{prefix}{export}class {} {{", class.name)?;
        for field in &class.fields {
            if config.examples_in_documentation && !field.examples.is_empty() {
                writeln!(out)?;
                writeln!(out, "{prefix}    /**")?;
                writeln!(out, "{prefix}     * Examples: {}", examples_text(field, config.example_limit))?;
                writeln!(out, "{prefix}     */")?;
            }
            writeln!(
                out,
                "{prefix}    {}{}: {};",
                member_name(&field.source_name),
                if field.nullable { "?" } else { "" },
                self.qualified_name(model, &field.ty, scope),
            )?;
        }
        self.write_constructor(model, config, out, class, prefix)?;
        self.write_to_service(out, class, prefix)?;
        writeln!(out, "{prefix}}}")?;
        writeln!(out)
    }

    fn write_file_start(&self, _config: &Config, out: &mut dyn Write) -> fmt::Result {
        for line in FILE_HEADER {
            writeln!(out, "// {line}")?;
        }
        writeln!(out)
    }

    fn write_file_end(&self, _config: &Config, _out: &mut dyn Write) -> fmt::Result {
        Ok(())
    }

    fn write_namespace_start(&self, config: &Config, out: &mut dyn Write, root: bool) -> fmt::Result {
        match config.namespace_for(root) {
            Some(namespace) => {
                writeln!(out, "export namespace {namespace} {{")?;
                writeln!(out)
            }
            None => Ok(()),
        }
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

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn quoted(key: &str) -> String {
    format!("'{}'", key.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn member_name(key: &str) -> String {
    if is_identifier(key) { key.to_string() } else { quoted(key) }
}

fn member_access(key: &str) -> String {
    if is_identifier(key) { format!(".{key}") } else { format!("[{}]", quoted(key)) }
}

fn optional_access(key: &str) -> String {
    if is_identifier(key) { format!(".{key}") } else { format!(".[{}]", quoted(key)) }
}

fn examples_text(field: &FieldInfo, limit: usize) -> String {
    field
        .examples
        .iter()
        .take(limit)
        .map(|v| v.to_string().replace("*/", "*\\/"))
        .collect::<Vec<_>>()
        .join(", ")
}
