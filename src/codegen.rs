//! Code writers: one implementation per target language over the frozen
//! [`TypeModel`]. Writers are pure templating; every decision about types
//! and names has already been made by inference.
mod rust;
mod typescript;

use std::borrow::Cow;
use std::fmt::{self, Write};

pub use rust::RustWriter;
pub use typescript::TypeScriptWriter;

use crate::config::Config;
use crate::error::Result;
use crate::ir::{ClassDef, TypeModel, TypeNode};

pub const FILE_HEADER: &[&str] = &[
    "Generated by json-classgen from sample JSON documents.",
    "Edits will be lost when the file is regenerated.",
];

pub trait CodeWriter: Sync {
    fn file_extension(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Render a reference to `ty`, recursing through element types.
    fn type_name(&self, model: &TypeModel, ty: &TypeNode, config: &Config) -> String;

    /// Emit one complete definition for an object class.
    fn write_type(&self, model: &TypeModel, config: &Config, out: &mut dyn Write, class: &ClassDef) -> fmt::Result;

    fn write_file_start(&self, config: &Config, out: &mut dyn Write) -> fmt::Result;

    fn write_file_end(&self, config: &Config, out: &mut dyn Write) -> fmt::Result;

    fn write_namespace_start(&self, config: &Config, out: &mut dyn Write, root: bool) -> fmt::Result;

    fn write_namespace_end(&self, config: &Config, out: &mut dyn Write, root: bool) -> fmt::Result;
}

/// Emit every class of `model` exactly once, in model order. With a
/// secondary namespace, non-root classes get their own block ahead of the
/// root block. When there are no such classes the secondary namespace is
/// ignored, so writers never reference a block that was not emitted.
pub fn render(writer: &dyn CodeWriter, model: &TypeModel, config: &Config) -> Result<String> {
    let (roots, others): (Vec<&ClassDef>, Vec<&ClassDef>) = model.classes().iter().partition(|c| c.is_root);
    let config = if config.secondary_namespace.is_some() && others.is_empty() {
        Cow::Owned(Config { secondary_namespace: None, ..config.clone() })
    } else {
        Cow::Borrowed(config)
    };
    let config = config.as_ref();

    let mut out = String::new();
    writer.write_file_start(config, &mut out)?;
    if config.secondary_namespace.is_some() {
        write_block(writer, model, config, &mut out, &others, false)?;
        write_block(writer, model, config, &mut out, &roots, true)?;
    } else {
        let all: Vec<&ClassDef> = model.classes().iter().collect();
        write_block(writer, model, config, &mut out, &all, true)?;
    }
    writer.write_file_end(config, &mut out)?;
    Ok(out)
}

fn write_block(
    writer: &dyn CodeWriter,
    model: &TypeModel,
    config: &Config,
    out: &mut String,
    classes: &[&ClassDef],
    root: bool,
) -> fmt::Result {
    writer.write_namespace_start(config, out, root)?;
    for class in classes {
        writer.write_type(model, config, out, class)?;
    }
    writer.write_namespace_end(config, out, root)
}
