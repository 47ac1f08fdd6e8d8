//! Infer class definitions from sample JSON documents.
//!
//! ```
//! use json_classgen::{codegen, Config, TypeKind};
//! use serde_json::json;
//!
//! let config = Config::default();
//! let samples = [json!({"id": 1, "name": "Bob"}), json!({"id": null, "tags": []})];
//! let model = json_classgen::infer_from_values(&samples, &config);
//!
//! let root = model.root_class().unwrap();
//! assert_eq!(root.field("id").unwrap().ty.kind, TypeKind::NullableInteger);
//!
//! let ts = codegen::render(&codegen::TypeScriptWriter, &model, &config).unwrap();
//! assert!(ts.contains("export class Root {"));
//! ```
pub mod codegen;
pub mod config;
pub mod error;
pub mod inference;
pub mod ir;
pub mod jq_exec;
pub mod lower;
pub mod path_de;

pub use config::{Config, DictionaryDetection};
pub use error::{Error, Result};
pub use inference::{infer_batch, infer_from_strs, infer_from_values, Inference};
pub use ir::{ClassDef, ClassId, FieldInfo, TypeKind, TypeModel, TypeNode};
