//! Type inference over sample JSON documents.
//!
//! Stream samples in, join every observation of the same position into one
//! evidence tree, then intern object shapes into classes, name them, and
//! freeze the result into a [`TypeModel`].
//!
//! - Join is commutative and associative, so sample order only affects
//!   field order and naming, never the inferred kinds.
//! - Conflicts never fail: they widen, ultimately to `Anything`.
//! - The builder types stay inside this module tree; callers only ever see
//!   the frozen model.
pub mod classify;
pub mod dict;
pub mod intern;
pub mod name;
pub mod obj;
pub mod unify;

use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ir::TypeModel;
use classify::{classify, DateFormats};
use intern::Registry;
use obj::{Field, Shape};
use unify::{join, Ty};

// ------------------------------ Observe ---------------------------------- //

struct Observer<'c> {
    config: &'c Config,
    dates: DateFormats,
}

impl Observer<'_> {
    fn observe(&self, v: &Value) -> Ty<Shape> {
        if let Some(leaf) = classify(v, &self.dates) {
            return leaf;
        }
        match v {
            Value::Array(xs) => self.observe_array(xs),
            Value::Object(map) => self.observe_object(map, true),
            // classify covers every scalar
            _ => Ty::anything(),
        }
    }

    fn observe_array(&self, xs: &[Value]) -> Ty<Shape> {
        let item = xs.iter().fold(Ty::Unknown, |acc, el| join(acc, self.observe(el)));
        Ty::array(item)
    }

    /// A root sample is always a record: the root class carries the root name.
    fn observe_root(&self, v: &Value) -> Ty<Shape> {
        match v {
            Value::Object(map) => self.observe_object(map, false),
            other => self.observe(other),
        }
    }

    fn observe_object(&self, map: &Map<String, Value>, may_be_dictionary: bool) -> Ty<Shape> {
        let observed: Vec<(&str, Ty<Shape>)> =
            map.iter().map(|(k, v)| (k.as_str(), self.observe(v))).collect();

        if may_be_dictionary {
            let entries = observed.iter().map(|(k, ty)| (*k, ty));
            if let Some(value) = dict::detect(&self.config.dictionaries, &self.dates, entries) {
                return Ty::dictionary(value);
            }
        }

        let mut shape = Shape::observed();
        for ((key, ty), value) in observed.into_iter().zip(map.values()) {
            let example = (self.config.examples_in_documentation && is_literal(value)).then_some(value);
            shape.fields.insert(key.to_string(), Field::observed(ty, example));
        }
        Ty::object(shape)
    }
}

fn is_literal(v: &Value) -> bool {
    matches!(v, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

// ------------------------------- Front API -------------------------------- //

/// One inference run. Owns its evidence until [`Inference::solve`].
pub struct Inference<'c> {
    observer: Observer<'c>,
    state: Ty<Shape>,
    documents: u64,
}

impl<'c> Inference<'c> {
    pub fn new(config: &'c Config) -> Self {
        let observer = Observer { config, dates: DateFormats::new(&config.date_formats) };
        Self { observer, state: Ty::Unknown, documents: 0 }
    }

    /// Observe one parsed document. A top-level array contributes each of
    /// its elements as a separate sample of the root.
    pub fn observe_value(&mut self, v: &Value) {
        match v {
            Value::Array(xs) => xs.iter().for_each(|x| self.observe_root(x)),
            other => self.observe_root(other),
        }
    }

    /// Parse and observe one document. Malformed text is rejected before
    /// anything is recorded.
    pub fn observe_str(&mut self, origin: &str, src: &str) -> Result<()> {
        let value: Value = serde_json::from_str(src).map_err(|source| Error::MalformedInput {
            origin: origin.to_string(),
            source,
        })?;
        self.observe_value(&value);
        Ok(())
    }

    fn observe_root(&mut self, v: &Value) {
        let obs = self.observer.observe_root(v);
        self.state = join(std::mem::take(&mut self.state), obs);
        self.documents += 1;
    }

    pub fn documents(&self) -> u64 {
        self.documents
    }

    pub fn solve(self) -> TypeModel {
        let config = self.observer.config;
        let mut registry = Registry::default();
        let root = registry.intern_root(self.state);
        let names = name::assign_names(&registry, &root, &config.root_name);
        let model = crate::lower::lower_to_ir(&registry, &root, &names, config);
        debug!(
            documents = self.documents,
            registered = registry.classes.len(),
            emitted = model.classes().len(),
            "inference solved"
        );
        model
    }
}

pub fn infer_from_values<'a, I>(values: I, config: &Config) -> TypeModel
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut inference = Inference::new(config);
    for v in values {
        inference.observe_value(v);
    }
    inference.solve()
}

/// Parse every document first, then infer. Any malformed document fails the
/// whole run.
pub fn infer_from_strs<'a, I>(documents: I, config: &Config) -> Result<TypeModel>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let values = documents
        .into_iter()
        .map(|(origin, src)| {
            serde_json::from_str::<Value>(src).map_err(|source| Error::MalformedInput {
                origin: origin.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(infer_from_values(&values, config))
}

/// Independent runs over unrelated sample sets, in parallel.
pub fn infer_batch(sets: &[Vec<Value>], config: &Config) -> Vec<TypeModel> {
    sets.par_iter().map(|set| infer_from_values(set, config)).collect()
}

// ------------------------------- Tests ------------------------------------ //
