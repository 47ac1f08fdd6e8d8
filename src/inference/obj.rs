use indexmap::IndexMap;
use serde_json::Value;

use super::unify::{join, ObjectRepr, Ty};

// upper bound while merging; the configured limit is applied when lowering
const MAX_EXAMPLES_KEPT: usize = 64;

/// An object shape under construction: fields in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    pub fields: IndexMap<String, Field>,
    pub seen_objects: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field<O = Shape> {
    pub ty: Ty<O>,
    pub present_in: u64,
    pub examples: Vec<Value>,
}

impl<O> Field<O> {
    pub fn observed(ty: Ty<O>, example: Option<&Value>) -> Self {
        Self { ty, present_in: 1, examples: example.cloned().into_iter().collect() }
    }

    fn into_nullable(mut self) -> Self {
        self.ty = std::mem::take(&mut self.ty).into_nullable();
        self
    }

    pub(super) fn absorb_examples(&mut self, theirs: Vec<Value>) {
        for example in theirs {
            if self.examples.len() >= MAX_EXAMPLES_KEPT {
                break;
            }
            if !self.examples.contains(&example) {
                self.examples.push(example);
            }
        }
    }
}

impl<O: ObjectRepr> Field<O> {
    /// Fold another observation of the same key into this one.
    pub fn absorb(&mut self, theirs: Field<O>) {
        self.ty = join(std::mem::take(&mut self.ty), theirs.ty);
        self.present_in += theirs.present_in;
        self.absorb_examples(theirs.examples);
    }
}

impl Shape {
    pub fn observed() -> Self {
        Self { fields: IndexMap::new(), seen_objects: 1 }
    }
}

impl ObjectRepr for Shape {
    /// Union of both field sets. A key missing on one side counts as an
    /// observed null there.
    fn merge(mut self, other: Self) -> Option<Self> {
        for (name, field) in self.fields.iter_mut() {
            if !other.fields.contains_key(name) {
                field.ty = std::mem::take(&mut field.ty).into_nullable();
            }
        }
        for (name, theirs) in other.fields {
            match self.fields.get_mut(&name) {
                Some(ours) => ours.absorb(theirs),
                None => {
                    self.fields.insert(name, theirs.into_nullable());
                }
            }
        }
        self.seen_objects += other.seen_objects;
        Some(self)
    }

    fn compatible(&self, _other: &Self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::unify::Scalar;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn shape(fields: &[(&str, Ty<Shape>)]) -> Shape {
        let mut s = Shape::observed();
        for (name, ty) in fields {
            s.fields.insert(name.to_string(), Field::observed(ty.clone(), None));
        }
        s
    }

    #[test]
    fn merge_keeps_first_seen_order_and_marks_missing_nullable() {
        let a = shape(&[("id", Ty::scalar(Scalar::Integer)), ("name", Ty::scalar(Scalar::String))]);
        let b = shape(&[("id", Ty::scalar(Scalar::Long)), ("tag", Ty::scalar(Scalar::Boolean))]);
        let merged = a.merge(b).unwrap();

        let names: Vec<&str> = merged.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "name", "tag"]);
        assert_eq!(merged.seen_objects, 2);

        let id = &merged.fields["id"];
        assert_eq!(id.ty, Ty::scalar(Scalar::Long));
        assert_eq!(id.present_in, 2);
        assert_eq!(merged.fields["name"].ty, Ty::Scalar { kind: Scalar::String, nullable: true });
        assert_eq!(merged.fields["tag"].ty, Ty::Scalar { kind: Scalar::Boolean, nullable: true });
        assert_eq!(merged.fields["tag"].present_in, 1);
    }

    #[test]
    fn examples_are_deduplicated_in_order() {
        let mut field: Field = Field::observed(Ty::scalar(Scalar::Integer), Some(&json!(1)));
        field.absorb(Field::observed(Ty::scalar(Scalar::Integer), Some(&json!(2))));
        field.absorb(Field::observed(Ty::scalar(Scalar::Integer), Some(&json!(1))));
        assert_eq!(field.examples, vec![json!(1), json!(2)]);
        assert_eq!(field.present_in, 3);
    }
}
