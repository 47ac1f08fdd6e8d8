//! Structural deduplication of object shapes into classes.
//!
//! Runs once over the finished evidence tree, children before parents. A
//! shape joins the first registered class with the same key set whose field
//! types are all compatible with its own; otherwise it becomes a new class.
//! Nested objects are compared by class id, so two parents merge only if
//! their children already did.
use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use super::obj::{Field, Shape};
use super::unify::{is_compatible, ObjectRepr, Ty};
use crate::ir::ClassId;

impl ObjectRepr for ClassId {
    fn merge(self, other: Self) -> Option<Self> {
        (self == other).then_some(self)
    }

    fn compatible(&self, other: &Self) -> bool {
        self == other
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassEntry {
    pub fields: IndexMap<String, Field<ClassId>>,
    pub samples: u64,
    pub is_root: bool,
}

impl ClassEntry {
    fn accepts(&self, fields: &IndexMap<String, Field<ClassId>>) -> bool {
        self.fields.len() == fields.len()
            && fields.iter().all(|(name, theirs)| {
                self.fields
                    .get(name)
                    .is_some_and(|ours| is_compatible(&ours.ty, &theirs.ty))
            })
    }

    fn absorb(&mut self, fields: IndexMap<String, Field<ClassId>>, samples: u64) {
        for (name, theirs) in fields {
            if let Some(ours) = self.fields.get_mut(&name) {
                ours.absorb(theirs);
            }
        }
        self.samples += samples;
    }
}

/// Run-scoped class table. Ids here are discovery order; lowering
/// renumbers them into emission order.
#[derive(Debug, Default)]
pub struct Registry {
    pub classes: Vec<ClassEntry>,
    by_keys: BTreeMap<Vec<String>, Vec<ClassId>>,
}

impl Registry {
    pub fn class(&self, id: ClassId) -> &ClassEntry {
        &self.classes[id.0]
    }

    /// Intern the top-level evidence and flag its class as the root.
    pub fn intern_root(&mut self, ty: Ty<Shape>) -> Ty<ClassId> {
        let root = self.intern(ty);
        if let Ty::Object { obj, .. } = &root {
            self.classes[obj.0].is_root = true;
        }
        root
    }

    pub fn intern(&mut self, ty: Ty<Shape>) -> Ty<ClassId> {
        ty.map_objects(&mut |shape| self.intern_shape(shape))
    }

    fn intern_shape(&mut self, shape: Shape) -> ClassId {
        let fields: IndexMap<String, Field<ClassId>> = shape
            .fields
            .into_iter()
            .map(|(name, field)| {
                let ty = self.intern(field.ty);
                (name, Field { ty, present_in: field.present_in, examples: field.examples })
            })
            .collect();

        let mut keys: Vec<String> = fields.keys().cloned().collect();
        keys.sort();

        let existing = self
            .by_keys
            .get(&keys)
            .and_then(|ids| ids.iter().copied().find(|id| self.classes[id.0].accepts(&fields)));

        match existing {
            Some(id) => {
                debug!(class = id.0, fields = ?keys, "merged structurally equal shape");
                self.classes[id.0].absorb(fields, shape.seen_objects);
                id
            }
            None => {
                let id = ClassId(self.classes.len());
                debug!(class = id.0, fields = ?keys, "registered class");
                self.classes.push(ClassEntry { fields, samples: shape.seen_objects, is_root: false });
                self.by_keys.entry(keys).or_default().push(id);
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::unify::Scalar;
    use pretty_assertions::assert_eq;

    fn shape(fields: Vec<(&str, Ty<Shape>)>) -> Ty<Shape> {
        let mut s = Shape::observed();
        for (name, ty) in fields {
            s.fields.insert(name.to_string(), Field::observed(ty, None));
        }
        Ty::object(s)
    }

    fn int() -> Ty<Shape> {
        Ty::scalar(Scalar::Integer)
    }

    #[test]
    fn identical_siblings_share_a_class() {
        let root = shape(vec![("a", shape(vec![("x", int())])), ("b", shape(vec![("x", int())]))]);
        let mut registry = Registry::default();
        let root = registry.intern_root(root);

        assert_eq!(registry.classes.len(), 2);
        let Ty::Object { obj: root_id, .. } = root else { panic!("root is an object") };
        let root_class = registry.class(root_id);
        assert!(root_class.is_root);
        assert_eq!(root_class.fields["a"].ty, root_class.fields["b"].ty);
    }

    #[test]
    fn compatible_shapes_merge_and_widen() {
        let root = shape(vec![
            ("a", shape(vec![("x", int())])),
            ("b", shape(vec![("x", Ty::scalar(Scalar::Float))])),
        ]);
        let mut registry = Registry::default();
        registry.intern_root(root);

        let child = registry.class(ClassId(0));
        assert_eq!(child.fields["x"].ty, Ty::scalar(Scalar::Float));
        assert_eq!(child.samples, 2);
    }

    #[test]
    fn conflicting_shapes_stay_apart() {
        let root = shape(vec![
            ("a", shape(vec![("x", int())])),
            ("b", shape(vec![("x", Ty::scalar(Scalar::String))])),
            ("c", shape(vec![("y", int())])),
        ]);
        let mut registry = Registry::default();
        registry.intern_root(root);
        assert_eq!(registry.classes.len(), 4);
    }

    #[test]
    fn recursive_data_collapses_to_a_self_reference() {
        let leaf = shape(vec![("children", Ty::array(Ty::Unknown))]);
        let root = shape(vec![("children", Ty::array(leaf))]);
        let mut registry = Registry::default();
        let root = registry.intern_root(root);

        assert_eq!(registry.classes.len(), 1);
        let Ty::Object { obj, .. } = root else { panic!("root is an object") };
        assert_eq!(registry.class(obj).fields["children"].ty, Ty::array(Ty::object(obj)));
    }
}
