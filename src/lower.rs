//! Freeze interned evidence into the immutable [`TypeModel`].
//!
//! Classes are renumbered into emission order: a post-order walk from the
//! root, so a class comes after every class it references (a cycle is cut
//! where the walk first re-enters it). Classes the root cannot reach are
//! dropped.
use crate::config::Config;
use crate::inference::intern::Registry;
use crate::inference::unify::{Scalar, Ty};
use crate::ir::{ClassDef, ClassId, FieldInfo, TypeKind, TypeModel, TypeNode};

pub fn lower_to_ir(registry: &Registry, root: &Ty<ClassId>, names: &[String], config: &Config) -> TypeModel {
    let order = emission_order(registry, root);

    let mut remap = vec![None; registry.classes.len()];
    for (new, old) in order.iter().enumerate() {
        remap[old.0] = Some(ClassId(new));
    }
    let lowerer = Lowerer { remap: &remap, config };

    let classes = order
        .iter()
        .enumerate()
        .map(|(new, old)| {
            let entry = registry.class(*old);
            ClassDef {
                id: ClassId(new),
                name: names[old.0].clone(),
                fields: entry
                    .fields
                    .iter()
                    .map(|(name, field)| FieldInfo {
                        source_name: name.clone(),
                        ty: lowerer.lower(&field.ty),
                        nullable: field.ty.is_nullable(),
                        present_in: field.present_in,
                        examples: lowerer.examples(&field.examples),
                    })
                    .collect(),
                is_root: entry.is_root,
                samples: entry.samples,
            }
        })
        .collect();

    let mut root = lowerer.lower(root);
    root.is_root = true;
    TypeModel::new(root, classes)
}

fn emission_order(registry: &Registry, root: &Ty<ClassId>) -> Vec<ClassId> {
    fn walk_ty(registry: &Registry, ty: &Ty<ClassId>, visited: &mut [bool], order: &mut Vec<ClassId>) {
        match ty {
            Ty::Object { obj, .. } => walk_class(registry, *obj, visited, order),
            Ty::Array { item, .. } => walk_ty(registry, item, visited, order),
            Ty::Dictionary { value, .. } => walk_ty(registry, value, visited, order),
            Ty::Unknown | Ty::Null | Ty::Anything { .. } | Ty::Scalar { .. } => {}
        }
    }

    fn walk_class(registry: &Registry, id: ClassId, visited: &mut [bool], order: &mut Vec<ClassId>) {
        if std::mem::replace(&mut visited[id.0], true) {
            return;
        }
        for field in registry.class(id).fields.values() {
            walk_ty(registry, &field.ty, visited, order);
        }
        order.push(id);
    }

    let mut visited = vec![false; registry.classes.len()];
    let mut order = Vec::with_capacity(registry.classes.len());
    walk_ty(registry, root, &mut visited, &mut order);
    order
}

struct Lowerer<'a> {
    remap: &'a [Option<ClassId>],
    config: &'a Config,
}

impl Lowerer<'_> {
    fn lower(&self, ty: &Ty<ClassId>) -> TypeNode {
        let node = match ty {
            Ty::Unknown => TypeNode::leaf(TypeKind::NonConstrained),
            // a conflict that also saw null is "anything, or null"
            Ty::Null | Ty::Anything { nullable: true } => TypeNode::leaf(TypeKind::NullableSomething),
            Ty::Anything { nullable: false } => TypeNode::leaf(TypeKind::Anything),
            Ty::Scalar { kind, nullable } => {
                let kind = scalar_kind(*kind);
                let kind = if *nullable { kind.nullable().unwrap_or(kind) } else { kind };
                TypeNode::leaf(kind)
            }
            Ty::Array { item, .. } => TypeNode::array(self.lower(item)),
            Ty::Dictionary { value, .. } => TypeNode::dictionary(self.lower(value)),
            Ty::Object { obj, .. } => {
                // everything under a reachable class is reachable too
                let id = self.remap[obj.0].unwrap_or(*obj);
                TypeNode::object(id)
            }
        };
        node.with_nullable(ty.is_nullable())
    }

    fn examples(&self, examples: &[serde_json::Value]) -> Vec<serde_json::Value> {
        if !self.config.examples_in_documentation {
            return Vec::new();
        }
        examples.iter().take(self.config.example_limit).cloned().collect()
    }
}

fn scalar_kind(scalar: Scalar) -> TypeKind {
    match scalar {
        Scalar::Boolean => TypeKind::Boolean,
        Scalar::Integer => TypeKind::Integer,
        Scalar::Long => TypeKind::Long,
        Scalar::Float => TypeKind::Float,
        Scalar::Date => TypeKind::Date,
        Scalar::String => TypeKind::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::obj::{Field, Shape};
    use pretty_assertions::assert_eq;

    fn shape(fields: Vec<(&str, Ty<Shape>)>) -> Ty<Shape> {
        let mut s = Shape::observed();
        for (name, ty) in fields {
            s.fields.insert(name.to_string(), Field::observed(ty, None));
        }
        Ty::object(s)
    }

    fn lower(root: Ty<Shape>) -> TypeModel {
        let mut registry = Registry::default();
        let root = registry.intern_root(root);
        let names = crate::inference::name::assign_names(&registry, &root, "Root");
        lower_to_ir(&registry, &root, &names, &Config::default())
    }

    #[test]
    fn dependencies_come_first() {
        let model = lower(shape(vec![
            ("user", shape(vec![("address", shape(vec![("city", Ty::scalar(Scalar::String))]))])),
            ("tags", Ty::array(Ty::scalar(Scalar::String))),
        ]));
        let names: Vec<&str> = model.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Address", "User", "Root"]);
        for class in model.classes() {
            for field in &class.fields {
                if let Some(dep) = field.ty.innermost_class() {
                    assert!(dep <= class.id, "{} references later class", class.name);
                }
            }
        }
        assert!(model.root().is_root);
        assert_eq!(model.root_class().map(|c| c.name.as_str()), Some("Root"));
    }

    #[test]
    fn nullable_scalars_use_counterpart_kinds() {
        let model = lower(shape(vec![
            ("count", Ty::Scalar { kind: Scalar::Integer, nullable: true }),
            ("label", Ty::Scalar { kind: Scalar::String, nullable: true }),
            ("gone", Ty::Null),
            ("empty", Ty::array(Ty::Unknown)),
        ]));
        let root = model.root_class().unwrap();
        let count = root.field("count").unwrap();
        assert_eq!(count.ty.kind, TypeKind::NullableInteger);
        assert!(count.nullable);
        let label = root.field("label").unwrap();
        assert_eq!(label.ty.kind, TypeKind::String);
        assert!(label.nullable);
        assert_eq!(root.field("gone").unwrap().ty.kind, TypeKind::NullableSomething);
        let empty = &root.field("empty").unwrap().ty;
        assert_eq!(empty.kind, TypeKind::Array);
        assert_eq!(empty.element().unwrap().kind, TypeKind::NonConstrained);
    }

    #[test]
    fn element_nullability_is_kept() {
        let model = lower(shape(vec![
            ("xs", Ty::array(Ty::Scalar { kind: Scalar::String, nullable: true })),
            ("os", Ty::array(shape(vec![("k", Ty::scalar(Scalar::Integer))]).into_nullable())),
            ("m", Ty::dictionary(Ty::Scalar { kind: Scalar::Float, nullable: true })),
        ]));
        let root = model.root_class().unwrap();
        let element = |name: &str| root.field(name).unwrap().ty.element().unwrap().clone();
        assert_eq!(element("xs").kind, TypeKind::String);
        assert!(element("xs").nullable);
        assert_eq!(element("os").kind, TypeKind::Object);
        assert!(element("os").nullable);
        assert_eq!(element("m").kind, TypeKind::NullableFloat);
        assert!(element("m").nullable);
        assert!(!root.field("xs").unwrap().nullable);
    }

    #[test]
    fn conflicts_that_saw_null_lower_to_nullable_something() {
        let model = lower(shape(vec![
            ("v", Ty::Anything { nullable: true }),
            ("w", Ty::anything()),
        ]));
        let root = model.root_class().unwrap();
        let v = root.field("v").unwrap();
        assert_eq!(v.ty.kind, TypeKind::NullableSomething);
        assert!(v.nullable);
        let w = root.field("w").unwrap();
        assert_eq!(w.ty.kind, TypeKind::Anything);
        assert!(!w.nullable);
    }

    #[test]
    fn scalar_root_has_no_classes() {
        let model = lower(Ty::scalar(Scalar::Float));
        assert!(model.classes().is_empty());
        assert_eq!(model.root().kind, TypeKind::Float);
    }
}
