//! Class naming.
//!
//! Names are handed out in a pre-order walk from the root, fields in
//! first-seen order. A class is named after the field it is first reached
//! through (singular when reached through an array or map element); taken
//! names get a numeric suffix starting at 2. The table lives only for the
//! duration of one run.
use std::collections::HashSet;

use super::intern::Registry;
use super::unify::Ty;
use crate::ir::ClassId;

const FALLBACK_NAME: &str = "Type";

/// Names the code writers reference unqualified: TypeScript globals and
/// Rust prelude/std types. A class never takes one of these.
pub const RESERVED_NAMES: &[&str] = &[
    "Array", "Boolean", "Box", "Date", "Deserialize", "Err", "Error", "Function", "HashMap", "Map", "None",
    "Number", "Object", "Ok", "Option", "Promise", "Record", "Result", "Self", "Serialize", "Set", "Some",
    "String", "Symbol", "Value", "Vec",
];

#[derive(Clone, Copy, Debug)]
enum Hint<'a> {
    Root(&'a str),
    Field { name: &'a str, element: bool },
}

impl<'a> Hint<'a> {
    fn element(self) -> Self {
        match self {
            Hint::Root(name) => Hint::Root(name),
            Hint::Field { name, .. } => Hint::Field { name, element: true },
        }
    }

    fn base_name(self) -> String {
        match self {
            Hint::Root(name) => name.to_string(),
            Hint::Field { name, element } => {
                let pascal = pascal_case(name);
                if element { singularize(&pascal) } else { pascal }
            }
        }
    }
}

struct Namer<'r> {
    registry: &'r Registry,
    names: Vec<Option<String>>,
    taken: HashSet<String>,
}

/// Assign a name to every class reachable from `root`, indexed by the
/// registry's ids. Unreachable classes keep an empty name.
pub fn assign_names(registry: &Registry, root: &Ty<ClassId>, root_name: &str) -> Vec<String> {
    let mut namer = Namer {
        registry,
        names: vec![None; registry.classes.len()],
        taken: RESERVED_NAMES.iter().map(|name| name.to_string()).collect(),
    };
    namer.visit(root, Hint::Root(root_name));
    namer.names.into_iter().map(Option::unwrap_or_default).collect()
}

impl Namer<'_> {
    fn visit(&mut self, ty: &Ty<ClassId>, hint: Hint<'_>) {
        match ty {
            Ty::Object { obj, .. } => self.visit_class(*obj, hint),
            Ty::Array { item, .. } => self.visit(item, hint.element()),
            Ty::Dictionary { value, .. } => self.visit(value, hint.element()),
            Ty::Unknown | Ty::Null | Ty::Anything { .. } | Ty::Scalar { .. } => {}
        }
    }

    fn visit_class(&mut self, id: ClassId, hint: Hint<'_>) {
        if self.names[id.0].is_some() {
            return;
        }
        let registry = self.registry;
        let class = registry.class(id);
        let base = hint.base_name();
        let name = self.unique(&base);
        self.names[id.0] = Some(name);
        for (field_name, field) in &class.fields {
            self.visit(&field.ty, Hint::Field { name: field_name, element: false });
        }
    }

    fn unique(&mut self, base: &str) -> String {
        let base = if base.is_empty() { FALLBACK_NAME } else { base };
        let mut candidate = base.to_string();
        let mut suffix = 2u64;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// `first_name`, `first-name`, `firstName` → `FirstName`. Leading digits
/// get an underscore so the result is a valid identifier.
pub fn pascal_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for segment in raw.split(|c: char| !c.is_alphanumeric()).filter(|s| !s.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// English-ish singular of a PascalCase name. Unknown forms pass through.
pub fn singularize(word: &str) -> String {
    const IRREGULAR: &[(&str, &str)] = &[("people", "person"), ("children", "child")];

    let lower = word.to_ascii_lowercase();
    for (plural, singular) in IRREGULAR {
        if lower.ends_with(plural) {
            let stem = &word[..word.len() - plural.len()];
            let tail = &word[word.len() - plural.len()..];
            let mut replacement = singular.to_string();
            if tail.starts_with(|c: char| c.is_uppercase()) {
                replacement = pascal_case(&replacement);
            }
            return format!("{stem}{replacement}");
        }
    }

    let strip = |n: usize, add: &str| format!("{}{add}", &word[..word.len() - n]);
    if lower.len() > 3 && lower.ends_with("ies") {
        strip(3, "y")
    } else if ["sses", "shes", "ches", "xes", "zes"].iter().any(|s| lower.ends_with(s)) {
        strip(2, "")
    } else if ["ss", "us", "is"].iter().any(|s| lower.ends_with(s)) {
        word.to_string()
    } else if lower.len() > 1 && lower.ends_with('s') {
        strip(1, "")
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::obj::{Field, Shape};
    use crate::inference::unify::Scalar;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("id", "Id")]
    #[test_case("first_name", "FirstName")]
    #[test_case("first-name", "FirstName")]
    #[test_case("firstName", "FirstName")]
    #[test_case("2fa settings", "_2faSettings")]
    #[test_case("$$", "")]
    fn pascal(raw: &str, expected: &str) {
        assert_eq!(pascal_case(raw), expected);
    }

    #[test_case("Items", "Item")]
    #[test_case("Categories", "Category")]
    #[test_case("Addresses", "Address")]
    #[test_case("Boxes", "Box")]
    #[test_case("Matches", "Match")]
    #[test_case("Status", "Status")]
    #[test_case("Data", "Data")]
    #[test_case("People", "Person")]
    #[test_case("ChildPeople", "ChildPerson")]
    #[test_case("S", "S")]
    fn singular(word: &str, expected: &str) {
        assert_eq!(singularize(word), expected);
    }

    fn shape(fields: Vec<(&str, Ty<Shape>)>) -> Ty<Shape> {
        let mut s = Shape::observed();
        for (name, ty) in fields {
            s.fields.insert(name.to_string(), Field::observed(ty, None));
        }
        Ty::object(s)
    }

    fn names_for(root: Ty<Shape>) -> Vec<String> {
        let mut registry = Registry::default();
        let root = registry.intern_root(root);
        let mut names = assign_names(&registry, &root, "Root");
        names.sort();
        names
    }

    #[test]
    fn names_follow_fields_and_singularize_elements() {
        let int = Ty::scalar(Scalar::Integer);
        let root = shape(vec![
            ("owner", shape(vec![("id", int.clone())])),
            ("line_items", Ty::array(shape(vec![("sku", Ty::scalar(Scalar::String))]))),
        ]);
        assert_eq!(names_for(root), vec!["LineItem", "Owner", "Root"]);
    }

    #[test]
    fn collisions_get_numeric_suffixes_in_discovery_order() {
        let int = Ty::scalar(Scalar::Integer);
        let text = Ty::scalar(Scalar::String);
        let root = shape(vec![
            ("item", shape(vec![("a", int.clone())])),
            ("items", Ty::array(shape(vec![("b", int.clone())]))),
            ("nested", shape(vec![("item", shape(vec![("c", text)]))])),
        ]);
        let mut registry = Registry::default();
        let root = registry.intern_root(root);
        let names = assign_names(&registry, &root, "Root");

        let name_of = |field: &str, class: &crate::inference::intern::ClassEntry| match &class.fields[field].ty {
            Ty::Object { obj, .. } => names[obj.0].clone(),
            Ty::Array { item, .. } => match &**item {
                Ty::Object { obj, .. } => names[obj.0].clone(),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        };
        let Ty::Object { obj: root_id, .. } = root else { panic!("root is an object") };
        let root_class = registry.class(root_id);
        assert_eq!(name_of("item", root_class), "Item");
        assert_eq!(name_of("items", root_class), "Item2");
        assert_eq!(name_of("nested", root_class), "Nested");

        let Ty::Object { obj: nested, .. } = &root_class.fields["nested"].ty else { panic!() };
        assert_eq!(name_of("item", registry.class(*nested)), "Item3");
    }

    #[test]
    fn a_field_named_like_the_root_is_disambiguated() {
        let root = shape(vec![("root", shape(vec![("x", Ty::scalar(Scalar::Boolean))]))]);
        assert_eq!(names_for(root), vec!["Root", "Root2"]);
    }

    #[test]
    fn reserved_type_names_are_never_taken() {
        let root = shape(vec![
            ("string", shape(vec![("a", Ty::scalar(Scalar::Integer))])),
            ("date", shape(vec![("y", Ty::scalar(Scalar::Integer))])),
            ("name", Ty::scalar(Scalar::String)),
        ]);
        assert_eq!(names_for(root), vec!["Date2", "Root", "String2"]);
    }
}
