// The frozen type model handed to code writers. No serde_json::Value here
// except the retained example literals.
use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Anything,
    String,
    Boolean,
    Integer,
    Long,
    Float,
    Date,
    Object,
    Array,
    Dictionary,
    NullableInteger,
    NullableLong,
    NullableFloat,
    NullableBoolean,
    NullableDate,
    /// Only ever observed as null.
    NullableSomething,
    /// Never observed at all (e.g. the element of an always-empty array).
    NonConstrained,
}

impl TypeKind {
    pub fn is_nullable(self) -> bool {
        matches!(
            self,
            TypeKind::NullableInteger
                | TypeKind::NullableLong
                | TypeKind::NullableFloat
                | TypeKind::NullableBoolean
                | TypeKind::NullableDate
                | TypeKind::NullableSomething
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeKind::Integer
                | TypeKind::Long
                | TypeKind::Float
                | TypeKind::NullableInteger
                | TypeKind::NullableLong
                | TypeKind::NullableFloat
        )
    }

    /// Nullable counterpart, for the kinds that have one.
    pub fn nullable(self) -> Option<TypeKind> {
        match self {
            TypeKind::Integer => Some(TypeKind::NullableInteger),
            TypeKind::Long => Some(TypeKind::NullableLong),
            TypeKind::Float => Some(TypeKind::NullableFloat),
            TypeKind::Boolean => Some(TypeKind::NullableBoolean),
            TypeKind::Date => Some(TypeKind::NullableDate),
            k if k.is_nullable() => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Index into [`TypeModel::classes`]. Ids follow emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ClassId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeNode {
    pub kind: TypeKind,
    /// Element type; present iff `kind` is `Array` or `Dictionary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<TypeNode>>,
    /// Class definition; present iff `kind` is `Object`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassId>,
    /// A null was observed at this position, or the key was missing. Set
    /// for every kind, including the ones with a `Nullable*` counterpart.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_root: bool,
}

impl TypeNode {
    pub fn leaf(kind: TypeKind) -> Self {
        debug_assert!(!matches!(kind, TypeKind::Array | TypeKind::Dictionary | TypeKind::Object));
        Self { kind, element: None, class: None, nullable: false, is_root: false }
    }

    pub fn array(element: TypeNode) -> Self {
        Self { kind: TypeKind::Array, element: Some(Box::new(element)), class: None, nullable: false, is_root: false }
    }

    pub fn dictionary(value: TypeNode) -> Self {
        Self { kind: TypeKind::Dictionary, element: Some(Box::new(value)), class: None, nullable: false, is_root: false }
    }

    pub fn object(class: ClassId) -> Self {
        Self { kind: TypeKind::Object, element: None, class: Some(class), nullable: false, is_root: false }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn element(&self) -> Option<&TypeNode> {
        self.element.as_deref()
    }

    /// Class reached directly or through array/dictionary elements.
    pub fn innermost_class(&self) -> Option<ClassId> {
        match self.kind {
            TypeKind::Object => self.class,
            TypeKind::Array | TypeKind::Dictionary => self.element().and_then(TypeNode::innermost_class),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    /// JSON key as first observed.
    pub source_name: String,
    #[serde(rename = "type")]
    pub ty: TypeNode,
    /// Null was observed, or the key was missing from some objects.
    pub nullable: bool,
    /// Objects of this class that carried the key.
    pub present_in: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDef {
    pub id: ClassId,
    /// Assigned, collision-free name.
    pub name: String,
    pub fields: Vec<FieldInfo>,
    pub is_root: bool,
    /// Object occurrences merged into this class.
    pub samples: u64,
}

impl ClassDef {
    pub fn field(&self, source_name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.source_name == source_name)
    }
}

/// Result of one inference run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeModel {
    root: TypeNode,
    classes: Vec<ClassDef>,
}

impl TypeModel {
    pub(crate) fn new(root: TypeNode, classes: Vec<ClassDef>) -> Self {
        debug_assert!(classes.iter().enumerate().all(|(i, c)| c.id == ClassId(i)));
        Self { root, classes }
    }

    pub fn root(&self) -> &TypeNode {
        &self.root
    }

    /// Every class reachable from the root, dependencies before dependents
    /// (cycles excepted).
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0]
    }

    pub fn class_by_name(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn root_class(&self) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.is_root)
    }

    pub fn assigned_name(&self, node: &TypeNode) -> Option<&str> {
        node.class.map(|id| self.class(id).name.as_str())
    }
}
