//! The type lattice and its join.
//!
//! `Ty<O>` is generic over how objects are represented: an inline [`Shape`]
//! while samples are being walked, a [`ClassId`] once shapes are interned.
//! Both phases share one join, so positional merging and structural
//! deduplication agree on what "compatible" means.
//!
//! Lattice, bottom to top:
//! - `Unknown` is the identity (nothing observed yet, e.g. an empty array's
//!   element slot).
//! - `Null` joins any concrete kind by setting that kind's `nullable` flag.
//! - scalars widen along `Integer < Long < Float`; any other pair of
//!   distinct scalar kinds conflicts.
//! - containers and objects join component-wise.
//! - `Anything` absorbs everything; it is what incompatible kinds become.
//!   It still remembers whether a null was seen on the way.
//!
//! [`Shape`]: super::obj::Shape
//! [`ClassId`]: crate::ir::ClassId

use std::fmt::Debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    Boolean,
    Integer,
    Long,
    Float,
    Date,
    String,
}

impl Scalar {
    fn is_numeric(self) -> bool {
        matches!(self, Scalar::Integer | Scalar::Long | Scalar::Float)
    }

    /// Least upper bound within a chain; `None` across chains.
    pub fn join(self, other: Self) -> Option<Self> {
        if self == other {
            return Some(self);
        }
        // derive(Ord) follows declaration order, which is the widening order
        if self.is_numeric() && other.is_numeric() {
            return Some(self.max(other));
        }
        None
    }
}

/// How an object representation merges and compares.
pub trait ObjectRepr: Clone + Debug {
    /// Merge two objects observed at the same position, or `None` if they
    /// cannot share one definition.
    fn merge(self, other: Self) -> Option<Self>;
    fn compatible(&self, other: &Self) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Ty<O> {
    Unknown,
    Null,
    Anything { nullable: bool },
    Scalar { kind: Scalar, nullable: bool },
    Array { item: Box<Ty<O>>, nullable: bool },
    Dictionary { value: Box<Ty<O>>, nullable: bool },
    Object { obj: O, nullable: bool },
}

impl<O> Default for Ty<O> {
    fn default() -> Self {
        Ty::Unknown
    }
}

impl<O> Ty<O> {
    pub fn anything() -> Self {
        Ty::Anything { nullable: false }
    }

    pub fn scalar(kind: Scalar) -> Self {
        Ty::Scalar { kind, nullable: false }
    }

    pub fn array(item: Ty<O>) -> Self {
        Ty::Array { item: Box::new(item), nullable: false }
    }

    pub fn dictionary(value: Ty<O>) -> Self {
        Ty::Dictionary { value: Box::new(value), nullable: false }
    }

    pub fn object(obj: O) -> Self {
        Ty::Object { obj, nullable: false }
    }

    pub fn is_anything(&self) -> bool {
        matches!(self, Ty::Anything { .. })
    }

    /// Whether a null was observed (or implied) at this position.
    pub fn is_nullable(&self) -> bool {
        match self {
            Ty::Null => true,
            Ty::Unknown => false,
            Ty::Anything { nullable }
            | Ty::Scalar { nullable, .. }
            | Ty::Array { nullable, .. }
            | Ty::Dictionary { nullable, .. }
            | Ty::Object { nullable, .. } => *nullable,
        }
    }

    /// Join with an observed null.
    pub fn into_nullable(self) -> Self {
        match self {
            Ty::Unknown | Ty::Null => Ty::Null,
            Ty::Anything { .. } => Ty::Anything { nullable: true },
            Ty::Scalar { kind, .. } => Ty::Scalar { kind, nullable: true },
            Ty::Array { item, .. } => Ty::Array { item, nullable: true },
            Ty::Dictionary { value, .. } => Ty::Dictionary { value, nullable: true },
            Ty::Object { obj, .. } => Ty::Object { obj, nullable: true },
        }
    }

    /// Rebuild with a different object representation. Used when shapes
    /// are interned into classes.
    pub fn map_objects<P>(self, f: &mut impl FnMut(O) -> P) -> Ty<P> {
        match self {
            Ty::Unknown => Ty::Unknown,
            Ty::Null => Ty::Null,
            Ty::Anything { nullable } => Ty::Anything { nullable },
            Ty::Scalar { kind, nullable } => Ty::Scalar { kind, nullable },
            Ty::Array { item, nullable } => Ty::Array { item: Box::new(item.map_objects(f)), nullable },
            Ty::Dictionary { value, nullable } => {
                Ty::Dictionary { value: Box::new(value.map_objects(f)), nullable }
            }
            Ty::Object { obj, nullable } => Ty::Object { obj: f(obj), nullable },
        }
    }
}

/// Unify two observations of the same position.
pub fn join<O: ObjectRepr>(a: Ty<O>, b: Ty<O>) -> Ty<O> {
    let conflict = Ty::Anything { nullable: a.is_nullable() || b.is_nullable() };
    match (a, b) {
        (Ty::Unknown, x) | (x, Ty::Unknown) => x,
        (Ty::Anything { .. }, _) | (_, Ty::Anything { .. }) => conflict,
        (Ty::Null, x) | (x, Ty::Null) => x.into_nullable(),
        (Ty::Scalar { kind: ka, nullable: na }, Ty::Scalar { kind: kb, nullable: nb }) => {
            match ka.join(kb) {
                Some(kind) => Ty::Scalar { kind, nullable: na || nb },
                None => conflict,
            }
        }
        (Ty::Array { item: ia, nullable: na }, Ty::Array { item: ib, nullable: nb }) => Ty::Array {
            item: Box::new(join(*ia, *ib)),
            nullable: na || nb,
        },
        (Ty::Dictionary { value: va, nullable: na }, Ty::Dictionary { value: vb, nullable: nb }) => {
            Ty::Dictionary { value: Box::new(join(*va, *vb)), nullable: na || nb }
        }
        (Ty::Object { obj: oa, nullable: na }, Ty::Object { obj: ob, nullable: nb }) => match oa.merge(ob) {
            Some(obj) => Ty::Object { obj, nullable: na || nb },
            None => conflict,
        },
        _ => conflict,
    }
}

/// True when joining would not newly produce `Anything`. Two positions that
/// are both already `Anything` stay compatible.
pub fn is_compatible<O: ObjectRepr>(a: &Ty<O>, b: &Ty<O>) -> bool {
    match (a, b) {
        (Ty::Unknown, _) | (_, Ty::Unknown) => true,
        (Ty::Anything { .. }, Ty::Anything { .. }) => true,
        (Ty::Anything { .. }, _) | (_, Ty::Anything { .. }) => false,
        (Ty::Null, _) | (_, Ty::Null) => true,
        (Ty::Scalar { kind: ka, .. }, Ty::Scalar { kind: kb, .. }) => ka.join(*kb).is_some(),
        (Ty::Array { item: ia, .. }, Ty::Array { item: ib, .. }) => is_compatible(ia, ib),
        (Ty::Dictionary { value: va, .. }, Ty::Dictionary { value: vb, .. }) => is_compatible(va, vb),
        (Ty::Object { obj: oa, .. }, Ty::Object { obj: ob, .. }) => oa.compatible(ob),
        _ => false,
    }
}
