//! Runtime view of the values handed to the engine.
//!
//! Records describe their own fields through [`Record`], normally generated by
//! `#[derive(Record)]`. Everything else is reduced to a [`Kind`] so the engine
//! can tell text apart from the rest without knowing the concrete type.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Runtime kind of an inspected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Char,
    Text,
    Sequence,
    Map,
    Option,
    Unit,
    Struct,
    /// Reference or smart pointer to a record.
    Pointer,
    /// Not inspected, or a type that exposes no kind.
    Opaque,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Char => "char",
            Kind::Text => "text",
            Kind::Sequence => "sequence",
            Kind::Map => "map",
            Kind::Option => "option",
            Kind::Unit => "unit",
            Kind::Struct => "struct",
            Kind::Pointer => "pointer",
            Kind::Opaque => "opaque",
        };
        f.write_str(s)
    }
}

/// Borrowed, kind-tagged view of a value.
#[derive(Clone, Copy)]
pub enum Value<'a> {
    Text(&'a str),
    Record(&'a dyn Record),
    Other(Kind),
}

impl<'a> Value<'a> {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Text(_) => Kind::Text,
            Value::Record(_) => Kind::Struct,
            Value::Other(kind) => *kind,
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Value::Text(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Record(r) => f.debug_tuple("Record").field(&r.type_name()).finish(),
            Value::Other(kind) => f.debug_tuple("Other").field(kind).finish(),
        }
    }
}

/// Anything the engine can look at.
///
/// `Option` has an inherent `inspect` method that shadows this one, so call
/// it as `Inspect::inspect(&opt)` on optional values.
pub trait Inspect {
    fn inspect(&self) -> Value<'_>;
}

/// A struct-shaped value with named fields in declaration order.
pub trait Record: Inspect {
    fn type_name(&self) -> &'static str;
    fn fields(&self) -> Vec<Field<'_>>;
}

/// Static `key = "value"` metadata attached to a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags(&'static [(&'static str, &'static str)]);

impl Tags {
    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self(pairs)
    }

    /// Value stored under `key`, or `""` when the key is absent. The first
    /// occurrence wins when a key is repeated.
    pub fn get(&self, key: &str) -> &'static str {
        self.lookup(key).unwrap_or("")
    }

    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One field of a [`Record`].
#[derive(Debug, Clone)]
pub struct Field<'a> {
    pub name: &'static str,
    /// Declared `pub`, i.e. readable outside the defining module.
    pub exported: bool,
    pub tags: Tags,
    /// `None` for unexported fields.
    pub value: Option<Value<'a>>,
}

impl Inspect for str {
    fn inspect(&self) -> Value<'_> {
        Value::Text(self)
    }
}

impl Inspect for String {
    fn inspect(&self) -> Value<'_> {
        Value::Text(self.as_str())
    }
}

impl Inspect for Cow<'_, str> {
    fn inspect(&self) -> Value<'_> {
        Value::Text(self.as_ref())
    }
}

macro_rules! impl_kind {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Inspect for $ty {
                fn inspect(&self) -> Value<'_> {
                    Value::Other($kind)
                }
            }
        )+
    };
}

impl_kind!(Kind::Bool => bool);
impl_kind!(Kind::Int => i8, i16, i32, i64, i128, isize);
impl_kind!(Kind::Uint => u8, u16, u32, u64, u128, usize);
impl_kind!(Kind::Float => f32, f64);
impl_kind!(Kind::Char => char);
impl_kind!(Kind::Unit => ());

impl<T> Inspect for Option<T> {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Option)
    }
}

impl<T> Inspect for [T] {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Sequence)
    }
}

impl<T, const N: usize> Inspect for [T; N] {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Sequence)
    }
}

impl<T> Inspect for Vec<T> {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Sequence)
    }
}

impl<T> Inspect for VecDeque<T> {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Sequence)
    }
}

impl<T, S> Inspect for HashSet<T, S> {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Sequence)
    }
}

impl<T> Inspect for BTreeSet<T> {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Sequence)
    }
}

impl<K, V, S> Inspect for HashMap<K, V, S> {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Map)
    }
}

impl<K, V> Inspect for BTreeMap<K, V> {
    fn inspect(&self) -> Value<'_> {
        Value::Other(Kind::Map)
    }
}

// References and owning pointers are looked through for scalars and text.
// A pointer to a record is not itself a record.
fn pointee(value: Value<'_>) -> Value<'_> {
    match value {
        Value::Record(_) => Value::Other(Kind::Pointer),
        other => other,
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn inspect(&self) -> Value<'_> {
        pointee((**self).inspect())
    }
}

impl<T: Inspect + ?Sized> Inspect for &mut T {
    fn inspect(&self) -> Value<'_> {
        pointee((**self).inspect())
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn inspect(&self) -> Value<'_> {
        pointee((**self).inspect())
    }
}

impl<T: Inspect + ?Sized> Inspect for Rc<T> {
    fn inspect(&self) -> Value<'_> {
        pointee((**self).inspect())
    }
}

impl<T: Inspect + ?Sized> Inspect for Arc<T> {
    fn inspect(&self) -> Value<'_> {
        pointee((**self).inspect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_types_inspect_as_text() {
        assert_eq!("ab".inspect().as_text(), Some("ab"));
        assert_eq!(String::from("abc").inspect().as_text(), Some("abc"));
        assert_eq!(Cow::Borrowed("x").inspect().kind(), Kind::Text);
        let boxed: Box<str> = "boxed".into();
        assert_eq!(boxed.inspect().as_text(), Some("boxed"));
        let shared: Arc<str> = "shared".into();
        assert_eq!(shared.inspect().as_text(), Some("shared"));
        assert_eq!((&&String::from("deep")).inspect().as_text(), Some("deep"));
    }

    #[test]
    fn non_text_kinds() {
        assert_eq!(42i32.inspect().kind(), Kind::Int);
        assert_eq!(7u8.inspect().kind(), Kind::Uint);
        assert_eq!(1.5f64.inspect().kind(), Kind::Float);
        assert_eq!(true.inspect().kind(), Kind::Bool);
        assert_eq!('c'.inspect().kind(), Kind::Char);
        assert_eq!(().inspect().kind(), Kind::Unit);
        assert_eq!(
            Inspect::inspect(&Some("x".to_string())).kind(),
            Kind::Option
        );
        assert_eq!(vec![1, 2].inspect().kind(), Kind::Sequence);
        assert_eq!([1u8; 4].inspect().kind(), Kind::Sequence);
        assert_eq!(HashMap::<String, i32>::new().inspect().kind(), Kind::Map);
        assert!(Value::Other(Kind::Opaque).as_text().is_none());
    }

    #[test]
    fn pointers_to_records_are_not_records() {
        struct Empty;
        impl Inspect for Empty {
            fn inspect(&self) -> Value<'_> {
                Value::Record(self)
            }
        }
        impl Record for Empty {
            fn type_name(&self) -> &'static str {
                "Empty"
            }
            fn fields(&self) -> Vec<Field<'_>> {
                Vec::new()
            }
        }

        assert_eq!(Inspect::inspect(&Empty).kind(), Kind::Struct);
        assert_eq!(Inspect::inspect(&&Empty).kind(), Kind::Pointer);
        assert_eq!(Inspect::inspect(&Box::new(Empty)).kind(), Kind::Pointer);
        assert_eq!(Inspect::inspect(&Rc::new(Empty)).kind(), Kind::Pointer);
        assert_eq!(Inspect::inspect(&Arc::new(Empty)).kind(), Kind::Pointer);
    }

    #[test]
    fn tags_first_occurrence_wins() {
        let tags = Tags::new(&[("validate", "len:3"), ("json", "name"), ("validate", "len:9")]);
        assert_eq!(tags.get("validate"), "len:3");
        assert_eq!(tags.get("json"), "name");
        assert_eq!(tags.get("missing"), "");
        assert_eq!(tags.lookup("missing"), None);
        assert_eq!(tags.iter().count(), 3);
        assert!(Tags::default().is_empty());
    }
}
