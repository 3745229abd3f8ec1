//! Canonical cache keys.
//!
//! A [`Key`] is the immutable, hashable, order-sensitive representation of one
//! call's arguments. It is built once per invocation by a [`KeyBuilder`] (or
//! the [`make_key`] convenience) from:
//!
//! - the positional-argument sequence, in call order;
//! - if named arguments are present, a marker component followed by each
//!   name/value pair in call order;
//! - in type-sensitive mode, the runtime type of every positional and named
//!   value, appended afterwards.
//!
//! Two calls produce equal keys iff their argument sequences (and, in
//! type-sensitive mode, their argument types) are equal in value and order.
//! Named-argument order is significant and deliberately not normalized:
//! `f(x = 1, y = 2)` and `f(y = 2, x = 1)` are cached separately. This is a
//! documented limitation inherited from the flat-key construction, not a bug.
//!
//! When type-sensitive mode is off, no named arguments are present, and the
//! single positional argument is an integer or text value, the key *is* that
//! value directly ([`Key::Direct`]) — no wrapping allocation, no second hash.
//! Every other shape is flattened into a [`HashedSeq`], whose hash is computed
//! exactly once at construction and cached for reuse.

use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::Error;

/// Canonical value of a single call argument.
///
/// Arguments are reduced to this small value model so that keys can be
/// compared and hashed without knowing the original Rust types. Integer
/// widths collapse to one integer form (`3u32` and `3i64` are the same value;
/// enable type-sensitive mode to keep them apart). Floats are carried by bit
/// pattern, and a `NaN` float is rejected during key construction: a key that
/// is never equal to itself would leave ring entries unreachable from the
/// lookup index, which is exactly the corruption an unhashable argument must
/// not cause.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ArgValue {
    /// The unit value `()`.
    Unit,
    /// An absent optional argument (`Option::None`).
    Nil,
    Bool(bool),
    /// Any signed value, and any unsigned value that fits `i64`.
    Int(i64),
    /// Unsigned values above `i64::MAX`.
    Uint(u64),
    /// Carried by bit pattern; `NaN` is unhashable.
    Float(f64),
    Char(char),
    Text(String),
    /// A compound argument (slice, `Vec`, tuple), flattened element-wise.
    Seq(Vec<ArgValue>),
}

impl ArgValue {
    /// Values whose equality and hash are cheap and stable enough to serve as
    /// an unwrapped [`Key::Direct`]: integers and text.
    fn is_fast(&self) -> bool {
        matches!(
            self,
            ArgValue::Int(_) | ArgValue::Uint(_) | ArgValue::Text(_)
        )
    }

    fn ensure_hashable(&self) -> Result<(), &'static str> {
        match self {
            ArgValue::Float(f) if f.is_nan() => {
                Err("NaN is never equal to itself and cannot identify a cache entry")
            }
            ArgValue::Seq(items) => items.iter().try_for_each(ArgValue::ensure_hashable),
            _ => Ok(()),
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Unit, ArgValue::Unit) | (ArgValue::Nil, ArgValue::Nil) => true,
            (ArgValue::Bool(a), ArgValue::Bool(b)) => a == b,
            (ArgValue::Int(a), ArgValue::Int(b)) => a == b,
            (ArgValue::Uint(a), ArgValue::Uint(b)) => a == b,
            (ArgValue::Float(a), ArgValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ArgValue::Char(a), ArgValue::Char(b)) => a == b,
            (ArgValue::Text(a), ArgValue::Text(b)) => a == b,
            (ArgValue::Seq(a), ArgValue::Seq(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ArgValue {}

impl Hash for ArgValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ArgValue::Unit | ArgValue::Nil => {}
            ArgValue::Bool(v) => v.hash(state),
            ArgValue::Int(v) => v.hash(state),
            ArgValue::Uint(v) => v.hash(state),
            ArgValue::Float(v) => v.to_bits().hash(state),
            ArgValue::Char(v) => v.hash(state),
            ArgValue::Text(v) => v.hash(state),
            ArgValue::Seq(v) => v.hash(state),
        }
    }
}

/// One call argument: its canonical value plus the [`TypeId`] of the Rust
/// type it came from. The type id participates in the key only when the cache
/// was configured with type-sensitive mode.
#[derive(Clone, Debug)]
pub struct Arg {
    value: ArgValue,
    type_id: TypeId,
}

impl Arg {
    /// Builds an argument whose runtime type is `T`.
    pub fn of<T: 'static + ?Sized>(value: ArgValue) -> Self {
        Self {
            value,
            type_id: TypeId::of::<T>(),
        }
    }

    pub fn value(&self) -> &ArgValue {
        &self.value
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// Conversion of a Rust value into a canonical call [`Arg`].
///
/// Implemented for the primitive types, text, options, and homogeneous
/// containers. All text forms report the runtime type `str`, so `String` and
/// `&str` arguments agree under type-sensitive mode; integer and float widths
/// keep their own types and are only collapsed by value when type-sensitive
/// mode is off.
pub trait KeyArg {
    fn key_arg(&self) -> Arg;
}

impl<T: KeyArg + ?Sized> KeyArg for &T {
    fn key_arg(&self) -> Arg {
        (**self).key_arg()
    }
}

impl KeyArg for () {
    fn key_arg(&self) -> Arg {
        Arg::of::<()>(ArgValue::Unit)
    }
}

impl KeyArg for bool {
    fn key_arg(&self) -> Arg {
        Arg::of::<bool>(ArgValue::Bool(*self))
    }
}

impl KeyArg for char {
    fn key_arg(&self) -> Arg {
        Arg::of::<char>(ArgValue::Char(*self))
    }
}

macro_rules! signed_key_arg {
    ($($ty:ty),*) => {
        $(impl KeyArg for $ty {
            fn key_arg(&self) -> Arg {
                Arg::of::<$ty>(ArgValue::Int(*self as i64))
            }
        })*
    };
}

macro_rules! small_unsigned_key_arg {
    ($($ty:ty),*) => {
        $(impl KeyArg for $ty {
            fn key_arg(&self) -> Arg {
                Arg::of::<$ty>(ArgValue::Int(*self as i64))
            }
        })*
    };
}

// u64/usize may exceed i64; everything that fits stays in the one integer
// form so that equal values compare equal across widths.
macro_rules! wide_unsigned_key_arg {
    ($($ty:ty),*) => {
        $(impl KeyArg for $ty {
            fn key_arg(&self) -> Arg {
                let wide = *self as u64;
                let value = match i64::try_from(wide) {
                    Ok(v) => ArgValue::Int(v),
                    Err(_) => ArgValue::Uint(wide),
                };
                Arg::of::<$ty>(value)
            }
        })*
    };
}

signed_key_arg!(i8, i16, i32, i64, isize);
small_unsigned_key_arg!(u8, u16, u32);
wide_unsigned_key_arg!(u64, usize);

impl KeyArg for f32 {
    fn key_arg(&self) -> Arg {
        Arg::of::<f32>(ArgValue::Float(f64::from(*self)))
    }
}

impl KeyArg for f64 {
    fn key_arg(&self) -> Arg {
        Arg::of::<f64>(ArgValue::Float(*self))
    }
}

impl KeyArg for str {
    fn key_arg(&self) -> Arg {
        Arg::of::<str>(ArgValue::Text(self.to_owned()))
    }
}

impl KeyArg for String {
    fn key_arg(&self) -> Arg {
        Arg::of::<str>(ArgValue::Text(self.clone()))
    }
}

impl<T: KeyArg> KeyArg for Option<T> {
    fn key_arg(&self) -> Arg {
        match self {
            Some(value) => value.key_arg(),
            None => Arg::of::<()>(ArgValue::Nil),
        }
    }
}

impl<T: KeyArg + 'static> KeyArg for [T] {
    fn key_arg(&self) -> Arg {
        let items = self.iter().map(|v| v.key_arg().value).collect();
        Arg::of::<[T]>(ArgValue::Seq(items))
    }
}

impl<T: KeyArg + 'static> KeyArg for Vec<T> {
    fn key_arg(&self) -> Arg {
        let items = self.iter().map(|v| v.key_arg().value).collect();
        Arg::of::<Vec<T>>(ArgValue::Seq(items))
    }
}

impl<A: KeyArg + 'static, B: KeyArg + 'static> KeyArg for (A, B) {
    fn key_arg(&self) -> Arg {
        Arg::of::<(A, B)>(ArgValue::Seq(vec![
            self.0.key_arg().value,
            self.1.key_arg().value,
        ]))
    }
}

impl<A: KeyArg + 'static, B: KeyArg + 'static, C: KeyArg + 'static> KeyArg for (A, B, C) {
    fn key_arg(&self) -> Arg {
        Arg::of::<(A, B, C)>(ArgValue::Seq(vec![
            self.0.key_arg().value,
            self.1.key_arg().value,
            self.2.key_arg().value,
        ]))
    }
}

/// One flattened component of a composite key.
///
/// `NamedMark` is a dedicated variant rather than a sentinel value, so a
/// positional argument can never collide with the start of the named section.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum KeyComponent {
    Value(ArgValue),
    Type(TypeId),
    NamedMark,
}

/// Flat component sequence whose hash is computed exactly once.
///
/// The hash is captured at construction and replayed on every subsequent
/// [`Hash`] call, so a miss (which looks the key up once before the
/// computation and once after) never re-hashes the argument data.
#[derive(Clone, Debug)]
pub struct HashedSeq {
    parts: Box<[KeyComponent]>,
    hash: u64,
}

impl HashedSeq {
    fn new(parts: Vec<KeyComponent>) -> Self {
        let mut hasher = DefaultHasher::new();
        parts.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            parts: parts.into_boxed_slice(),
        }
    }

    /// The cached hash value.
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Number of flattened components (arguments, marks, and type tags).
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartialEq for HashedSeq {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.parts == other.parts
    }
}

impl Eq for HashedSeq {}

impl Hash for HashedSeq {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Canonical cache key for one invocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Single fast-type positional argument, stored unwrapped.
    Direct(ArgValue),
    /// General form: the flattened, pre-hashed component sequence.
    Seq(HashedSeq),
}

/// Accumulates one call's arguments and produces its [`Key`].
///
/// Construction is deterministic, pure, and non-suspending; the only work
/// beyond collecting values is the single hash computation captured inside
/// the returned key. Build the key once per invocation and reuse it for both
/// the pre-computation lookup and the post-computation re-check.
///
/// # Examples
///
/// ```
/// use recall_core::KeyBuilder;
///
/// let mut builder = KeyBuilder::new(false);
/// builder.positional(&42).named("base", &10);
/// let key = builder.finish().unwrap();
///
/// let mut again = KeyBuilder::new(false);
/// again.positional(&42).named("base", &10);
/// assert_eq!(key, again.finish().unwrap());
/// ```
#[derive(Debug)]
pub struct KeyBuilder {
    typed: bool,
    positional: Vec<Arg>,
    named: Vec<(String, Arg)>,
}

impl KeyBuilder {
    /// Starts a key. `typed` appends the runtime type of every argument, so
    /// calls differing only in argument type are cached separately.
    pub fn new(typed: bool) -> Self {
        Self {
            typed,
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    /// Appends the next positional argument.
    pub fn positional<T: KeyArg + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.positional.push(value.key_arg());
        self
    }

    /// Appends a named argument. Order of named arguments is part of the key.
    pub fn named<T: KeyArg + ?Sized>(&mut self, name: &str, value: &T) -> &mut Self {
        self.named.push((name.to_owned(), value.key_arg()));
        self
    }

    /// Canonicalizes the collected arguments into a [`Key`].
    ///
    /// Zero arguments is a valid key (the empty sequence). Fails with
    /// [`Error::UnhashableArgument`] if any value cannot identify a cache
    /// entry; the cache is left untouched in that case.
    pub fn finish(mut self) -> Result<Key, Error> {
        for (i, arg) in self.positional.iter().enumerate() {
            arg.value.ensure_hashable().map_err(|reason| Error::UnhashableArgument {
                argument: format!("positional {i}"),
                reason,
            })?;
        }
        for (name, arg) in &self.named {
            arg.value.ensure_hashable().map_err(|reason| Error::UnhashableArgument {
                argument: format!("named '{name}'"),
                reason,
            })?;
        }

        if !self.typed && self.named.is_empty() && self.positional.len() == 1 {
            if self.positional[0].value.is_fast() {
                if let Some(arg) = self.positional.pop() {
                    return Ok(Key::Direct(arg.value));
                }
            }
        }

        let type_tail: Vec<TypeId> = if self.typed {
            self.positional
                .iter()
                .map(Arg::type_id)
                .chain(self.named.iter().map(|(_, arg)| arg.type_id))
                .collect()
        } else {
            Vec::new()
        };

        let mut parts =
            Vec::with_capacity(self.positional.len() + 1 + 2 * self.named.len() + type_tail.len());
        for arg in self.positional {
            parts.push(KeyComponent::Value(arg.value));
        }
        if !self.named.is_empty() {
            parts.push(KeyComponent::NamedMark);
            for (name, arg) in self.named {
                parts.push(KeyComponent::Value(ArgValue::Text(name)));
                parts.push(KeyComponent::Value(arg.value));
            }
        }
        for type_id in type_tail {
            parts.push(KeyComponent::Type(type_id));
        }

        Ok(Key::Seq(HashedSeq::new(parts)))
    }
}

/// Builds a key the way a call site would: positional arguments first, then
/// named pairs in call order.
///
/// # Examples
///
/// ```
/// use recall_core::make_key;
///
/// let a = make_key(&[&1, &2], &[], false).unwrap();
/// let b = make_key(&[&1, &2], &[], false).unwrap();
/// let c = make_key(&[&2, &1], &[], false).unwrap();
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
pub fn make_key(
    positional: &[&dyn KeyArg],
    named: &[(&str, &dyn KeyArg)],
    typed: bool,
) -> Result<Key, Error> {
    let mut builder = KeyBuilder::new(typed);
    for value in positional {
        builder.positional(value);
    }
    for (name, value) in named {
        builder.named(name, value);
    }
    builder.finish()
}
