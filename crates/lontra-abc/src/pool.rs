//! Constant pool model and lazy reference resolution
//!
//! The pool is populated up front (by the container parser, which is not
//! part of this crate) and is read-only for the whole decode/analysis
//! session. Instruction bodies hold [`PoolRef`]s (a pool kind plus an
//! index) and never touch the pool while decoding; bounds are checked
//! when a reference is actually resolved.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AbcError, Result};

/// The typed pools a reference can point into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    /// Signed integer pool
    Int,
    /// Unsigned integer pool
    Uint,
    /// Floating point pool
    Double,
    /// String pool
    String,
    /// Namespace pool
    Namespace,
    /// Namespace set pool
    NamespaceSet,
    /// Multiname pool
    Multiname,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Double => "double",
            Self::String => "string",
            Self::Namespace => "namespace",
            Self::NamespaceSet => "namespace_set",
            Self::Multiname => "multiname",
        };
        f.write_str(name)
    }
}

/// An unresolved reference into the constant pool
///
/// Created while decoding an instruction body; resolved lazily via
/// [`ConstantPool::resolve`] or the typed getters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolRef {
    /// Which pool the index points into
    pub kind: PoolKind,
    /// Index into that pool
    pub index: u32,
}

impl PoolRef {
    /// Create a new pool reference
    #[inline]
    pub const fn new(kind: PoolKind, index: u32) -> Self {
        Self { kind, index }
    }
}

/// Namespace kinds of the format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamespaceKind {
    /// The wildcard (`*`) namespace, pool entry zero
    Any,
    /// Plain namespace
    Namespace,
    /// Package public namespace
    Package,
    /// Package internal namespace
    PackageInternal,
    /// Class protected namespace
    Protected,
    /// Explicit namespace
    Explicit,
    /// Static protected namespace
    StaticProtected,
    /// Class private namespace
    Private,
}

/// A namespace pool entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    /// Kind of namespace
    pub kind: NamespaceKind,
    /// Namespace name (a URI or dotted package path)
    pub name: Rc<str>,
}

impl Namespace {
    /// Create a new namespace
    pub fn new(kind: NamespaceKind, name: impl Into<Rc<str>>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// True for class private namespaces
    #[inline]
    pub fn is_private(&self) -> bool {
        self.kind == NamespaceKind::Private
    }
}

/// A namespace set pool entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSet {
    namespaces: Vec<Rc<Namespace>>,
}

impl NamespaceSet {
    /// Create a namespace set from its members
    pub fn new(namespaces: Vec<Rc<Namespace>>) -> Self {
        Self { namespaces }
    }

    /// Number of namespaces in the set
    #[inline]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// True when the set has no members
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Iterate over the member namespaces
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Namespace>> {
        self.namespaces.iter()
    }
}

/// A multiname pool entry: a possibly namespace-qualified name
///
/// Runtime-qualified kinds take their namespace and/or name from the
/// evaluation stack instead of the pool; [`Multiname::runtime_arity`]
/// reports how many stack slots that costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiname {
    /// Fully qualified name: one namespace, one name
    QName {
        /// Qualifying namespace
        ns: Rc<Namespace>,
        /// Local name
        name: Rc<str>,
        /// XML attribute form
        attribute: bool,
    },
    /// Runtime-qualified name: namespace from the stack, name from the pool
    RtqName {
        /// Local name
        name: Rc<str>,
        /// XML attribute form
        attribute: bool,
    },
    /// Runtime-qualified late name: namespace and name from the stack
    RtqNameL {
        /// XML attribute form
        attribute: bool,
    },
    /// Name qualified by a namespace set
    Multiname {
        /// Local name
        name: Rc<str>,
        /// Candidate namespaces
        ns_set: Rc<NamespaceSet>,
        /// XML attribute form
        attribute: bool,
    },
    /// Late name qualified by a namespace set: name from the stack
    MultinameL {
        /// Candidate namespaces
        ns_set: Rc<NamespaceSet>,
        /// XML attribute form
        attribute: bool,
    },
    /// Parameterized type name (`Base.<Param, …>`)
    TypeName {
        /// The parameterized base name
        base: Rc<Multiname>,
        /// Type parameters
        params: Vec<Rc<Multiname>>,
    },
}

impl Multiname {
    /// The pool-resident local name, if this kind has one
    pub fn name(&self) -> Option<&Rc<str>> {
        match self {
            Self::QName { name, .. } | Self::RtqName { name, .. } | Self::Multiname { name, .. } => {
                Some(name)
            }
            Self::RtqNameL { .. } | Self::MultinameL { .. } | Self::TypeName { .. } => None,
        }
    }

    /// Number of evaluation stack slots the runtime-qualified parts consume
    pub fn runtime_arity(&self) -> u32 {
        match self {
            Self::QName { .. } | Self::Multiname { .. } | Self::TypeName { .. } => 0,
            Self::RtqName { .. } | Self::MultinameL { .. } => 1,
            Self::RtqNameL { .. } => 2,
        }
    }

    /// True when any part of the name comes from the stack
    #[inline]
    pub fn is_runtime(&self) -> bool {
        self.runtime_arity() > 0
    }

    /// True for XML attribute forms
    pub fn is_attribute(&self) -> bool {
        match self {
            Self::QName { attribute, .. }
            | Self::RtqName { attribute, .. }
            | Self::RtqNameL { attribute }
            | Self::Multiname { attribute, .. }
            | Self::MultinameL { attribute, .. } => *attribute,
            Self::TypeName { base, .. } => base.is_attribute(),
        }
    }
}

/// A resolved constant pool entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoolEntry<'a> {
    /// Signed integer
    Int(i32),
    /// Unsigned integer
    Uint(u32),
    /// Floating point value
    Double(f64),
    /// String
    Str(&'a Rc<str>),
    /// Namespace
    Namespace(&'a Rc<Namespace>),
    /// Namespace set
    NamespaceSet(&'a Rc<NamespaceSet>),
    /// Multiname
    Multiname(&'a Rc<Multiname>),
}

/// The typed constant pools shared by every instruction of a decode session
///
/// Entry zero of each pool is the format's wildcard/empty sentinel and is
/// seeded at construction. `add_*` deduplicate where entries are cheaply
/// comparable, mirroring how the rest of the toolchain builds pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantPool {
    ints: Vec<i32>,
    uints: Vec<u32>,
    doubles: Vec<f64>,
    strings: Vec<Rc<str>>,
    namespaces: Vec<Rc<Namespace>>,
    ns_sets: Vec<Rc<NamespaceSet>>,
    multinames: Vec<Rc<Multiname>>,
    #[serde(skip)]
    string_index: FxHashMap<Rc<str>, u32>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// Create a pool holding only the wildcard entries
    pub fn new() -> Self {
        let empty: Rc<str> = Rc::from("");
        let any_ns = Rc::new(Namespace {
            kind: NamespaceKind::Any,
            name: Rc::clone(&empty),
        });
        let any_name = Rc::new(Multiname::QName {
            ns: Rc::clone(&any_ns),
            name: Rc::clone(&empty),
            attribute: false,
        });
        let mut string_index = FxHashMap::default();
        string_index.insert(Rc::clone(&empty), 0);
        Self {
            ints: vec![0],
            uints: vec![0],
            doubles: vec![f64::NAN],
            strings: vec![empty],
            namespaces: vec![any_ns],
            ns_sets: vec![Rc::new(NamespaceSet::default())],
            multinames: vec![any_name],
            string_index,
        }
    }

    /// Add a signed integer, returning its index
    pub fn add_int(&mut self, value: i32) -> u32 {
        if let Some(idx) = self.ints.iter().position(|&v| v == value) {
            return idx as u32;
        }
        self.ints.push(value);
        (self.ints.len() - 1) as u32
    }

    /// Add an unsigned integer, returning its index
    pub fn add_uint(&mut self, value: u32) -> u32 {
        if let Some(idx) = self.uints.iter().position(|&v| v == value) {
            return idx as u32;
        }
        self.uints.push(value);
        (self.uints.len() - 1) as u32
    }

    /// Add a double, returning its index
    pub fn add_double(&mut self, value: f64) -> u32 {
        self.doubles.push(value);
        (self.doubles.len() - 1) as u32
    }

    /// Add a string, returning its index
    pub fn add_string(&mut self, value: &str) -> u32 {
        if let Some(&idx) = self.string_index.get(value) {
            return idx;
        }
        let entry: Rc<str> = Rc::from(value);
        let idx = self.strings.len() as u32;
        self.strings.push(Rc::clone(&entry));
        self.string_index.insert(entry, idx);
        idx
    }

    /// Add a namespace, returning its index
    pub fn add_namespace(&mut self, ns: Namespace) -> u32 {
        if let Some(idx) = self.namespaces.iter().position(|n| **n == ns) {
            return idx as u32;
        }
        self.namespaces.push(Rc::new(ns));
        (self.namespaces.len() - 1) as u32
    }

    /// Add a namespace set, returning its index
    pub fn add_ns_set(&mut self, set: NamespaceSet) -> u32 {
        self.ns_sets.push(Rc::new(set));
        (self.ns_sets.len() - 1) as u32
    }

    /// Add a multiname, returning its index
    pub fn add_multiname(&mut self, multiname: Multiname) -> u32 {
        if let Some(idx) = self.multinames.iter().position(|m| **m == multiname) {
            return idx as u32;
        }
        self.multinames.push(Rc::new(multiname));
        (self.multinames.len() - 1) as u32
    }

    /// Resolve a signed integer entry
    pub fn int(&self, index: u32) -> Result<i32> {
        self.ints
            .get(index as usize)
            .copied()
            .ok_or(AbcError::PoolResolution {
                kind: PoolKind::Int,
                index,
            })
    }

    /// Resolve an unsigned integer entry
    pub fn uint(&self, index: u32) -> Result<u32> {
        self.uints
            .get(index as usize)
            .copied()
            .ok_or(AbcError::PoolResolution {
                kind: PoolKind::Uint,
                index,
            })
    }

    /// Resolve a double entry
    pub fn double(&self, index: u32) -> Result<f64> {
        self.doubles
            .get(index as usize)
            .copied()
            .ok_or(AbcError::PoolResolution {
                kind: PoolKind::Double,
                index,
            })
    }

    /// Resolve a string entry
    pub fn string(&self, index: u32) -> Result<&Rc<str>> {
        self.strings
            .get(index as usize)
            .ok_or(AbcError::PoolResolution {
                kind: PoolKind::String,
                index,
            })
    }

    /// Resolve a namespace entry
    pub fn namespace(&self, index: u32) -> Result<&Rc<Namespace>> {
        self.namespaces
            .get(index as usize)
            .ok_or(AbcError::PoolResolution {
                kind: PoolKind::Namespace,
                index,
            })
    }

    /// Resolve a namespace set entry
    pub fn ns_set(&self, index: u32) -> Result<&Rc<NamespaceSet>> {
        self.ns_sets
            .get(index as usize)
            .ok_or(AbcError::PoolResolution {
                kind: PoolKind::NamespaceSet,
                index,
            })
    }

    /// Resolve a multiname entry
    pub fn multiname(&self, index: u32) -> Result<&Rc<Multiname>> {
        self.multinames
            .get(index as usize)
            .ok_or(AbcError::PoolResolution {
                kind: PoolKind::Multiname,
                index,
            })
    }

    /// Resolve any reference to its entry
    pub fn resolve(&self, r: PoolRef) -> Result<PoolEntry<'_>> {
        Ok(match r.kind {
            PoolKind::Int => PoolEntry::Int(self.int(r.index)?),
            PoolKind::Uint => PoolEntry::Uint(self.uint(r.index)?),
            PoolKind::Double => PoolEntry::Double(self.double(r.index)?),
            PoolKind::String => PoolEntry::Str(self.string(r.index)?),
            PoolKind::Namespace => PoolEntry::Namespace(self.namespace(r.index)?),
            PoolKind::NamespaceSet => PoolEntry::NamespaceSet(self.ns_set(r.index)?),
            PoolKind::Multiname => PoolEntry::Multiname(self.multiname(r.index)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_entries() {
        let pool = ConstantPool::new();
        assert_eq!(pool.int(0), Ok(0));
        assert_eq!(pool.string(0).unwrap().as_ref(), "");
        assert_eq!(pool.namespace(0).unwrap().kind, NamespaceKind::Any);
        assert!(pool.ns_set(0).unwrap().is_empty());
    }

    #[test]
    fn test_string_dedup() {
        let mut pool = ConstantPool::new();
        let idx1 = pool.add_string("flash.display");
        let idx2 = pool.add_string("Sprite");
        let idx3 = pool.add_string("flash.display");
        assert_eq!(idx1, idx3);
        assert_ne!(idx1, idx2);
        assert_eq!(pool.add_string(""), 0);
    }

    #[test]
    fn test_out_of_bounds_resolution() {
        let pool = ConstantPool::new();
        assert_eq!(
            pool.multiname(7).unwrap_err(),
            AbcError::PoolResolution {
                kind: PoolKind::Multiname,
                index: 7,
            }
        );
        assert!(pool.resolve(PoolRef::new(PoolKind::Double, 99)).is_err());
    }

    #[test]
    fn test_runtime_arity() {
        let ns = Rc::new(Namespace::new(NamespaceKind::Package, "flash.utils"));
        let qname = Multiname::QName {
            ns,
            name: Rc::from("ByteArray"),
            attribute: false,
        };
        assert_eq!(qname.runtime_arity(), 0);
        assert!(!qname.is_runtime());

        let rtq = Multiname::RtqName {
            name: Rc::from("x"),
            attribute: false,
        };
        assert_eq!(rtq.runtime_arity(), 1);

        let rtql = Multiname::RtqNameL { attribute: false };
        assert_eq!(rtql.runtime_arity(), 2);

        let late = Multiname::MultinameL {
            ns_set: Rc::new(NamespaceSet::default()),
            attribute: true,
        };
        assert_eq!(late.runtime_arity(), 1);
        assert!(late.is_attribute());
    }

    #[test]
    fn test_multiname_dedup() {
        let mut pool = ConstantPool::new();
        let ns = Rc::new(Namespace::new(NamespaceKind::Package, ""));
        let mn = Multiname::QName {
            ns: Rc::clone(&ns),
            name: Rc::from("trace"),
            attribute: false,
        };
        let idx1 = pool.add_multiname(mn.clone());
        let idx2 = pool.add_multiname(mn);
        assert_eq!(idx1, idx2);
    }
}
