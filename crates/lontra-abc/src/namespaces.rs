//! Namespace collection
//!
//! Callers assembling the set of namespaces a script opens walk each
//! instruction and ask it for the namespaces its operands reference.
//! Collection resolves the instruction's pool references (this is where
//! a stale reference surfaces as [`crate::AbcError::PoolResolution`])
//! and traverses multinames transitively; it never mutates the pool or
//! the options.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::instruction::Instruction;
use crate::pool::{ConstantPool, Multiname, Namespace, PoolKind};
use crate::schema::FieldKind;

/// Caller-supplied collection context
#[derive(Debug, Clone, Copy, Default)]
pub struct NsOptions {
    /// Also collect class private namespaces, which most import-list
    /// consumers want filtered out
    pub include_private: bool,
}

impl NsOptions {
    fn admits(&self, ns: &Namespace) -> bool {
        self.include_private || !ns.is_private()
    }
}

impl Multiname {
    /// Collect every pool-resident namespace this name references
    ///
    /// Runtime-qualified parts contribute nothing; their namespaces only
    /// exist on the evaluation stack.
    pub fn collect_ns(&self, options: &NsOptions, out: &mut FxHashSet<Rc<Namespace>>) {
        match self {
            Self::QName { ns, .. } => {
                if options.admits(ns) {
                    out.insert(Rc::clone(ns));
                }
            }
            Self::Multiname { ns_set, .. } | Self::MultinameL { ns_set, .. } => {
                for ns in ns_set.iter() {
                    if options.admits(ns) {
                        out.insert(Rc::clone(ns));
                    }
                }
            }
            Self::RtqName { .. } | Self::RtqNameL { .. } => {}
            Self::TypeName { base, params } => {
                base.collect_ns(options, out);
                for param in params {
                    param.collect_ns(options, out);
                }
            }
        }
    }
}

impl Instruction {
    /// Collect the namespaces referenced by this instruction's operands
    ///
    /// Returns the empty set for instructions without namespace-bearing
    /// operands.
    pub fn collect_namespaces(
        &self,
        pool: &ConstantPool,
        options: &NsOptions,
    ) -> Result<FxHashSet<Rc<Namespace>>> {
        let mut out = FxHashSet::default();
        for (index, spec) in self.descriptor().body.iter().enumerate() {
            match spec.kind {
                FieldKind::Pool(PoolKind::Multiname) => {
                    let multiname = self.multiname_at(index, pool)?;
                    multiname.collect_ns(options, &mut out);
                }
                FieldKind::Pool(PoolKind::Namespace) => {
                    let r = self.pool_ref_at(index);
                    let ns = pool.namespace(r.index)?;
                    if options.admits(ns) {
                        out.insert(Rc::clone(ns));
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbcError;
    use crate::instruction::InstructionStream;
    use crate::pool::{NamespaceKind, NamespaceSet};

    fn decode_one(bytes: &[u8]) -> Instruction {
        let stream = InstructionStream::decode(bytes).unwrap();
        stream.into_iter().next().unwrap()
    }

    fn pool_with_ns_set() -> (ConstantPool, Rc<Namespace>, Rc<Namespace>, u32) {
        let mut pool = ConstantPool::new();
        let a = Rc::new(Namespace::new(NamespaceKind::Package, "flash.display"));
        let b = Rc::new(Namespace::new(NamespaceKind::Package, "flash.geom"));
        let set = NamespaceSet::new(vec![Rc::clone(&a), Rc::clone(&b)]);
        let ns_set = Rc::new(set);
        let idx = pool.add_multiname(Multiname::Multiname {
            name: Rc::from("Matrix"),
            ns_set,
            attribute: false,
        });
        (pool, a, b, idx)
    }

    #[test]
    fn test_no_namespace_operands_yield_empty_set() {
        let pool = ConstantPool::new();
        let insn = decode_one(&[0xC5]);
        let set = insn.collect_namespaces(&pool, &NsOptions::default()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_multiname_ns_set_is_collected_exactly() {
        let (pool, a, b, idx) = pool_with_ns_set();
        let insn = decode_one(&[0x60, idx as u8]);
        let set = insn.collect_namespaces(&pool, &NsOptions::default()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
        assert!(set.contains(&b));
    }

    #[test]
    fn test_private_namespaces_are_filtered_by_default() {
        let mut pool = ConstantPool::new();
        let private = Rc::new(Namespace::new(NamespaceKind::Private, "Widget"));
        let idx = pool.add_multiname(Multiname::QName {
            ns: Rc::clone(&private),
            name: Rc::from("draw"),
            attribute: false,
        });
        let insn = decode_one(&[0x66, idx as u8]);

        let set = insn.collect_namespaces(&pool, &NsOptions::default()).unwrap();
        assert!(set.is_empty());

        let options = NsOptions {
            include_private: true,
        };
        let set = insn.collect_namespaces(&pool, &options).unwrap();
        assert!(set.contains(&private));
    }

    #[test]
    fn test_runtime_names_contribute_nothing() {
        let mut pool = ConstantPool::new();
        let idx = pool.add_multiname(Multiname::RtqNameL { attribute: false });
        let insn = decode_one(&[0x66, idx as u8]);
        let set = insn.collect_namespaces(&pool, &NsOptions::default()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_type_name_recurses() {
        let mut pool = ConstantPool::new();
        let vec_ns = Rc::new(Namespace::new(NamespaceKind::Package, "__AS3__.vec"));
        let elem_ns = Rc::new(Namespace::new(NamespaceKind::Package, "flash.display"));
        let base = Rc::new(Multiname::QName {
            ns: Rc::clone(&vec_ns),
            name: Rc::from("Vector"),
            attribute: false,
        });
        let param = Rc::new(Multiname::QName {
            ns: Rc::clone(&elem_ns),
            name: Rc::from("Sprite"),
            attribute: false,
        });
        let idx = pool.add_multiname(Multiname::TypeName {
            base,
            params: vec![param],
        });
        let insn = decode_one(&[0x60, idx as u8]);
        let set = insn.collect_namespaces(&pool, &NsOptions::default()).unwrap();
        assert!(set.contains(&vec_ns));
        assert!(set.contains(&elem_ns));
    }

    #[test]
    fn test_stale_reference_surfaces_on_collection() {
        let pool = ConstantPool::new();
        let insn = decode_one(&[0x60, 0x09]);
        let err = insn
            .collect_namespaces(&pool, &NsOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            AbcError::PoolResolution {
                kind: PoolKind::Multiname,
                index: 9,
            }
        );
    }

    #[test]
    fn test_pushnamespace_contributes_its_namespace() {
        let mut pool = ConstantPool::new();
        let idx = pool.add_namespace(Namespace::new(NamespaceKind::Namespace, "http://adobe.com/AS3/2006/builtin"));
        let insn = decode_one(&[0x31, idx as u8]);
        let set = insn.collect_namespaces(&pool, &NsOptions::default()).unwrap();
        assert_eq!(set.len(), 1);
    }
}
