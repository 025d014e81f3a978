//! The foreign-interop representability check.
//!
//! Whether a type can cross the foreign bridge is decided against two sets
//! of standard-environment types: directly mapped foreign primitive types
//! and bridgeable container types. Both are looked up once per session, on
//! the first query.

use rustc_hash::FxHashSet;

use crate::context::db::TypeDatabase;
use crate::resolver::TypeResolver;
use crate::types::{Ty, TyInterner, TyKind};

/// Standard-environment names of types that map directly onto a foreign
/// primitive representation.
const MAPPED_TYPE_NAMES: &[&str] = &[
    "CBool",
    "CChar",
    "CShort",
    "CInt",
    "CLong",
    "CLongLong",
    "CFloat",
    "CDouble",
    "OpaquePointer",
];

/// Standard-environment names of native types bridged by value conversion.
const BRIDGEABLE_TYPE_NAMES: &[&str] = &["String", "Array", "Dictionary"];

/// The resolved bridging sets of one session.
#[derive(Debug, Default)]
pub struct ForeignBridge {
    mapped: FxHashSet<Ty>,
    bridgeable: FxHashSet<Ty>,
}

impl ForeignBridge {
    /// Resolves the name tables against the standard interop module. Names
    /// the module does not define are skipped; an absent module yields
    /// empty sets, and then only classes are representable.
    pub fn populate(db: &dyn TypeDatabase, interner: &TyInterner) -> Self {
        let mut bridge = ForeignBridge::default();
        let Some(module) = db.standard_module() else {
            log::debug!("no standard interop module; bridging sets are empty");
            return bridge;
        };
        for name in MAPPED_TYPE_NAMES {
            for (decl, ty) in db.module_type_lookup(module, name) {
                db.ensure_validated(decl);
                bridge.mapped.insert(ty);
            }
        }
        for name in BRIDGEABLE_TYPE_NAMES {
            for (decl, ty) in db.module_type_lookup(module, name) {
                db.ensure_validated(decl);
                bridge.bridgeable.insert(ty);
            }
        }
        // The dynamic lookup existential and its metatype cross the bridge
        // as the foreign `id` representation.
        if let Some(protocol) = db.dynamic_lookup_protocol() {
            db.ensure_validated(protocol);
            if let Some(ty) = db.declared_ty(protocol) {
                bridge.mapped.insert(interner.intern(TyKind::Meta(ty.clone())));
                bridge.mapped.insert(ty);
            }
        }
        bridge
    }

    fn contains(&self, ty: &Ty) -> bool {
        self.mapped.contains(ty) || self.bridgeable.contains(ty)
    }
}

impl TypeResolver<'_> {
    /// True if `ty` has a foreign-bridge representation.
    pub fn is_foreign_representable(&self, ty: &Ty) -> bool {
        if ty.has_reference_semantics(self.db) {
            return true;
        }
        let mut slot = self.bridge.borrow_mut();
        let bridge = slot.get_or_insert_with(|| ForeignBridge::populate(self.db, &self.interner));
        if bridge.contains(ty) {
            return true;
        }
        // Pointer wrappers are representable when the pointee is a mapped
        // type, through any number of wrapper layers.
        let Some(wrapper) = self.db.pointer_wrapper_decl() else {
            return false;
        };
        let mut current = ty.clone();
        loop {
            match current.kind() {
                TyKind::BoundGeneric { decl, args, .. }
                    if *decl == wrapper && args.len() == 1 =>
                {
                    current = args[0].clone();
                    if bridge.mapped.contains(&current) {
                        return true;
                    }
                }
                _ => return false,
            }
        }
    }
}
