//! Dispatch resolution: shadow override or real method body, never both
//!
//! Resolution walks the shadow type hierarchy most-derived-first; within one
//! class its own methods are consulted before its capability sets, and sets
//! are consulted in the order they were adopted. The first match wins; a
//! signature two sets of the same class both declare resolves to the earlier
//! set, deterministically, with the losers recorded at debug level.
//!
//! Resolutions are pure functions of static types, so they are memoized per
//! (class id, signature). Recomputing a missed entry twice is harmless.

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::class::{CallEnv, ClassId, MethodBody, ShadowClassId};
use crate::error::{UmbraError, UmbraResult};
use crate::object::RealRef;
use crate::registry::{ClassRegistry, ShadowRegistry};
use crate::runtime::Runtime;
use crate::signature::MethodSig;
use crate::value::Value;

/// A resolved shadow override, remembering which class declared it
#[derive(Clone)]
pub(crate) struct ResolvedOverride {
    pub(crate) declaring: ShadowClassId,
    pub(crate) body: MethodBody,
}

/// A resolved real method body
#[derive(Clone)]
pub(crate) struct ResolvedReal {
    pub(crate) declaring: ClassId,
    pub(crate) body: MethodBody,
}

/// Memoizing resolver for both sides of dispatch
pub(crate) struct DispatchResolver {
    overrides: DashMap<(ShadowClassId, MethodSig), Option<ResolvedOverride>>,
    real_methods: DashMap<(ClassId, MethodSig), Option<ResolvedReal>>,
}

impl DispatchResolver {
    pub(crate) fn new() -> Self {
        Self {
            overrides: DashMap::new(),
            real_methods: DashMap::new(),
        }
    }

    /// Resolve the override for `sig` starting at `class`, most-derived-first
    pub(crate) fn resolve_override(
        &self,
        class: ShadowClassId,
        sig: &MethodSig,
        shadows: &ShadowRegistry,
    ) -> Option<ResolvedOverride> {
        let key = (class, sig.clone());
        if let Some(hit) = self.overrides.get(&key) {
            return hit.clone();
        }
        let resolved = walk_shadow_chain(class, sig, shadows);
        self.overrides.insert(key, resolved.clone());
        resolved
    }

    /// Resolve the real method body for `sig` starting at `class`
    pub(crate) fn resolve_real(
        &self,
        class: ClassId,
        sig: &MethodSig,
        classes: &ClassRegistry,
    ) -> Option<ResolvedReal> {
        let key = (class, sig.clone());
        if let Some(hit) = self.real_methods.get(&key) {
            return hit.clone();
        }
        let resolved = classes.ancestors(class).find_map(|(id, def)| {
            def.method(sig).map(|body| ResolvedReal {
                declaring: id,
                body: body.clone(),
            })
        });
        self.real_methods.insert(key, resolved.clone());
        resolved
    }
}

impl std::fmt::Debug for DispatchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchResolver")
            .field("overrides", &self.overrides.len())
            .field("real_methods", &self.real_methods.len())
            .finish()
    }
}

fn walk_shadow_chain(
    class: ShadowClassId,
    sig: &MethodSig,
    shadows: &ShadowRegistry,
) -> Option<ResolvedOverride> {
    for (id, def) in shadows.ancestors(class) {
        if let Some(body) = def.own_method(sig) {
            return Some(ResolvedOverride {
                declaring: id,
                body: body.clone(),
            });
        }
        let mut winner: Option<&MethodBody> = None;
        for set in def.sets() {
            if let Some(body) = set.get(sig) {
                if winner.is_none() {
                    winner = Some(body);
                } else {
                    debug!(
                        shadow = def.name(),
                        set = set.name(),
                        sig = %sig,
                        "ambiguous override, earlier capability set wins"
                    );
                }
            }
        }
        if let Some(body) = winner {
            return Some(ResolvedOverride {
                declaring: id,
                body: body.clone(),
            });
        }
    }
    None
}

/// Dispatch a call on `obj`: the bound shadow's override if one resolves,
/// otherwise the real method body. Exactly one of the two executes.
pub(crate) fn invoke(
    runtime: &Runtime,
    obj: &RealRef,
    name: &str,
    args: &[Value],
) -> UmbraResult<Value> {
    let sig = MethodSig::from_call(name, args);
    let shadow = runtime.bindings.lookup_shadow(obj.id());

    if let Some(shadow) = &shadow {
        if let Some(overridden) =
            runtime
                .resolver
                .resolve_override(shadow.class_id(), &sig, &runtime.shadows)
        {
            trace!(object = ?obj.id(), sig = %sig, declaring = overridden.declaring, "shadow override");
            let env = CallEnv {
                runtime,
                receiver: obj,
                shadow: Some(shadow),
            };
            return (overridden.body)(&env, args);
        }
    }

    if let Some(real) = runtime
        .resolver
        .resolve_real(obj.class_id(), &sig, &runtime.classes)
    {
        trace!(object = ?obj.id(), sig = %sig, declaring = real.declaring, "real method");
        let env = CallEnv {
            runtime,
            receiver: obj,
            shadow: shadow.as_ref(),
        };
        return (real.body)(&env, args);
    }

    Err(UmbraError::UnknownMethod {
        class: runtime.class_name(obj.class_id()),
        sig: sig.to_string(),
    })
}
