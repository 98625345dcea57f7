//! Proxy factory: construction with constructor interception
//!
//! `create_instance` builds the real object's storage from its class chain's
//! state constructors, then either runs the real constructor (pass-through
//! mode) or binds a shadow and notifies its constructor hook with the same
//! arguments the real constructor would have received. Construction is atomic
//! from the caller's perspective: on hook failure the fresh binding is rolled
//! back and nothing dangles.

use std::sync::Arc;

use tracing::trace;

use crate::class::{CallEnv, ShadowClassId};
use crate::error::{UmbraError, UmbraResult};
use crate::object::{RealObject, RealRef, ShadowInstance, StateSet};
use crate::runtime::Runtime;
use crate::signature::display_tags;
use crate::value::{param_tags, Value};

pub(crate) fn create_instance(
    runtime: &Runtime,
    class: &str,
    args: &[Value],
) -> UmbraResult<RealRef> {
    let (class_id, _) = runtime
        .classes
        .get_by_name(class)
        .ok_or_else(|| UmbraError::UnknownClass(class.to_string()))?;

    let states = runtime
        .classes
        .ancestors(class_id)
        .map(|(_, def)| (def.state_ctor())())
        .collect();
    let real: RealRef = Arc::new(RealObject::new(class_id, StateSet::from_states(states)));
    let tags = param_tags(args);

    match runtime.shadow_map.resolve(class_id, &runtime.classes) {
        None => {
            // Pass-through: the real constructor body runs, uninstrumented
            let ctor = runtime
                .classes
                .ancestors(class_id)
                .find_map(|(_, def)| def.ctor(&tags))
                .cloned();
            match ctor {
                Some(body) => {
                    let env = CallEnv {
                        runtime,
                        receiver: &real,
                        shadow: None,
                    };
                    body(&env, args)?;
                }
                None => {
                    let declares = runtime
                        .classes
                        .ancestors(class_id)
                        .any(|(_, def)| def.has_ctors());
                    // storage-only construction accepts only an empty
                    // argument list
                    if declares || !args.is_empty() {
                        return Err(UmbraError::NoMatchingConstructor {
                            class: class.to_string(),
                            sig: display_tags(&tags),
                        });
                    }
                }
            }
            trace!(object = ?real.id(), class, "constructed pass-through");
            Ok(real)
        }
        Some(shadow_class_id) => {
            // Shadowed: the real constructor is intercepted. State
            // construction (field defaults) and hook notification stay two
            // separate, ordered steps.
            let shadow = runtime
                .bindings
                .bind(&real, || instantiate_shadow(runtime, shadow_class_id, &real));

            let hook = runtime
                .shadows
                .ancestors(shadow_class_id)
                .find_map(|(_, def)| def.hook(&tags))
                .cloned();
            match hook {
                Some(hook) => {
                    let env = CallEnv {
                        runtime,
                        receiver: &real,
                        shadow: Some(&shadow),
                    };
                    if let Err(err) = hook(&env, args) {
                        runtime.bindings.remove(real.id());
                        return Err(UmbraError::ShadowInstantiation {
                            class: class.to_string(),
                            shadow: runtime.shadow_name(shadow_class_id),
                            reason: err.to_string(),
                        });
                    }
                }
                None => {
                    let declares = runtime
                        .shadows
                        .ancestors(shadow_class_id)
                        .any(|(_, def)| def.has_hooks());
                    if declares {
                        runtime.bindings.remove(real.id());
                        return Err(UmbraError::ShadowInstantiation {
                            class: class.to_string(),
                            shadow: runtime.shadow_name(shadow_class_id),
                            reason: format!(
                                "no constructor hook matching `{}`",
                                display_tags(&tags)
                            ),
                        });
                    }
                }
            }
            trace!(object = ?real.id(), class, shadow = ?shadow.id(), "constructed shadowed");
            Ok(real)
        }
    }
}

fn instantiate_shadow(
    runtime: &Runtime,
    shadow_class_id: ShadowClassId,
    real: &RealRef,
) -> Arc<ShadowInstance> {
    let states = runtime
        .shadows
        .ancestors(shadow_class_id)
        .map(|(_, def)| (def.state_ctor())())
        .collect();
    Arc::new(ShadowInstance::new(
        shadow_class_id,
        Arc::downgrade(real),
        StateSet::from_states(states),
    ))
}
