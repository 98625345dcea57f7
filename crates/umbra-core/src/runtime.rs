//! The runtime context: registries, binding table, resolver, and the public
//! accessor façade
//!
//! A [`Runtime`] is an explicitly constructed context object; tests spin up
//! as many isolated runtimes as they like instead of sharing a hidden
//! process-wide singleton. Registration happens through [`RuntimeBuilder`]
//! and is frozen by `build()`; after that the registries and the shadow class
//! map are immutable and read without locking.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binding::BindingTable;
use crate::class::{ClassId, RealClassDef, ShadowClassDef, ShadowClassId};
use crate::dispatch::{self, DispatchResolver};
use crate::error::{UmbraError, UmbraResult};
use crate::factory;
use crate::object::{RealRef, ShadowInstance};
use crate::registry::{ClassRegistry, ShadowClassMap, ShadowRegistry};
use crate::value::Value;

/// Tunables for a runtime instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// Binding-table operations between opportunistic eviction sweeps
    /// (0 disables opportunistic sweeping; explicit sweeps still work)
    pub sweep_interval: u64,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { sweep_interval: 64 }
    }
}

impl RuntimeOptions {
    /// Parse options from a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> UmbraResult<Self> {
        serde_json::from_str(json).map_err(|e| UmbraError::Config(e.to_string()))
    }
}

/// Accumulates class definitions and shadow registrations, then freezes them
/// into a [`Runtime`]
#[derive(Default)]
pub struct RuntimeBuilder {
    classes: ClassRegistry,
    shadows: ShadowRegistry,
    registrations: Vec<(String, String)>,
    options: RuntimeOptions,
}

impl RuntimeBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default options
    pub fn with_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a real class definition, returning its id for parent links
    pub fn register_class(&mut self, def: RealClassDef) -> ClassId {
        self.classes.register(def)
    }

    /// Register a shadow class definition, returning its id for parent links
    pub fn register_shadow_class(&mut self, def: ShadowClassDef) -> ShadowClassId {
        self.shadows.register(def)
    }

    /// Declare that shadow class `shadow` covers real class `real`. Pairs
    /// are validated in the order they were declared.
    pub fn register_shadow(&mut self, real: impl Into<String>, shadow: impl Into<String>) {
        self.registrations.push((real.into(), shadow.into()));
    }

    /// Validate every registration and freeze the runtime. Fails with
    /// `DuplicateRegistration` if two shadows claim the same real class, or
    /// with an unknown-name error for a dangling pair.
    pub fn build(self) -> UmbraResult<Runtime> {
        let mut map = ShadowClassMap::new();
        for (real_name, shadow_name) in &self.registrations {
            let (real_id, _) = self
                .classes
                .get_by_name(real_name)
                .ok_or_else(|| UmbraError::UnknownClass(real_name.clone()))?;
            let (shadow_id, _) = self
                .shadows
                .get_by_name(shadow_name)
                .ok_or_else(|| UmbraError::UnknownShadowClass(shadow_name.clone()))?;
            map.insert(real_id, shadow_id, &self.classes, &self.shadows)?;
        }

        debug!(
            classes = self.classes.len(),
            shadows = self.shadows.len(),
            registrations = map.len(),
            "runtime built"
        );

        Ok(Runtime {
            bindings: BindingTable::new(self.options.sweep_interval),
            resolver: DispatchResolver::new(),
            classes: self.classes,
            shadows: self.shadows,
            shadow_map: map,
            options: self.options,
        })
    }
}

/// An isolated shadow runtime
pub struct Runtime {
    pub(crate) classes: ClassRegistry,
    pub(crate) shadows: ShadowRegistry,
    pub(crate) shadow_map: ShadowClassMap,
    pub(crate) bindings: BindingTable,
    pub(crate) resolver: DispatchResolver,
    options: RuntimeOptions,
}

impl Runtime {
    /// Start building a runtime
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Construct an instance of the named class. If a shadow class covers it
    /// (directly or through an ancestor), the constructor is intercepted:
    /// the shadow is created and bound, then its constructor hook is invoked
    /// with `args`. Otherwise construction is pass-through.
    pub fn create(&self, class: &str, args: &[Value]) -> UmbraResult<RealRef> {
        factory::create_instance(self, class, args)
    }

    /// Invoke `method` on `obj`. The bound shadow's override runs if one
    /// resolves for the call's signature; otherwise the real method body
    /// runs. Errors from the winning body pass through unmodified.
    pub fn invoke(&self, obj: &RealRef, method: &str, args: &[Value]) -> UmbraResult<Value> {
        dispatch::invoke(self, obj, method, args)
    }

    /// The shadow instance bound to `obj`. Fails with `NoShadowBound` for an
    /// object constructed in pass-through mode.
    pub fn shadow_of(&self, obj: &RealRef) -> UmbraResult<Arc<ShadowInstance>> {
        self.bindings
            .lookup_shadow(obj.id())
            .ok_or_else(|| UmbraError::NoShadowBound {
                class: self.class_name(obj.class_id()),
            })
    }

    /// The interceptable handle for `obj`: the identity function on the
    /// real object. Shadow code uses this when wiring a related object back
    /// into dispatch, to document that intent.
    pub fn proxy_for(&self, obj: &RealRef) -> RealRef {
        self.bindings.tick();
        Arc::clone(obj)
    }

    /// Number of bindings currently stored
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Evict bindings whose real object is gone; returns how many
    pub fn sweep_bindings(&self) -> usize {
        self.bindings.sweep()
    }

    /// The options this runtime was built with
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub(crate) fn class_name(&self, id: ClassId) -> String {
        self.classes
            .get(id)
            .map(|def| def.name().to_string())
            .unwrap_or_default()
    }

    pub(crate) fn shadow_name(&self, id: ShadowClassId) -> String {
        self.shadows
            .get(id)
            .map(|def| def.name().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("classes", &self.classes.len())
            .field("shadows", &self.shadows.len())
            .field("registrations", &self.shadow_map.len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
