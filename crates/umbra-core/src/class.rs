//! Class definitions and the call environment handed to method bodies
//!
//! Real classes and shadow classes are described by plain definition records
//! built through [`RealClassBuilder`] and [`ShadowClassBuilder`]. Method
//! bodies, constructor bodies, and constructor hooks are registered once as
//! function values keyed by signature; no reflection happens at dispatch time.
//!
//! A shadow class keeps two distinct construction steps: its state
//! constructor (field defaults, run when the instance is created) and its
//! constructor hooks (notified of the real constructor's arguments, run by
//! the factory after binding). They are never collapsed into one.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::UmbraResult;
use crate::object::{RealRef, ShadowInstance};
use crate::runtime::Runtime;
use crate::signature::MethodSig;
use crate::value::{ParamType, Value};

/// Index of a real class in the class registry
pub type ClassId = usize;

/// Index of a shadow class in the shadow registry
pub type ShadowClassId = usize;

/// A registered method body. Returns its result in place of whatever it
/// shadows; errors pass through dispatch unmodified.
pub type MethodBody = Arc<dyn Fn(&CallEnv<'_>, &[Value]) -> UmbraResult<Value> + Send + Sync>;

/// A constructor body or constructor hook
pub type CtorFn = Arc<dyn Fn(&CallEnv<'_>, &[Value]) -> UmbraResult<()> + Send + Sync>;

/// Produces a class's default state, one slot per declaring class
pub type StateCtor = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Everything a method body may touch: the runtime (for nested dispatch),
/// the real receiver, and the bound shadow when running as an override or
/// constructor hook.
pub struct CallEnv<'a> {
    pub(crate) runtime: &'a Runtime,
    pub(crate) receiver: &'a RealRef,
    pub(crate) shadow: Option<&'a Arc<ShadowInstance>>,
}

impl<'a> CallEnv<'a> {
    /// The runtime dispatching this call
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    /// The real object the call was made on
    pub fn receiver(&self) -> &'a RealRef {
        self.receiver
    }

    /// The bound shadow instance; `None` inside a real method body
    pub fn shadow(&self) -> Option<&'a Arc<ShadowInstance>> {
        self.shadow
    }

    /// Access the receiver's real-side state of type `T`
    pub fn real_state<T: Any + Send, R>(&self, f: impl FnOnce(&mut T) -> R) -> UmbraResult<R> {
        self.receiver.with_state(f)
    }

    /// Access the bound shadow's state of type `T`
    pub fn shadow_state<T: Any + Send, R>(&self, f: impl FnOnce(&mut T) -> R) -> UmbraResult<R> {
        match self.shadow {
            Some(shadow) => shadow.with_state(f),
            None => Err(crate::error::UmbraError::StateType {
                expected: std::any::type_name::<T>(),
            }),
        }
    }
}

fn unit_state() -> StateCtor {
    Arc::new(|| Box::new(()) as Box<dyn Any + Send>)
}

/// Definition of a real (host) class
pub struct RealClassDef {
    name: String,
    parent: Option<ClassId>,
    state_ctor: StateCtor,
    ctors: FxHashMap<Vec<ParamType>, CtorFn>,
    methods: FxHashMap<MethodSig, MethodBody>,
}

impl RealClassDef {
    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, if any
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    pub(crate) fn state_ctor(&self) -> &StateCtor {
        &self.state_ctor
    }

    pub(crate) fn ctor(&self, tags: &[ParamType]) -> Option<&CtorFn> {
        self.ctors.get(tags)
    }

    pub(crate) fn has_ctors(&self) -> bool {
        !self.ctors.is_empty()
    }

    pub(crate) fn method(&self, sig: &MethodSig) -> Option<&MethodBody> {
        self.methods.get(sig)
    }
}

impl std::fmt::Debug for RealClassDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealClassDef")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("ctors", &self.ctors.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Builder for [`RealClassDef`]
pub struct RealClassBuilder {
    name: String,
    parent: Option<ClassId>,
    state_ctor: StateCtor,
    ctors: FxHashMap<Vec<ParamType>, CtorFn>,
    methods: FxHashMap<MethodSig, MethodBody>,
}

impl RealClassBuilder {
    /// Start a definition for the named class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            state_ctor: unit_state(),
            ctors: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    /// Set the parent class
    pub fn parent(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the state constructor producing this class's default state
    pub fn state<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.state_ctor = Arc::new(move || Box::new(f()) as Box<dyn Any + Send>);
        self
    }

    /// Add a constructor body for the given parameter tags. Runs only in
    /// pass-through mode; shadowed construction intercepts it.
    pub fn ctor<F>(mut self, params: &[ParamType], body: F) -> Self
    where
        F: Fn(&CallEnv<'_>, &[Value]) -> UmbraResult<()> + Send + Sync + 'static,
    {
        self.ctors.insert(params.to_vec(), Arc::new(body));
        self
    }

    /// Add a method body under `name(params)`
    pub fn method<F>(mut self, name: &str, params: &[ParamType], body: F) -> Self
    where
        F: Fn(&CallEnv<'_>, &[Value]) -> UmbraResult<Value> + Send + Sync + 'static,
    {
        self.methods
            .insert(MethodSig::new(name, params), Arc::new(body));
        self
    }

    /// Finalize the definition
    pub fn build(self) -> RealClassDef {
        RealClassDef {
            name: self.name,
            parent: self.parent,
            state_ctor: self.state_ctor,
            ctors: self.ctors,
            methods: self.methods,
        }
    }
}

/// A named group of overrides a shadow class adopts alongside its own.
/// Consulted after the class's own methods, in declaration order.
pub struct MethodSet {
    name: String,
    methods: FxHashMap<MethodSig, MethodBody>,
}

impl MethodSet {
    /// Start an empty capability set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: FxHashMap::default(),
        }
    }

    /// Add an override under `name(params)`
    pub fn method<F>(mut self, name: &str, params: &[ParamType], body: F) -> Self
    where
        F: Fn(&CallEnv<'_>, &[Value]) -> UmbraResult<Value> + Send + Sync + 'static,
    {
        self.methods
            .insert(MethodSig::new(name, params), Arc::new(body));
        self
    }

    /// Set name, used in ambiguity diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn get(&self, sig: &MethodSig) -> Option<&MethodBody> {
        self.methods.get(sig)
    }
}

/// Definition of a shadow class
pub struct ShadowClassDef {
    name: String,
    parent: Option<ShadowClassId>,
    state_ctor: StateCtor,
    hooks: FxHashMap<Vec<ParamType>, CtorFn>,
    methods: FxHashMap<MethodSig, MethodBody>,
    sets: Vec<MethodSet>,
}

impl ShadowClassDef {
    /// Shadow class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent shadow class, if any
    pub fn parent(&self) -> Option<ShadowClassId> {
        self.parent
    }

    pub(crate) fn state_ctor(&self) -> &StateCtor {
        &self.state_ctor
    }

    pub(crate) fn hook(&self, tags: &[ParamType]) -> Option<&CtorFn> {
        self.hooks.get(tags)
    }

    pub(crate) fn has_hooks(&self) -> bool {
        !self.hooks.is_empty()
    }

    pub(crate) fn own_method(&self, sig: &MethodSig) -> Option<&MethodBody> {
        self.methods.get(sig)
    }

    pub(crate) fn sets(&self) -> &[MethodSet] {
        &self.sets
    }
}

impl std::fmt::Debug for ShadowClassDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowClassDef")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("hooks", &self.hooks.len())
            .field("methods", &self.methods.len())
            .field("sets", &self.sets.len())
            .finish()
    }
}

/// Builder for [`ShadowClassDef`]
pub struct ShadowClassBuilder {
    name: String,
    parent: Option<ShadowClassId>,
    state_ctor: StateCtor,
    hooks: FxHashMap<Vec<ParamType>, CtorFn>,
    methods: FxHashMap<MethodSig, MethodBody>,
    sets: Vec<MethodSet>,
}

impl ShadowClassBuilder {
    /// Start a definition for the named shadow class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            state_ctor: unit_state(),
            hooks: FxHashMap::default(),
            methods: FxHashMap::default(),
            sets: Vec::new(),
        }
    }

    /// Set the parent shadow class
    pub fn parent(mut self, parent: ShadowClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the state constructor producing this shadow's field defaults
    pub fn state<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.state_ctor = Arc::new(move || Box::new(f()) as Box<dyn Any + Send>);
        self
    }

    /// Add a constructor hook for the given parameter tags. Invoked by the
    /// factory with the real constructor's arguments, after state
    /// construction and binding.
    pub fn ctor_hook<F>(mut self, params: &[ParamType], hook: F) -> Self
    where
        F: Fn(&CallEnv<'_>, &[Value]) -> UmbraResult<()> + Send + Sync + 'static,
    {
        self.hooks.insert(params.to_vec(), Arc::new(hook));
        self
    }

    /// Add an override under `name(params)`
    pub fn method<F>(mut self, name: &str, params: &[ParamType], body: F) -> Self
    where
        F: Fn(&CallEnv<'_>, &[Value]) -> UmbraResult<Value> + Send + Sync + 'static,
    {
        self.methods
            .insert(MethodSig::new(name, params), Arc::new(body));
        self
    }

    /// Adopt a capability set; sets resolve after own methods, in the order
    /// they were adopted
    pub fn capability_set(mut self, set: MethodSet) -> Self {
        self.sets.push(set);
        self
    }

    /// Finalize the definition
    pub fn build(self) -> ShadowClassDef {
        ShadowClassDef {
            name: self.name,
            parent: self.parent,
            state_ctor: self.state_ctor,
            hooks: self.hooks,
            methods: self.methods,
            sets: self.sets,
        }
    }
}
