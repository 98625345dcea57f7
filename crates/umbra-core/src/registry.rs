//! Class registries and the shadow class map
//!
//! Both registries are populated while the runtime is being built and are
//! immutable afterwards, so lookups after `build()` take no locks. The
//! [`ShadowClassMap`] records which shadow class covers which real class;
//! resolution tries the exact class first, then walks the ancestor chain
//! most-derived-first so a shadow written for a base class covers subclasses
//! that have no dedicated shadow.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::class::{ClassId, RealClassDef, ShadowClassDef, ShadowClassId};
use crate::error::{UmbraError, UmbraResult};

/// Registry of real class definitions
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<RealClassDef>,
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class definition, returning its id
    pub fn register(&mut self, def: RealClassDef) -> ClassId {
        let id = self.classes.len();
        self.name_to_id.insert(def.name().to_string(), id);
        self.classes.push(def);
        id
    }

    /// Get a class by id
    pub fn get(&self, id: ClassId) -> Option<&RealClassDef> {
        self.classes.get(id)
    }

    /// Get a class by name
    pub fn get_by_name(&self, name: &str) -> Option<(ClassId, &RealClassDef)> {
        let id = *self.name_to_id.get(name)?;
        Some((id, self.classes.get(id)?))
    }

    /// Walk a class and its ancestors, most-derived-first
    pub fn ancestors(
        &self,
        id: ClassId,
    ) -> impl Iterator<Item = (ClassId, &RealClassDef)> + '_ {
        std::iter::successors(self.get(id).map(|def| (id, def)), move |(_, def)| {
            let parent = def.parent()?;
            Some((parent, self.get(parent)?))
        })
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Registry of shadow class definitions
#[derive(Debug, Default)]
pub struct ShadowRegistry {
    classes: Vec<ShadowClassDef>,
    name_to_id: FxHashMap<String, ShadowClassId>,
}

impl ShadowRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shadow class definition, returning its id
    pub fn register(&mut self, def: ShadowClassDef) -> ShadowClassId {
        let id = self.classes.len();
        self.name_to_id.insert(def.name().to_string(), id);
        self.classes.push(def);
        id
    }

    /// Get a shadow class by id
    pub fn get(&self, id: ShadowClassId) -> Option<&ShadowClassDef> {
        self.classes.get(id)
    }

    /// Get a shadow class by name
    pub fn get_by_name(&self, name: &str) -> Option<(ShadowClassId, &ShadowClassDef)> {
        let id = *self.name_to_id.get(name)?;
        Some((id, self.classes.get(id)?))
    }

    /// Walk a shadow class and its ancestors, most-derived-first
    pub fn ancestors(
        &self,
        id: ShadowClassId,
    ) -> impl Iterator<Item = (ShadowClassId, &ShadowClassDef)> + '_ {
        std::iter::successors(self.get(id).map(|def| (id, def)), move |(_, def)| {
            let parent = def.parent()?;
            Some((parent, self.get(parent)?))
        })
    }

    /// Number of registered shadow classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Real class → shadow class coverage, fixed at build time
#[derive(Debug, Default)]
pub struct ShadowClassMap {
    map: FxHashMap<ClassId, ShadowClassId>,
}

impl ShadowClassMap {
    /// Create a new empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `shadow` covers `real`. Fails if `real` is already
    /// claimed by another registration.
    pub fn insert(
        &mut self,
        real: ClassId,
        shadow: ShadowClassId,
        classes: &ClassRegistry,
        shadows: &ShadowRegistry,
    ) -> UmbraResult<()> {
        if let Some(&existing) = self.map.get(&real) {
            let name = |reg: &ShadowRegistry, id: ShadowClassId| {
                reg.get(id).map(|d| d.name().to_string()).unwrap_or_default()
            };
            return Err(UmbraError::DuplicateRegistration {
                real: classes
                    .get(real)
                    .map(|d| d.name().to_string())
                    .unwrap_or_default(),
                existing: name(shadows, existing),
                shadow: name(shadows, shadow),
            });
        }
        debug!(
            real = classes.get(real).map(|d| d.name()).unwrap_or(""),
            shadow = shadows.get(shadow).map(|d| d.name()).unwrap_or(""),
            "shadow registered"
        );
        self.map.insert(real, shadow);
        Ok(())
    }

    /// Resolve the shadow class covering `class`: exact match first, then
    /// the nearest registered ancestor. `None` means pass-through.
    pub fn resolve(&self, class: ClassId, classes: &ClassRegistry) -> Option<ShadowClassId> {
        classes
            .ancestors(class)
            .find_map(|(id, _)| self.map.get(&id).copied())
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
