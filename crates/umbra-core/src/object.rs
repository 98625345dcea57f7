//! Object model: real instances, shadow instances, and their state storage
//!
//! Every constructed real object gets a process-unique [`ObjectId`]; every
//! shadow instance gets a process-unique [`ShadowId`]. Identifiers are never
//! reused, which is what makes dead-binding eviction race-free: a collected
//! identity can never be bound again.
//!
//! State is stored per declaring class. Each class in a definition chain
//! contributes one slot, created by that class's own state constructor, so a
//! method body declared by an ancestor operates on the ancestor's state even
//! when the receiver is an instance of a subclass.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::class::{ClassId, ShadowClassId};
use crate::error::{UmbraError, UmbraResult};

/// Global counter for generating unique real-object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Global counter for generating unique shadow-instance IDs
static NEXT_SHADOW_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a real object, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

/// Identity of a shadow instance, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadowId(u64);

/// One state cell, owned by the class that declared it
struct StateSlot {
    type_id: TypeId,
    cell: Mutex<Box<dyn Any + Send>>,
}

/// Per-declaring-class state cells, found by state type
pub struct StateSet {
    slots: Vec<StateSlot>,
}

impl StateSet {
    /// Build a state set from the chain's state constructors,
    /// most-derived-first
    pub(crate) fn from_states(states: Vec<Box<dyn Any + Send>>) -> Self {
        let slots = states
            .into_iter()
            .map(|state| StateSlot {
                type_id: state.as_ref().type_id(),
                cell: Mutex::new(state),
            })
            .collect();
        Self { slots }
    }

    /// Run `f` against the first slot holding a `T`, most-derived-first
    pub fn with<T: Any + Send, R>(&self, f: impl FnOnce(&mut T) -> R) -> UmbraResult<R> {
        for slot in &self.slots {
            if slot.type_id == TypeId::of::<T>() {
                let mut guard = slot.cell.lock();
                if let Some(state) = guard.downcast_mut::<T>() {
                    return Ok(f(state));
                }
            }
        }
        Err(UmbraError::StateType {
            expected: std::any::type_name::<T>(),
        })
    }
}

impl std::fmt::Debug for StateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSet")
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// A constructed instance of a real class
#[derive(Debug)]
pub struct RealObject {
    id: ObjectId,
    class_id: ClassId,
    state: StateSet,
}

/// Shared handle to a real object. Identity follows [`RealObject::id`], not
/// the handle itself.
pub type RealRef = Arc<RealObject>;

impl RealObject {
    pub(crate) fn new(class_id: ClassId, state: StateSet) -> Self {
        Self {
            id: ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)),
            class_id,
            state,
        }
    }

    /// Unique identity of this object
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Class this object was constructed as
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Inspect or mutate this object's state of type `T`
    pub fn with_state<T: Any + Send, R>(&self, f: impl FnOnce(&mut T) -> R) -> UmbraResult<R> {
        self.state.with(f)
    }
}

/// The substitute instance bound to exactly one real object
#[derive(Debug)]
pub struct ShadowInstance {
    id: ShadowId,
    class_id: ShadowClassId,
    real: Weak<RealObject>,
    state: StateSet,
}

impl ShadowInstance {
    pub(crate) fn new(class_id: ShadowClassId, real: Weak<RealObject>, state: StateSet) -> Self {
        Self {
            id: ShadowId(NEXT_SHADOW_ID.fetch_add(1, Ordering::Relaxed)),
            class_id,
            real,
            state,
        }
    }

    /// Unique identity of this shadow instance
    pub fn id(&self) -> ShadowId {
        self.id
    }

    /// Shadow class this instance was created from
    pub fn class_id(&self) -> ShadowClassId {
        self.class_id
    }

    /// Back-reference to the real object. Returns `None` once the real
    /// object has been dropped; the shadow never extends its lifetime.
    pub fn real(&self) -> Option<RealRef> {
        self.real.upgrade()
    }

    /// Inspect or mutate this shadow's state of type `T`
    pub fn with_state<T: Any + Send, R>(&self, f: impl FnOnce(&mut T) -> R) -> UmbraResult<R> {
        self.state.with(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WidgetState {
        id: i64,
    }

    struct LabelState {
        text: String,
    }

    fn two_slot_set() -> StateSet {
        StateSet::from_states(vec![
            Box::new(LabelState {
                text: String::new(),
            }),
            Box::new(WidgetState { id: 0 }),
        ])
    }

    #[test]
    fn test_object_ids_unique() {
        let a = RealObject::new(0, StateSet::from_states(vec![]));
        let b = RealObject::new(0, StateSet::from_states(vec![]));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_state_set_finds_each_type() {
        let set = two_slot_set();
        set.with(|s: &mut WidgetState| s.id = 7).unwrap();
        set.with(|s: &mut LabelState| s.text.push('x')).unwrap();
        assert_eq!(set.with(|s: &mut WidgetState| s.id).unwrap(), 7);
        assert_eq!(set.with(|s: &mut LabelState| s.text.clone()).unwrap(), "x");
    }

    #[test]
    fn test_state_set_missing_type() {
        let set = StateSet::from_states(vec![Box::new(WidgetState { id: 0 })]);
        let err = set.with(|_: &mut LabelState| ()).unwrap_err();
        assert!(matches!(err, UmbraError::StateType { .. }));
    }

    #[test]
    fn test_shadow_back_reference_is_weak() {
        let real: RealRef = Arc::new(RealObject::new(0, StateSet::from_states(vec![])));
        let shadow = ShadowInstance::new(0, Arc::downgrade(&real), StateSet::from_states(vec![]));
        assert!(shadow.real().is_some());
        drop(real);
        assert!(shadow.real().is_none());
    }

    #[test]
    fn test_real_state_accessor() {
        let real = RealObject::new(
            0,
            StateSet::from_states(vec![Box::new(WidgetState { id: 3 })]),
        );
        assert_eq!(real.with_state(|s: &mut WidgetState| s.id).unwrap(), 3);
    }
}
