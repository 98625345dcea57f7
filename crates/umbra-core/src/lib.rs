//! Umbra Shadow Runtime Core
//!
//! Umbra lets test code exercise a graph of host-platform classes without the
//! host present: calls on "real" objects are transparently routed to
//! hand-written "shadow" objects. This crate is the dispatch and binding
//! core:
//!
//! - **Registries and shadow class map** (`registry` module): which shadow
//!   class covers which real class, with nearest-ancestor fallback
//! - **Binding table** (`binding` module): exactly one shadow instance per
//!   real object, weakly associated and evicted once the real object is gone
//! - **Proxy factory** (`Runtime::create`): constructor interception and the
//!   shadow constructor-hook protocol
//! - **Dispatch resolver** (`Runtime::invoke`): per-signature override
//!   resolution over the shadow hierarchy, memoized, falling through to the
//!   real method body when no override exists
//! - **Accessor façade** (`Runtime::shadow_of` / `Runtime::proxy_for`):
//!   bidirectional lookup between a real object and its shadow
//!
//! # Example
//!
//! ```rust,ignore
//! use umbra_core::{RealClassBuilder, Runtime, ShadowClassBuilder, Value};
//!
//! let mut builder = Runtime::builder();
//! builder.register_class(RealClassBuilder::new("Widget").build());
//! builder.register_shadow_class(
//!     ShadowClassBuilder::new("ShadowWidget")
//!         .method("id", &[], |_env, _args| Ok(Value::int(42)))
//!         .build(),
//! );
//! builder.register_shadow("Widget", "ShadowWidget");
//! let rt = builder.build()?;
//!
//! let widget = rt.create("Widget", &[])?;
//! assert_eq!(rt.invoke(&widget, "id", &[])?, Value::int(42));
//! let shadow = rt.shadow_of(&widget)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod binding;
pub mod class;
pub mod error;
pub mod object;
pub mod registry;
pub mod runtime;
pub mod signature;
pub mod value;

mod dispatch;
mod factory;

pub use binding::BindingTable;
pub use class::{
    CallEnv, ClassId, CtorFn, MethodBody, MethodSet, RealClassBuilder, RealClassDef,
    ShadowClassBuilder, ShadowClassDef, ShadowClassId, StateCtor,
};
pub use error::{UmbraError, UmbraResult};
pub use object::{ObjectId, RealObject, RealRef, ShadowId, ShadowInstance, StateSet};
pub use registry::{ClassRegistry, ShadowClassMap, ShadowRegistry};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeOptions};
pub use signature::MethodSig;
pub use value::{param_tags, ParamType, Value};
