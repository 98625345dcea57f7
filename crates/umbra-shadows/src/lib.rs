//! Umbra Shadow Catalog
//!
//! Example shadow implementations built on `umbra-core`: a view hierarchy
//! and dialog shadows. These are ordinary data classes consuming the
//! dispatch core's contract; they carry no dispatch logic of their own.
//!
//! Call [`install`] (or a module's own `install`) on a `RuntimeBuilder` to
//! register the catalog:
//!
//! ```rust,ignore
//! use umbra_core::Runtime;
//!
//! let mut builder = Runtime::builder();
//! umbra_shadows::install(&mut builder);
//! let rt = builder.build()?;
//!
//! let view = rt.create("View", &[])?;
//! rt.invoke(&view, "set_id", &[umbra_core::Value::int(7)])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod dialogs;
pub mod widgets;

pub use dialogs::{ShadowAlertDialog, ShadowDialog};
pub use widgets::{ShadowTextView, ShadowView};

use umbra_core::RuntimeBuilder;

/// Register the whole catalog: widgets and dialogs
pub fn install(builder: &mut RuntimeBuilder) {
    widgets::install(builder);
    dialogs::install(builder);
}
