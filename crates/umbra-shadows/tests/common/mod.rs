//! Shared test helpers

use once_cell::sync::Lazy;
use umbra_core::Runtime;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

/// Build a runtime with the full catalog installed
pub fn catalog_runtime() -> Runtime {
    Lazy::force(&TRACING);
    let mut builder = Runtime::builder();
    umbra_shadows::install(&mut builder);
    builder.build().expect("catalog registers cleanly")
}
