pub mod runtime;

pub use runtime::ensure_runtime;
pub use runtime::resolve_system_runtime;
pub use runtime::RuntimeManifest;
pub use runtime::RuntimeSelection;
