pub mod manager;
pub mod model;

pub use manager::{InstallManager, VERSION_MARKER};
pub use model::InstalledState;
