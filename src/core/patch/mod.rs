pub mod butler;

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::LauncherResult;
use crate::core::events::EventSink;

pub use butler::{apply_arguments, ButlerPatcher, STAGING_DIR_NAME};

/// Applies a downloaded binary patch artifact to an install directory.
#[async_trait]
pub trait PatchApplier: Send + Sync {
    async fn apply(
        &self,
        patch_file: &Path,
        install_dir: &Path,
        events: &dyn EventSink,
    ) -> LauncherResult<()>;
}
