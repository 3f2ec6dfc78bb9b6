// ─── Archive ───
// Zip extraction plus the "single wrapper folder" flattening shared by the
// runtime and patch tool installers.

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// Extract every entry of `archive_path` into `dest_dir`, overwriting files
/// that already exist. Runs on the blocking pool.
pub async fn extract_zip(archive_path: &Path, dest_dir: &Path) -> LauncherResult<()> {
    let archive_path = archive_path.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || extract_zip_blocking(&archive_path, &dest_dir))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))?
}

fn extract_zip_blocking(archive_path: &Path, dest_dir: &Path) -> LauncherResult<()> {
    let file = std::fs::File::open(archive_path).map_err(|e| LauncherError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    std::fs::create_dir_all(dest_dir).map_err(|e| LauncherError::io(dest_dir, e))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| LauncherError::Other(format!("Invalid zip entry path: {}", entry.name())))?;
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&out_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = entry.unix_mode().unwrap_or(0) & 0o7777;
            if mode != 0 {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                    .map_err(|e| LauncherError::io(&out_path, e))?;
            }
        }
    }

    debug!("Extracted {} entries from {:?}", archive.len(), archive_path);
    Ok(())
}

/// If `dir` contains exactly one subdirectory, move that subdirectory's
/// contents up one level and remove it. Colliding top-level entries are
/// replaced. Returns whether anything was flattened.
pub fn flatten_single_subdir(dir: &Path) -> LauncherResult<bool> {
    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| LauncherError::io(dir, e))? {
        let entry = entry.map_err(|e| LauncherError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| LauncherError::io(entry.path(), e))?;
        if file_type.is_dir() {
            subdirs.push(entry.path());
        }
    }

    if subdirs.len() != 1 {
        return Ok(false);
    }

    // Park the wrapper under a unique name first so an inner entry that
    // shares the wrapper's name can be moved up without colliding with it.
    let wrapper = dir.join(format!(".flatten-{}", Uuid::new_v4().simple()));
    std::fs::rename(&subdirs[0], &wrapper).map_err(|e| LauncherError::io(&subdirs[0], e))?;

    for entry in std::fs::read_dir(&wrapper).map_err(|e| LauncherError::io(&wrapper, e))? {
        let entry = entry.map_err(|e| LauncherError::io(&wrapper, e))?;
        let target = dir.join(entry.file_name());
        remove_path(&target)?;
        std::fs::rename(entry.path(), &target).map_err(|e| LauncherError::io(&target, e))?;
    }

    std::fs::remove_dir(&wrapper).map_err(|e| LauncherError::io(&wrapper, e))?;
    debug!("Flattened {:?} into {:?}", subdirs[0], dir);
    Ok(true)
}

/// Extract then flatten, the layout both installers expect.
pub async fn extract_and_flatten(archive_path: &Path, dest_dir: &Path) -> LauncherResult<()> {
    extract_zip(archive_path, dest_dir).await?;
    let dest: PathBuf = dest_dir.to_path_buf();
    tokio::task::spawn_blocking(move || flatten_single_subdir(&dest))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))??;
    Ok(())
}

fn remove_path(path: &Path) -> LauncherResult<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => return Ok(()),
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| LauncherError::io(path, e))
}


#[cfg(test)]
mod tests {
    use super::testing::write_zip;
    use super::*;

    #[tokio::test]
    async fn extracts_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_zip(&archive, &[("bin/", ""), ("bin/java", "#!"), ("release", "17")]);

        let out = dir.path().join("out");
        extract_zip(&archive, &out).await.unwrap();

        assert_eq!(std::fs::read_to_string(out.join("bin/java")).unwrap(), "#!");
        assert_eq!(std::fs::read_to_string(out.join("release")).unwrap(), "17");
    }

    #[tokio::test]
    async fn extract_and_flatten_unwraps_versioned_folder() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("jre.zip");
        write_zip(
            &archive,
            &[
                ("jdk-17.0.9+9-jre/bin/java", "java"),
                ("jdk-17.0.9+9-jre/lib/modules", "mods"),
            ],
        );

        let out = dir.path().join("jre");
        extract_and_flatten(&archive, &out).await.unwrap();

        assert_eq!(std::fs::read_to_string(out.join("bin/java")).unwrap(), "java");
        assert_eq!(std::fs::read_to_string(out.join("lib/modules")).unwrap(), "mods");
        assert!(!out.join("jdk-17.0.9+9-jre").exists());
    }

    #[test]
    fn flatten_leaves_multi_folder_layouts_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();

        assert!(!flatten_single_subdir(dir.path()).unwrap());
        assert!(dir.path().join("bin").is_dir());
        assert!(dir.path().join("lib").is_dir());
    }

    #[test]
    fn flatten_replaces_colliding_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("butler"), "old").unwrap();
        std::fs::create_dir_all(dir.path().join("wrap")).unwrap();
        std::fs::write(dir.path().join("wrap/butler"), "new").unwrap();

        assert!(flatten_single_subdir(dir.path()).unwrap());
        assert_eq!(std::fs::read_to_string(dir.path().join("butler")).unwrap(), "new");
        assert!(!dir.path().join("wrap").exists());
    }

    #[test]
    fn flatten_handles_inner_entry_named_like_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("jre/jre")).unwrap();
        std::fs::write(dir.path().join("jre/jre/marker"), "inner").unwrap();

        assert!(flatten_single_subdir(dir.path()).unwrap());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("jre/marker")).unwrap(),
            "inner"
        );
    }
}
