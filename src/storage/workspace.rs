use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Names never copied to shared storage, at any depth
///
/// Platform internals, nextflow's own state and binary, previous run output and package manager
/// installations.
pub static EXCLUDED: [&str; 9] = [
    "latch",
    ".latch",
    "nextflow",
    ".nextflow",
    "work",
    "results",
    "miniconda",
    "anaconda3",
    "mambaforge",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub directories: usize,
    pub dangling_links: usize,
}

/// Copy the task's local root into the shared directory, skipping [`EXCLUDED`] names
pub fn materialize(local_root: &Path, shared_dir: &Path) -> io::Result<CopyStats> {
    info!("Copying {} to {}", local_root.display(), shared_dir.display());
    let stats = copy_tree(local_root, shared_dir, &EXCLUDED)?;
    info!(
        "Copied {} files and {} directories ({} dangling links skipped)",
        stats.files, stats.directories, stats.dangling_links
    );
    Ok(stats)
}

/// Recursive copy that merges into an existing destination
///
/// Symlinks are followed and their targets copied. Links that point nowhere are skipped.
pub fn copy_tree(src: &Path, dst: &Path, excluded: &[&str]) -> io::Result<CopyStats> {
    fs::create_dir_all(dst)?;

    let mut stats = CopyStats::default();
    let walker = WalkDir::new(src)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        // the destination may live inside the source tree
        .filter_entry(|entry| entry.depth() == 0 || (!is_excluded(entry, excluded) && entry.path() != dst));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_dangling_link(&err) => {
                warn!("Skipping dangling symlink {}", err.path().map(|p| p.display().to_string()).unwrap_or_default());
                stats.dangling_links += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            stats.directories += 1;
        } else {
            debug!("{} -> {}", entry.path().display(), target.display());
            fs::copy(entry.path(), &target)?;
            stats.files += 1;
        }
    }

    Ok(stats)
}

fn is_excluded(entry: &DirEntry, excluded: &[&str]) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| excluded.contains(&name))
        .unwrap_or(false)
}

/// walkdir reports a followed link with no target as an error on the link's own path
fn is_dangling_link(err: &walkdir::Error) -> bool {
    if err.loop_ancestor().is_some() {
        return false;
    }
    err.path()
        .and_then(|path| fs::symlink_metadata(path).ok())
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}
