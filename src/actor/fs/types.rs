use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

use crate::compiler::source::has_extension;
use crate::utils::path::is_temp_file;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Turn one notify event into the source-file changes it describes.
///
/// Keeps files with `extension`; drops editor artifacts and metadata-only
/// modifications.
pub(super) fn source_changes(event: &notify::Event, extension: &str) -> Vec<(PathBuf, ChangeKind)> {
    let kinds: Vec<(&Path, ChangeKind)> = match event.kind {
        EventKind::Create(_) => with_kind(&event.paths, ChangeKind::Created),
        EventKind::Remove(_) => with_kind(&event.paths, ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(mode)) => renamed(&event.paths, mode),
        EventKind::Modify(_) => with_kind(&event.paths, ChangeKind::Modified),
        _ => return Vec::new(),
    };

    kinds
        .into_iter()
        .filter(|(path, _)| has_extension(path, extension) && !is_temp_file(path))
        .map(|(path, kind)| (path.to_path_buf(), kind))
        .collect()
}

fn with_kind(paths: &[PathBuf], kind: ChangeKind) -> Vec<(&Path, ChangeKind)> {
    paths.iter().map(|p| (p.as_path(), kind)).collect()
}

/// A rename is a removal of the old name and a creation of the new one.
fn renamed(paths: &[PathBuf], mode: RenameMode) -> Vec<(&Path, ChangeKind)> {
    match (mode, paths) {
        (RenameMode::From, _) => with_kind(paths, ChangeKind::Removed),
        (RenameMode::To, _) => with_kind(paths, ChangeKind::Created),
        (RenameMode::Both, [from, to]) => vec![
            (from.as_path(), ChangeKind::Removed),
            (to.as_path(), ChangeKind::Created),
        ],
        // Backends that cannot tell which side they saw
        _ => paths
            .iter()
            .map(|p| {
                let kind = if p.exists() {
                    ChangeKind::Created
                } else {
                    ChangeKind::Removed
                };
                (p.as_path(), kind)
            })
            .collect(),
    }
}
