//! Bundled dotfile fragments, embedded into the binary at compile time.

use include_dir::{Dir, include_dir};

static DOTFILES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/dotfiles");

/// Read-only access to the fragment tree.
///
/// Paths are forward-slash relative to the bundle root, e.g.
/// `zsh/common/config.zsh`. A missing directory is indistinguishable from an
/// empty one, which is exactly how callers treat it.
pub trait FragmentStore {
    /// File names directly under `dir` (subdirectories are not listed).
    fn list(&self, dir: &str) -> Vec<String>;

    /// Contents of the file at `path`, if it exists and can be read.
    fn read(&self, path: &str) -> Option<Vec<u8>>;

    /// Whether a file exists at `path`.
    fn contains(&self, path: &str) -> bool;
}

/// The fragment tree compiled into the binary.
pub struct EmbeddedStore;

impl FragmentStore for EmbeddedStore {
    fn list(&self, dir: &str) -> Vec<String> {
        let Some(dir) = DOTFILES.get_dir(dir) else {
            return Vec::new();
        };
        dir.files()
            .filter_map(|f| f.path().file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    fn read(&self, path: &str) -> Option<Vec<u8>> {
        DOTFILES.get_file(path).map(|f| f.contents().to_vec())
    }

    fn contains(&self, path: &str) -> bool {
        DOTFILES.get_file(path).is_some()
    }
}

#[cfg(test)]
pub mod testing {
    use super::FragmentStore;
    use std::collections::BTreeMap;

    /// In-memory store so assembler tests control the exact tree shape.
    #[derive(Default)]
    pub struct MemoryStore {
        files: BTreeMap<String, Vec<u8>>,
    }

    impl MemoryStore {
        pub fn with(entries: &[(&str, &str)]) -> Self {
            let files = entries
                .iter()
                .map(|(path, contents)| (path.to_string(), contents.as_bytes().to_vec()))
                .collect();
            Self { files }
        }
    }

    impl FragmentStore for MemoryStore {
        fn list(&self, dir: &str) -> Vec<String> {
            let prefix = format!("{dir}/");
            self.files
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .filter(|rest| !rest.contains('/'))
                .map(str::to_string)
                .collect()
        }

        fn read(&self, path: &str) -> Option<Vec<u8>> {
            self.files.get(path).cloned()
        }

        fn contains(&self, path: &str) -> bool {
            self.files.contains_key(path)
        }
    }
}
