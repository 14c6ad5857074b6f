use std::path::{Component, Path, PathBuf};

use crate::error::{Result, VaultError};
use crate::parser::{normalize_slashes, with_note_extension};

/// Maps note identifiers to paths that are guaranteed to stay inside the vault.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    extension: String,
}

impl PathResolver {
    /// Resolver anchored at the canonical form of `root`.
    ///
    /// # Errors
    ///
    /// Fails when `root` cannot be canonicalized.
    pub fn new(root: &Path, extension: &str) -> Result<Self> {
        Ok(Self {
            root: root.canonicalize()?,
            extension: extension.to_string(),
        })
    }

    /// Canonical vault root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an identifier (with or without extension) to an absolute path.
    ///
    /// Existing prefixes are canonicalized so symlinks and `..` are followed
    /// before the containment check.
    ///
    /// # Errors
    ///
    /// [`VaultError::PathEscape`] when the identifier is absolute, resolves
    /// outside the vault root, or crosses a dangling symlink.
    pub fn resolve(&self, identifier: &str) -> Result<PathBuf> {
        let normalized = normalize_slashes(identifier.trim());
        if normalized.is_empty() {
            return Err(VaultError::InvalidIdentifier(identifier.to_string()));
        }
        let relative = with_note_extension(&normalized, &self.extension);

        let mut current = self.root.clone();
        for component in Path::new(&relative).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    current.pop();
                }
                Component::Normal(part) => {
                    current.push(part);
                    match current.canonicalize() {
                        Ok(canonical) => current = canonical,
                        Err(_) if current.symlink_metadata().is_ok() => {
                            return Err(VaultError::PathEscape(identifier.to_string()));
                        }
                        Err(_) => {}
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(VaultError::PathEscape(identifier.to_string()));
                }
            }
        }

        if current == self.root || !current.starts_with(&self.root) {
            return Err(VaultError::PathEscape(identifier.to_string()));
        }
        Ok(current)
    }
}
