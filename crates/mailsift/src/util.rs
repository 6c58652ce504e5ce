//! Small helpers shared by callers of the filter API.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Either a single value or a list of values.
///
/// Deserializes from a bare value or an array, so configuration can say
/// `"messages": "a.eml"` as well as `"messages": ["a.eml", "b.eml"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// A list of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Converts into a vector: a single value becomes a one-element vector,
    /// a list is returned unchanged.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

/// Returns `value` as a sequence. See [`OneOrMany::into_vec`].
#[must_use]
pub fn as_sequence<T>(value: OneOrMany<T>) -> Vec<T> {
    value.into_vec()
}

/// Resolves a file name to a path that exists.
///
/// Returns `name` unchanged if it exists relative to the process, otherwise
/// `name` joined onto the current working directory if that exists.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if neither location exists.
pub fn resolve_path(name: impl AsRef<Path>) -> Result<PathBuf> {
    let name = name.as_ref();
    if name.exists() {
        return Ok(name.to_path_buf());
    }

    let not_found = || Error::FileNotFound(name.to_path_buf());
    let work_path = std::env::current_dir().map_err(|_| not_found())?;
    let candidate = work_path.join(name);
    if candidate.exists() {
        Ok(candidate)
    } else {
        Err(not_found())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_becomes_sequence() {
        assert_eq!(as_sequence(OneOrMany::One("x")), vec!["x"]);
    }

    #[test]
    fn test_list_is_unchanged() {
        assert_eq!(as_sequence(OneOrMany::from(vec![1, 2])), vec![1, 2]);
        assert_eq!(as_sequence::<u8>(OneOrMany::Many(Vec::new())), Vec::<u8>::new());
    }

    #[test]
    fn test_deserialize_one_or_many() {
        let one: OneOrMany<String> = serde_json::from_str(r#""a.eml""#).unwrap();
        assert_eq!(one, OneOrMany::One("a.eml".to_string()));

        let many: OneOrMany<String> = serde_json::from_str(r#"["a.eml", "b.eml"]"#).unwrap();
        assert_eq!(many.into_vec(), vec!["a.eml", "b.eml"]);
    }

    #[test]
    fn test_resolve_existing_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = resolve_path(file.path()).unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn test_resolve_relative_path() {
        let resolved = resolve_path("Cargo.toml").unwrap();
        assert!(resolved.exists());
    }

    #[test]
    fn test_resolve_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.eml");
        let err = resolve_path(&missing).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(path) if path == missing));
    }
}
