//! Hierarchical permission paths and their ancestor chains.

use pathkey_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Slash-delimited hierarchical path naming a capability.
///
/// A grant or denial on an ancestor path applies to all of its descendants
/// unless a more specific entry exists for the same subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionPath(String);

impl PermissionPath {
    /// Creates a validated permission path.
    ///
    /// Splits on `/`, drops empty segments left by repeated separators, and
    /// stores the normalized form. A path with no segments is rejected.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let segments: Vec<&str> = value
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        if segments.is_empty() {
            return Err(AppError::Validation(format!(
                "permission path '{value}' has no segments"
            )));
        }

        Ok(Self(segments.join("/")))
    }

    /// Returns the normalized path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the path segments in order.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').collect()
    }

    /// Returns the segment count; more segments means a more specific path.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.0.split('/').count()
    }

    /// Returns the ordered ancestor chain, least to most specific.
    ///
    /// `"Staff/Manage/Fire"` yields `["Staff", "Staff/Manage",
    /// "Staff/Manage/Fire"]`; the final element is always the path itself.
    #[must_use]
    pub fn ancestors(&self) -> Vec<PermissionPath> {
        let mut chain = Vec::new();
        let mut assembled = String::new();

        for segment in self.0.split('/') {
            if !assembled.is_empty() {
                assembled.push('/');
            }
            assembled.push_str(segment);
            chain.push(Self(assembled.clone()));
        }

        chain
    }
}

impl std::fmt::Display for PermissionPath {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
