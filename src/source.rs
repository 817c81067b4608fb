//! Image source descriptors and their change-detection identity.

use alloc::string::String;
use core::fmt;

/// Opaque reference to an asset bundled with the host application.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an image's pixels come from.
///
/// With `serde`, a remote source is `{"uri": "..."}` and a bundled asset is
/// its bare number, matching how hosts usually spell image props.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ImageSource {
    /// Network image; its size must be probed asynchronously.
    Remote { uri: String },
    /// Bundled asset; its size is known synchronously.
    Local(AssetId),
}

/// The tag of an optional [`ImageSource`], for change detection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Remote,
    Local,
    None,
}

impl SourceKind {
    /// Kind of an optional source.
    pub fn of(source: Option<&ImageSource>) -> Self {
        match source {
            Some(ImageSource::Remote { .. }) => Self::Remote,
            Some(ImageSource::Local(_)) => Self::Local,
            None => Self::None,
        }
    }
}

impl ImageSource {
    /// Remote source for `uri`.
    pub fn remote(uri: impl Into<String>) -> Self {
        Self::Remote { uri: uri.into() }
    }

    /// Bundled asset source.
    pub const fn local(id: u32) -> Self {
        Self::Local(AssetId(id))
    }

    pub fn kind(&self) -> SourceKind {
        SourceKind::of(Some(self))
    }

    /// The remote URI, if any.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Remote { uri } => Some(uri),
            Self::Local(_) => None,
        }
    }

    /// Whether two sources name the same image: same URI for remote, same
    /// asset for local.
    pub fn same_image(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Remote { uri: a }, Self::Remote { uri: b }) => a == b,
            (Self::Local(a), Self::Local(b)) => a == b,
            _ => false,
        }
    }
}

impl From<AssetId> for ImageSource {
    fn from(id: AssetId) -> Self {
        Self::Local(id)
    }
}
