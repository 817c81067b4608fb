//! Intrinsic size resolution: collaborator traits, the resolution state
//! machine, and the re-trigger predicate.
//!
//! Remote sources are probed asynchronously through a [`SizeProbe`];
//! bundled sources are looked up synchronously through an
//! [`AssetResolver`]. Attempts are tracked by a [`SizeTracker`], which
//! resets the size when an attempt starts and applies a result only if it
//! belongs to the most recent attempt.

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::future::Future;

use crate::scale::{IntrinsicSize, ResizeMode};
use crate::source::{AssetId, ImageSource, SourceKind};

/// Why a size could not be resolved.
///
/// None of these are fatal: the size stays unresolved and an aspect-fill
/// image simply does not render.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("size probe failed for {uri}: {reason}")]
    ProbeFailed { uri: String, reason: String },

    #[error("bundled asset {0} not found")]
    AssetNotFound(AssetId),

    #[error("unusable image dimensions {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
}

impl ResolveError {
    pub fn probe_failed(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}

// Size checks that report a `ResolveError`.
impl TryFrom<(f64, f64)> for IntrinsicSize {
    type Error = ResolveError;

    fn try_from((width, height): (f64, f64)) -> Result<Self, Self::Error> {
        IntrinsicSize::new(width, height).ok_or(ResolveError::InvalidDimensions { width, height })
    }
}

impl TryFrom<(u32, u32)> for IntrinsicSize {
    type Error = ResolveError;

    fn try_from((width, height): (u32, u32)) -> Result<Self, Self::Error> {
        IntrinsicSize::try_from((f64::from(width), f64::from(height)))
    }
}

/// Looks up the declared dimensions of a bundled asset.
pub trait AssetResolver {
    fn resolve_asset(&self, id: AssetId) -> Result<IntrinsicSize, ResolveError>;
}

impl<T: AssetResolver + ?Sized> AssetResolver for &T {
    fn resolve_asset(&self, id: AssetId) -> Result<IntrinsicSize, ResolveError> {
        (**self).resolve_asset(id)
    }
}

/// In-memory asset registry.
///
/// Dimensions are stored as registered; an entry with a zero axis is kept
/// and reported as `InvalidDimensions` when looked up.
///
/// ```
/// use zenscale::{AssetId, AssetResolver, AssetTable, IntrinsicSize};
///
/// let assets = AssetTable::new().with(AssetId(1), 64, 32);
/// assert_eq!(
///     assets.resolve_asset(AssetId(1)),
///     Ok(IntrinsicSize::new(64.0, 32.0).unwrap())
/// );
/// assert!(assets.resolve_asset(AssetId(2)).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetTable {
    sizes: BTreeMap<AssetId, (u32, u32)>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` with integer pixel dimensions.
    pub fn with(mut self, id: AssetId, width: u32, height: u32) -> Self {
        self.insert(id, width, height);
        self
    }

    /// Register `id`, replacing any previous entry.
    pub fn insert(&mut self, id: AssetId, width: u32, height: u32) {
        self.sizes.insert(id, (width, height));
    }

    /// Registered dimensions of `id`, usable or not.
    pub fn get(&self, id: AssetId) -> Option<(u32, u32)> {
        self.sizes.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl AssetResolver for AssetTable {
    fn resolve_asset(&self, id: AssetId) -> Result<IntrinsicSize, ResolveError> {
        let dims = self.get(id).ok_or(ResolveError::AssetNotFound(id))?;
        IntrinsicSize::try_from(dims)
    }
}

/// Fetches the dimensions of a remote image without decoding it.
///
/// Implemented for closures returning a future, so hosts can wire in any
/// HTTP client:
///
/// ```
/// use zenscale::{IntrinsicSize, SizeProbe};
///
/// let probe = |_uri: &str| async { IntrinsicSize::try_from((800u32, 600u32)) };
/// # let _ = probe.probe("https://example.com/a.jpg");
/// ```
pub trait SizeProbe {
    fn probe(&self, uri: &str) -> impl Future<Output = Result<IntrinsicSize, ResolveError>>;
}

impl<F, Fut> SizeProbe for F
where
    F: Fn(&str) -> Fut,
    Fut: Future<Output = Result<IntrinsicSize, ResolveError>>,
{
    fn probe(&self, uri: &str) -> impl Future<Output = Result<IntrinsicSize, ResolveError>> {
        self(uri)
    }
}

/// Resolve the intrinsic size of `source`.
///
/// Local sources never await; remote sources await the probe.
pub async fn resolve_size<A, P>(
    assets: &A,
    probe: &P,
    source: &ImageSource,
) -> Result<IntrinsicSize, ResolveError>
where
    A: AssetResolver + ?Sized,
    P: SizeProbe + ?Sized,
{
    match source {
        ImageSource::Remote { uri } => probe.probe(uri).await,
        ImageSource::Local(id) => assets.resolve_asset(*id),
    }
}

// ============================================================================
// Re-trigger policy
// ============================================================================

/// The props that decide whether a size must be resolved again.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolveInputs<'a> {
    pub resize_mode: ResizeMode,
    pub source: Option<&'a ImageSource>,
}

/// Whether moving from `prev` to `next` props requires a new resolution.
///
/// Only aspect-fill modes re-resolve. They do so when the mode just became
/// aspect-fill, the source kind changed, or the asset / URI changed.
pub fn needs_resolution(prev: ResolveInputs<'_>, next: ResolveInputs<'_>) -> bool {
    if !next.resize_mode.is_aspect_fill() {
        return false;
    }
    if next.resize_mode != prev.resize_mode {
        return true;
    }
    if SourceKind::of(prev.source) != SourceKind::of(next.source) {
        return true;
    }
    match (prev.source, next.source) {
        (Some(a), Some(b)) => !a.same_image(b),
        _ => false,
    }
}

// ============================================================================
// Resolution state machine
// ============================================================================

/// Identifies one resolution attempt. Later attempts compare greater.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Whether the intrinsic size is known.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum SizeState {
    #[default]
    Unresolved,
    Resolved(IntrinsicSize),
}

impl SizeState {
    /// The size, or [`IntrinsicSize::UNRESOLVED`].
    pub fn intrinsic(&self) -> IntrinsicSize {
        match self {
            Self::Unresolved => IntrinsicSize::UNRESOLVED,
            Self::Resolved(size) => *size,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// What happened to a completed attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    /// The size was stored.
    Applied(IntrinsicSize),
    /// The attempt failed; the size stays unresolved.
    Failed(ResolveError),
    /// A newer attempt was issued, or this one already completed.
    Stale,
    /// The owner was torn down.
    Detached,
}

/// Tracks resolution attempts for one image.
///
/// ```
/// use zenscale::{Completion, IntrinsicSize, SizeTracker};
///
/// let mut tracker = SizeTracker::new();
/// let first = tracker.begin();
/// let second = tracker.begin();
///
/// let size = IntrinsicSize::new(4.0, 3.0).unwrap();
/// assert_eq!(tracker.complete(first, Ok(size)), Completion::Stale);
/// assert_eq!(tracker.complete(second, Ok(size)), Completion::Applied(size));
/// ```
#[derive(Debug, Default)]
pub struct SizeTracker {
    state: SizeState,
    issued: u64,
    pending: Option<RequestToken>,
    detached: bool,
}

impl SizeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an attempt: reset to unresolved and issue a fresh token.
    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        let token = RequestToken(self.issued);
        self.state = SizeState::Unresolved;
        self.pending = Some(token);
        token
    }

    /// Finish the attempt identified by `token`.
    ///
    /// Writes the size only for the latest pending attempt, at most once.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<IntrinsicSize, ResolveError>,
    ) -> Completion {
        if self.detached {
            log::debug!("discarding size for request {} after teardown", token.0);
            return Completion::Detached;
        }
        if self.pending != Some(token) {
            log::debug!(
                "discarding stale size for request {} (latest {})",
                token.0,
                self.issued
            );
            return Completion::Stale;
        }
        self.pending = None;

        let result = result.and_then(|size| {
            if size.is_resolved() {
                Ok(size)
            } else {
                Err(ResolveError::InvalidDimensions {
                    width: size.width(),
                    height: size.height(),
                })
            }
        });

        match result {
            Ok(size) => {
                log::debug!(
                    "request {} resolved to {}x{}",
                    token.0,
                    size.width(),
                    size.height()
                );
                self.state = SizeState::Resolved(size);
                Completion::Applied(size)
            }
            Err(err) => {
                log::warn!("request {} failed: {}", token.0, err);
                Completion::Failed(err)
            }
        }
    }

    /// Drop the attempt without a result, if it is still the pending one.
    pub fn cancel(&mut self, token: RequestToken) {
        if self.pending == Some(token) {
            self.pending = None;
        }
    }

    /// Ignore every completion from now on.
    pub fn detach(&mut self) {
        self.detached = true;
        self.pending = None;
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn state(&self) -> SizeState {
        self.state
    }

    pub fn intrinsic(&self) -> IntrinsicSize {
        self.state.intrinsic()
    }

    /// Token of the attempt still awaiting completion, if any.
    pub fn pending(&self) -> Option<RequestToken> {
        self.pending
    }
}
