//! Aspect-fill scale computation from partial layout constraints.
//!
//! Given an image's intrinsic size and whatever width/height/min/max values
//! the host style happens to carry, computes the concrete size to render.
//! Pure arithmetic — no allocations, `no_std` compatible.
//!
//! # Example
//!
//! ```
//! use zenscale::{IntrinsicSize, LayoutConstraints, ResizeMode, ResolvedStyle, compute_style};
//!
//! let intrinsic = IntrinsicSize::new(100.0, 50.0).unwrap();
//! let style = compute_style(
//!     ResizeMode::Stretch,
//!     intrinsic,
//!     &LayoutConstraints::new().width(200.0),
//! );
//!
//! // Width given, height derived from the 2:1 intrinsic ratio
//! assert_eq!(style, Some(ResolvedStyle::new(200.0, 100.0)));
//! ```

use core::fmt;
use core::str::FromStr;

use num_traits::{Float, ToPrimitive};

/// How the rendered image relates to its layout box.
///
/// Only [`Stretch`](Self::Stretch) is computed here; the other modes are
/// carried so hosts can pass them through to the platform primitive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ResizeMode {
    /// Scale to cover the box, cropping overflow.
    Cover,
    /// Scale to fit inside the box.
    Contain,
    /// Aspect-fill: size the box itself from the intrinsic ratio and the
    /// constraints that are known.
    #[default]
    Stretch,
    /// Tile at intrinsic size.
    Repeat,
    /// Center at intrinsic size.
    Center,
}

impl ResizeMode {
    /// All modes, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Cover,
        Self::Contain,
        Self::Stretch,
        Self::Repeat,
        Self::Center,
    ];

    /// Whether this mode activates [`compute_style`].
    pub const fn is_aspect_fill(self) -> bool {
        matches!(self, Self::Stretch)
    }

    /// Lowercase configuration name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Stretch => "stretch",
            Self::Repeat => "repeat",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown resize mode name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown resize mode, expected cover|contain|stretch|repeat|center")]
pub struct ParseResizeModeError;

impl FromStr for ResizeMode {
    type Err = ParseResizeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or(ParseResizeModeError)
    }
}

/// Native pixel dimensions of an image.
///
/// Either fully unresolved (`0×0`) or fully resolved (both axes > 0).
/// The constructors refuse anything in between. With `alloc`, the
/// `TryFrom<(f64, f64)>` and `TryFrom<(u32, u32)>` impls in
/// [`resolve`](crate::resolve) give the same check with a
/// `ResolveError::InvalidDimensions` on failure.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct IntrinsicSize {
    width: f64,
    height: f64,
}

impl IntrinsicSize {
    /// The `0×0` "not yet known" size.
    pub const UNRESOLVED: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// A resolved size. `None` unless both axes are finite and positive.
    pub fn new(width: f64, height: f64) -> Option<Self> {
        (is_positive(width) && is_positive(height)).then_some(Self { width, height })
    }

    /// A resolved size from any numeric pixel type (`u32` from decoders,
    /// `i64` from JSON, ...).
    pub fn from_pixels<N: ToPrimitive>(width: N, height: N) -> Option<Self> {
        Self::new(width.to_f64()?, height.to_f64()?)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Whether both axes are known.
    pub fn is_resolved(&self) -> bool {
        self.width != 0.0 && self.height != 0.0
    }

    /// Width divided by height, if resolved.
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.is_resolved().then(|| self.width / self.height)
    }
}

/// The dimension-bearing subset of a host style.
///
/// Each field is optional. Zero, negative, and non-finite values count as
/// "not set", the same as absent ones.
///
/// # Example
///
/// ```
/// use zenscale::LayoutConstraints;
///
/// let c = LayoutConstraints::new().max_width(50.0).min_height(-3.0);
/// assert_eq!(c.max_width, Some(50.0));
/// // Stored as given, ignored when computing.
/// assert_eq!(c.min_height, Some(-3.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct LayoutConstraints {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub min_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
}

impl LayoutConstraints {
    /// No constraints.
    pub const fn new() -> Self {
        Self {
            width: None,
            height: None,
            min_width: None,
            min_height: None,
            max_width: None,
            max_height: None,
        }
    }

    /// Set explicit width.
    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set explicit height.
    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Set minimum width.
    pub fn min_width(mut self, min_width: f64) -> Self {
        self.min_width = Some(min_width);
        self
    }

    /// Set minimum height.
    pub fn min_height(mut self, min_height: f64) -> Self {
        self.min_height = Some(min_height);
        self
    }

    /// Set maximum width.
    pub fn max_width(mut self, max_width: f64) -> Self {
        self.max_width = Some(max_width);
        self
    }

    /// Set maximum height.
    pub fn max_height(mut self, max_height: f64) -> Self {
        self.max_height = Some(max_height);
        self
    }

    /// Effective width: explicit width clamped by min/max, or the minimum
    /// when no width is given. `0.0` when neither is usable.
    pub fn effective_width(&self) -> f64 {
        effective_dimension(self.width, self.min_width, self.max_width)
    }

    /// Effective height, same rules as [`effective_width`](Self::effective_width).
    pub fn effective_height(&self) -> f64 {
        effective_dimension(self.height, self.min_height, self.max_height)
    }
}

/// Concrete size to merge over the host style.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedStyle {
    pub width: f64,
    pub height: f64,
}

impl ResolvedStyle {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Round to whole pixels for integer layout engines. Each axis is at
    /// least 1.
    pub fn to_pixels(&self) -> (u32, u32) {
        (round_pixels(self.width), round_pixels(self.height))
    }
}

/// Compute the size an aspect-fill image should render at.
///
/// Returns `None` unless `mode` is [`ResizeMode::Stretch`] and `intrinsic`
/// is resolved. Otherwise, with `w`/`h` the effective dimensions:
///
/// | `w` | `h` | Output |
/// |---|---|---|
/// | set | set | `w × h`, ratio not preserved |
/// | — | — | intrinsic, downscaled uniformly to respect `max_width`/`max_height` |
/// | set | — | intrinsic scaled so width is `w` |
/// | — | set | intrinsic scaled so height is `h` |
///
/// Single-axis scaling ignores the max bounds.
pub fn compute_style(
    mode: ResizeMode,
    intrinsic: IntrinsicSize,
    constraints: &LayoutConstraints,
) -> Option<ResolvedStyle> {
    if !mode.is_aspect_fill() || !intrinsic.is_resolved() {
        return None;
    }

    let width = constraints.effective_width();
    let height = constraints.effective_height();
    let (iw, ih) = (intrinsic.width, intrinsic.height);

    let scale = match (width != 0.0, height != 0.0) {
        (true, true) => return Some(ResolvedStyle::new(width, height)),
        (false, false) => {
            let width_scale = downscale_factor(iw, constraints.max_width);
            let height_scale = downscale_factor(ih, constraints.max_height);
            if width_scale > height_scale {
                height_scale
            } else {
                width_scale
            }
        }
        (true, false) => width / iw,
        (false, true) => height / ih,
    };

    Some(ResolvedStyle::new(iw * scale, ih * scale))
}

// ============================================================================
// Internal arithmetic
// ============================================================================

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// A constraint value, or `0.0` when unset or unusable.
fn usable(v: Option<f64>) -> f64 {
    match v {
        Some(v) if is_positive(v) => v,
        _ => 0.0,
    }
}

/// Clamp `size` by `min` then `max`; fall back to `min` when `size` is unset.
///
/// Min wins when both bounds would apply, since it is checked first.
fn effective_dimension(size: Option<f64>, min: Option<f64>, max: Option<f64>) -> f64 {
    let size = usable(size);
    let min = usable(min);
    let max = usable(max);
    if size == 0.0 {
        return min;
    }
    if min != 0.0 && size < min {
        min
    } else if max != 0.0 && size > max {
        max
    } else {
        size
    }
}

/// Factor (≤ 1) that brings `size` within `max`. Never upscales.
fn downscale_factor(size: f64, max: Option<f64>) -> f64 {
    let max = usable(max);
    let shown = if max != 0.0 && size > max { max } else { size };
    shown / size
}

fn round_pixels(v: f64) -> u32 {
    Float::round(v).to_u32().unwrap_or(u32::MAX).max(1)
}
