//! Aspect-preserving image sizing from partial layout constraints.
//!
//! Pure geometry in the core, `no_std` compatible; the lifecycle half needs
//! `alloc`.
//!
//! # Modules
//!
//! - [`scale`] — Resize modes, intrinsic sizes, and the aspect-fill size computation
//! - [`source`] — Remote / bundled image sources and their identity
//! - [`style`] — Flattened style records and layered merging
//! - [`resolve`] — Size probes, asset lookup, and the token-guarded resolution state
//! - [`image`] — The image controller tying resolution, scaling, and render output together

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod scale;

#[cfg(feature = "alloc")]
pub mod image;
#[cfg(feature = "alloc")]
pub mod resolve;
#[cfg(feature = "alloc")]
pub mod source;
#[cfg(feature = "alloc")]
pub mod style;

// Re-exports: core types from scale module
pub use scale::{
    IntrinsicSize, LayoutConstraints, ParseResizeModeError, ResizeMode, ResolvedStyle,
    compute_style,
};

#[cfg(feature = "alloc")]
pub use image::{
    ImageProps, ImageRef, PrimitiveHandle, ProbeRequest, ProbeResponse, Rendered, ScaleImage,
    Trigger,
};
#[cfg(feature = "alloc")]
pub use resolve::{
    AssetResolver, AssetTable, Completion, RequestToken, ResolveError, ResolveInputs, SizeProbe,
    SizeState, SizeTracker, needs_resolution, resolve_size,
};
#[cfg(feature = "alloc")]
pub use source::{AssetId, ImageSource, SourceKind};
#[cfg(feature = "alloc")]
pub use style::{Style, StyleValue};
