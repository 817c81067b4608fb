//! Aspect-fill image controller.
//!
//! [`ScaleImage`] owns the host props and the resolution state for one
//! rendered image. It never awaits on its own: lifecycle calls return a
//! [`Trigger`], and a remote size probe is handed back as a
//! [`ProbeRequest`] for the host to run on its executor and feed back
//! through [`ScaleImage::complete`].
//!
//! # Example
//!
//! ```
//! use zenscale::{AssetId, AssetTable, ImageProps, ImageSource, ScaleImage, Style, Trigger};
//!
//! let assets = AssetTable::new().with(AssetId(1), 100, 50);
//! let props = ImageProps::new()
//!     .source(ImageSource::local(1))
//!     .style(Style::new().with("width", 200.0));
//!
//! let mut image = ScaleImage::new(props, assets);
//! assert!(matches!(image.mount(), Trigger::Settled(_)));
//!
//! let out = image.render();
//! assert_eq!(out.style.number("width"), Some(200.0));
//! assert_eq!(out.style.number("height"), Some(100.0));
//! ```

use alloc::boxed::Box;
use alloc::string::String;

use crate::resolve::{
    AssetResolver, Completion, RequestToken, ResolveError, ResolveInputs, SizeProbe, SizeState,
    SizeTracker, needs_resolution,
};
use crate::scale::{IntrinsicSize, LayoutConstraints, ResizeMode, ResolvedStyle, compute_style};
use crate::source::{ImageSource, SourceKind};
use crate::style::Style;

/// Host-facing props.
///
/// Defaults: empty style, [`ResizeMode::Stretch`], no source.
///
/// With `serde`, deserializes from camelCase props where `style` may be an
/// object, `null`, or an array of those:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// use zenscale::{ImageProps, ImageSource, ResizeMode};
///
/// let props: ImageProps = serde_json::from_str(
///     r#"{"resizeMode": "cover", "source": {"uri": "https://a/b.png"},
///         "style": [{"width": 10}, null, {"width": 20}]}"#,
/// ).unwrap();
/// assert_eq!(props.resize_mode, ResizeMode::Cover);
/// assert_eq!(props.source, Some(ImageSource::remote("https://a/b.png")));
/// assert_eq!(props.style.number("width"), Some(20.0));
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ImageProps {
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::style::deserialize_flattened")
    )]
    pub style: Style,
    pub resize_mode: ResizeMode,
    pub source: Option<ImageSource>,
}

impl ImageProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flattened host style.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = mode;
        self
    }

    pub fn source(mut self, source: impl Into<ImageSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Layout constraints read from the host style.
    pub fn constraints(&self) -> LayoutConstraints {
        LayoutConstraints::from_style(&self.style)
    }

    pub fn resolve_inputs(&self) -> ResolveInputs<'_> {
        ResolveInputs {
            resize_mode: self.resize_mode,
            source: self.source.as_ref(),
        }
    }
}

/// Opaque handle to the platform image primitive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveHandle(pub u64);

/// Host callback receiving the primitive handle. Whatever it returns is
/// what [`ScaleImage::attach`] hands back.
pub type ImageRef = Box<dyn FnMut(PrimitiveHandle) -> PrimitiveHandle>;

/// A remote size probe the host must run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeRequest {
    token: RequestToken,
    uri: String,
}

impl ProbeRequest {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Run the probe.
    pub async fn run<P: SizeProbe + ?Sized>(self, probe: &P) -> ProbeResponse {
        let result = probe.probe(&self.uri).await;
        ProbeResponse {
            token: self.token,
            result,
        }
    }

    /// Pair this request with a result obtained some other way.
    pub fn respond(self, result: Result<IntrinsicSize, ResolveError>) -> ProbeResponse {
        ProbeResponse {
            token: self.token,
            result,
        }
    }
}

/// The outcome of a [`ProbeRequest`], ready for [`ScaleImage::complete`].
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeResponse {
    pub token: RequestToken,
    pub result: Result<IntrinsicSize, ResolveError>,
}

/// What a lifecycle call started.
#[derive(Clone, Debug, PartialEq)]
pub enum Trigger {
    /// No resolution was needed.
    Idle,
    /// Size reset, but there is no source to resolve.
    Skipped,
    /// A bundled asset was resolved synchronously.
    Settled(Completion),
    /// A remote probe is outstanding.
    Pending(ProbeRequest),
}

/// Everything the platform primitive should be rendered with.
#[derive(Debug, PartialEq)]
pub struct Rendered<'a, C> {
    /// `None` while an aspect-fill image is still unsized.
    pub source: Option<&'a ImageSource>,
    /// Container style, then host style, then the computed size.
    pub style: Style,
    /// The computed size alone, if any.
    pub computed: Option<ResolvedStyle>,
    pub resize_mode: ResizeMode,
    pub children: &'a C,
}

/// One aspect-fill image: props, lifecycle, and render output.
pub struct ScaleImage<A, C = ()> {
    props: ImageProps,
    assets: A,
    container_style: Style,
    image_ref: Option<ImageRef>,
    children: C,
    tracker: SizeTracker,
    mounted: bool,
}

impl<A: AssetResolver> ScaleImage<A> {
    pub fn new(props: ImageProps, assets: A) -> Self {
        Self {
            props,
            assets,
            container_style: Style::new(),
            image_ref: None,
            children: (),
            tracker: SizeTracker::new(),
            mounted: false,
        }
    }
}

impl<A: AssetResolver, C> ScaleImage<A, C> {
    /// Replace the passthrough children.
    pub fn with_children<D>(self, children: D) -> ScaleImage<A, D> {
        ScaleImage {
            props: self.props,
            assets: self.assets,
            container_style: self.container_style,
            image_ref: self.image_ref,
            children,
            tracker: self.tracker,
            mounted: self.mounted,
        }
    }

    /// Base style layered under the host style.
    pub fn with_container_style(mut self, style: Style) -> Self {
        self.container_style = style;
        self
    }

    /// Install the primitive handle callback.
    pub fn with_image_ref(
        mut self,
        image_ref: impl FnMut(PrimitiveHandle) -> PrimitiveHandle + 'static,
    ) -> Self {
        self.image_ref = Some(Box::new(image_ref));
        self
    }

    /// First mount: always resolves, whatever the resize mode.
    pub fn mount(&mut self) -> Trigger {
        if self.mounted || self.tracker.is_detached() {
            return Trigger::Idle;
        }
        self.mounted = true;
        self.begin_resolution()
    }

    /// Replace the props, resolving again if [`needs_resolution`] says so.
    pub fn update(&mut self, next: ImageProps) -> Trigger {
        let retrigger =
            self.mounted && needs_resolution(self.props.resolve_inputs(), next.resolve_inputs());
        self.props = next;
        if retrigger {
            self.begin_resolution()
        } else {
            Trigger::Idle
        }
    }

    /// Apply a finished remote probe.
    pub fn complete(&mut self, response: ProbeResponse) -> Completion {
        self.tracker.complete(response.token, response.result)
    }

    /// Run a trigger to completion on the current task.
    ///
    /// Holds `&mut self` across the probe, so no update can race it. Hosts
    /// that need to keep updating while a probe runs should take the
    /// [`ProbeRequest`] out of the trigger and call [`complete`](Self::complete)
    /// themselves.
    pub async fn settle<P: SizeProbe + ?Sized>(
        &mut self,
        probe: &P,
        trigger: Trigger,
    ) -> Option<Completion> {
        match trigger {
            Trigger::Idle | Trigger::Skipped => None,
            Trigger::Settled(completion) => Some(completion),
            Trigger::Pending(request) => {
                let response = request.run(probe).await;
                Some(self.complete(response))
            }
        }
    }

    /// Tear down. Later completions are ignored.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.tracker.detach();
    }

    /// Compute the primitive's source and style from the current state.
    pub fn render(&self) -> Rendered<'_, C> {
        let mode = self.props.resize_mode;
        let intrinsic = self.tracker.intrinsic();
        let computed = compute_style(mode, intrinsic, &self.props.constraints());

        let mut style = Style::layered([&self.container_style, &self.props.style]);
        if let Some(size) = computed {
            style.merge(&Style::from(size));
        }

        let hidden = mode.is_aspect_fill() && !intrinsic.is_resolved();
        Rendered {
            source: if hidden { None } else { self.props.source.as_ref() },
            style,
            computed,
            resize_mode: mode,
            children: &self.children,
        }
    }

    /// Pass the primitive handle through the host's image ref.
    pub fn attach(&mut self, handle: PrimitiveHandle) -> PrimitiveHandle {
        match self.image_ref.as_mut() {
            Some(image_ref) => image_ref(handle),
            None => handle,
        }
    }

    pub fn props(&self) -> &ImageProps {
        &self.props
    }

    pub fn state(&self) -> SizeState {
        self.tracker.state()
    }

    pub fn intrinsic(&self) -> IntrinsicSize {
        self.tracker.intrinsic()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn children(&self) -> &C {
        &self.children
    }

    fn begin_resolution(&mut self) -> Trigger {
        let token = self.tracker.begin();
        log::debug!(
            "request {} resolving {:?} source",
            token.get(),
            SourceKind::of(self.props.source.as_ref())
        );
        match &self.props.source {
            None => {
                self.tracker.cancel(token);
                Trigger::Skipped
            }
            Some(ImageSource::Local(id)) => {
                let result = self.assets.resolve_asset(*id);
                Trigger::Settled(self.tracker.complete(token, result))
            }
            Some(ImageSource::Remote { uri }) => Trigger::Pending(ProbeRequest {
                token,
                uri: uri.clone(),
            }),
        }
    }
}
