//! Mount / update / complete / unmount against real async probes.
//!
//! `Gate` hands out a oneshot per probe so the test decides when, and in
//! which order, each probe finishes.

use std::cell::RefCell;
use std::future::Future;

use tokio::sync::oneshot;
use zenscale::*;

type ProbeResult = Result<IntrinsicSize, ResolveError>;

#[derive(Default)]
struct Gate {
    waiting: RefCell<Vec<(String, oneshot::Sender<ProbeResult>)>>,
}

impl Gate {
    /// Finish the probe for `uri`.
    fn release(&self, uri: &str, result: ProbeResult) {
        let mut waiting = self.waiting.borrow_mut();
        let idx = waiting
            .iter()
            .position(|(u, _)| u == uri)
            .unwrap_or_else(|| panic!("no probe waiting for {uri}"));
        let (_, tx) = waiting.remove(idx);
        tx.send(result).expect("probe receiver alive");
    }

    fn waiting(&self) -> usize {
        self.waiting.borrow().len()
    }
}

impl SizeProbe for Gate {
    fn probe(&self, uri: &str) -> impl Future<Output = ProbeResult> {
        let (tx, rx) = oneshot::channel();
        self.waiting.borrow_mut().push((uri.to_owned(), tx));
        let uri = uri.to_owned();
        async move {
            rx.await
                .unwrap_or_else(|_| Err(ResolveError::probe_failed(uri, "probe dropped")))
        }
    }
}

fn size(w: f64, h: f64) -> IntrinsicSize {
    IntrinsicSize::new(w, h).unwrap()
}

fn remote(uri: &str) -> ImageProps {
    ImageProps::new().source(ImageSource::remote(uri))
}

fn take_request(trigger: Trigger) -> ProbeRequest {
    match trigger {
        Trigger::Pending(req) => req,
        other => panic!("expected a pending probe, got {other:?}"),
    }
}

// ============================================================
// Single probe
// ============================================================

#[tokio::test]
async fn remote_image_renders_after_probe() {
    let gate = Gate::default();
    let props = remote("https://cdn/a.jpg").style(Style::new().with("width", 300.0));
    let mut image = ScaleImage::new(props, AssetTable::new());

    let request = take_request(image.mount());

    // Reset shows nothing until the probe lands
    let before = image.render();
    assert_eq!(before.source, None);
    assert_eq!(before.computed, None);
    assert_eq!(image.intrinsic(), IntrinsicSize::UNRESOLVED);

    let (response, ()) = tokio::join!(request.run(&gate), async {
        tokio::task::yield_now().await;
        gate.release("https://cdn/a.jpg", Ok(size(600.0, 400.0)));
    });
    assert_eq!(image.complete(response), Completion::Applied(size(600.0, 400.0)));

    let after = image.render();
    assert_eq!(after.source, Some(&ImageSource::remote("https://cdn/a.jpg")));
    assert_eq!(after.computed, Some(ResolvedStyle::new(300.0, 200.0)));
    assert_eq!(after.style.number("height"), Some(200.0));
}

#[tokio::test]
async fn failed_probe_keeps_image_hidden() {
    let probe = |uri: &str| {
        let uri = uri.to_owned();
        async move {
            Err::<IntrinsicSize, _>(ResolveError::probe_failed(uri, "connection refused"))
        }
    };
    let mut image = ScaleImage::new(remote("https://cdn/missing.jpg"), AssetTable::new());

    let trigger = image.mount();
    let completion = image.settle(&probe, trigger).await;
    assert_eq!(
        completion,
        Some(Completion::Failed(ResolveError::probe_failed(
            "https://cdn/missing.jpg",
            "connection refused"
        )))
    );
    assert_eq!(image.state(), SizeState::Unresolved);
    assert_eq!(image.render().source, None);
}

#[tokio::test]
async fn settle_runs_closure_probe() {
    let probe = |_uri: &str| async { IntrinsicSize::try_from((100u32, 50u32)) };
    let props = remote("https://cdn/b.png").style(Style::new().with("minWidth", 300.0));
    let mut image = ScaleImage::new(props, AssetTable::new());

    let trigger = image.mount();
    image.settle(&probe, trigger).await;
    assert_eq!(
        image.render().computed,
        Some(ResolvedStyle::new(300.0, 150.0))
    );
}

#[tokio::test]
async fn resolve_size_dispatches_on_source() {
    let assets = AssetTable::new().with(AssetId(4), 12, 6);
    let probe = |_uri: &str| async { IntrinsicSize::try_from((800u32, 600u32)) };

    assert_eq!(
        resolve_size(&assets, &probe, &ImageSource::local(4)).await,
        Ok(size(12.0, 6.0))
    );
    assert_eq!(
        resolve_size(&assets, &probe, &ImageSource::remote("https://cdn/c.png")).await,
        Ok(size(800.0, 600.0))
    );
}

// ============================================================
// Overlapping probes
// ============================================================

#[tokio::test]
async fn older_probe_finishing_last_is_discarded() {
    let gate = Gate::default();
    let mut image = ScaleImage::new(remote("https://cdn/old.jpg"), AssetTable::new());

    let old = take_request(image.mount());
    let new = take_request(image.update(remote("https://cdn/new.jpg")));
    assert!(new.token() > old.token());

    // The newer probe finishes first, the older one last.
    let (old_resp, new_resp, ()) = tokio::join!(old.run(&gate), new.run(&gate), async {
        tokio::task::yield_now().await;
        assert_eq!(gate.waiting(), 2);
        gate.release("https://cdn/new.jpg", Ok(size(20.0, 10.0)));
        gate.release("https://cdn/old.jpg", Ok(size(99.0, 99.0)));
    });

    assert_eq!(image.complete(new_resp), Completion::Applied(size(20.0, 10.0)));
    assert_eq!(image.complete(old_resp), Completion::Stale);
    assert_eq!(image.intrinsic(), size(20.0, 10.0));
}

#[tokio::test]
async fn older_probe_finishing_first_does_not_flash() {
    let gate = Gate::default();
    let mut image = ScaleImage::new(remote("https://cdn/old.jpg"), AssetTable::new());

    let old = take_request(image.mount());
    let new = take_request(image.update(remote("https://cdn/new.jpg")));

    let (old_resp, new_resp, ()) = tokio::join!(old.run(&gate), new.run(&gate), async {
        tokio::task::yield_now().await;
        gate.release("https://cdn/old.jpg", Ok(size(99.0, 99.0)));
        gate.release("https://cdn/new.jpg", Ok(size(20.0, 10.0)));
    });

    assert_eq!(image.complete(old_resp), Completion::Stale);
    assert_eq!(image.render().source, None);
    assert!(matches!(image.complete(new_resp), Completion::Applied(_)));
}

#[tokio::test]
async fn probe_landing_after_unmount_is_ignored() {
    let gate = Gate::default();
    let mut image = ScaleImage::new(remote("https://cdn/a.jpg"), AssetTable::new());
    let request = take_request(image.mount());

    let (response, ()) = tokio::join!(request.run(&gate), async {
        tokio::task::yield_now().await;
        gate.release("https://cdn/a.jpg", Ok(size(1.0, 1.0)));
    });

    image.unmount();
    assert_eq!(image.complete(response), Completion::Detached);
    assert_eq!(image.intrinsic(), IntrinsicSize::UNRESOLVED);
}

// ============================================================
// Re-trigger policy through the controller
// ============================================================

#[test]
fn uri_change_in_stretch_resolves_again() {
    let mut image = ScaleImage::new(remote("https://cdn/1.jpg"), AssetTable::new());
    let first = take_request(image.mount());
    image.complete(first.respond(Ok(size(10.0, 10.0))));

    let trigger = image.update(remote("https://cdn/2.jpg"));
    assert_eq!(take_request(trigger).uri(), "https://cdn/2.jpg");
    assert_eq!(image.state(), SizeState::Unresolved);
}

#[test]
fn uri_change_in_cover_does_not_resolve() {
    let cover = |uri: &str| remote(uri).resize_mode(ResizeMode::Cover);
    let mut image = ScaleImage::new(cover("https://cdn/1.jpg"), AssetTable::new());
    let first = take_request(image.mount());
    image.complete(first.respond(Ok(size(10.0, 10.0))));

    assert_eq!(image.update(cover("https://cdn/2.jpg")), Trigger::Idle);
    let out = image.render();
    assert_eq!(out.source, Some(&ImageSource::remote("https://cdn/2.jpg")));
    assert_eq!(out.computed, None);
}

#[test]
fn switching_back_to_stretch_resolves_again() {
    let assets = AssetTable::new().with(AssetId(1), 100, 50);
    let local = ImageProps::new().source(ImageSource::local(1));
    let mut image = ScaleImage::new(local.clone().resize_mode(ResizeMode::Contain), &assets);
    image.mount();

    let trigger = image.update(local);
    assert_eq!(
        trigger,
        Trigger::Settled(Completion::Applied(size(100.0, 50.0)))
    );
}

#[test]
fn hung_probe_never_renders_in_stretch() {
    let mut image = ScaleImage::new(remote("https://cdn/slow.jpg"), AssetTable::new());
    let _never_completed = take_request(image.mount());
    for _ in 0..3 {
        assert_eq!(image.render().source, None);
    }
}
