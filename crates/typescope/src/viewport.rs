//! Keeping the drawn content framed in the viewport.
//!
//! The pan/zoom collaborator is created lazily, on the first refit. A refit
//! centers the content box in the viewport and zooms so that it fits with
//! some padding, never beyond a fraction of the maximum zoom. Animated refits
//! run as two phases, pan first and zoom second, stepped by a [`FrameClock`].

use std::time::Duration;

use log::{debug, trace};

use typescope_core::{
    geometry::{Bounds, Point},
    tween::{Lerp, Tween},
};

use crate::{
    clock::FrameClock,
    config::ViewportConfig,
    surface::{PanZoom, Surface, ViewportOptions},
};

/// Pan offset and zoom level a refit aims for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTarget {
    pub pan: Point,
    pub zoom: f32,
}

/// One frame of an animated refit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportStep {
    Pan(Point),
    Zoom(f32),
}

/// An animated refit waiting to be stepped by [`run_refit`].
#[derive(Debug, Clone, Copy)]
pub struct Refit {
    pan: Tween<Point>,
    zoom: Tween<f32>,
}

impl Refit {
    pub fn target(&self) -> FitTarget {
        FitTarget {
            pan: self.pan.target(),
            zoom: self.zoom.target(),
        }
    }
}

/// Computes and applies refits.
#[derive(Debug, Clone, Copy)]
pub struct ViewportController {
    max_zoom: f32,
    fit_padding: f32,
    zoom_cap: f32,
    duration: Duration,
}

impl ViewportController {
    pub fn new(config: &ViewportConfig, duration: Duration) -> Self {
        Self {
            max_zoom: config.max_zoom(),
            fit_padding: config.fit_padding(),
            zoom_cap: config.zoom_cap(),
            duration,
        }
    }

    /// Options the pan/zoom collaborator is created with.
    pub fn options(&self) -> ViewportOptions {
        ViewportOptions {
            max_zoom: self.max_zoom,
            fit: true,
            pan_enabled: false,
        }
    }

    /// Returns the pan/zoom collaborator in `slot`, creating it first if
    /// needed.
    pub fn ensure<'v, S: Surface>(
        &self,
        slot: &'v mut Option<S::Viewport>,
        surface: &mut S,
    ) -> &'v mut S::Viewport {
        slot.get_or_insert_with(|| {
            debug!(max_zoom = self.max_zoom; "Creating pan/zoom viewport");
            surface.create_viewport(self.options())
        })
    }

    /// Where pan and zoom should go to frame `content`.
    ///
    /// Returns `None` when there is nothing to frame or the viewport has no
    /// area.
    pub fn fit_target<V: PanZoom>(&self, viewport: &V, content: Option<Bounds>) -> Option<FitTarget> {
        let content = content?;
        let sizes = viewport.sizes();
        if content.to_size().is_empty() || sizes.is_empty() {
            return None;
        }

        let zoom = viewport.zoom_level();
        let on_screen = content.to_size().scale(zoom);
        let viewport_center = Point::new(sizes.width() / 2.0, sizes.height() / 2.0);
        let pan = viewport_center.sub_point(content.center().scale(zoom));

        let ratio = (on_screen.height() / sizes.height()).max(on_screen.width() / sizes.width());
        let zoom = (zoom / (self.fit_padding * ratio)).min(self.zoom_cap);

        Some(FitTarget { pan, zoom })
    }

    /// Refits the viewport in `slot` to the drawn content of `surface`.
    ///
    /// Without `animate` the viewport jumps to the target and `None` is
    /// returned. With `animate` nothing moves yet; the returned [`Refit`] is
    /// to be stepped with [`run_refit`].
    pub fn refit<S: Surface>(
        &self,
        slot: &mut Option<S::Viewport>,
        surface: &mut S,
        animate: bool,
    ) -> Option<Refit> {
        let content = surface.content_bounds();
        let viewport = self.ensure(slot, surface);
        viewport.update_bbox(content);

        let target = self.fit_target(viewport, content)?;
        debug!(
            pan_x = target.pan.x(),
            pan_y = target.pan.y(),
            zoom = target.zoom,
            animate;
            "Refitting viewport"
        );

        if !animate {
            viewport.pan(target.pan);
            viewport.zoom(target.zoom);
            return None;
        }

        Some(Refit {
            pan: Tween::new(viewport.pan_position(), target.pan, self.duration),
            zoom: Tween::new(viewport.zoom_level(), target.zoom, self.duration),
        })
    }
}

/// Steps an animated refit: the pan phase runs to completion before the zoom
/// phase starts.
///
/// `apply` receives every frame and returns false to abandon the refit. A
/// clock that stops advancing ends the current phase at its target.
pub async fn run_refit(refit: Refit, clock: &dyn FrameClock, apply: impl Fn(ViewportStep) -> bool) {
    if !run_phase(refit.pan, clock, |pan| apply(ViewportStep::Pan(pan))).await {
        trace!("Refit abandoned during pan");
        return;
    }
    if !run_phase(refit.zoom, clock, |zoom| apply(ViewportStep::Zoom(zoom))).await {
        trace!("Refit abandoned during zoom");
    }
}

async fn run_phase<T: Lerp>(
    tween: Tween<T>,
    clock: &dyn FrameClock,
    apply: impl Fn(T) -> bool,
) -> bool {
    let mut elapsed = Duration::ZERO;
    loop {
        let frame = clock.next_frame().await;
        elapsed = elapsed.saturating_add(frame);
        let finished = frame.is_zero() || tween.is_finished(elapsed);
        let value = if finished {
            tween.target()
        } else {
            tween.sample(elapsed)
        };
        if !apply(value) {
            return false;
        }
        if finished {
            return true;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use float_cmp::assert_approx_eq;
    use futures::executor::block_on;
    use typescope_core::{catalog::EntityKind, geometry::Size, identifier::Id};

    use super::*;
    use crate::{
        clock::FixedStepClock,
        headless::{HeadlessSurface, HeadlessViewport},
        surface::{Element, NodeSpec},
    };

    fn controller() -> ViewportController {
        ViewportController::new(&ViewportConfig::default(), Duration::from_millis(100))
    }

    fn viewport(width: f32, height: f32) -> HeadlessViewport {
        HeadlessViewport::new(Size::new(width, height), controller().options())
    }

    fn surface_with(bounds: &[(f32, f32, f32, f32)]) -> HeadlessSurface {
        let mut surface = HeadlessSurface::new(Size::new(1000.0, 500.0));
        for (idx, (x, y, w, h)) in bounds.iter().enumerate() {
            let node = surface
                .create_node(&NodeSpec {
                    id: Id::new(&format!("N{idx}")),
                    kind: EntityKind::Object,
                    title: String::new(),
                    in_ports: Vec::new(),
                    out_ports: Vec::new(),
                    size: Size::new(*w, *h),
                    position: Point::new(*x, *y),
                })
                .unwrap();
            surface.add_elements(&[Element::Node(node)]);
        }
        surface
    }

    #[test]
    fn test_fit_target_centers_and_pads() {
        let controller = controller();
        let viewport = viewport(1000.0, 500.0);
        let content = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(2000.0, 500.0));

        let target = controller.fit_target(&viewport, Some(content)).unwrap();
        assert!(target.pan.approx_eq(Point::new(-500.0, 0.0), 0.001));
        // 1 / (1.2 * max(500 / 500, 2000 / 1000))
        assert_approx_eq!(f32, target.zoom, 1.0 / 2.4, epsilon = 0.0001);
    }

    #[test]
    fn test_fit_target_caps_zoom() {
        let controller = controller();
        let viewport = viewport(1000.0, 500.0);
        let tiny = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(1.0, 1.0));

        let target = controller.fit_target(&viewport, Some(tiny)).unwrap();
        assert_approx_eq!(f32, target.zoom, 12.0);
    }

    #[test]
    fn test_fit_target_needs_content_and_area() {
        let controller = controller();
        assert!(controller.fit_target(&viewport(1000.0, 500.0), None).is_none());
        let content = Bounds::new_from_top_left(Point::default(), Size::new(10.0, 10.0));
        assert!(controller.fit_target(&viewport(0.0, 0.0), Some(content)).is_none());
    }

    #[test]
    fn test_viewport_is_created_lazily_once() {
        let controller = controller();
        let mut surface = surface_with(&[(0.0, 0.0, 100.0, 100.0)]);
        let mut slot: Option<HeadlessViewport> = None;

        controller.ensure(&mut slot, &mut surface).enable_pan();
        controller.ensure(&mut slot, &mut surface);
        assert!(slot.as_ref().unwrap().is_pan_enabled(), "not recreated");
    }

    #[test]
    fn test_unanimated_refit_jumps() {
        let controller = controller();
        let mut surface = surface_with(&[(0.0, 0.0, 400.0, 100.0), (600.0, 300.0, 400.0, 100.0)]);
        let mut slot = None;

        assert!(controller.refit(&mut slot, &mut surface, false).is_none());

        let viewport = slot.unwrap();
        let content = surface.content_bounds().unwrap();
        assert_eq!(viewport.content(), Some(content));
        let center = viewport.to_screen(content.center());
        assert!(center.approx_eq(Point::new(500.0, 250.0), 0.01));
        assert!(viewport.zoom_level() <= 12.0);
    }

    #[test]
    fn test_animated_refit_pans_then_zooms() {
        let controller = controller();
        let mut surface = surface_with(&[(0.0, 0.0, 400.0, 100.0), (600.0, 300.0, 400.0, 100.0)]);
        let mut slot = None;

        let refit = controller.refit(&mut slot, &mut surface, true).unwrap();
        let steps = RefCell::new(Vec::new());
        let clock = FixedStepClock::new(Duration::from_millis(30));
        block_on(run_refit(refit, &clock, |step| {
            steps.borrow_mut().push(step);
            true
        }));

        let steps = steps.into_inner();
        let first_zoom = steps
            .iter()
            .position(|step| matches!(step, ViewportStep::Zoom(_)))
            .unwrap();
        assert!(first_zoom > 0);
        assert!(
            steps[first_zoom..]
                .iter()
                .all(|step| matches!(step, ViewportStep::Zoom(_)))
        );
        assert_eq!(steps[first_zoom - 1], ViewportStep::Pan(refit.target().pan));
        assert_eq!(steps.last(), Some(&ViewportStep::Zoom(refit.target().zoom)));
        // 100ms at 30ms per frame: 4 frames per phase.
        assert_eq!(steps.len(), 8);
    }

    #[test]
    fn test_refit_can_be_abandoned() {
        let controller = controller();
        let mut surface = surface_with(&[(0.0, 0.0, 400.0, 100.0)]);
        let mut slot = None;
        let refit = controller.refit(&mut slot, &mut surface, true).unwrap();

        let frames = RefCell::new(0);
        block_on(run_refit(refit, &FixedStepClock::default(), |_| {
            *frames.borrow_mut() += 1;
            false
        }));
        assert_eq!(frames.into_inner(), 1);
    }
}
