//! The public controller driving the render pipeline.
//!
//! [`TypeGraph`] owns the drawing surface, the lazily created viewport and
//! the identity cache, and runs the pipeline whenever the focus or the catalog
//! changes. It is a cheap handle: clones share the same graph, so a host can
//! keep one for event dispatch while a render is in flight.
//!
//! Every run captures its inputs in a [`RenderContext`] and is tagged with a
//! generation number. A run that sees a newer generation at one of its
//! suspension points stops committing anything and reports
//! [`RenderOutcome::Superseded`].

use std::{cell::RefCell, collections::HashSet, fmt, rc::Rc};

use log::{debug, error, info, trace, warn};

use typescope_core::{
    catalog::TypeCatalog,
    geometry::Size,
    identifier::Id,
    introspection::{SchemaIntrospection, TypeIntrospection},
};

use crate::{
    animation::{AnimationController, reattach, run_tweens},
    cache::IdentityCache,
    clock::{FixedStepClock, FrameClock},
    config::{AppConfig, Theme},
    error::TypeGraphError,
    filter::{ROOT_FOCUS, select_render_set},
    interaction::{InteractionEvent, InteractionRouter},
    layout::{LayoutEngine, SugiyamaEngine},
    pipeline::{
        EventHooks, LoadingEvent, PipelineState, RenderContext, RenderOutcome, RenderSummary,
    },
    reconcile::Reconciler,
    surface::{EdgeKey, Element, PanZoom, Surface},
    viewport::{ViewportController, ViewportStep, run_refit},
};

/// Builder for [`TypeGraph`].
///
/// Every collaborator has a default: the layered [`SugiyamaEngine`], the
/// GraphQL flavored [`SchemaIntrospection`] and a [`FixedStepClock`] ticking
/// at the configured frame interval.
///
/// # Examples
///
/// ```
/// use typescope::{TypeGraph, TypeGraphBuilder, config::AppConfig, headless::HeadlessSurface};
/// use typescope_core::introspection::SchemaIntrospection;
///
/// let graph: TypeGraph<HeadlessSurface> = TypeGraphBuilder::new(AppConfig::default())
///     .with_introspection(SchemaIntrospection::default().with_hidden(["Secret"]))
///     .build()
///     .unwrap();
/// assert!(!graph.is_initialized());
/// ```
pub struct TypeGraphBuilder {
    config: AppConfig,
    engine: Option<Box<dyn LayoutEngine>>,
    introspection: Option<Box<dyn TypeIntrospection>>,
    clock: Option<Rc<dyn FrameClock>>,
}

impl TypeGraphBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            engine: None,
            introspection: None,
            clock: None,
        }
    }

    /// Replaces the layout engine.
    pub fn with_engine(mut self, engine: impl LayoutEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Replaces the type predicates.
    pub fn with_introspection(mut self, introspection: impl TypeIntrospection + 'static) -> Self {
        self.introspection = Some(Box::new(introspection));
        self
    }

    /// Replaces the clock stepping viewport tweens.
    pub fn with_clock(mut self, clock: impl FrameClock + 'static) -> Self {
        self.clock = Some(Rc::new(clock));
        self
    }

    /// Builds an uninitialized graph.
    ///
    /// # Errors
    ///
    /// Returns [`TypeGraphError::Config`] when the configuration is invalid.
    pub fn build<S: Surface>(self) -> Result<TypeGraph<S>, TypeGraphError> {
        self.config.validate()?;
        let theme = self.config.theme()?;
        let duration = self.config.animation().transition_duration();

        let shared = Shared {
            engine: self
                .engine
                .unwrap_or_else(|| Box::new(SugiyamaEngine::default())),
            introspection: self
                .introspection
                .unwrap_or_else(|| Box::new(SchemaIntrospection::default())),
            clock: self.clock.unwrap_or_else(|| {
                Rc::new(FixedStepClock::new(self.config.animation().frame_interval()))
            }),
            animation: AnimationController::new(duration),
            viewport_controller: ViewportController::new(self.config.viewport(), duration),
            router: InteractionRouter::new(&theme, duration),
            animate: self.config.animation().enabled(),
            theme,
            config: self.config,
            surface: None,
            viewport: None,
            cache: IdentityCache::new(),
            catalog: Rc::new(TypeCatalog::default()),
            focus: ROOT_FOCUS.to_string(),
            generation: 0,
            active_runs: 0,
            state: PipelineState::Idle,
            hooks: EventHooks::default(),
            desired_edges: HashSet::new(),
            render_set: Vec::new(),
        };

        Ok(TypeGraph {
            shared: Rc::new(RefCell::new(shared)),
        })
    }
}

impl Default for TypeGraphBuilder {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

struct Shared<S: Surface> {
    config: AppConfig,
    theme: Theme,
    engine: Box<dyn LayoutEngine>,
    introspection: Box<dyn TypeIntrospection>,
    clock: Rc<dyn FrameClock>,
    animation: AnimationController,
    viewport_controller: ViewportController,
    router: InteractionRouter,

    surface: Option<S>,
    viewport: Option<S::Viewport>,
    cache: IdentityCache,
    catalog: Rc<TypeCatalog>,
    focus: String,
    animate: bool,

    generation: u64,
    active_runs: usize,
    state: PipelineState,
    hooks: EventHooks,

    /// Edges of the latest render set; detached edges only come back if they
    /// are still in here.
    desired_edges: HashSet<EdgeKey>,
    render_set: Vec<Id>,
}

impl<S: Surface> Shared<S> {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Drops the surface and everything that refers to its handles.
    fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.clear();
        }
        self.viewport = None;
        self.cache.clear();
        self.desired_edges.clear();
        self.render_set.clear();
        // In-flight runs belong to the dropped surface.
        self.generation += 1;
    }
}

/// Renders a type catalog as a graph centered on a focus entity.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use typescope::{TypeGraph, TypeGraphBuilder, headless::HeadlessSurface};
/// use typescope_core::{
///     catalog::{EntityKind, TypeCatalog},
///     geometry::Size,
///     identifier::Id,
/// };
///
/// let catalog = TypeCatalog::builder()
///     .entity("Query", EntityKind::Object, [("user", "User")])
///     .entity("User", EntityKind::Object, [("name", "String")])
///     .build()
///     .unwrap();
///
/// let graph: TypeGraph<HeadlessSurface> = TypeGraphBuilder::default().build().unwrap();
/// block_on(graph.init((), Size::new(800.0, 600.0), catalog)).unwrap();
///
/// assert_eq!(graph.render_set(), vec![Id::new("Query"), Id::new("User")]);
/// assert_eq!(graph.drawn_edge_keys().len(), 1);
/// ```
pub struct TypeGraph<S: Surface> {
    shared: Rc<RefCell<Shared<S>>>,
}

impl<S: Surface> Clone for TypeGraph<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S: Surface> fmt::Debug for TypeGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("TypeGraph")
            .field("focus", &shared.focus)
            .field("state", &shared.state)
            .field("generation", &shared.generation)
            .field("initialized", &shared.surface.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: Surface> TypeGraph<S> {
    /// Mounts the drawing surface and performs the first render.
    ///
    /// The first render never tweens; it ends with the viewport fitted to the
    /// content. Initializing an initialized graph tears the old surface down
    /// first.
    ///
    /// # Arguments
    ///
    /// * `container` - Whatever the surface mounts into.
    /// * `size` - Size of the drawing surface.
    /// * `catalog` - The type catalog to render.
    ///
    /// # Errors
    ///
    /// Returns [`TypeGraphError::Rendering`] when mounting or drawing fails
    /// and [`TypeGraphError::Layout`] when the layout engine fails.
    pub async fn init(
        &self,
        container: S::Container,
        size: Size,
        catalog: TypeCatalog,
    ) -> Result<RenderOutcome, TypeGraphError> {
        let surface = S::mount(container, size)?;
        {
            let mut shared = self.shared.borrow_mut();
            if shared.surface.is_some() {
                warn!("Type graph initialized twice, dropping the previous surface");
                shared.teardown();
            }
            info!(
                width = size.width(),
                height = size.height(),
                types = catalog.len();
                "Initializing type graph"
            );
            shared.surface = Some(surface);
            shared.catalog = Rc::new(catalog);
            if !focus_exists(&shared.catalog, &shared.focus) {
                shared.focus = ROOT_FOCUS.to_string();
            }
        }
        self.render(Some(false)).await
    }

    /// Re-renders against a new catalog, keeping the focus when it still
    /// exists and returning to `root` otherwise.
    ///
    /// Cached elements whose entity changed shape are evicted first; those
    /// still drawn are removed so the render builds them afresh. When that
    /// removal fails the cache and the catalog are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TypeGraphError::NotInitialized`] before [`TypeGraph::init`],
    /// otherwise any pipeline error.
    pub async fn set_type_catalog(
        &self,
        catalog: TypeCatalog,
    ) -> Result<RenderOutcome, TypeGraphError> {
        {
            let mut guard = self.shared.borrow_mut();
            let shared = &mut *guard;
            let surface = shared
                .surface
                .as_mut()
                .ok_or(TypeGraphError::NotInitialized)?;

            let evicted = shared.cache.stale(&catalog);
            if !evicted.is_empty() {
                let elements = evicted.elements();
                let drawn: Vec<Element> = elements
                    .iter()
                    .copied()
                    .filter(|element| surface.is_drawn(*element))
                    .collect();
                if !drawn.is_empty() {
                    surface.remove_elements(&drawn)?;
                }
                shared.cache.evict(&evicted);
                for element in elements {
                    surface.dispose(element);
                }
                debug!(
                    nodes = evicted.nodes.len(),
                    edges = evicted.edges.len(),
                    removed = drawn.len();
                    "Evicted stale cache entries"
                );
            }

            shared.catalog = Rc::new(catalog);
            if !focus_exists(&shared.catalog, &shared.focus) {
                warn!(focus = shared.focus; "Focus missing from the new catalog, returning to root");
                shared.focus = ROOT_FOCUS.to_string();
            }
        }
        self.render(None).await
    }

    /// Re-renders centered on `id`.
    ///
    /// Focusing the current focus does nothing. `root` is always accepted;
    /// any other id must be a drawn node.
    ///
    /// # Errors
    ///
    /// Returns [`TypeGraphError::InvalidFocus`] when `id` is not drawn,
    /// otherwise any pipeline error.
    pub async fn set_focus(&self, id: &str) -> Result<RenderOutcome, TypeGraphError> {
        {
            let mut shared = self.shared.borrow_mut();
            let surface = shared
                .surface
                .as_ref()
                .ok_or(TypeGraphError::NotInitialized)?;

            if shared.focus == id {
                debug!(focus = id; "Focus unchanged");
                return Ok(RenderOutcome::Unchanged);
            }
            let drawn = surface
                .nodes()
                .into_iter()
                .any(|node| surface.node_id(node).is_some_and(|node_id| node_id == id));
            if id != ROOT_FOCUS && !drawn {
                warn!(focus = id; "Rejected focus on an element that is not drawn");
                return Err(TypeGraphError::InvalidFocus { id: id.to_string() });
            }
            shared.focus = id.to_string();
        }
        self.render(None).await
    }

    /// Resizes the drawing surface and resets the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`TypeGraphError::NotInitialized`] before [`TypeGraph::init`].
    pub fn set_size(&self, size: Size) -> Result<(), TypeGraphError> {
        let mut guard = self.shared.borrow_mut();
        let shared = &mut *guard;
        let surface = shared
            .surface
            .as_mut()
            .ok_or(TypeGraphError::NotInitialized)?;

        debug!(width = size.width(), height = size.height(); "Resizing type graph");
        surface.set_size(size);
        shared.router.handle(
            &InteractionEvent::Resize(size),
            surface,
            shared.viewport.as_mut(),
        );
        Ok(())
    }

    /// Makes later renders tween.
    pub fn enable_animation(&self) {
        self.shared.borrow_mut().animate = true;
    }

    /// Makes later renders jump straight to their layout.
    pub fn disable_animation(&self) {
        self.shared.borrow_mut().animate = false;
    }

    pub fn is_animation_enabled(&self) -> bool {
        self.shared.borrow().animate
    }

    /// Registers the callback for `event`, replacing any earlier one.
    pub fn on(&self, event: LoadingEvent, hook: impl Fn() + 'static) {
        self.shared.borrow_mut().hooks.set(event, Rc::new(hook));
    }

    /// Releases the drawn graph, the drawing surface and the identity cache.
    ///
    /// Runs still in flight stop committing. The focus is kept for the next
    /// [`TypeGraph::init`].
    pub fn destroy(&self) {
        let mut shared = self.shared.borrow_mut();
        if shared.surface.is_none() {
            return;
        }
        info!(focus = shared.focus; "Destroying type graph");
        shared.teardown();
    }

    /// Routes a pointer or window event.
    ///
    /// Clicks turn into [`TypeGraph::set_focus`]; every other event returns
    /// [`RenderOutcome::Unchanged`].
    ///
    /// # Errors
    ///
    /// Returns [`TypeGraphError::NotInitialized`] before [`TypeGraph::init`],
    /// otherwise whatever the triggered render returns.
    pub async fn dispatch(&self, event: InteractionEvent) -> Result<RenderOutcome, TypeGraphError> {
        let focus = {
            let mut guard = self.shared.borrow_mut();
            let shared = &mut *guard;
            let surface = shared
                .surface
                .as_mut()
                .ok_or(TypeGraphError::NotInitialized)?;
            shared
                .router
                .handle(&event, surface, shared.viewport.as_mut())
        };

        match focus {
            Some(id) => self.set_focus(&id.to_text()).await,
            None => Ok(RenderOutcome::Unchanged),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.borrow().surface.is_some()
    }

    pub fn state(&self) -> PipelineState {
        self.shared.borrow().state
    }

    pub fn focus(&self) -> String {
        self.shared.borrow().focus.clone()
    }

    /// Generation of the most recent run.
    pub fn generation(&self) -> u64 {
        self.shared.borrow().generation
    }

    /// Ids of the drawn nodes, back to front.
    pub fn drawn_node_ids(&self) -> Vec<Id> {
        self.with_surface(|surface| {
            surface
                .nodes()
                .into_iter()
                .filter_map(|node| surface.node_id(node))
                .collect()
        })
        .unwrap_or_default()
    }

    /// Keys of the drawn edges, back to front.
    pub fn drawn_edge_keys(&self) -> Vec<EdgeKey> {
        self.with_surface(|surface| {
            surface
                .edges()
                .into_iter()
                .filter_map(|edge| surface.edge_key(edge))
                .collect()
        })
        .unwrap_or_default()
    }

    /// Entities selected by the latest run, in catalog order.
    pub fn render_set(&self) -> Vec<Id> {
        self.shared.borrow().render_set.clone()
    }

    /// Runs `f` on the drawing surface, if mounted.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        self.shared.borrow_mut().surface.as_mut().map(f)
    }

    /// Runs `f` on the viewport, if one was created.
    pub fn with_viewport<R>(&self, f: impl FnOnce(&mut S::Viewport) -> R) -> Option<R> {
        self.shared.borrow_mut().viewport.as_mut().map(f)
    }

    /// Forgets every cached element. Cached elements that are not drawn are
    /// released; drawn ones stay until they leave the render set.
    pub fn clear_cache(&self) {
        let mut guard = self.shared.borrow_mut();
        let shared = &mut *guard;
        let evicted = shared.cache.clear();
        if let Some(surface) = shared.surface.as_mut() {
            for element in evicted.elements() {
                if !surface.is_drawn(element) {
                    surface.dispose(element);
                }
            }
        }
        debug!(nodes = evicted.nodes.len(), edges = evicted.edges.len(); "Cleared identity cache");
    }

    async fn render(&self, animate: Option<bool>) -> Result<RenderOutcome, TypeGraphError> {
        let context = self.begin(animate);
        let result = self.run(&context).await;
        self.finish(&context, &result);
        result
    }

    fn begin(&self, animate: Option<bool>) -> RenderContext {
        let (context, hook) = {
            let mut shared = self.shared.borrow_mut();
            shared.generation += 1;
            shared.active_runs += 1;
            shared.state = PipelineState::Loading;
            let context = RenderContext {
                generation: shared.generation,
                catalog: Rc::clone(&shared.catalog),
                focus: shared.focus.clone(),
                animate: animate.unwrap_or(shared.animate),
            };
            let hook = if shared.active_runs == 1 {
                shared.hooks.get(LoadingEvent::Start)
            } else {
                None
            };
            (context, hook)
        };

        info!(
            focus = context.focus,
            generation = context.generation,
            animate = context.animate;
            "Rendering type graph"
        );
        if let Some(hook) = hook {
            hook();
        }
        context
    }

    async fn run(&self, context: &RenderContext) -> Result<RenderOutcome, TypeGraphError> {
        let (diff, tweens) = {
            let mut guard = self.shared.borrow_mut();
            let shared = &mut *guard;
            if !shared.is_current(context.generation) {
                return Ok(RenderOutcome::Superseded);
            }
            let surface = shared
                .surface
                .as_mut()
                .ok_or(TypeGraphError::NotInitialized)?;

            shared.state = PipelineState::Diffing;
            let desired = select_render_set(
                &context.catalog,
                &context.focus,
                shared.introspection.as_ref(),
            );
            let diff = Reconciler::new(shared.introspection.as_ref(), &shared.theme).reconcile(
                surface,
                &mut shared.cache,
                &context.catalog,
                &desired,
            )?;
            shared.render_set = desired.iter().map(|entity| entity.id()).collect();
            shared.desired_edges = diff.desired_edges.iter().copied().collect();

            shared.state = PipelineState::LayingOut;
            let options = shared.config.layout().options();
            let tweens = shared.animation.apply_layout(
                surface,
                shared.engine.as_ref(),
                &options,
                &diff.desired_edges,
                context.animate,
            )?;

            shared.state = PipelineState::Animating;
            (diff, tweens)
        };

        let tween_count = tweens.len();
        if !tweens.is_empty() {
            let shared = Rc::clone(&self.shared);
            let generation = context.generation;
            run_tweens(tweens, move |node, detached| {
                let mut guard = shared.borrow_mut();
                let shared = &mut *guard;
                if !shared.is_current(generation) {
                    trace!(node = node.raw(), generation; "Ignoring landing of a superseded run");
                    return;
                }
                if let Some(surface) = shared.surface.as_mut() {
                    reattach(surface, detached, &shared.desired_edges);
                }
            })
            .await;
        }

        let (refit, clock) = {
            let mut guard = self.shared.borrow_mut();
            let shared = &mut *guard;
            if !shared.is_current(context.generation) {
                return Ok(RenderOutcome::Superseded);
            }
            let surface = shared
                .surface
                .as_mut()
                .ok_or(TypeGraphError::NotInitialized)?;
            let refit =
                shared
                    .viewport_controller
                    .refit(&mut shared.viewport, surface, context.animate);
            (refit, Rc::clone(&shared.clock))
        };

        if let Some(refit) = refit {
            let shared = Rc::clone(&self.shared);
            let generation = context.generation;
            run_refit(refit, clock.as_ref(), |step| {
                let mut guard = shared.borrow_mut();
                let shared = &mut *guard;
                if !shared.is_current(generation) {
                    return false;
                }
                let Some(viewport) = shared.viewport.as_mut() else {
                    return false;
                };
                match step {
                    ViewportStep::Pan(to) => viewport.pan(to),
                    ViewportStep::Zoom(level) => viewport.zoom(level),
                }
                true
            })
            .await;
        }

        if !self.shared.borrow().is_current(context.generation) {
            return Ok(RenderOutcome::Superseded);
        }
        Ok(RenderOutcome::Committed(RenderSummary {
            generation: context.generation,
            diff,
            tweens: tween_count,
        }))
    }

    fn finish(&self, context: &RenderContext, result: &Result<RenderOutcome, TypeGraphError>) {
        let hook = {
            let mut shared = self.shared.borrow_mut();
            shared.active_runs = shared.active_runs.saturating_sub(1);
            if shared.active_runs == 0 {
                shared.state = PipelineState::Idle;
                shared.hooks.get(LoadingEvent::Stop)
            } else {
                None
            }
        };

        match result {
            Ok(RenderOutcome::Committed(summary)) => info!(
                generation = context.generation,
                added_nodes = summary.diff.added_nodes.len(),
                removed_nodes = summary.diff.removed_nodes.len(),
                added_edges = summary.diff.added_edges.len(),
                removed_edges = summary.diff.removed_edges.len(),
                tweens = summary.tweens;
                "Render committed"
            ),
            Ok(RenderOutcome::Superseded) => {
                warn!(generation = context.generation; "Render superseded by a newer run")
            }
            Ok(RenderOutcome::Unchanged) => {}
            Err(err) => error!(generation = context.generation, err:%; "Render failed"),
        }

        if let Some(hook) = hook {
            hook();
        }
    }
}

fn focus_exists(catalog: &TypeCatalog, focus: &str) -> bool {
    focus == ROOT_FOCUS || catalog.contains(Id::new(focus))
}
