//! Render pipeline vocabulary: states, loading events and run outcomes.

use std::{fmt, rc::Rc, str::FromStr};

use typescope_core::catalog::TypeCatalog;

use crate::{error::TypeGraphError, reconcile::Diff};

/// Stage of the render pipeline.
///
/// A run walks `Idle → Loading → Diffing → LayingOut → Animating → Idle`.
/// While runs overlap the state follows the newest one and only returns to
/// `Idle` once every run has ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PipelineState {
    #[default]
    Idle,
    Loading,
    Diffing,
    LayingOut,
    Animating,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Diffing => "diffing",
            Self::LayingOut => "laying-out",
            Self::Animating => "animating",
        };
        f.write_str(name)
    }
}

/// Events a host can subscribe to with [`TypeGraph::on`](crate::TypeGraph::on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingEvent {
    /// Fired when the pipeline leaves `Idle`.
    Start,
    /// Fired when the pipeline returns to `Idle`, whether the run succeeded
    /// or not.
    Stop,
}

impl LoadingEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "loading:start",
            Self::Stop => "loading:stop",
        }
    }
}

impl fmt::Display for LoadingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoadingEvent {
    type Err = TypeGraphError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "loading:start" => Ok(Self::Start),
            "loading:stop" => Ok(Self::Stop),
            _ => Err(TypeGraphError::UnknownEvent(name.to_string())),
        }
    }
}

pub(crate) type Hook = Rc<dyn Fn()>;

/// One callback per loading event; registering again replaces it.
#[derive(Default)]
pub(crate) struct EventHooks {
    start: Option<Hook>,
    stop: Option<Hook>,
}

impl EventHooks {
    pub(crate) fn set(&mut self, event: LoadingEvent, hook: Hook) {
        match event {
            LoadingEvent::Start => self.start = Some(hook),
            LoadingEvent::Stop => self.stop = Some(hook),
        }
    }

    pub(crate) fn get(&self, event: LoadingEvent) -> Option<Hook> {
        match event {
            LoadingEvent::Start => self.start.clone(),
            LoadingEvent::Stop => self.stop.clone(),
        }
    }
}

impl fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHooks")
            .field("start", &self.start.is_some())
            .field("stop", &self.stop.is_some())
            .finish()
    }
}

/// Inputs of one pipeline run, captured when the run starts.
///
/// Later changes to the controller (a new focus, a new catalog, toggling
/// animation) never leak into a run that is already in flight.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub generation: u64,
    pub catalog: Rc<TypeCatalog>,
    pub focus: String,
    pub animate: bool,
}

/// What a committed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub generation: u64,
    pub diff: Diff,
    /// Position tweens started by the run.
    pub tweens: usize,
}

/// Result of asking the pipeline to render.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The run completed and its results are on screen.
    Committed(RenderSummary),
    /// A newer run started before this one finished; this run stopped
    /// committing.
    Superseded,
    /// Nothing had to be rendered.
    Unchanged,
}

impl RenderOutcome {
    pub fn summary(&self) -> Option<&RenderSummary> {
        match self {
            Self::Committed(summary) => Some(summary),
            Self::Superseded | Self::Unchanged => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}
