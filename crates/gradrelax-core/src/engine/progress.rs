use crate::engine::state::Termination;

/// Events emitted while a relaxation runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// The epoch loop is about to start.
    RunStart { epochs: usize },
    Epoch {
        epoch: usize,
        loss: f64,
        learning_rate: f64,
    },
    /// Backbone translations take part in the transform from this epoch on.
    BackboneUnlocked { epoch: usize },
    RunFinish {
        epochs_run: usize,
        termination: Termination,
    },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional observer; silent by default.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    observer: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self { observer: None }
    }

    pub fn with_callback(observer: ProgressCallback<'a>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.observer.is_none()
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(observer) = self.observer.as_ref() {
            observer(event);
        }
    }
}
