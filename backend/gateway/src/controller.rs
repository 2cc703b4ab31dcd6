//! Presentation controller.
//!
//! A synchronous state machine per session. It never performs I/O: starting an
//! analysis is returned as an [`Effect`] for the caller to run outside any lock.

use std::sync::Arc;

use tracing::debug;

use finsight_core::TriggerPolicy;
use finsight_media::CapturedImage;

use crate::pipeline::CycleReport;

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    ImageAcquired {
        image: Arc<CapturedImage>,
    },
    Analyzing {
        image: Arc<CapturedImage>,
        cycle: u64,
    },
    Displaying {
        image: Arc<CapturedImage>,
        report: Arc<CycleReport>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ImageAcquired { .. } => "image_acquired",
            Self::Analyzing { .. } => "analyzing",
            Self::Displaying { .. } => "displaying",
        }
    }

    pub fn image(&self) -> Option<&Arc<CapturedImage>> {
        match self {
            Self::Idle => None,
            Self::ImageAcquired { image }
            | Self::Analyzing { image, .. }
            | Self::Displaying { image, .. } => Some(image),
        }
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    ImageProvided(CapturedImage),
    /// A new submission could not be turned into an image.
    ImageRejected,
    AnalysisRequested,
    AnalysisCompleted { cycle: u64, report: CycleReport },
}

#[derive(Debug)]
pub enum Effect {
    None,
    StartAnalysis { cycle: u64, image: Arc<CapturedImage> },
}

#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    trigger: TriggerPolicy,
    cycle: u64,
}

impl SessionController {
    pub fn new(trigger: TriggerPolicy) -> Self {
        Self {
            state: SessionState::Idle,
            trigger,
            cycle: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn trigger(&self) -> TriggerPolicy {
        self.trigger
    }

    /// Latest cycle number handed out.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn handle(&mut self, event: SessionEvent) -> Effect {
        match event {
            SessionEvent::ImageProvided(image) => {
                let image = Arc::new(image);
                self.cycle += 1;
                match self.trigger {
                    TriggerPolicy::Automatic => self.start(image),
                    TriggerPolicy::Manual => {
                        self.state = SessionState::ImageAcquired { image };
                        Effect::None
                    }
                }
            }
            SessionEvent::ImageRejected => {
                // Bumping the cycle turns any in-flight completion stale.
                self.cycle += 1;
                self.state = SessionState::Idle;
                Effect::None
            }
            SessionEvent::AnalysisRequested => match &self.state {
                SessionState::ImageAcquired { image } | SessionState::Displaying { image, .. } => {
                    let image = Arc::clone(image);
                    self.cycle += 1;
                    self.start(image)
                }
                SessionState::Idle | SessionState::Analyzing { .. } => {
                    debug!(state = self.state.name(), "Ignoring analysis request");
                    Effect::None
                }
            },
            SessionEvent::AnalysisCompleted { cycle, report } => {
                match &self.state {
                    SessionState::Analyzing { image, cycle: current } if *current == cycle => {
                        self.state = SessionState::Displaying {
                            image: Arc::clone(image),
                            report: Arc::new(report),
                        };
                    }
                    _ => debug!(cycle, current = self.cycle, "Discarding stale analysis result"),
                }
                Effect::None
            }
        }
    }

    fn start(&mut self, image: Arc<CapturedImage>) -> Effect {
        self.state = SessionState::Analyzing {
            image: Arc::clone(&image),
            cycle: self.cycle,
        };
        Effect::StartAnalysis {
            cycle: self.cycle,
            image,
        }
    }
}
