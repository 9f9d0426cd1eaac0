use std::fmt;

use serde::Serialize;

/// Ordered pipeline stages; a run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    DetectParameter,
    Retrieve,
    GenerateSections,
    Assemble,
    Done,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::DetectParameter => "detect_parameter",
            Self::Retrieve => "retrieve",
            Self::GenerateSections => "generate_sections",
            Self::Assemble => "assemble",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of user-visible progress steps.
pub const TOTAL_STEPS: u8 = 6;

/// Status updates emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started {
        step: u8,
        stage: Stage,
        message: String,
    },
    Completed {
        step: u8,
        stage: Stage,
        message: String,
        percent: u8,
    },
    Notice {
        stage: Stage,
        message: String,
    },
    Failed {
        stage: Stage,
        message: String,
    },
}

impl ProgressEvent {
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Started { stage, .. }
            | Self::Completed { stage, .. }
            | Self::Notice { stage, .. }
            | Self::Failed { stage, .. } => *stage,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { step, message, .. } => write!(f, "{step}/{TOTAL_STEPS} {message}"),
            Self::Completed {
                step,
                message,
                percent,
                ..
            } => write!(f, "{step}/{TOTAL_STEPS} {message} ({percent}% complete)"),
            Self::Notice { message, .. } => f.write_str(message),
            Self::Failed { stage, message } => write!(f, "{stage} failed: {message}"),
        }
    }
}

pub type ProgressTx = tokio::sync::mpsc::UnboundedSender<ProgressEvent>;

/// Optional sink; a dropped receiver is not an error.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reporter<'a>(pub(crate) Option<&'a ProgressTx>);

impl Reporter<'_> {
    pub(crate) fn send(self, event: ProgressEvent) {
        tracing::info!(stage = %event.stage(), "{event}");
        if let Some(tx) = self.0 {
            let _ = tx.send(event);
        }
    }

    pub(crate) fn started(self, step: u8, stage: Stage, message: impl Into<String>) {
        self.send(ProgressEvent::Started {
            step,
            stage,
            message: message.into(),
        });
    }

    pub(crate) fn completed(self, step: u8, stage: Stage, message: impl Into<String>, percent: u8) {
        self.send(ProgressEvent::Completed {
            step,
            stage,
            message: message.into(),
            percent,
        });
    }

    pub(crate) fn notice(self, stage: Stage, message: impl Into<String>) {
        self.send(ProgressEvent::Notice {
            stage,
            message: message.into(),
        });
    }
}
