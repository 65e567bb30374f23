//! Chaos targets and the actions applied to them.
//!
//! A [`Target`] is a named external unit (a container or process) under
//! chaos control. A [`ChaosAction`] is a single disruptive lifecycle
//! operation against one target; it carries enough information to be
//! logged and replayed deterministically.

use std::fmt;
use std::time::Duration;

/// Category of a target, used only for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// The HTTP service under test.
    Service,
    /// The relational datastore behind it.
    Datastore,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Service => write!(f, "service"),
            TargetKind::Datastore => write!(f, "datastore"),
        }
    }
}

/// A named external unit subject to chaos actions.
///
/// Immutable after creation; the name doubles as the container name
/// passed to the process-control adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    kind: TargetKind,
}

impl Target {
    /// Create a new target.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Unique target name (e.g. `recovery_fastapi`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target category, for logging only.
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// A single lifecycle action against one target.
///
/// Created by the scenario at the moment of injection; not persisted
/// beyond the run.
#[derive(Debug, Clone)]
pub enum ChaosAction {
    /// Stop the target.
    Stop(Target),
    /// Start the target, then wait `settle` before returning.
    ///
    /// The settle delay is a minimum, not a readiness guarantee; callers
    /// must still gate on the health monitor before assuming
    /// availability.
    Start {
        /// Unit to start.
        target: Target,
        /// Minimum wait after the start command returns.
        settle: Duration,
    },
    /// Restart the target in a single lifecycle call, then wait `settle`.
    Restart {
        /// Unit to restart.
        target: Target,
        /// Minimum wait after the restart command returns.
        settle: Duration,
    },
}

impl ChaosAction {
    /// The target this action applies to.
    #[must_use]
    pub fn target(&self) -> &Target {
        match self {
            ChaosAction::Stop(target)
            | ChaosAction::Start { target, .. }
            | ChaosAction::Restart { target, .. } => target,
        }
    }

    /// Short action name for logging.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ChaosAction::Stop(_) => "stop",
            ChaosAction::Start { .. } => "start",
            ChaosAction::Restart { .. } => "restart",
        }
    }
}

impl fmt::Display for ChaosAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChaosAction::Stop(target) => write!(f, "stop {target}"),
            ChaosAction::Start { target, settle } => {
                write!(f, "start {target} (settle {settle:?})")
            }
            ChaosAction::Restart { target, settle } => {
                write!(f, "restart {target} (settle {settle:?})")
            }
        }
    }
}
