//! Screen state machine.
//!
//! ```text
//! dashboard --select_case--> processing --open_outlay--> outlay
//!     ^                          |   ^                     |
//!     +---------back-------------+   +--------back---------+
//!
//! any screen --open_supervisor--> supervisor --back--> dashboard
//! any screen --back_to_dashboard--> dashboard (full reset)
//! ```
//!
//! Each [`Screen`] variant carries exactly the context it needs, so an outlay screen
//! without a case or without a ready evaluation cannot be represented.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::{
    cases::Case,
    error::{FlowError, Result},
    payload::CaseEvaluation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Dashboard,
    Processing,
    Outlay,
    Supervisor,
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenKind::Dashboard => "dashboard",
            ScreenKind::Processing => "processing",
            ScreenKind::Outlay => "outlay",
            ScreenKind::Supervisor => "supervisor",
        };
        f.write_str(name)
    }
}

/// A case evaluation whose readiness flag was `true` when it was wrapped.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyEvaluation(CaseEvaluation);

impl ReadyEvaluation {
    pub fn new(evaluation: CaseEvaluation) -> Option<Self> {
        evaluation.is_ready().then_some(Self(evaluation))
    }

    pub fn evaluation(&self) -> &CaseEvaluation {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Dashboard,
    Processing {
        case: Case,
        /// Evaluation carried back from the outlay screen, if any.
        evaluation: Option<CaseEvaluation>,
    },
    Outlay {
        case: Case,
        evaluation: ReadyEvaluation,
    },
    Supervisor,
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Dashboard => ScreenKind::Dashboard,
            Screen::Processing { .. } => ScreenKind::Processing,
            Screen::Outlay { .. } => ScreenKind::Outlay,
            Screen::Supervisor => ScreenKind::Supervisor,
        }
    }

    pub fn case(&self) -> Option<&Case> {
        match self {
            Screen::Processing { case, .. } | Screen::Outlay { case, .. } => Some(case),
            Screen::Dashboard | Screen::Supervisor => None,
        }
    }

    pub fn evaluation(&self) -> Option<&CaseEvaluation> {
        match self {
            Screen::Processing { evaluation, .. } => evaluation.as_ref(),
            Screen::Outlay { evaluation, .. } => Some(evaluation.evaluation()),
            Screen::Dashboard | Screen::Supervisor => None,
        }
    }
}

/// Owns the current [`Screen`]. Mutated only through the transition methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigator {
    screen: Screen,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            screen: Screen::Dashboard,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn selected_case(&self) -> Option<&Case> {
        self.screen.case()
    }

    pub fn evaluation(&self) -> Option<&CaseEvaluation> {
        self.screen.evaluation()
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            from: self.kind(),
            action,
        }
    }

    fn replace(&mut self, screen: Screen) {
        debug!(from = %self.kind(), to = %screen.kind(), "Screen transition");
        self.screen = screen;
    }

    /// Dashboard → processing for `case`.
    pub fn select_case(&mut self, case: Case) -> Result<()> {
        if self.kind() != ScreenKind::Dashboard {
            return Err(self.invalid("select a case"));
        }
        self.replace(Screen::Processing {
            case,
            evaluation: None,
        });
        Ok(())
    }

    /// Processing → outlay, storing the evaluation alongside the selected case.
    pub fn open_outlay(&mut self, evaluation: ReadyEvaluation) -> Result<()> {
        let Screen::Processing { case, .. } = &self.screen else {
            return Err(self.invalid("open the outlay document"));
        };
        let case = case.clone();
        self.replace(Screen::Outlay { case, evaluation });
        Ok(())
    }

    /// Outlay → processing, keeping the case and the evaluation.
    pub fn back_to_processing(&mut self) -> Result<()> {
        let Screen::Outlay { case, evaluation } = &self.screen else {
            return Err(self.invalid("return to processing"));
        };
        let screen = Screen::Processing {
            case: case.clone(),
            evaluation: Some(evaluation.evaluation().clone()),
        };
        self.replace(screen);
        Ok(())
    }

    /// Any screen → dashboard, clearing the selected case and evaluation.
    pub fn back_to_dashboard(&mut self) {
        self.replace(Screen::Dashboard);
    }

    /// Any screen → supervisor queue.
    pub fn open_supervisor(&mut self) {
        self.replace(Screen::Supervisor);
    }

    /// Follows the back edge of the current screen.
    pub fn back(&mut self) -> Result<()> {
        match self.kind() {
            ScreenKind::Dashboard => Err(self.invalid("go back")),
            ScreenKind::Outlay => self.back_to_processing(),
            ScreenKind::Processing | ScreenKind::Supervisor => {
                self.back_to_dashboard();
                Ok(())
            }
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
