//! Kill alerts and their user-driven lifecycle

use crate::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Where an alert stands with its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Pending,
    Dismissed,
    Acknowledged,
    Acted,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dismissed => "dismissed",
            Self::Acknowledged => "acknowledged",
            Self::Acted => "acted",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kill criterion that new analysis appears to have met
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillAlert {
    pub thesis_id: Uuid,
    pub ticker: String,
    /// Criterion text exactly as the user wrote it
    pub criterion: String,
    /// Statement from the analysis that matched
    pub triggering_signal: String,
    pub match_confidence: f64,
    pub status: AlertStatus,
    pub explanation: String,
}

impl KillAlert {
    /// Move the alert out of `Pending`
    pub fn transition(&mut self, to: AlertStatus) -> Result<()> {
        if self.status != AlertStatus::Pending || to == AlertStatus::Pending {
            return Err(MonitorError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn dismiss(&mut self) -> Result<()> {
        self.transition(AlertStatus::Dismissed)
    }

    pub fn acknowledge(&mut self) -> Result<()> {
        self.transition(AlertStatus::Acknowledged)
    }

    pub fn mark_acted(&mut self) -> Result<()> {
        self.transition(AlertStatus::Acted)
    }

    pub fn is_pending(&self) -> bool {
        self.status == AlertStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> KillAlert {
        KillAlert {
            thesis_id: Uuid::nil(),
            ticker: "AAPL".to_string(),
            criterion: "CEO resigns".to_string(),
            triggering_signal: "CEO departure announced".to_string(),
            match_confidence: 1.0,
            status: AlertStatus::Pending,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_pending_moves_once() {
        let mut alert = alert();
        alert.acknowledge().unwrap();
        assert_eq!(alert.status, AlertStatus::Acknowledged);

        let err = alert.mark_acted().unwrap_err();
        assert_eq!(
            err,
            MonitorError::InvalidTransition {
                from: AlertStatus::Acknowledged,
                to: AlertStatus::Acted,
            }
        );
        assert_eq!(err.to_string(), "Cannot move alert from acknowledged to acted");
    }

    #[test]
    fn test_cannot_return_to_pending() {
        let mut alert = alert();
        assert!(alert.transition(AlertStatus::Pending).is_err());
        assert!(alert.is_pending());
        alert.dismiss().unwrap();
        assert!(!alert.is_pending());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&AlertStatus::Acted).unwrap();
        assert_eq!(json, "\"acted\"");
    }
}
