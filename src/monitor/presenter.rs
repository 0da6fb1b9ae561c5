//! Rendering of a [`TransactionStatus`] for display.
//!
//! Stateless: the same status and explorer settings always give the same view.

use std::fmt;

use alloy_primitives::TxHash;
use serde::Serialize;

use crate::config::ExplorerConfig;
use crate::monitor::types::{TransactionStatus, TxState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    /// Indeterminate progress
    Spinner,
    Check,
    Cross,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Spinner => "⟳",
            Icon::Check => "✓",
            Icon::Cross => "✗",
        }
    }
}

/// Colour family of the status card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// yellow
    Warning,
    /// green
    Positive,
    /// red
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub icon: Icon,
    pub tone: Tone,
    pub title: &'static str,
    /// Confirmation progress, only while pending.
    pub detail: Option<String>,
    pub error: Option<String>,
    pub explorer_url: String,
    pub explorer_label: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatusPresenter {
    explorer: ExplorerConfig,
}

impl StatusPresenter {
    pub fn new(explorer: ExplorerConfig) -> Self {
        Self { explorer }
    }

    /// `None` renders nothing.
    pub fn render(&self, status: Option<&TransactionStatus>) -> Option<StatusView> {
        let status = status?;

        let (icon, tone, title) = match status.state {
            TxState::Pending => (Icon::Spinner, Tone::Warning, "Transaction Pending"),
            TxState::Success => (Icon::Check, Tone::Positive, "Transaction Confirmed"),
            TxState::Failed => (Icon::Cross, Tone::Negative, "Transaction Failed"),
        };

        let detail = status.is_pending().then(|| {
            format!("Waiting for confirmations ({})", status.confirmations)
        });

        Some(StatusView {
            icon,
            tone,
            title,
            detail,
            error: status.error.clone(),
            explorer_url: self.explorer_url(&status.hash),
            explorer_label: format!("View on {}", self.explorer.name),
        })
    }

    /// `https://<host>/tx/<hash>`
    pub fn explorer_url(&self, hash: &TxHash) -> String {
        format!("https://{}/tx/{}", self.explorer.host, hash)
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.icon.glyph(), self.title)?;
        if let Some(detail) = &self.detail {
            writeln!(f, "  {}", detail)?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "  {}", error)?;
        }
        write!(f, "  {}: {}", self.explorer_label, self.explorer_url)
    }
}
