use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("table not found: marker `{marker}` index {index} ({found} matching elements on page)")]
    TableNotFound {
        marker: String,
        index: usize,
        found: usize,
    },

    #[error("structural mismatch in {table}: {detail}")]
    StructuralMismatch { table: &'static str, detail: String },

    #[error("invalid selector `{css}`: {reason}")]
    InvalidSelector { css: String, reason: String },
}

/// Coarse classification kept on batch failures so callers can retry selectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Fetch,
    TableNotFound,
    StructuralMismatch,
    InvalidSelector,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Fetch => "fetch",
            FailureKind::TableNotFound => "table_not_found",
            FailureKind::StructuralMismatch => "structural_mismatch",
            FailureKind::InvalidSelector => "invalid_selector",
        }
    }
}

impl ScrapeError {
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        ScrapeError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn mismatch(table: &'static str, detail: impl Into<String>) -> Self {
        ScrapeError::StructuralMismatch {
            table,
            detail: detail.into(),
        }
    }

    pub fn missing_label(table: &'static str, label: &str) -> Self {
        ScrapeError::StructuralMismatch {
            table,
            detail: format!("missing expected column `{label}`"),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::Fetch { .. } => FailureKind::Fetch,
            ScrapeError::TableNotFound { .. } => FailureKind::TableNotFound,
            ScrapeError::StructuralMismatch { .. } => FailureKind::StructuralMismatch,
            ScrapeError::InvalidSelector { .. } => FailureKind::InvalidSelector,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fetch_errors_are_retryable() {
        assert!(ScrapeError::fetch("u", "timeout").is_retryable());
        assert!(!ScrapeError::mismatch("team_stats", "x").is_retryable());
        let err = ScrapeError::TableNotFound {
            marker: ".a".to_string(),
            index: 5,
            found: 2,
        };
        assert_eq!(err.kind(), FailureKind::TableNotFound);
        assert!(err.to_string().contains("index 5"));
    }
}
