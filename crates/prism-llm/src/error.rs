use http::StatusCode;
use thiserror::Error;

use crate::types::Vendor;

/// Errors raised by the adapter layer
///
/// Every variant that can occur after a provider has been resolved carries the
/// vendor and model it was raised for, so callers can log it without extra
/// context.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider key has no adapter registered
    #[error("unknown provider: {provider}")]
    UnknownProvider { provider: String },

    /// Upstream returned a non-2xx status or the connection failed
    #[error("{vendor} transport error for model {model}{}: {body}", fmt_status(.status))]
    Transport {
        vendor: Vendor,
        model: String,
        /// HTTP status, absent when the request never got a response
        status: Option<StatusCode>,
        /// Raw response body or the network error message
        body: String,
    },

    /// A payload fragment could not be decoded
    #[error("{vendor} parse error for model {model}: {message}")]
    Parse {
        vendor: Vendor,
        model: String,
        message: String,
    },

    /// A tool schema cannot be expressed for the target vendor
    #[error("{vendor} cannot accept tool '{tool}'{}: {reason}", fmt_model(.model))]
    SchemaConversion {
        vendor: Vendor,
        model: String,
        tool: String,
        reason: String,
    },

    /// The generic request cannot be turned into a vendor request
    #[error("invalid {vendor} request for model {model}: {reason}")]
    InvalidRequest {
        vendor: Vendor,
        model: String,
        reason: String,
    },
}

impl LlmError {
    /// Build a schema conversion error that is not yet tied to a model
    pub fn schema(vendor: Vendor, tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaConversion {
            vendor,
            model: String::new(),
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Attach the model identifier when the error was raised without one
    #[must_use]
    pub fn with_model(mut self, model_id: &str) -> Self {
        match &mut self {
            Self::Transport { model, .. }
            | Self::Parse { model, .. }
            | Self::SchemaConversion { model, .. }
            | Self::InvalidRequest { model, .. }
                if model.is_empty() =>
            {
                model.push_str(model_id);
            }
            _ => {}
        }
        self
    }

    /// Vendor the error was raised for, if a provider had been resolved
    pub const fn vendor(&self) -> Option<Vendor> {
        match self {
            Self::UnknownProvider { .. } => None,
            Self::Transport { vendor, .. }
            | Self::Parse { vendor, .. }
            | Self::SchemaConversion { vendor, .. }
            | Self::InvalidRequest { vendor, .. } => Some(*vendor),
        }
    }

    /// Whether a caller-side retry policy may try again
    ///
    /// Only transport failures qualify: rate limits, server errors and
    /// connections that never produced a response. This layer never retries
    /// on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status: None, .. } => true,
            Self::Transport {
                status: Some(status), ..
            } => *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            _ => false,
        }
    }
}

fn fmt_status(status: &Option<StatusCode>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

fn fmt_model(model: &str) -> String {
    if model.is_empty() {
        String::new()
    } else {
        format!(" for model {model}")
    }
}
