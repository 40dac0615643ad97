//! Per-call audit hook.
//!
//! Every public [`Gateway`](crate::gateway::Gateway) operation reports one
//! [`AuditRecord`] to the configured [`AuditSink`]: what was called, with which
//! fields, what actually went out and what came of it. The merchant secret is
//! never part of a record.

use paynet_core::types::FieldMap;
use serde::Serialize;

/// The gateway operation being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    HostedRequest,
    DirectRequest,
    DirectPayment,
    VerifyResponse,
}

/// Result summary of an audited call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// A hosted form was rendered.
    Rendered { form: String },
    /// The direct API answered with these fields.
    Response { fields: FieldMap },
    /// A response was verified and dispatched.
    Verified {
        outcome: &'static str,
        response_code: i64,
    },
    Failed { error: String },
}

/// One audited gateway call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub operation: AuditOperation,
    /// The fields exactly as the caller passed them in.
    pub arguments: FieldMap,
    /// The request as it left the gateway client: with `merchantID`,
    /// `redirectURL` and `signature` filled in. Absent when nothing was sent
    /// or rendered, and for verifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<FieldMap>,
    pub outcome: AuditOutcome,
}

impl AuditRecord {
    pub fn new(operation: AuditOperation, arguments: FieldMap, outcome: AuditOutcome) -> Self {
        AuditRecord {
            operation,
            arguments,
            sent: None,
            outcome,
        }
    }

    pub fn with_sent(mut self, sent: Option<FieldMap>) -> Self {
        self.sent = sent;
        self
    }

    pub fn failed(
        operation: AuditOperation,
        arguments: FieldMap,
        error: &impl std::fmt::Display,
    ) -> Self {
        Self::new(
            operation,
            arguments,
            AuditOutcome::Failed {
                error: error.to_string(),
            },
        )
    }
}

/// Receiver of audit records. Must not block.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: &AuditRecord) {}
}

/// Emits each record as a `debug` event with the record serialized to JSON.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[cfg(feature = "tracing")]
impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        match serde_json::to_string(record) {
            Ok(json) => tracing::debug!(
                target: "paynet_kit::audit",
                operation = ?record.operation,
                "{json}"
            ),
            Err(err) => tracing::warn!(
                target: "paynet_kit::audit",
                operation = ?record.operation,
                "Failed to serialize audit record: {err}"
            ),
        }
    }
}
