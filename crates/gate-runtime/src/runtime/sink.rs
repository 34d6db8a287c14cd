use crate::infra::audit::{AuditEventType, AuditLogger};
use gate_core::{Cause, InhibitionEvent, InhibitionSink, RoundDuration};
use std::sync::Arc;
use tracing::{info, warn};

/// Sends gate events to tracing and, when enabled, the audit trail.
pub struct RuntimeSink {
    audit: Option<Arc<AuditLogger>>,
}

impl RuntimeSink {
    pub fn new(audit: Option<Arc<AuditLogger>>) -> Self {
        Self { audit }
    }

    fn audit(&self, event_type: AuditEventType, details: serde_json::Value) {
        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log_event(event_type, details) {
                warn!(error = %e, "Failed to write audit entry");
            }
        }
    }
}

impl InhibitionSink for RuntimeSink {
    fn on_armed(&mut self, event: &InhibitionEvent) {
        match event.cause {
            Cause::SpeedChange => warn!(
                previous_us = event.previous,
                current_us = event.current,
                relative_change = event.relative_change.unwrap_or(f64::NAN),
                cooldown_rounds = event.cooldown_rounds,
                "Release inhibited: round duration changed"
            ),
            Cause::ZeroDuration => warn!(
                previous_us = event.previous,
                cooldown_rounds = event.cooldown_rounds,
                "Release inhibited: zero-length round from fine sensor"
            ),
        }
        self.audit(
            AuditEventType::InhibitionArmed,
            serde_json::to_value(event).unwrap_or_default(),
        );
    }

    fn on_cleared(&mut self, last_round_duration: RoundDuration) {
        info!(last_round_us = last_round_duration, "Release allowed again");
        self.audit(
            AuditEventType::InhibitionCleared,
            serde_json::json!({ "last_round_duration": last_round_duration }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::audit::AuditEntry;
    use gate_core::{Inhibitor, InhibitorConfig};

    #[test]
    fn inhibitor_events_reach_audit_trail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = Arc::new(AuditLogger::new(&path).unwrap());

        let sink = RuntimeSink::new(Some(logger));
        let mut inhibitor = Inhibitor::with_sink(InhibitorConfig::default(), sink).unwrap();
        inhibitor.feed_fine(1000);
        inhibitor.feed_coarse(1000);
        inhibitor.feed_coarse(1000);
        inhibitor.feed_fine(0);

        let content = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<AuditEntry> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        let kinds: Vec<_> = entries.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventType::InhibitionArmed,
                AuditEventType::InhibitionCleared,
                AuditEventType::InhibitionArmed,
            ]
        );
        assert_eq!(entries[0].details["cause"], "speed_change");
        assert_eq!(entries[0].details["current"], 1000);
        assert_eq!(entries[1].details["last_round_duration"], 1000);
        assert_eq!(entries[2].details["cause"], "zero_duration");
        assert!(entries[2].details["relative_change"].is_null());
    }

    #[test]
    fn works_without_audit() {
        let mut inhibitor =
            Inhibitor::with_sink(InhibitorConfig::default(), RuntimeSink::new(None)).unwrap();
        inhibitor.feed_fine(1000);
        assert!(inhibitor.is_inhibited());
    }
}
