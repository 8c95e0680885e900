//! Presentation state of the form: status line, audit section, info line.
//!
//! Each event overwrites what it touches; nothing is queued or kept as history.

use crate::model::{AuditState, FormEvent, Status, AUDIT_FAILED_MESSAGE};

#[derive(Debug, Clone, Default)]
pub struct FormView {
    pub status: Status,
    pub audit: AuditState,
    pub info: String,
    pub in_flight: bool,
}

impl FormView {
    pub fn apply(&mut self, ev: &FormEvent) {
        match ev {
            FormEvent::Status(s) => {
                self.status = *s;
                // Complete still has the audit fetch ahead; only the finished outcome clears it.
                match s {
                    Status::Ingesting => self.in_flight = true,
                    Status::Failed => self.in_flight = false,
                    Status::Idle | Status::Complete => {}
                }
            }
            FormEvent::AuditRevealed => self.audit = AuditState::Loading,
            FormEvent::AuditLoaded { text } => self.audit = AuditState::Loaded(text.clone()),
            FormEvent::AuditFailed => self.audit = AuditState::Failed,
            FormEvent::Info(msg) => self.info = msg.clone(),
            FormEvent::Navigated { target } => self.info = format!("Opened {target}"),
            FormEvent::SubmissionFinished { .. } => self.in_flight = false,
        }
    }

    pub fn status_text(&self) -> &'static str {
        self.status.message()
    }

    pub fn audit_visible(&self) -> bool {
        self.audit.is_visible()
    }

    /// Text of the audit display element; empty while loading.
    pub fn audit_text(&self) -> &str {
        match &self.audit {
            AuditState::Loaded(text) => text,
            AuditState::Failed => AUDIT_FAILED_MESSAGE,
            AuditState::Hidden | AuditState::Loading => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_section_starts_hidden() {
        let view = FormView::default();
        assert!(!view.audit_visible());
        assert_eq!(view.audit_text(), "");
        assert_eq!(view.status_text(), "");
    }

    #[test]
    fn events_overwrite_last_write_wins() {
        let mut view = FormView::default();
        view.apply(&FormEvent::Status(Status::Ingesting));
        assert!(view.in_flight);
        assert_eq!(view.status_text(), "Ingesting...");

        view.apply(&FormEvent::Status(Status::Complete));
        view.apply(&FormEvent::AuditRevealed);
        assert!(view.audit_visible());
        assert_eq!(view.audit_text(), "");

        view.apply(&FormEvent::AuditLoaded {
            text: "raw <b>text</b>\n".into(),
        });
        assert_eq!(view.status_text(), "Ingest complete");
        assert_eq!(view.audit_text(), "raw <b>text</b>\n");
    }

    #[test]
    fn failed_audit_keeps_section_visible_with_its_own_message() {
        let mut view = FormView::default();
        view.apply(&FormEvent::Status(Status::Complete));
        view.apply(&FormEvent::AuditRevealed);
        view.apply(&FormEvent::AuditFailed);
        assert!(view.audit_visible());
        assert_eq!(view.audit_text(), "Error loading audit log");
        assert_eq!(view.status_text(), "Ingest complete");
    }

    #[test]
    fn stays_in_flight_until_the_audit_fetch_finishes() {
        let mut view = FormView::default();
        view.apply(&FormEvent::Status(Status::Ingesting));
        view.apply(&FormEvent::Status(Status::Complete));
        view.apply(&FormEvent::AuditRevealed);
        assert!(view.in_flight);

        view.apply(&FormEvent::AuditLoaded { text: "log".into() });
        assert!(view.in_flight);
    }

    #[test]
    fn a_new_submission_does_not_hide_a_previous_audit() {
        let mut view = FormView::default();
        view.apply(&FormEvent::AuditLoaded { text: "old".into() });
        view.apply(&FormEvent::Status(Status::Ingesting));
        view.apply(&FormEvent::Status(Status::Failed));
        assert_eq!(view.status_text(), "Error running ingest");
        assert_eq!(view.audit_text(), "old");
        assert!(!view.in_flight);
    }
}
