//! Conversation orchestrator: command dispatch and the intake state
//! machine.
//!
//! Every inbound text lands here with its sender identity. Commands
//! (`register`, `cancel`, `query`) are handled directly; anything else is
//! routed to the sender's live intake session, or answered with help
//! text when no session exists. The reply is returned to the transport
//! layer, which delivers it at most once per inbound event.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{BotConfig, CorrectionStyle, IntakeMode};
use crate::domain::OwnerId;
use crate::error::ExchangeError;
use crate::intake::session::{IntakeSession, SessionState};
use crate::intake::{FIELD_FLOW, FieldKey, SessionRegistry, template};
use crate::persistence::RequestStore;
use crate::service::match_engine::{MatchEngine, counterpart_summary};
use crate::validate::form;
use crate::validate::FieldRules;

/// Drives intake conversations and owner-facing lookups.
#[derive(Debug)]
pub struct IntakeService {
    store: Arc<dyn RequestStore>,
    engine: Arc<MatchEngine>,
    sessions: SessionRegistry,
    rules: FieldRules,
    intake_mode: IntakeMode,
    correction_style: CorrectionStyle,
    allow_multiple_requests: bool,
}

impl IntakeService {
    /// Creates the service from the loaded configuration.
    #[must_use]
    pub fn new(store: Arc<dyn RequestStore>, engine: Arc<MatchEngine>, config: &BotConfig) -> Self {
        Self {
            store,
            engine,
            sessions: SessionRegistry::new(Duration::from_secs(config.session_ttl_secs)),
            rules: FieldRules::from_config(config),
            intake_mode: config.intake_mode,
            correction_style: config.correction_style,
            allow_multiple_requests: config.allow_multiple_requests,
        }
    }

    /// Handles one inbound text from `owner` and returns the reply.
    ///
    /// Conversational problems (validation failures, duplicates, unknown
    /// lookups) are part of the reply, not errors; only persistence
    /// failure aborts the operation.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    pub async fn handle_text(&self, owner: &OwnerId, text: &str) -> Result<String, ExchangeError> {
        let mut words = text.trim().split_whitespace();
        let command = words.next().unwrap_or("").to_ascii_lowercase();
        match command.as_str() {
            "register" | "swap" => self.cmd_register(owner).await,
            "cancel" => self.cmd_cancel(owner, words.next(), words.next()).await,
            "query" | "status" => self.cmd_query(owner, words.next(), words.next()).await,
            _ => self.drive_session(owner, text).await,
        }
    }

    /// `register`: open an intake session, unless an open request blocks
    /// it.
    async fn cmd_register(&self, owner: &OwnerId) -> Result<String, ExchangeError> {
        if !self.allow_multiple_requests {
            if let Some(open) = self.store.latest_pending_for_owner(owner).await? {
                return Ok(format!(
                    "You already have an open request (order {}). Cancel it before registering another.",
                    open.order_no
                ));
            }
        }

        match self.intake_mode {
            IntakeMode::Form => {
                self.sessions
                    .begin(owner.clone(), IntakeSession::new(SessionState::AwaitForm))
                    .await;
                Ok(template())
            }
            IntakeMode::Step => {
                self.sessions
                    .begin(owner.clone(), IntakeSession::new(SessionState::AwaitStep(0)))
                    .await;
                Ok(ask(FieldKey::Contact))
            }
        }
    }

    /// `cancel [order code]`: drop the session and delete the pending
    /// stored request, reporting what was actually removed.
    async fn cmd_cancel(
        &self,
        owner: &OwnerId,
        order_no: Option<&str>,
        code: Option<&str>,
    ) -> Result<String, ExchangeError> {
        let had_session = self.sessions.remove(owner).await;
        let session_note = if had_session {
            "\nThe form in progress was discarded."
        } else {
            ""
        };

        let target = match (order_no, code) {
            (Some(order), Some(code)) => {
                let Some(found) = self.store.get_by_owner_order_code(owner, order, code).await?
                else {
                    return Ok(format!("{}{session_note}", ExchangeError::NotFound));
                };
                Some(found)
            }
            (None, None) => self.store.latest_pending_for_owner(owner).await?,
            _ => return Ok("Usage: cancel <order number> <verification code>".to_string()),
        };

        let Some(request) = target else {
            return Ok(format!("Nothing to cancel.{session_note}"));
        };
        if !request.is_pending() {
            return Ok(format!("{}{session_note}", ExchangeError::AlreadyMatched));
        }

        let deleted = self.store.delete_if_pending(request.id).await?;
        if deleted == 1 {
            tracing::info!(id = %request.id, owner = %owner, "request cancelled");
            Ok(format!(
                "Request for order {} cancelled.{session_note}",
                request.order_no
            ))
        } else {
            // Matched between lookup and delete; the row is untouched.
            Ok(format!("{}{session_note}", ExchangeError::AlreadyMatched))
        }
    }

    /// `query <order> <code>`: current status, plus counterpart details
    /// once matched. Never touches session state.
    async fn cmd_query(
        &self,
        owner: &OwnerId,
        order_no: Option<&str>,
        code: Option<&str>,
    ) -> Result<String, ExchangeError> {
        let (Some(order), Some(code)) = (order_no, code) else {
            return Ok("Usage: query <order number> <verification code>".to_string());
        };

        let Some(request) = self.store.get_by_owner_order_code(owner, order, code).await? else {
            return Ok(ExchangeError::NotFound.to_string());
        };
        if request.is_pending() {
            return Ok(format!(
                "Order {} is still waiting for a counterpart.",
                request.order_no
            ));
        }

        match self.store.match_partner(&request).await? {
            Some(partner) => Ok(format!(
                "Order {} is matched.\n{}",
                request.order_no,
                counterpart_summary(&partner)
            )),
            None => {
                tracing::warn!(id = %request.id, "matched request without a partner row");
                Ok(format!(
                    "Order {} is matched; counterpart details are temporarily unavailable.",
                    request.order_no
                ))
            }
        }
    }

    /// Routes non-command text into the owner's session, if any.
    async fn drive_session(&self, owner: &OwnerId, text: &str) -> Result<String, ExchangeError> {
        let Some(entry) = self.sessions.get(owner).await else {
            return Ok(help_text());
        };
        let mut session = entry.lock().await;
        session.touch();
        match session.state {
            SessionState::AwaitForm => self.on_form(owner, &mut session, text).await,
            SessionState::AwaitFix(field) => self.on_fix(owner, &mut session, field, text).await,
            SessionState::AwaitStep(index) => self.on_step(owner, &mut session, index, text).await,
        }
    }

    /// Bulk form submission: validate everything present, collect
    /// missing fields and failures, then branch per correction style.
    async fn on_form(
        &self,
        owner: &OwnerId,
        session: &mut IntakeSession,
        text: &str,
    ) -> Result<String, ExchangeError> {
        // Each bulk submission is complete in itself; start clean so a
        // resubmission cannot collide with leftovers of the previous one.
        session.draft = crate::intake::Draft::default();

        let lines = form::parse_form(text);
        let mut recognized = 0usize;
        let mut errors: Vec<(FieldKey, String)> = Vec::new();

        for line in &lines {
            let Some(key) = FieldKey::from_label(&line.label) else {
                continue; // unknown labels are ignored
            };
            recognized += 1;
            if let Err(e) = session.draft.apply(key, &line.value, &self.rules) {
                errors.push((key, e.to_string()));
            }
        }

        if recognized == 0 {
            return Ok(format!("That does not look like the form.\n\n{}", template()));
        }

        for key in FIELD_FLOW {
            if !session.draft.has(key) && !errors.iter().any(|(k, _)| *k == key) {
                errors.push((key, "missing, please fill it in".to_string()));
            }
        }

        if errors.is_empty() {
            if let Some(order) = session.draft.order_no() {
                if self.store.order_no_exists(owner, order).await? {
                    errors.push((
                        FieldKey::OrderNo,
                        ExchangeError::DuplicateOrderNo(order.to_string()).to_string(),
                    ));
                }
            }
        }

        if errors.is_empty() {
            return self.finalize(owner, session).await;
        }

        errors.sort_by_key(|(key, _)| key.position());
        match self.correction_style {
            CorrectionStyle::Resubmit => Ok(format!(
                "{}\nPlease send the whole form again.\n\n{}",
                errors_block(&errors),
                template()
            )),
            CorrectionStyle::FieldByField => {
                let Some((first, _)) = errors.first() else {
                    return Ok(help_text());
                };
                let first = *first;
                session.state = SessionState::AwaitFix(first);
                Ok(format!("{}\n{}", errors_block(&errors), ask(first)))
            }
        }
    }

    /// Targeted correction of a single field. Accepts a bare value or a
    /// line re-labeled with the same field; other labels are refused.
    async fn on_fix(
        &self,
        owner: &OwnerId,
        session: &mut IntakeSession,
        field: FieldKey,
        text: &str,
    ) -> Result<String, ExchangeError> {
        let labeled: Vec<(FieldKey, String)> = form::parse_form(text)
            .into_iter()
            .filter_map(|line| FieldKey::from_label(&line.label).map(|key| (key, line.value)))
            .collect();

        let value = match labeled.iter().find(|(key, _)| *key == field) {
            Some((_, value)) => value.clone(),
            None => {
                if let Some((other, _)) = labeled.first() {
                    return Ok(format!(
                        "We are fixing the {} right now; please do not switch to the {}.",
                        field.display_name(),
                        other.display_name()
                    ));
                }
                text.trim().to_string()
            }
        };

        if let Err(e) = session.draft.apply(field, &value, &self.rules) {
            return Ok(format!(
                "Invalid {}: {e}\n{}",
                field.display_name(),
                ask(field)
            ));
        }

        if field == FieldKey::OrderNo {
            if let Some(reask) = self.reject_duplicate_order(owner, session).await? {
                return Ok(reask);
            }
        }

        match session.draft.first_missing() {
            Some(next) => {
                session.state = SessionState::AwaitFix(next);
                Ok(ask(next))
            }
            None => self.finalize(owner, session).await,
        }
    }

    /// Step mode: exactly one field per message, re-asked until valid.
    async fn on_step(
        &self,
        owner: &OwnerId,
        session: &mut IntakeSession,
        index: usize,
        text: &str,
    ) -> Result<String, ExchangeError> {
        let Some(field) = FIELD_FLOW.get(index).copied() else {
            // Index past the flow only happens if the flow shrinks
            // between releases; recover by finalizing.
            return self.finalize(owner, session).await;
        };

        if let Err(e) = session.draft.apply(field, text.trim(), &self.rules) {
            return Ok(format!(
                "Invalid {}: {e}\n{}",
                field.display_name(),
                ask(field)
            ));
        }

        if field == FieldKey::OrderNo {
            if let Some(reask) = self.reject_duplicate_order(owner, session).await? {
                return Ok(reask);
            }
        }

        let next = index + 1;
        if next < FIELD_FLOW.len() {
            session.state = SessionState::AwaitStep(next);
            let Some(next_field) = FIELD_FLOW.get(next).copied() else {
                return self.finalize(owner, session).await;
            };
            Ok(ask(next_field))
        } else {
            self.finalize(owner, session).await
        }
    }

    /// Duplicate-key check at the moment an order number is accepted.
    /// Returns the re-ask reply when the number is taken.
    async fn reject_duplicate_order(
        &self,
        owner: &OwnerId,
        session: &mut IntakeSession,
    ) -> Result<Option<String>, ExchangeError> {
        let Some(order) = session.draft.order_no() else {
            return Ok(None);
        };
        if self.store.order_no_exists(owner, order).await? {
            let message = ExchangeError::DuplicateOrderNo(order.to_string()).to_string();
            return Ok(Some(format!("{message}\n{}", ask(FieldKey::OrderNo))));
        }
        Ok(None)
    }

    /// Clean completion: insert, close the session, confirm, and trigger
    /// matching synchronously.
    async fn finalize(
        &self,
        owner: &OwnerId,
        session: &mut IntakeSession,
    ) -> Result<String, ExchangeError> {
        let draft = std::mem::take(&mut session.draft);
        let Some(new_request) = draft.into_new_request(owner.clone()) else {
            self.sessions.remove(owner).await;
            return Ok(format!(
                "Something went wrong with the form; please start over.\n\n{}",
                help_text()
            ));
        };

        let stored = self.store.insert(new_request).await?;
        self.sessions.remove(owner).await;
        tracing::info!(id = %stored.id, owner = %owner, order = %stored.order_no, "request registered");

        let matched = self.engine.try_match(stored.id).await?;

        let mut reply = format!(
            "Request registered for order {}. Your verification code is {}. Keep it: cancel and query both need it.",
            stored.order_no, stored.verification_code
        );
        if matched.is_some() {
            reply.push_str("\nA counterpart was found right away; details were sent separately.");
        }
        Ok(reply)
    }
}

/// Prompt for a single field.
fn ask(field: FieldKey) -> String {
    format!("Please provide: {}", field.label())
}

/// Bullet list of everything wrong with a form submission.
fn errors_block(errors: &[(FieldKey, String)]) -> String {
    let mut out = String::from("Some fields need attention:\n");
    for (key, reason) in errors {
        out.push_str(&format!("- {}: {}\n", key.display_name(), reason));
    }
    out
}

/// Help text for unrecognized input outside a session.
fn help_text() -> String {
    format!(
        "Commands:\n\
         register - start a swap request\n\
         cancel [order code] - cancel a pending request\n\
         query <order> <code> - check a request's status\n\n\
         After register, fill in this form:\n{}",
        template()
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::DateStyle;
    use crate::domain::RequestStatus;
    use crate::notify::NoopNotifier;
    use crate::persistence::memory::MemoryStore;

    const FORM_A: &str = "\
1. Contact name: Alice
2. Order number (9 digits): 111111111
3. Phone: 555-0100
4. Email: alice@example.com
5. Current date (MM/DD): 12/25
6. Current time slot (HH:MM~HH:MM): 14:00~15:00
7. Current venue (name or number): Hall A
8. Desired dates (comma separated): 12/31
9. Desired time slots (comma separated): 15:00~16:00
10. Desired venue (name, number, or \"any\"): any";

    const FORM_B: &str = "\
1. Contact name: Bob
2. Order number (9 digits): 222222222
3. Phone: 555-0200
4. Email: bob@example.com
5. Current date (MM/DD): 12/31
6. Current time slot (HH:MM~HH:MM): 15:00~16:00
7. Current venue (name or number): Hall A
8. Desired dates (comma separated): 12/25
9. Desired time slots (comma separated): 14:00~15:00
10. Desired venue (name, number, or \"any\"): any";

    fn config(mode: IntakeMode, style: CorrectionStyle, allow_multiple: bool) -> BotConfig {
        BotConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap_or_else(|_| panic!("addr")),
            database_url: None,
            database_max_connections: 1,
            database_min_connections: 1,
            database_connect_timeout_secs: 1,
            channel_secret: String::new(),
            channel_access_token: String::new(),
            date_style: DateStyle::MonthDay,
            event_year: 2026,
            allowed_months: vec![12, 1],
            venues: vec![
                "Hall A".to_string(),
                "Hall B".to_string(),
                "Hall C".to_string(),
            ],
            intake_mode: mode,
            correction_style: style,
            allow_multiple_requests: allow_multiple,
            session_ttl_secs: 60,
        }
    }

    fn service(
        mode: IntakeMode,
        style: CorrectionStyle,
        allow_multiple: bool,
    ) -> (IntakeService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(MatchEngine::new(
            Arc::clone(&store) as Arc<dyn RequestStore>,
            Arc::new(NoopNotifier),
        ));
        let svc = IntakeService::new(
            Arc::clone(&store) as Arc<dyn RequestStore>,
            engine,
            &config(mode, style, allow_multiple),
        );
        (svc, store)
    }

    async fn say(svc: &IntakeService, owner: &str, text: &str) -> String {
        let Ok(reply) = svc.handle_text(&OwnerId::new(owner), text).await else {
            panic!("handle_text failed for {text:?}");
        };
        reply
    }

    #[tokio::test]
    async fn register_emits_the_form_template() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        let reply = say(&svc, "U1", "register").await;
        assert!(reply.contains("1. Contact name:"));
        assert!(reply.contains("10. Desired venue"));
    }

    #[tokio::test]
    async fn idle_chatter_gets_help() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        let reply = say(&svc, "U1", "hello?").await;
        assert!(reply.contains("register"));
        assert!(reply.contains("query"));
    }

    #[tokio::test]
    async fn clean_form_registers_and_returns_a_code() {
        let (svc, store) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        let reply = say(&svc, "U1", FORM_A).await;
        assert!(reply.contains("verification code"), "{reply}");

        let Ok(Some(stored)) = store.latest_pending_for_owner(&OwnerId::new("U1")).await else {
            panic!("request not stored");
        };
        assert_eq!(stored.order_no, "111111111");
        assert_eq!(stored.original.place.as_str(), "Hall A");
        assert_eq!(stored.desired.len(), 1);
    }

    #[tokio::test]
    async fn second_open_request_is_refused() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;

        let reply = say(&svc, "U1", "register").await;
        assert!(reply.contains("already have an open request"), "{reply}");
    }

    #[tokio::test]
    async fn crossed_registrations_end_matched_with_min_id_group() {
        let (svc, store) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;
        say(&svc, "U2", "register").await;
        let reply = say(&svc, "U2", FORM_B).await;
        assert!(reply.contains("counterpart was found"), "{reply}");

        let Ok(candidates) = store.pending_candidates(&OwnerId::new("nobody")).await else {
            panic!("listing failed");
        };
        assert!(candidates.is_empty(), "both requests should be matched");

        let mut groups = Vec::new();
        for id in [1, 2] {
            let Ok(Some(row)) = store.get_by_id(crate::domain::RequestId::new(id)).await else {
                panic!("missing row {id}");
            };
            assert_eq!(row.status, RequestStatus::Matched);
            groups.push(row.match_group);
        }
        assert_eq!(groups, vec![
            Some(crate::domain::RequestId::new(1)),
            Some(crate::domain::RequestId::new(1)),
        ]);
    }

    #[tokio::test]
    async fn count_mismatch_walks_into_field_fix() {
        let (svc, store) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;

        let broken = FORM_A.replace(
            "8. Desired dates (comma separated): 12/31",
            "8. Desired dates (comma separated): 12/25,12/26",
        );
        let reply = say(&svc, "U1", &broken).await;
        assert!(reply.contains("must pair up"), "{reply}");
        assert!(reply.contains("Desired time slots"), "{reply}");

        // supply two slots to pair with the two dates, then we are done
        let reply = say(&svc, "U1", "15:00~16:00, 16:00~17:00").await;
        assert!(reply.contains("verification code"), "{reply}");

        let Ok(Some(stored)) = store.latest_pending_for_owner(&OwnerId::new("U1")).await else {
            panic!("request not stored");
        };
        assert_eq!(stored.desired.len(), 2);
    }

    #[tokio::test]
    async fn fixing_a_different_field_is_refused() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;

        let broken = FORM_A.replace(
            "2. Order number (9 digits): 111111111",
            "2. Order number (9 digits): 12345",
        );
        let reply = say(&svc, "U1", &broken).await;
        assert!(reply.contains("Order number"), "{reply}");

        let reply = say(&svc, "U1", "4. Email: sneaky@example.com").await;
        assert!(reply.contains("do not switch"), "{reply}");

        // a bare value for the right field is accepted
        let reply = say(&svc, "U1", "111111111").await;
        assert!(reply.contains("verification code"), "{reply}");
    }

    #[tokio::test]
    async fn relabeled_line_for_the_same_field_is_accepted() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;

        let broken = FORM_A.replace(
            "2. Order number (9 digits): 111111111",
            "2. Order number (9 digits): 12345",
        );
        say(&svc, "U1", &broken).await;

        let reply = say(&svc, "U1", "2. Order number (9 digits): 111111111").await;
        assert!(reply.contains("verification code"), "{reply}");
    }

    #[tokio::test]
    async fn resubmit_style_reemits_the_whole_template() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::Resubmit, false);
        say(&svc, "U1", "register").await;

        let broken = FORM_A.replace(
            "6. Current time slot (HH:MM~HH:MM): 14:00~15:00",
            "6. Current time slot (HH:MM~HH:MM): 15:00~14:00",
        );
        let reply = say(&svc, "U1", &broken).await;
        assert!(reply.contains("start must be before"), "{reply}");
        assert!(reply.contains("1. Contact name:"), "{reply}");

        let reply = say(&svc, "U1", FORM_A).await;
        assert!(reply.contains("verification code"), "{reply}");
    }

    #[tokio::test]
    async fn missing_fields_are_reported() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;

        let partial = "1. Contact name: Alice\n2. Order number (9 digits): 111111111";
        let reply = say(&svc, "U1", partial).await;
        assert!(reply.contains("phone"), "{reply}");
        assert!(reply.contains("missing"), "{reply}");
    }

    #[tokio::test]
    async fn step_mode_walks_the_whole_flow() {
        let (svc, store) = service(IntakeMode::Step, CorrectionStyle::FieldByField, false);
        let first = say(&svc, "U1", "register").await;
        assert!(first.contains("Contact name"), "{first}");

        let answers = [
            "Alice",
            "111111111",
            "555-0100",
            "alice@example.com",
            "12/25",
            "14:00~15:00",
            "Hall A",
            "12/31",
            "15:00~16:00",
            "any",
        ];
        let mut last = String::new();
        for answer in answers {
            last = say(&svc, "U1", answer).await;
        }
        assert!(last.contains("verification code"), "{last}");

        let Ok(Some(stored)) = store.latest_pending_for_owner(&OwnerId::new("U1")).await else {
            panic!("request not stored");
        };
        assert_eq!(stored.contact, "Alice");
    }

    #[tokio::test]
    async fn step_mode_reasks_the_same_step_on_error() {
        let (svc, _) = service(IntakeMode::Step, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", "Alice").await;

        let reply = say(&svc, "U1", "12345").await;
        assert!(reply.contains("must be exactly 9 digits"), "{reply}");
        assert!(reply.contains("Order number"), "{reply}");

        let reply = say(&svc, "U1", "111111111").await;
        assert!(reply.contains("Phone"), "{reply}");
    }

    #[tokio::test]
    async fn duplicate_order_number_reprompts_the_same_field() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, true);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;

        // same owner, same order number again
        say(&svc, "U1", "register").await;
        let reply = say(&svc, "U1", FORM_A).await;
        assert!(reply.contains("already registered"), "{reply}");
        assert!(reply.contains("Order number"), "{reply}");

        let reply = say(&svc, "U1", "333333333").await;
        assert!(reply.contains("verification code"), "{reply}");
    }

    #[tokio::test]
    async fn same_order_number_under_another_owner_is_fine() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;

        say(&svc, "U2", "register").await;
        let b_with_a_order = FORM_B.replace("222222222", "111111111");
        // B's request matches A's, so it registers and pairs immediately
        let reply = say(&svc, "U2", &b_with_a_order).await;
        assert!(reply.contains("verification code"), "{reply}");
    }

    #[tokio::test]
    async fn cancel_deletes_a_pending_request_once() {
        let (svc, store) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;

        let Ok(Some(stored)) = store.latest_pending_for_owner(&OwnerId::new("U1")).await else {
            panic!("request not stored");
        };
        let command = format!("cancel {} {}", stored.order_no, stored.verification_code);

        let reply = say(&svc, "U1", &command).await;
        assert!(reply.contains("cancelled"), "{reply}");
        assert!(store.get_by_id(stored.id).await.ok().flatten().is_none());

        // gone means gone: the same triple no longer resolves
        let reply = say(&svc, "U1", &command).await;
        assert!(reply.contains("no request found"), "{reply}");
    }

    #[tokio::test]
    async fn cancel_without_arguments_drops_the_latest_pending() {
        let (svc, store) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;

        let reply = say(&svc, "U1", "cancel").await;
        assert!(reply.contains("cancelled"), "{reply}");
        assert!(
            store
                .latest_pending_for_owner(&OwnerId::new("U1"))
                .await
                .ok()
                .flatten()
                .is_none()
        );

        let reply = say(&svc, "U1", "cancel").await;
        assert!(reply.contains("Nothing to cancel"), "{reply}");
    }

    #[tokio::test]
    async fn cancel_mid_intake_discards_the_session() {
        let (svc, _) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;

        let reply = say(&svc, "U1", "cancel").await;
        assert!(reply.contains("discarded"), "{reply}");

        // back to idle: the form is no longer expected
        let reply = say(&svc, "U1", FORM_A).await;
        assert!(reply.contains("Commands:"), "{reply}");
    }

    #[tokio::test]
    async fn matched_requests_cannot_be_cancelled() {
        let (svc, store) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;
        say(&svc, "U2", "register").await;
        say(&svc, "U2", FORM_B).await;

        let Ok(Some(matched)) = store
            .get_by_owner_order_code(&OwnerId::new("U1"), "111111111", &{
                let Ok(Some(row)) = store.get_by_id(crate::domain::RequestId::new(1)).await else {
                    panic!("row missing");
                };
                row.verification_code
            })
            .await
        else {
            panic!("lookup failed");
        };
        assert_eq!(matched.status, RequestStatus::Matched);

        let command = format!("cancel {} {}", matched.order_no, matched.verification_code);
        let reply = say(&svc, "U1", &command).await;
        assert!(reply.contains("already matched"), "{reply}");
        assert!(store.get_by_id(matched.id).await.ok().flatten().is_some());
    }

    #[tokio::test]
    async fn query_reports_status_and_counterpart() {
        let (svc, store) = service(IntakeMode::Form, CorrectionStyle::FieldByField, false);
        say(&svc, "U1", "register").await;
        say(&svc, "U1", FORM_A).await;

        let Ok(Some(mine)) = store.latest_pending_for_owner(&OwnerId::new("U1")).await else {
            panic!("request not stored");
        };
        let query = format!("query {} {}", mine.order_no, mine.verification_code);

        let reply = say(&svc, "U1", &query).await;
        assert!(reply.contains("waiting for a counterpart"), "{reply}");

        // wrong code reveals nothing
        let reply = say(&svc, "U1", &format!("query {} 999999", mine.order_no)).await;
        assert!(reply.contains("no request found"), "{reply}");

        say(&svc, "U2", "register").await;
        say(&svc, "U2", FORM_B).await;

        let reply = say(&svc, "U1", &query).await;
        assert!(reply.contains("is matched"), "{reply}");
        assert!(reply.contains("Bob"), "{reply}");
        assert!(reply.contains("12/31 15:00~16:00 at Hall A"), "{reply}");
    }
}
