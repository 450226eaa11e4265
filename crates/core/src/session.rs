//! The scan session controller.
//!
//! A session is a single-writer state container driven by discrete external
//! events: start scan, payload received, lookup settled, reset. The only
//! suspension point is the lookup call; everything else is a synchronous
//! transition. The scan capability is exclusively owned by the active
//! session and is released on every exit path from `Scanning`.
//!
//! Stale lookup results are fenced with a session generation counter: a
//! [`PendingLookup`] token captures the generation when the session enters
//! `Resolving`, and [`SessionController::complete_lookup`] discards any
//! result whose token no longer matches (the session was reset while the
//! call was in flight).

use crate::error::{ScanError, SourceError};
use crate::identifier::ParsedIdentifier;
use crate::lookup::{LookupError, PatientLookup};
use crate::patient::PatientRecord;
use crate::query::LookupQuery;

/// Lifecycle phase of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No scan in progress.
    Idle,
    /// The capability is active and may deliver a payload.
    Scanning,
    /// A payload was accepted; the lookup call is (or is about to be) in
    /// flight.
    Resolving,
    /// The lookup returned a patient.
    Success,
    /// The session terminated with a [`ScanError`].
    Failed,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Scanning => "scanning",
            SessionPhase::Resolving => "resolving",
            SessionPhase::Success => "success",
            SessionPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The session state container, owned by the controller.
///
/// Collaborators read it through [`SessionController::session`] or the
/// [`SessionObserver`] callback; only the controller mutates it.
#[derive(Debug)]
pub struct ScanSession {
    phase: SessionPhase,
    scanned: Option<ParsedIdentifier>,
    patient: Option<PatientRecord>,
    error: Option<ScanError>,
    generation: u64,
}

impl ScanSession {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            scanned: None,
            patient: None,
            error: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The interpreted payload of the accepted scan, if one was accepted.
    pub fn scanned(&self) -> Option<&ParsedIdentifier> {
        self.scanned.as_ref()
    }

    /// The patient aggregate, present in `Success`.
    pub fn patient(&self) -> Option<&PatientRecord> {
        self.patient.as_ref()
    }

    /// The terminating error, present in `Failed`.
    pub fn error(&self) -> Option<&ScanError> {
        self.error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A scan capability: camera decode loop, tag reader, tethered scanner.
///
/// `start` and `stop` are idempotent. Payload delivery is out-of-band: the
/// embedding feeds decoded payloads to
/// [`SessionController::payload_received`] (or the async drivers) while the
/// source is active.
pub trait ScanSource {
    /// Activate the capability.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the hardware is unsupported or cannot
    /// be acquired.
    fn start(&mut self) -> Result<(), SourceError>;

    /// Release the capability. Safe to call in any state.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Capability stand-in for tethered readers.
///
/// Keyboard-wedge barcode scanners and serial-line NFC readers deliver
/// decoded payloads through ordinary input; there is no device to acquire,
/// so this source only tracks the active flag.
#[derive(Debug, Default)]
pub struct ManualSource {
    active: bool,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScanSource for ManualSource {
    fn start(&mut self) -> Result<(), SourceError> {
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Display collaborator: notified after every session transition.
pub trait SessionObserver {
    fn session_changed(&mut self, session: &ScanSession);
}

/// Observer that ignores all transitions.
#[derive(Debug, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn session_changed(&mut self, _session: &ScanSession) {}
}

/// Observer that logs transitions through `tracing`.
#[derive(Debug, Default)]
pub struct TraceObserver;

impl SessionObserver for TraceObserver {
    fn session_changed(&mut self, session: &ScanSession) {
        match session.error() {
            Some(error) => {
                tracing::warn!(kind = error.kind(), %error, "scan session failed")
            }
            None => tracing::debug!(phase = session.phase().as_str(), "scan session phase"),
        }
    }
}

/// Token for an in-flight lookup, captured when the session enters
/// `Resolving`.
#[derive(Debug, Clone)]
pub struct PendingLookup {
    generation: u64,
    query: LookupQuery,
}

impl PendingLookup {
    pub fn query(&self) -> &LookupQuery {
        &self.query
    }
}

/// Drives the scan → resolve → lookup → display lifecycle.
pub struct SessionController<S, L, O> {
    session: ScanSession,
    source: S,
    lookup: L,
    observer: O,
}

impl<S, L, O> SessionController<S, L, O>
where
    S: ScanSource,
    L: PatientLookup,
    O: SessionObserver,
{
    pub fn new(source: S, lookup: L, observer: O) -> Self {
        Self {
            session: ScanSession::new(),
            source,
            lookup,
            observer,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Begin listening for a scan.
    ///
    /// Transitions `Idle` to `Scanning`. A repeated start while `Scanning`
    /// is a no-op; while a lookup is in flight, or after the session has
    /// settled, the command is ignored; the session must be reset first.
    /// A capability that fails to start terminates the session with
    /// [`ScanError::Transport`].
    pub fn start_scan(&mut self) {
        match self.session.phase {
            SessionPhase::Idle => match self.source.start() {
                Ok(()) => {
                    self.session.phase = SessionPhase::Scanning;
                    self.notify();
                }
                Err(error) => self.fail(ScanError::Transport(error.to_string())),
            },
            SessionPhase::Scanning => {
                tracing::debug!("start scan ignored: capability already active");
            }
            phase => {
                tracing::debug!(phase = phase.as_str(), "start scan ignored");
            }
        }
    }

    /// Accept a payload from the active capability.
    ///
    /// Only honoured in `Scanning`; a payload delivered in any other phase
    /// is discarded, so the first accepted payload wins even if the hardware
    /// races a second delivery past `stop`. The capability is released
    /// before the payload is resolved.
    ///
    /// Returns the [`PendingLookup`] token when the payload resolved to a
    /// query; the caller runs the lookup (see [`run_lookup`](Self::run_lookup))
    /// and reports back through [`complete_lookup`](Self::complete_lookup).
    pub fn payload_received(&mut self, raw: &str) -> Option<PendingLookup> {
        if self.session.phase != SessionPhase::Scanning {
            tracing::debug!(
                phase = self.session.phase.as_str(),
                "discarding scan payload"
            );
            return None;
        }

        self.source.stop();

        let parsed = match ParsedIdentifier::parse(raw) {
            Ok(parsed) => parsed,
            Err(error) => {
                self.fail(error);
                return None;
            }
        };

        let query = parsed.to_query();
        self.session.scanned = Some(parsed);

        match query {
            Ok(query) => {
                self.session.phase = SessionPhase::Resolving;
                self.notify();
                Some(PendingLookup {
                    generation: self.session.generation,
                    query,
                })
            }
            Err(error) => {
                self.fail(error);
                None
            }
        }
    }

    /// Report a capability failure.
    ///
    /// Only meaningful while `Scanning`: releases the capability and
    /// terminates the session with [`ScanError::Transport`].
    pub fn source_failed(&mut self, error: SourceError) {
        if self.session.phase != SessionPhase::Scanning {
            tracing::debug!(
                phase = self.session.phase.as_str(),
                "discarding capability error"
            );
            return;
        }
        self.fail(ScanError::Transport(error.to_string()));
    }

    /// Settle the session with the outcome of a lookup call.
    ///
    /// A result whose token was issued before the last reset is stale and is
    /// discarded without touching session state.
    pub fn complete_lookup(
        &mut self,
        pending: PendingLookup,
        outcome: Result<Option<PatientRecord>, LookupError>,
    ) {
        if pending.generation != self.session.generation {
            tracing::debug!("discarding stale lookup result");
            return;
        }
        if self.session.phase != SessionPhase::Resolving {
            tracing::debug!(
                phase = self.session.phase.as_str(),
                "discarding lookup result"
            );
            return;
        }

        match outcome {
            Ok(Some(patient)) => {
                self.session.patient = Some(patient);
                self.session.phase = SessionPhase::Success;
                self.notify();
            }
            Ok(None) => self.fail(ScanError::NotFound),
            Err(error) => self.fail(ScanError::Transport(error.to_string())),
        }
    }

    /// Await the lookup for a pending token and settle the session.
    pub async fn run_lookup(&mut self, pending: PendingLookup) {
        let outcome = self.lookup.find_patient(pending.query()).await;
        self.complete_lookup(pending, outcome);
    }

    /// Accept a payload and drive it through lookup to completion.
    pub async fn process_payload(&mut self, raw: &str) {
        if let Some(pending) = self.payload_received(raw) {
            self.run_lookup(pending).await;
        }
    }

    /// Return the session to `Idle`.
    ///
    /// Releases the capability, clears the scanned payload, patient and
    /// error, and bumps the generation so any still-pending lookup result
    /// arrives stale.
    pub fn reset(&mut self) {
        self.source.stop();
        self.session.generation += 1;
        self.session.phase = SessionPhase::Idle;
        self.session.scanned = None;
        self.session.patient = None;
        self.session.error = None;
        self.notify();
    }

    fn fail(&mut self, error: ScanError) {
        self.source.stop();
        self.session.phase = SessionPhase::Failed;
        self.session.error = Some(error);
        self.notify();
    }

    fn notify(&mut self) {
        self.observer.session_changed(&self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use medicard_types::IdentifierText;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    /// Scripted capability standing in for the camera/NFC hardware.
    #[derive(Default)]
    struct ScriptedSource {
        active: bool,
        starts: usize,
        fail_start: bool,
    }

    impl ScanSource for ScriptedSource {
        fn start(&mut self) -> Result<(), SourceError> {
            if self.fail_start {
                return Err(SourceError::Unsupported);
            }
            self.starts += 1;
            self.active = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    enum StubOutcome {
        Found,
        Missing,
        Fails,
    }

    struct StubLookup {
        outcome: StubOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl StubLookup {
        fn new(outcome: StubOutcome) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    outcome,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl PatientLookup for StubLookup {
        async fn find_patient(
            &self,
            _query: &LookupQuery,
        ) -> Result<Option<PatientRecord>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                StubOutcome::Found => Ok(Some(sample_patient())),
                StubOutcome::Missing => Ok(None),
                StubOutcome::Fails => Err(LookupError::Transport("connection refused".into())),
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingObserver {
        phases: Arc<Mutex<Vec<SessionPhase>>>,
    }

    impl SessionObserver for RecordingObserver {
        fn session_changed(&mut self, session: &ScanSession) {
            self.phases.lock().expect("lock").push(session.phase());
        }
    }

    fn sample_patient() -> PatientRecord {
        PatientRecord {
            id: Uuid::new_v4(),
            patient_id: IdentifierText::new("P123").expect("valid identifier"),
            nfc_id: Some("NFC_P987".into()),
            qr_code: None,
            full_name: "John Doe".into(),
            date_of_birth: None,
            gender: None,
            blood_type: Some("A+".into()),
            allergies: vec!["Penicillin".into()],
            medical_conditions: vec![],
            phone: None,
            email: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            created_at: Utc::now(),
        }
    }

    fn harness(
        outcome: StubOutcome,
    ) -> (
        SessionController<ScriptedSource, StubLookup, NullObserver>,
        Arc<AtomicUsize>,
    ) {
        let (lookup, calls) = StubLookup::new(outcome);
        (
            SessionController::new(ScriptedSource::default(), lookup, NullObserver),
            calls,
        )
    }

    #[test]
    fn start_scan_is_idempotent_while_scanning() {
        let (mut controller, _calls) = harness(StubOutcome::Found);

        controller.start_scan();
        controller.start_scan();

        assert_eq!(controller.session().phase(), SessionPhase::Scanning);
        assert_eq!(controller.source().starts, 1);
    }

    #[test]
    fn first_payload_wins() {
        let (mut controller, _calls) = harness(StubOutcome::Found);

        controller.start_scan();
        let first = controller.payload_received(r#"{"patientId":"P123"}"#);
        let second = controller.payload_received("NFC_LATE");

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(controller.session().phase(), SessionPhase::Resolving);
        assert!(!controller.source().is_active());
    }

    #[test]
    fn stale_lookup_result_after_reset_is_discarded() {
        let (mut controller, _calls) = harness(StubOutcome::Found);

        controller.start_scan();
        let pending = controller
            .payload_received(r#"{"patientId":"P123"}"#)
            .expect("pending lookup");

        controller.reset();
        controller.complete_lookup(pending, Ok(Some(sample_patient())));

        assert_eq!(controller.session().phase(), SessionPhase::Idle);
        assert!(controller.session().patient().is_none());
    }

    #[tokio::test]
    async fn structured_payload_resolves_to_success() {
        let (mut controller, calls) = harness(StubOutcome::Found);

        controller.start_scan();
        controller.process_payload(r#"{"patientId":"P123"}"#).await;

        assert_eq!(controller.session().phase(), SessionPhase::Success);
        assert_eq!(
            controller.session().patient().map(|p| p.patient_id.as_str()),
            Some("P123")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!controller.source().is_active());
    }

    #[tokio::test]
    async fn bare_string_with_no_match_fails_not_found() {
        let (mut controller, _calls) = harness(StubOutcome::Missing);

        controller.start_scan();
        controller.process_payload("NFC_P987").await;

        let session = controller.session();
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.error(), Some(&ScanError::NotFound));
        assert!(matches!(
            session.scanned(),
            Some(ParsedIdentifier::Opaque(raw)) if raw == "NFC_P987"
        ));
    }

    #[tokio::test]
    async fn empty_object_fails_without_calling_lookup() {
        let (mut controller, calls) = harness(StubOutcome::Found);

        controller.start_scan();
        controller.process_payload("{}").await;

        let session = controller.session();
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.error(), Some(&ScanError::NoUsableIdentifier));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_transport_error_fails_session() {
        let (mut controller, _calls) = harness(StubOutcome::Fails);

        controller.start_scan();
        controller.process_payload(r#"{"patientId":"P123"}"#).await;

        let session = controller.session();
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert!(matches!(session.error(), Some(ScanError::Transport(_))));
    }

    #[test]
    fn empty_payload_fails_before_lookup() {
        let (mut controller, calls) = harness(StubOutcome::Found);

        controller.start_scan();
        let pending = controller.payload_received("");

        assert!(pending.is_none());
        assert_eq!(controller.session().phase(), SessionPhase::Failed);
        assert_eq!(
            controller.session().error(),
            Some(&ScanError::NoUsableIdentifier)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reset_releases_capability_mid_scan() {
        let (mut controller, _calls) = harness(StubOutcome::Found);

        controller.start_scan();
        assert!(controller.source().is_active());

        controller.reset();
        assert_eq!(controller.session().phase(), SessionPhase::Idle);
        assert!(!controller.source().is_active());
    }

    #[test]
    fn capability_failure_releases_and_fails() {
        let (mut controller, _calls) = harness(StubOutcome::Found);

        controller.start_scan();
        controller.source_failed(SourceError::Device("reader unplugged".into()));

        assert_eq!(controller.session().phase(), SessionPhase::Failed);
        assert!(matches!(
            controller.session().error(),
            Some(ScanError::Transport(_))
        ));
        assert!(!controller.source().is_active());
    }

    #[test]
    fn start_scan_is_ignored_while_resolving() {
        let (mut controller, _calls) = harness(StubOutcome::Found);

        controller.start_scan();
        let _pending = controller.payload_received(r#"{"patientId":"P123"}"#);

        controller.start_scan();
        assert_eq!(controller.session().phase(), SessionPhase::Resolving);
        assert_eq!(controller.source().starts, 1);
    }

    #[test]
    fn unsupported_capability_fails_on_start() {
        let source = ScriptedSource {
            fail_start: true,
            ..ScriptedSource::default()
        };
        let (lookup, _calls) = StubLookup::new(StubOutcome::Found);
        let mut controller = SessionController::new(source, lookup, NullObserver);

        controller.start_scan();
        assert_eq!(controller.session().phase(), SessionPhase::Failed);
        assert!(matches!(
            controller.session().error(),
            Some(ScanError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn observer_sees_every_transition() {
        let source = ScriptedSource::default();
        let (lookup, _calls) = StubLookup::new(StubOutcome::Found);
        let observer = RecordingObserver::default();
        let phases = observer.phases.clone();
        let mut controller = SessionController::new(source, lookup, observer);

        controller.start_scan();
        controller.process_payload(r#"{"patientId":"P123"}"#).await;
        controller.reset();

        assert_eq!(
            *phases.lock().expect("lock"),
            vec![
                SessionPhase::Scanning,
                SessionPhase::Resolving,
                SessionPhase::Success,
                SessionPhase::Idle
            ]
        );
    }

    #[test]
    fn reset_bumps_generation() {
        let (mut controller, _calls) = harness(StubOutcome::Found);

        let before = controller.session().generation();
        controller.reset();
        assert_eq!(controller.session().generation(), before + 1);
    }
}
