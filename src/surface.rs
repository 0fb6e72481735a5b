//! Map surface: hosts the catalog markers and at most one interaction session.
//!
//! The session walks `Info -> Form -> Verifying -> Accepted | Rejected` and is
//! cleared once the verdict has been on screen for the display window.
//!
//! Timers are spawned tokio tasks tracked by their `JoinHandle`. They hold only a
//! `Weak` reference to the surface and carry the generation they were armed in.
//! Every cancel path aborts both handles and bumps the generation, so a timer that
//! already woke up before the abort still finds a stale generation and does nothing.
//! Dropping the surface runs the same cancel path.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::{fmt, time::Duration};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::Timing;
use crate::domain::{Category, ChallengeId, Evidence, EvidenceError, Verdict};
use crate::verdict::VerdictPolicy;

const EVENT_BUFFER: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
  Info,
  Form,
  Verifying,
  Decided(Verdict),
}

impl Phase {
  fn name(self) -> &'static str {
    match self {
      Phase::Info => "info",
      Phase::Form => "form",
      Phase::Verifying => "verifying",
      Phase::Decided(Verdict::Accepted) => "accepted",
      Phase::Decided(Verdict::Rejected) => "rejected",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
  Start,
  Cancel,
  Submit,
}

impl fmt::Display for Trigger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Trigger::Start => "start",
      Trigger::Cancel => "cancel",
      Trigger::Submit => "submit",
    })
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("No challenge is selected")]
  NoSelection,
  #[error("Unknown challenge: {0}")]
  UnknownChallenge(ChallengeId),
  #[error("Cannot {trigger} while {phase}")]
  InvalidTransition { trigger: Trigger, phase: &'static str },
  #[error(transparent)]
  Evidence(#[from] EvidenceError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictState {
  Pending,
  Loading,
  Accepted,
  Rejected,
}

/// What the popup renders right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
  pub selected_challenge: Option<ChallengeId>,
  pub form_visible: bool,
  pub verdict_state: VerdictState,
}

impl SessionSnapshot {
  pub const EMPTY: SessionSnapshot =
    SessionSnapshot { selected_challenge: None, form_visible: false, verdict_state: VerdictState::Pending };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
  Selected,
  FormOpened,
  FormCancelled,
  VerificationStarted,
  VerdictReached,
  Reset,
  Closed,
}

/// Emitted after every transition, user- or timer-driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
  pub cause: Cause,
  pub session: SessionSnapshot,
}

#[derive(Default)]
struct Timers {
  verdict: Option<JoinHandle<()>>,
  reset: Option<JoinHandle<()>>,
}

impl Timers {
  fn abort_all(&mut self) {
    if let Some(h) = self.verdict.take() {
      h.abort();
    }
    if let Some(h) = self.reset.take() {
      h.abort();
    }
  }
}

struct InteractionSession {
  challenge: ChallengeId,
  category: Category,
  phase: Phase,
}

impl InteractionSession {
  fn snapshot(&self) -> SessionSnapshot {
    let (form_visible, verdict_state) = match self.phase {
      Phase::Info => (false, VerdictState::Pending),
      Phase::Form => (true, VerdictState::Pending),
      Phase::Verifying => (true, VerdictState::Loading),
      Phase::Decided(Verdict::Accepted) => (true, VerdictState::Accepted),
      Phase::Decided(Verdict::Rejected) => (true, VerdictState::Rejected),
    };
    SessionSnapshot { selected_challenge: Some(self.challenge), form_visible, verdict_state }
  }
}

#[derive(Default)]
struct Inner {
  session: Option<InteractionSession>,
  timers: Timers,
  generation: u64,
}

impl Inner {
  fn snapshot(&self) -> SessionSnapshot {
    self.session.as_ref().map(InteractionSession::snapshot).unwrap_or(SessionSnapshot::EMPTY)
  }

  /// Abort outstanding timers and invalidate any that already woke up.
  fn cancel_all(&mut self) {
    self.timers.abort_all();
    self.generation += 1;
  }

  fn session_mut(&mut self) -> Result<&mut InteractionSession, SessionError> {
    self.session.as_mut().ok_or(SessionError::NoSelection)
  }
}

struct Shared {
  inner: Mutex<Inner>,
  events: broadcast::Sender<SessionEvent>,
  catalog: Arc<Catalog>,
  policy: Arc<dyn VerdictPolicy>,
  verdict_delay: Duration,
  reset_delay: Duration,
}

impl Shared {
  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn emit(&self, cause: Cause, inner: &Inner) -> SessionSnapshot {
    let session = inner.snapshot();
    // No subscribers is fine; the surface still works headless.
    let _ = self.events.send(SessionEvent { cause, session });
    session
  }
}

/// One host per connected client. Dropping it is the unmount.
pub struct MapSurface {
  shared: Arc<Shared>,
}

impl MapSurface {
  pub fn new(catalog: Arc<Catalog>, policy: Arc<dyn VerdictPolicy>, timing: &Timing) -> Self {
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    Self {
      shared: Arc::new(Shared {
        inner: Mutex::new(Inner::default()),
        events,
        catalog,
        policy,
        verdict_delay: timing.verdict_delay(),
        reset_delay: timing.reset_delay(),
      }),
    }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
    self.shared.events.subscribe()
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    self.shared.lock().snapshot()
  }

  /// Open the popup for `id`. Re-selecting the current challenge changes nothing.
  #[instrument(level = "debug", skip(self))]
  pub fn select_challenge(&self, id: ChallengeId) -> Result<SessionSnapshot, SessionError> {
    let category = self.shared.catalog.get(id).map(|c| c.category).ok_or(SessionError::UnknownChallenge(id))?;
    let mut inner = self.shared.lock();
    if inner.session.as_ref().map(|s| s.challenge) == Some(id) {
      debug!(target: "session", challenge = id, "Challenge already selected");
      return Ok(inner.snapshot());
    }
    inner.cancel_all();
    inner.session = Some(InteractionSession { challenge: id, category, phase: Phase::Info });
    info!(target: "session", challenge = id, %category, "Challenge selected");
    Ok(self.shared.emit(Cause::Selected, &inner))
  }

  #[instrument(level = "debug", skip(self))]
  pub fn start(&self) -> Result<SessionSnapshot, SessionError> {
    let mut inner = self.shared.lock();
    let session = inner.session_mut()?;
    match session.phase {
      Phase::Info => session.phase = Phase::Form,
      other => return Err(SessionError::InvalidTransition { trigger: Trigger::Start, phase: other.name() }),
    }
    debug!(target: "session", challenge = session.challenge, "Completion form opened");
    Ok(self.shared.emit(Cause::FormOpened, &inner))
  }

  #[instrument(level = "debug", skip(self))]
  pub fn cancel(&self) -> Result<SessionSnapshot, SessionError> {
    let mut inner = self.shared.lock();
    let session = inner.session_mut()?;
    match session.phase {
      Phase::Form => session.phase = Phase::Info,
      other => return Err(SessionError::InvalidTransition { trigger: Trigger::Cancel, phase: other.name() }),
    }
    debug!(target: "session", challenge = session.challenge, "Completion form cancelled");
    Ok(self.shared.emit(Cause::FormCancelled, &inner))
  }

  /// Submit completion evidence and arm the verdict timer.
  ///
  /// Allowed from the form, and again while verifying or showing a verdict; a
  /// repeat submission cancels the timers of the previous one before re-arming.
  #[instrument(level = "debug", skip(self, evidence), fields(photos = evidence.photos.len()))]
  pub fn submit(&self, evidence: Evidence) -> Result<SessionSnapshot, SessionError> {
    let mut inner = self.shared.lock();
    let session = inner.session_mut()?;
    let (challenge, phase) = (session.challenge, session.phase);
    match phase {
      Phase::Form => {}
      Phase::Verifying | Phase::Decided(_) => {
        warn!(target: "session", challenge, phase = phase.name(), "Repeated submit; cancelling pending timers");
      }
      Phase::Info => return Err(SessionError::InvalidTransition { trigger: Trigger::Submit, phase: phase.name() }),
    }
    evidence.validate(session.category)?;
    session.phase = Phase::Verifying;

    inner.cancel_all();
    let generation = inner.generation;
    let weak = Arc::downgrade(&self.shared);
    let delay = self.shared.verdict_delay;
    inner.timers.verdict = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      on_verdict_due(weak, generation, evidence);
    }));
    info!(target: "session", challenge, generation, "Verification started");
    Ok(self.shared.emit(Cause::VerificationStarted, &inner))
  }

  /// Close the popup: cancel timers and clear the selection.
  #[instrument(level = "debug", skip(self))]
  pub fn close(&self) -> SessionSnapshot {
    let mut inner = self.shared.lock();
    inner.cancel_all();
    if let Some(s) = inner.session.take() {
      info!(target: "session", challenge = s.challenge, phase = s.phase.name(), "Session closed");
      return self.shared.emit(Cause::Closed, &inner);
    }
    inner.snapshot()
  }
}

impl Drop for MapSurface {
  fn drop(&mut self) {
    let mut inner = self.shared.lock();
    inner.cancel_all();
    if let Some(s) = inner.session.take() {
      debug!(target: "session", challenge = s.challenge, phase = s.phase.name(), "Surface dropped with open session");
    }
  }
}

fn on_verdict_due(weak: Weak<Shared>, generation: u64, evidence: Evidence) {
  let Some(shared) = weak.upgrade() else { return };
  let mut inner = shared.lock();
  if inner.generation != generation {
    return;
  }
  let Some(session) = inner.session.as_mut() else { return };
  if session.phase != Phase::Verifying {
    return;
  }
  let verdict = shared.policy.decide(&evidence);
  session.phase = Phase::Decided(verdict);
  info!(target: "session", challenge = session.challenge, ?verdict, "Verdict reached");

  // The finished verdict task needs no abort; only the reset timer stays live.
  inner.timers.verdict = None;
  let delay = shared.reset_delay;
  let weak = Arc::downgrade(&shared);
  inner.timers.reset = Some(tokio::spawn(async move {
    tokio::time::sleep(delay).await;
    on_reset_due(weak, generation);
  }));
  shared.emit(Cause::VerdictReached, &inner);
}

fn on_reset_due(weak: Weak<Shared>, generation: u64) {
  let Some(shared) = weak.upgrade() else { return };
  let mut inner = shared.lock();
  if inner.generation != generation {
    return;
  }
  match inner.session.as_ref().map(|s| s.phase) {
    Some(Phase::Decided(_)) => {}
    _ => return,
  }
  inner.timers.reset = None;
  inner.generation += 1;
  if let Some(s) = inner.session.take() {
    info!(target: "session", challenge = s.challenge, "Session reset after verdict display");
  }
  shared.emit(Cause::Reset, &inner);
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use base64::{engine::general_purpose::STANDARD, Engine as _};
  use tokio::sync::broadcast::error::TryRecvError;
  use tokio::time::sleep;

  use super::*;
  use crate::domain::PhotoUpload;
  use crate::seeds::seed_challenges;
  use crate::verdict::Fixed;

  const EIFFEL: ChallengeId = 1;
  const TOKYO_FOOD: ChallengeId = 2;

  struct Counting {
    calls: AtomicUsize,
    verdict: Verdict,
  }

  impl VerdictPolicy for Counting {
    fn decide(&self, _evidence: &Evidence) -> Verdict {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.verdict
    }
  }

  fn surface_with(policy: Arc<dyn VerdictPolicy>) -> MapSurface {
    let catalog = Arc::new(Catalog::build(seed_challenges(), &[]));
    MapSurface::new(catalog, policy, &Timing::default())
  }

  fn counting(verdict: Verdict) -> Arc<Counting> {
    Arc::new(Counting { calls: AtomicUsize::new(0), verdict })
  }

  fn evidence() -> Evidence {
    Evidence {
      photos: vec![PhotoUpload { name: "deck.jpg".into(), data: STANDARD.encode(b"jpeg-bytes") }],
      time_spent_minutes: Some(90),
      ..Default::default()
    }
  }

  fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<Cause> {
    let mut out = vec![];
    loop {
      match rx.try_recv() {
        Ok(ev) => out.push(ev.cause),
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return out,
        Err(TryRecvError::Lagged(_)) => continue,
      }
    }
  }

  #[tokio::test(start_paused = true)]
  async fn select_opens_info_view_once() {
    let surface = surface_with(Arc::new(Fixed(Verdict::Accepted)));
    let mut rx = surface.subscribe();
    let snap = surface.select_challenge(EIFFEL).unwrap();
    assert_eq!(
      snap,
      SessionSnapshot { selected_challenge: Some(EIFFEL), form_visible: false, verdict_state: VerdictState::Pending }
    );
    assert_eq!(surface.select_challenge(EIFFEL).unwrap(), snap);
    assert_eq!(drain(&mut rx), vec![Cause::Selected]);
  }

  #[tokio::test(start_paused = true)]
  async fn unknown_challenge_and_missing_selection_are_errors() {
    let surface = surface_with(Arc::new(Fixed(Verdict::Accepted)));
    assert_eq!(surface.select_challenge(999), Err(SessionError::UnknownChallenge(999)));
    assert_eq!(surface.start(), Err(SessionError::NoSelection));
    assert_eq!(surface.submit(evidence()), Err(SessionError::NoSelection));
    assert_eq!(surface.snapshot(), SessionSnapshot::EMPTY);
  }

  #[tokio::test(start_paused = true)]
  async fn start_then_cancel_round_trips() {
    let surface = surface_with(Arc::new(Fixed(Verdict::Accepted)));
    let before = surface.select_challenge(EIFFEL).unwrap();
    let form = surface.start().unwrap();
    assert!(form.form_visible);
    assert_eq!(surface.cancel().unwrap(), before);
  }

  #[tokio::test(start_paused = true)]
  async fn triggers_outside_the_table_are_rejected() {
    let surface = surface_with(Arc::new(Fixed(Verdict::Accepted)));
    surface.select_challenge(EIFFEL).unwrap();
    assert_eq!(
      surface.cancel(),
      Err(SessionError::InvalidTransition { trigger: Trigger::Cancel, phase: "info" })
    );
    assert_eq!(
      surface.submit(evidence()),
      Err(SessionError::InvalidTransition { trigger: Trigger::Submit, phase: "info" })
    );
    surface.start().unwrap();
    assert_eq!(surface.start(), Err(SessionError::InvalidTransition { trigger: Trigger::Start, phase: "form" }));
  }

  #[tokio::test(start_paused = true)]
  async fn incomplete_evidence_keeps_form_open() {
    let policy = counting(Verdict::Accepted);
    let surface = surface_with(policy.clone());
    surface.select_challenge(TOKYO_FOOD).unwrap();
    let form = surface.start().unwrap();

    // Food challenges also need a rating and a review.
    assert_eq!(surface.submit(evidence()), Err(SessionError::Evidence(EvidenceError::Missing("rating"))));
    assert_eq!(surface.snapshot(), form);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(surface.snapshot(), form);
    assert_eq!(policy.calls.load(Ordering::SeqCst), 0);

    let food = Evidence { rating: Some(5), review: Some("Best ramen of the trip".into()), ..evidence() };
    assert_eq!(surface.submit(food).unwrap().verdict_state, VerdictState::Loading);
  }

  #[tokio::test(start_paused = true)]
  async fn submit_resolves_to_one_verdict_then_resets_once() {
    let policy = counting(Verdict::Rejected);
    let surface = surface_with(policy.clone());
    let mut rx = surface.subscribe();
    surface.select_challenge(EIFFEL).unwrap();
    surface.start().unwrap();
    let verifying = surface.submit(evidence()).unwrap();
    assert_eq!(verifying.verdict_state, VerdictState::Loading);

    sleep(Duration::from_millis(1999)).await;
    assert_eq!(surface.snapshot().verdict_state, VerdictState::Loading);

    sleep(Duration::from_millis(2)).await;
    let decided = surface.snapshot();
    assert_eq!(decided.verdict_state, VerdictState::Rejected);
    assert_eq!(decided.selected_challenge, Some(EIFFEL));

    // Repeated reads during the display window must not reset anything.
    for _ in 0..5 {
      assert_eq!(surface.snapshot(), decided);
      sleep(Duration::from_millis(500)).await;
    }
    sleep(Duration::from_millis(600)).await;
    assert_eq!(surface.snapshot(), SessionSnapshot::EMPTY);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(policy.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
      drain(&mut rx),
      vec![Cause::Selected, Cause::FormOpened, Cause::VerificationStarted, Cause::VerdictReached, Cause::Reset]
    );
  }

  #[tokio::test(start_paused = true)]
  async fn close_during_verification_cancels_timers() {
    let policy = counting(Verdict::Accepted);
    let surface = surface_with(policy.clone());
    let mut rx = surface.subscribe();
    surface.select_challenge(EIFFEL).unwrap();
    surface.start().unwrap();
    surface.submit(evidence()).unwrap();

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(surface.close(), SessionSnapshot::EMPTY);
    drain(&mut rx);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(surface.snapshot(), SessionSnapshot::EMPTY);
    assert_eq!(policy.calls.load(Ordering::SeqCst), 0);
    assert!(drain(&mut rx).is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn dropping_the_surface_cancels_timers() {
    let policy = counting(Verdict::Accepted);
    let surface = surface_with(policy.clone());
    surface.select_challenge(EIFFEL).unwrap();
    surface.start().unwrap();
    surface.submit(evidence()).unwrap();
    drop(surface);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(policy.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn resubmit_replaces_pending_verdict_timer() {
    let policy = counting(Verdict::Accepted);
    let surface = surface_with(policy.clone());
    surface.select_challenge(EIFFEL).unwrap();
    surface.start().unwrap();
    surface.submit(evidence()).unwrap();

    sleep(Duration::from_millis(1500)).await;
    surface.submit(evidence()).unwrap();

    // The first timer would have fired at 2000ms.
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(surface.snapshot().verdict_state, VerdictState::Loading);
    assert_eq!(policy.calls.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(surface.snapshot().verdict_state, VerdictState::Accepted);
    assert_eq!(policy.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn resubmit_during_display_window_rearms_verification() {
    let surface = surface_with(Arc::new(Fixed(Verdict::Rejected)));
    let mut rx = surface.subscribe();
    surface.select_challenge(EIFFEL).unwrap();
    surface.start().unwrap();
    surface.submit(evidence()).unwrap();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(surface.snapshot().verdict_state, VerdictState::Rejected);

    surface.submit(evidence()).unwrap();
    // The old reset (due at 5000ms) is gone; the new verdict lands at 4500ms.
    sleep(Duration::from_millis(2100)).await;
    assert_eq!(surface.snapshot().verdict_state, VerdictState::Rejected);
    assert_eq!(surface.snapshot().selected_challenge, Some(EIFFEL));

    sleep(Duration::from_secs(3)).await;
    assert_eq!(surface.snapshot(), SessionSnapshot::EMPTY);
    let resets = drain(&mut rx).into_iter().filter(|c| *c == Cause::Reset).count();
    assert_eq!(resets, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn selecting_another_challenge_abandons_verification() {
    let policy = counting(Verdict::Accepted);
    let surface = surface_with(policy.clone());
    surface.select_challenge(EIFFEL).unwrap();
    surface.start().unwrap();
    surface.submit(evidence()).unwrap();

    let snap = surface.select_challenge(TOKYO_FOOD).unwrap();
    assert_eq!(snap.selected_challenge, Some(TOKYO_FOOD));
    assert_eq!(snap.verdict_state, VerdictState::Pending);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(surface.snapshot(), snap);
    assert_eq!(policy.calls.load(Ordering::SeqCst), 0);
  }
}
