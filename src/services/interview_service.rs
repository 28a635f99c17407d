use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::dto::analysis_dto::AnalysisReply;
use crate::error::{Error, Result};
use crate::models::application::RelevanceBucket;
use crate::models::interview::{
    CompletionSignal, DialogStage, InterviewPhase, InterviewSnapshot, TranscriptEntry,
    TranscriptRole,
};
use crate::models::message::{ChatMessage, ChatSender};
use crate::models::vacancy::Vacancy;

pub const START_FALLBACK: &str =
    "The assistant is unavailable right now. Please try starting the interview again in a moment.";
pub const REPLY_FALLBACK: &str =
    "Sorry, I could not process your answer. Please send it again.";

/// Completed interviews stay readable this long after their last request.
pub const COMPLETED_RETENTION: Duration = Duration::from_secs(300);

/// Calls an interview needs from the recruitment backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScreeningBackend: Send + Sync {
    async fn analyze(&self, application_id: i64) -> Result<AnalysisReply>;

    async fn chat_turn(
        &self,
        application_id: i64,
        session_id: &str,
        message: &str,
    ) -> Result<AnalysisReply>;

    async fn history(&self, application_id: i64) -> Result<Vec<ChatMessage>>;

    async fn record_message(
        &self,
        application_id: i64,
        sender: ChatSender,
        content: &str,
    ) -> Result<ChatMessage>;

    async fn alternative_vacancies(&self, vacancy_id: i64, limit: usize) -> Result<Vec<Vacancy>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetFlags {
    /// Widget sits inside the application page and restores the stored transcript on mount.
    pub embedded: bool,
    /// Mounting the widget opens the interview without an explicit start.
    pub auto_start: bool,
}

impl Default for WidgetFlags {
    fn default() -> Self {
        Self {
            embedded: false,
            auto_start: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterviewSettings {
    pub turn_cap: Option<u32>,
    pub alternatives: usize,
    pub idle_ttl: Duration,
}

impl InterviewSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            turn_cap: config.interview_turn_cap,
            alternatives: config.alternative_vacancies,
            idle_ttl: Duration::from_secs(config.interview_idle_ttl_secs),
        }
    }
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            turn_cap: Some(5),
            alternatives: 3,
            idle_ttl: Duration::from_secs(1800),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    phase: InterviewPhase,
    start_requested: bool,
    history_restored: bool,
    busy: bool,
    session_id: Option<String>,
    turn_count: u32,
    relevance_percent: Option<f64>,
    dialog_stage: Option<DialogStage>,
    completed_by: Option<CompletionSignal>,
    summary: Option<String>,
    reasons: Vec<String>,
    transcript: Vec<TranscriptEntry>,
    alternatives: Vec<Vacancy>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: InterviewPhase::NotStarted,
            start_requested: false,
            history_restored: false,
            busy: false,
            session_id: None,
            turn_count: 0,
            relevance_percent: None,
            dialog_stage: None,
            completed_by: None,
            summary: None,
            reasons: Vec::new(),
            transcript: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Folds an analysis reply into the state and returns the bot line to persist, if any.
    fn absorb(&mut self, reply: &AnalysisReply) -> Option<String> {
        if !reply.session_id.is_empty() {
            self.session_id = Some(reply.session_id.clone());
        }
        self.relevance_percent = Some(reply.relevance_percent);
        self.dialog_stage = reply.dialog_stage;
        if !reply.summary_for_employer.is_empty() {
            self.summary = Some(reply.summary_for_employer.clone());
        }
        if !reply.reasons.is_empty() {
            self.reasons = reply.reasons.clone();
        }
        let text = reply.bot_text();
        if let Some(text) = &text {
            self.transcript.push(TranscriptEntry::assistant(text.clone()));
        }
        text
    }

    fn complete(&mut self, signal: CompletionSignal) {
        self.phase = InterviewPhase::Completed;
        self.completed_by = Some(signal);
        if self.dialog_stage.is_none() {
            self.dialog_stage = Some(DialogStage::Completed);
        }
    }

    fn wants_alternatives(&self) -> bool {
        self.phase == InterviewPhase::Completed
            && RelevanceBucket::from_percent(self.relevance_percent.unwrap_or(0.0))
                == RelevanceBucket::Low
    }
}

/// One screening conversation, bound to a single application.
pub struct InterviewSession {
    application_id: i64,
    /// Job seeker who owns the application; nobody else may read or answer.
    owner_id: i64,
    vacancy_id: i64,
    settings: InterviewSettings,
    state: Mutex<SessionState>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl InterviewSession {
    pub fn new(
        application_id: i64,
        owner_id: i64,
        vacancy_id: i64,
        settings: InterviewSettings,
    ) -> Self {
        Self {
            application_id,
            owner_id,
            vacancy_id,
            settings,
            state: Mutex::new(SessionState::new()),
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    pub fn application_id(&self) -> i64 {
        self.application_id
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn vacancy_id(&self) -> i64 {
        self.vacancy_id
    }

    fn ensure_owner(&self, user_id: i64) -> Result<()> {
        if user_id != self.owner_id {
            return Err(Error::Forbidden(
                "This interview belongs to another user".to_string(),
            ));
        }
        Ok(())
    }

    /// Phase and busy flag, read without failing on a poisoned lock.
    fn activity(&self) -> Option<(InterviewPhase, bool)> {
        self.state.lock().ok().map(|s| (s.phase, s.busy))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("interview state lock poisoned".to_string()))
    }

    pub fn snapshot(&self) -> Result<InterviewSnapshot> {
        let state = self.lock()?;
        self.snapshot_from(&state)
    }

    /// Runs the widget's mount effects: history restore when embedded, then auto start.
    pub async fn mount(
        &self,
        backend: Arc<dyn ScreeningBackend>,
        flags: WidgetFlags,
    ) -> Result<InterviewSnapshot> {
        let (snapshot, _) = self.mount_effects(backend, flags).await?;
        Ok(snapshot)
    }

    /// Mount followed by an explicit start. Analysis runs at most once per call,
    /// and a start that failed on an earlier call is attempted again.
    pub async fn begin(
        &self,
        backend: Arc<dyn ScreeningBackend>,
        flags: WidgetFlags,
    ) -> Result<InterviewSnapshot> {
        let (snapshot, attempted) = self.mount_effects(backend.clone(), flags).await?;
        if attempted || snapshot.phase != InterviewPhase::NotStarted {
            return Ok(snapshot);
        }
        self.start(backend).await
    }

    /// Returns the snapshot and whether auto start ran.
    async fn mount_effects(
        &self,
        backend: Arc<dyn ScreeningBackend>,
        flags: WidgetFlags,
    ) -> Result<(InterviewSnapshot, bool)> {
        if flags.embedded {
            self.restore_history(backend.as_ref()).await?;
        }
        let should_start = {
            let state = self.lock()?;
            flags.auto_start && state.transcript.is_empty()
        };
        if should_start {
            return Ok((self.start(backend).await?, true));
        }
        Ok((self.snapshot()?, false))
    }

    async fn restore_history(&self, backend: &dyn ScreeningBackend) -> Result<()> {
        let restored = self.lock()?.history_restored;
        if restored {
            return Ok(());
        }

        let mut history = match backend.history(self.application_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    application_id = self.application_id,
                    "Failed to load chat history: {}",
                    e
                );
                return Ok(());
            }
        };
        history.sort_by_key(|m| m.created_at);

        let mut state = self.lock()?;
        state.history_restored = true;
        if state.transcript.is_empty() {
            state.transcript = history
                .into_iter()
                .map(|m| TranscriptEntry {
                    role: match m.sender_type {
                        ChatSender::Bot => TranscriptRole::Assistant,
                        ChatSender::User => TranscriptRole::User,
                    },
                    text: m.content,
                    at: m.created_at,
                    fallback: false,
                })
                .collect();
        }
        Ok(())
    }

    /// Opens the screening session. Repeated calls while a start is pending or done are no-ops.
    pub async fn start(&self, backend: Arc<dyn ScreeningBackend>) -> Result<InterviewSnapshot> {
        {
            let mut state = self.lock()?;
            if state.start_requested || state.phase != InterviewPhase::NotStarted {
                return self.snapshot_from(&state);
            }
            state.start_requested = true;
            state.busy = true;
        }

        tracing::info!(application_id = self.application_id, "Starting interview");
        let result = backend.analyze(self.application_id).await;

        let bot_line = {
            let mut state = self.lock()?;
            state.busy = false;
            match result {
                Ok(reply) => {
                    state.phase = InterviewPhase::InProgress;
                    let line = state.absorb(&reply);
                    if reply.reports_completion() {
                        state.complete(CompletionSignal::Server);
                    }
                    line
                }
                Err(e) => {
                    tracing::warn!(
                        application_id = self.application_id,
                        "Interview analysis failed: {}",
                        e
                    );
                    state.start_requested = false;
                    state.transcript.push(TranscriptEntry::fallback(START_FALLBACK));
                    None
                }
            }
        };

        if let Some(line) = bot_line {
            self.persist(backend.clone(), ChatSender::Bot, line);
        }
        self.attach_alternatives(backend.as_ref()).await?;
        self.snapshot()
    }

    /// Sends one candidate answer and folds the bot reply into the transcript.
    pub async fn submit(
        &self,
        backend: Arc<dyn ScreeningBackend>,
        message: &str,
    ) -> Result<InterviewSnapshot> {
        let text = message.trim();
        if text.is_empty() {
            return Err(Error::BadRequest("Message must not be empty".to_string()));
        }

        let session_id = {
            let mut state = self.lock()?;
            match state.phase {
                InterviewPhase::Completed => return Err(Error::InterviewCompleted),
                InterviewPhase::NotStarted => {
                    return Err(Error::Conflict("Interview has not been started".to_string()))
                }
                InterviewPhase::InProgress => {}
            }
            if state.busy {
                return Err(Error::Conflict(
                    "A previous answer is still being processed".to_string(),
                ));
            }
            let session_id = state
                .session_id
                .clone()
                .ok_or_else(|| Error::Internal("interview has no session id".to_string()))?;
            state.busy = true;
            state.transcript.push(TranscriptEntry::user(text));
            session_id
        };

        self.persist(backend.clone(), ChatSender::User, text.to_string());
        let result = backend
            .chat_turn(self.application_id, &session_id, text)
            .await;

        let bot_line = {
            let mut state = self.lock()?;
            state.busy = false;
            match result {
                Ok(reply) => {
                    state.turn_count += 1;
                    let line = state.absorb(&reply);
                    if reply.reports_completion() {
                        state.complete(CompletionSignal::Server);
                    } else if self
                        .settings
                        .turn_cap
                        .is_some_and(|cap| state.turn_count >= cap)
                    {
                        tracing::info!(
                            application_id = self.application_id,
                            turns = state.turn_count,
                            "Interview reached the turn cap without server completion"
                        );
                        state.complete(CompletionSignal::TurnCap);
                    }
                    line
                }
                Err(e) => {
                    tracing::warn!(
                        application_id = self.application_id,
                        "Interview turn failed: {}",
                        e
                    );
                    state.transcript.push(TranscriptEntry::fallback(REPLY_FALLBACK));
                    None
                }
            }
        };

        if let Some(line) = bot_line {
            self.persist(backend.clone(), ChatSender::Bot, line);
        }
        self.attach_alternatives(backend.as_ref()).await?;
        self.snapshot()
    }

    async fn attach_alternatives(&self, backend: &dyn ScreeningBackend) -> Result<()> {
        {
            let state = self.lock()?;
            if self.settings.alternatives == 0
                || !state.wants_alternatives()
                || !state.alternatives.is_empty()
            {
                return Ok(());
            }
        }

        let alternatives = match backend
            .alternative_vacancies(self.vacancy_id, self.settings.alternatives)
            .await
        {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(
                    vacancy_id = self.vacancy_id,
                    "Failed to load alternative vacancies: {}",
                    e
                );
                Vec::new()
            }
        };

        let mut state = self.lock()?;
        state.alternatives = alternatives
            .into_iter()
            .filter(|v| v.id != self.vacancy_id)
            .take(self.settings.alternatives)
            .collect();
        Ok(())
    }

    fn persist(&self, backend: Arc<dyn ScreeningBackend>, sender: ChatSender, content: String) {
        let application_id = self.application_id;
        let handle = tokio::spawn(async move {
            if let Err(e) = backend
                .record_message(application_id, sender, &content)
                .await
            {
                tracing::warn!(application_id, ?sender, "Failed to save chat message: {}", e);
            }
        });
        if let Ok(mut pending) = self.pending_writes.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    /// Waits for every message write spawned so far.
    pub async fn flush(&self) {
        let handles = match self.pending_writes.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Chat message writer task failed: {}", e);
            }
        }
    }

    fn snapshot_from(&self, state: &SessionState) -> Result<InterviewSnapshot> {
        Ok(InterviewSnapshot {
            application_id: self.application_id,
            phase: state.phase,
            session_id: state.session_id.clone(),
            turn_count: state.turn_count,
            turn_cap: self.settings.turn_cap,
            relevance_percent: state.relevance_percent,
            dialog_stage: state.dialog_stage,
            is_completed: state.phase == InterviewPhase::Completed,
            completed_by: state.completed_by,
            busy: state.busy,
            summary: state.summary.clone(),
            reasons: state.reasons.clone(),
            transcript: state.transcript.clone(),
            alternatives: state.alternatives.clone(),
        })
    }
}

struct RegistryEntry {
    session: Arc<InterviewSession>,
    touched: Instant,
}

/// Keeps one interview per application alive across requests.
#[derive(Clone)]
pub struct InterviewRegistry {
    settings: InterviewSettings,
    sessions: Arc<Mutex<HashMap<i64, RegistryEntry>>>,
}

impl InterviewRegistry {
    pub fn new(settings: InterviewSettings) -> Self {
        Self {
            settings,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<i64, RegistryEntry>>> {
        self.sessions
            .lock()
            .map_err(|_| Error::Internal("interview registry lock poisoned".to_string()))
    }

    /// Returns the application's session, creating it for `owner_id` on first use.
    pub fn open(
        &self,
        application_id: i64,
        owner_id: i64,
        vacancy_id: i64,
    ) -> Result<Arc<InterviewSession>> {
        let mut entries = self.entries()?;
        let entry = entries.entry(application_id).or_insert_with(|| RegistryEntry {
            session: Arc::new(InterviewSession::new(
                application_id,
                owner_id,
                vacancy_id,
                self.settings,
            )),
            touched: Instant::now(),
        });
        entry.session.ensure_owner(owner_id)?;
        entry.touched = Instant::now();
        Ok(entry.session.clone())
    }

    /// The caller's open session for the application.
    pub fn get(&self, application_id: i64, user_id: i64) -> Result<Arc<InterviewSession>> {
        let mut entries = self.entries()?;
        let entry = entries.get_mut(&application_id).ok_or_else(|| {
            Error::NotFound(format!(
                "No interview has been opened for application {}",
                application_id
            ))
        })?;
        entry.session.ensure_owner(user_id)?;
        entry.touched = Instant::now();
        Ok(entry.session.clone())
    }

    /// Drops idle sessions and completed ones past their retention. Busy sessions stay.
    pub fn sweep(&self, now: Instant) -> usize {
        let Ok(mut entries) = self.sessions.lock() else {
            return 0;
        };
        let before = entries.len();
        let idle_ttl = self.settings.idle_ttl;
        entries.retain(|_, entry| {
            let idle = now.saturating_duration_since(entry.touched);
            match entry.session.activity() {
                Some((_, true)) => true,
                Some((InterviewPhase::Completed, false)) => idle < COMPLETED_RETENTION.min(idle_ttl),
                Some((_, false)) => idle < idle_ttl,
                None => false,
            }
        });
        before - entries.len()
    }

    /// Sweeps on a fixed period for the life of the process.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                let removed = registry.sweep(Instant::now());
                if removed > 0 {
                    tracing::info!(removed, open = registry.len(), "Evicted expired interviews");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
