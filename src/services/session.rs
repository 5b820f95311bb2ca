// src/services/session.rs

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::Instant,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        question::{PublicQuestion, Question},
        quiz_config::QuizConfiguration,
        result::QuizResult,
        session::{DocumentSummary, QuizView, SessionView, Stage},
    },
    services::{
        ingestor::{self, IngestedDocument, TextExtractor},
        question_generator::QuestionGenerator,
        quiz_runtime::{Completion, QuizRuntime, Ticker},
        scorer,
    },
    utils::time::format_clock,
};

pub type SharedSession = Arc<Mutex<QuizSession>>;

/// How often the idle sweeper runs at most.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct StoredSession {
    session: SharedSession,
    last_touched: Instant,
}

/// In-memory registry of quiz sessions, keyed by session id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
}

impl SessionStore {
    pub async fn create(&self, generator: Arc<dyn QuestionGenerator>) -> Uuid {
        let id = Uuid::new_v4();
        let stored = StoredSession {
            session: Arc::new(Mutex::new(QuizSession::new(id, generator))),
            last_touched: Instant::now(),
        };
        self.sessions.write().await.insert(id, stored);
        tracing::info!("Session {} created", id);
        id
    }

    /// Looks the session up and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Result<SharedSession, AppError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        stored.last_touched = Instant::now();
        Ok(stored.session.clone())
    }

    /// Drops the session, stopping its countdown and orphaning any
    /// in-flight generation.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?
            .session;
        session.lock().await.reset();
        tracing::info!("Session {} discarded", id);
        Ok(())
    }

    /// Discards every session not looked up within `max_idle`.
    /// Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<(Uuid, SharedSession)> = {
            let mut sessions = self.sessions.write().await;
            let idle: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, stored)| now.duration_since(stored.last_touched) >= max_idle)
                .map(|(id, _)| *id)
                .collect();
            idle.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|stored| (id, stored.session)))
                .collect()
        };

        for (id, session) in &expired {
            session.lock().await.reset();
            tracing::info!("Session {} evicted after inactivity", id);
        }
        expired.len()
    }

    /// Runs `evict_idle` every `period` until the store is dropped.
    pub fn spawn_sweeper(&self, max_idle: Duration, period: Duration) -> JoinHandle<()> {
        let sessions = Arc::downgrade(&self.sessions);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                SessionStore { sessions }.evict_idle(max_idle).await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// The quiz currently attached to a session.
struct ActiveQuiz {
    config: QuizConfiguration,
    questions: Vec<Question>,
    runtime: QuizRuntime,
    started_at: Instant,
}

/// Work captured for a generation call made outside the session lock.
pub struct GenerationJob {
    pub epoch: u64,
    pub generator: Arc<dyn QuestionGenerator>,
    pub source_text: String,
}

/// One participant's pass through the flow:
/// document, configuration, generation, quiz, result.
///
/// Owns the generator bound to the participant's credential. `epoch` is
/// bumped on every reset; results of asynchronous work started under an
/// older epoch are discarded.
pub struct QuizSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    generator: Arc<dyn QuestionGenerator>,
    epoch: u64,
    document: Option<IngestedDocument>,
    ingesting: bool,
    generating: bool,
    quiz: Option<ActiveQuiz>,
    result: Option<QuizResult>,
    banner: Option<String>,
}

impl QuizSession {
    pub fn new(id: Uuid, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            generator,
            epoch: 0,
            document: None,
            ingesting: false,
            generating: false,
            quiz: None,
            result: None,
            banner: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn stage(&self) -> Stage {
        if self.generating {
            Stage::Generating
        } else if self.ingesting {
            Stage::Ingesting
        } else if self.result.is_some() {
            Stage::Completed
        } else if self.quiz.is_some() {
            Stage::InProgress
        } else if self.document.is_some() {
            Stage::AwaitingConfiguration
        } else {
            Stage::AwaitingDocument
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            created_at: self.created_at,
            stage: self.stage(),
            banner: self.banner.clone(),
            busy: self.ingesting || self.generating,
            document: self.document_summary(),
            quiz: self.quiz.as_ref().map(quiz_view),
        }
    }

    pub fn quiz_view(&self) -> Result<QuizView, AppError> {
        self.quiz
            .as_ref()
            .map(quiz_view)
            .ok_or_else(|| AppError::Conflict("No quiz has been started".to_string()))
    }

    pub fn result(&self) -> Result<&QuizResult, AppError> {
        self.result
            .as_ref()
            .ok_or_else(|| AppError::Conflict("The quiz has not been completed yet".to_string()))
    }

    fn document_summary(&self) -> Option<DocumentSummary> {
        self.document.as_ref().map(|doc| DocumentSummary {
            file_name: doc.file_name.clone(),
            page_count: doc.page_count,
            character_count: doc.character_count(),
        })
    }

    /// Records a failed step in the banner and hands the error back.
    fn fail(&mut self, err: AppError) -> AppError {
        if err.is_step_failure() {
            self.banner = Some(err.user_message());
        }
        err
    }

    fn ensure_not_underway(&self) -> Result<(), AppError> {
        if self.ingesting {
            return Err(AppError::Conflict(
                "A document is still being processed".to_string(),
            ));
        }
        if self.generating {
            return Err(AppError::Conflict(
                "Question generation is already in progress".to_string(),
            ));
        }
        if self.quiz.is_some() {
            return Err(AppError::Conflict(
                "A quiz has already been started; restart to begin a new one".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_current(&self, epoch: u64) -> Result<(), AppError> {
        if epoch != self.epoch {
            tracing::info!("Session {}: discarding result from before restart", self.id);
            return Err(AppError::Conflict(
                "The session was restarted; this response is no longer relevant".to_string(),
            ));
        }
        Ok(())
    }

    /// A document may be (re)uploaded until a quiz is generated, one at a time.
    pub fn begin_ingest(&mut self) -> Result<u64, AppError> {
        self.ensure_not_underway()?;
        self.ingesting = true;
        Ok(self.epoch)
    }

    pub fn finish_ingest(
        &mut self,
        epoch: u64,
        outcome: Result<IngestedDocument, AppError>,
    ) -> Result<DocumentSummary, AppError> {
        self.ensure_current(epoch)?;
        self.ingesting = false;
        self.ensure_not_underway()?;

        let document = outcome.map_err(|e| self.fail(e))?;
        tracing::info!(
            "Session {}: document ingested ({} pages)",
            self.id,
            document.page_count
        );
        self.document = Some(document);
        self.banner = None;
        self.document_summary()
            .ok_or_else(|| AppError::InternalServerError("document vanished".to_string()))
    }

    pub fn begin_generation(&mut self) -> Result<GenerationJob, AppError> {
        self.ensure_not_underway()?;
        let source_text = self
            .document
            .as_ref()
            .map(|doc| doc.text.clone())
            .ok_or_else(|| AppError::Conflict("Upload a document first".to_string()))?;

        self.generating = true;
        Ok(GenerationJob {
            epoch: self.epoch,
            generator: self.generator.clone(),
            source_text,
        })
    }

    /// Applies a generation outcome and starts the quiz clock.
    /// The countdown task is armed separately with `arm`.
    pub fn finish_generation(
        &mut self,
        epoch: u64,
        config: QuizConfiguration,
        outcome: Result<Vec<Question>, AppError>,
    ) -> Result<(), AppError> {
        self.ensure_current(epoch)?;
        self.generating = false;

        let questions = outcome.map_err(|e| self.fail(e))?;
        if questions.len() != config.number_of_questions as usize {
            return Err(self.fail(AppError::QuestionGenerationFailed(format!(
                "generator returned {} questions, {} requested",
                questions.len(),
                config.number_of_questions
            ))));
        }

        tracing::info!(
            "Session {}: quiz started with {} questions, {} minutes",
            self.id,
            questions.len(),
            config.duration_in_minutes
        );

        let runtime = QuizRuntime::new(questions.len(), config.duration_seconds());
        self.quiz = Some(ActiveQuiz {
            config,
            questions,
            runtime,
            started_at: Instant::now(),
        });
        self.banner = None;
        Ok(())
    }

    pub fn arm(&mut self, ticker: Ticker) {
        match self.quiz.as_mut() {
            Some(quiz) => quiz.runtime.arm(ticker),
            None => ticker.cancel(),
        }
    }

    fn running_quiz(&mut self) -> Result<&mut ActiveQuiz, AppError> {
        match self.quiz.as_mut() {
            None => Err(AppError::Conflict("No quiz has been started".to_string())),
            Some(quiz) if quiz.runtime.is_completed() => Err(AppError::Conflict(
                "The quiz has already been completed".to_string(),
            )),
            Some(quiz) => Ok(quiz),
        }
    }

    pub fn select_answer(&mut self, option_index: usize) -> Result<(), AppError> {
        let quiz = self.running_quiz()?;
        let option_count = quiz.questions[quiz.runtime.current_index()].options.len();
        if option_index >= option_count {
            return Err(AppError::BadRequest(format!(
                "option_index must be below {}",
                option_count
            )));
        }
        quiz.runtime.select_answer(option_index);
        Ok(())
    }

    pub fn advance(&mut self) -> Result<(), AppError> {
        let completion = self.running_quiz()?.runtime.advance();
        if let Some(completion) = completion {
            self.complete(completion);
        }
        Ok(())
    }

    pub fn retreat(&mut self) -> Result<(), AppError> {
        self.running_quiz()?.runtime.retreat();
        Ok(())
    }

    /// One countdown second. Returns whether the countdown should keep going.
    pub fn tick(&mut self) -> bool {
        let completion = match self.quiz.as_mut() {
            Some(quiz) => quiz.runtime.tick(),
            None => return false,
        };
        match completion {
            Some(completion) => {
                self.complete(completion);
                false
            }
            None => self.quiz.as_ref().is_some_and(|q| !q.runtime.is_completed()),
        }
    }

    fn complete(&mut self, completion: Completion) {
        let Some(quiz) = self.quiz.as_ref() else {
            return;
        };
        debug_assert!(self.result.is_none(), "a quiz completes only once");

        let elapsed = quiz.started_at.elapsed();
        let result = scorer::score(&quiz.config, &quiz.questions, &completion.answers, elapsed);
        tracing::info!(
            "Session {}: quiz completed ({:?}), {}/{} correct, score {}",
            self.id,
            completion.reason,
            result.correct_answers,
            result.total_questions,
            result.score
        );
        self.result = Some(result);
    }

    /// Clears the busy flags of the current epoch after the task carrying
    /// that work died without reporting back.
    pub fn abandon_work(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.ingesting = false;
            self.generating = false;
        }
    }

    /// Clears everything downstream of the credential and stops the
    /// countdown. In-flight work from before the reset is ignored.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.document = None;
        self.ingesting = false;
        self.generating = false;
        self.quiz = None;
        self.result = None;
        self.banner = None;
    }
}

fn quiz_view(quiz: &ActiveQuiz) -> QuizView {
    let runtime = &quiz.runtime;
    let index = runtime.current_index();
    QuizView {
        participant_name: quiz.config.participant_name.clone(),
        current_index: index,
        total_questions: runtime.total_questions(),
        question: PublicQuestion::from(&quiz.questions[index]),
        selected_option: runtime.selected_option(),
        answered_count: runtime.answered_count(),
        time_remaining_seconds: runtime.time_remaining_seconds(),
        clock: format_clock(runtime.time_remaining_seconds()),
        can_go_back: !runtime.is_completed() && index > 0,
        is_last: runtime.is_last(),
        completed: runtime.is_completed(),
    }
}

/// Spawns the countdown for the session's current epoch.
///
/// The task holds only a weak reference, and stops on its own once the
/// session is gone, reset, or its quiz has completed.
pub fn spawn_ticker(session: Weak<Mutex<QuizSession>>, epoch: u64, period: Duration) -> Ticker {
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            let Some(session) = session.upgrade() else {
                break;
            };
            let mut guard = session.lock().await;
            if guard.epoch() != epoch || !guard.tick() {
                break;
            }
        }
    });
    Ticker::new(task)
}

/// An uploaded file as received from the client.
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Extracts the upload's text on the blocking pool and attaches it.
///
/// Like generation, the work runs in its own task so that the session's
/// busy state is settled even if the request is dropped.
pub async fn ingest_document(
    session: &SharedSession,
    extractor: Arc<dyn TextExtractor>,
    upload: Upload,
) -> Result<DocumentSummary, AppError> {
    let epoch = session.lock().await.begin_ingest()?;
    let shared = session.clone();

    let task = tokio::spawn(async move {
        let outcome = tokio::task::spawn_blocking(move || {
            ingestor::ingest(
                extractor.as_ref(),
                upload.file_name,
                upload.content_type.as_deref(),
                &upload.bytes,
            )
        })
        .await
        .unwrap_or_else(|e| Err(AppError::from(e)));

        shared.lock().await.finish_ingest(epoch, outcome)
    });

    match task.await {
        Ok(summary) => summary,
        Err(e) => {
            session.lock().await.abandon_work(epoch);
            Err(e.into())
        }
    }
}

/// Generates the questions and starts the quiz.
///
/// The network call runs in its own task without the session lock, so a
/// dropped request still settles the session's busy state.
pub async fn generate_quiz(
    session: &SharedSession,
    config: QuizConfiguration,
    tick_period: Duration,
) -> Result<SessionView, AppError> {
    let job = session.lock().await.begin_generation()?;
    let epoch = job.epoch;
    let shared = session.clone();

    let task = tokio::spawn(async move {
        let outcome = job
            .generator
            .generate(&job.source_text, config.number_of_questions)
            .await;

        let mut guard = shared.lock().await;
        guard.finish_generation(job.epoch, config, outcome)?;
        let ticker = spawn_ticker(Arc::downgrade(&shared), guard.epoch(), tick_period);
        guard.arm(ticker);
        Ok::<_, AppError>(guard.view())
    });

    match task.await {
        Ok(view) => view,
        Err(e) => {
            session.lock().await.abandon_work(epoch);
            Err(e.into())
        }
    }
}
