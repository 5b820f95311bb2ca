// src/services/quiz_runtime.rs

use tokio::task::JoinHandle;

use crate::config::UNANSWERED;

/// One selection per question; `UNANSWERED` where nothing was picked.
pub type AnswerSet = Vec<i32>;

/// Why the quiz ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The participant moved past the last question.
    Finished,
    /// The countdown reached zero.
    TimedOut,
}

/// Emitted exactly once per quiz, by whichever path ends it first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub answers: AnswerSet,
    pub reason: CompletionReason,
}

/// Cancellable repeating task that drives the countdown.
///
/// Cancelling (or dropping) the handle aborts the task, so no tick can be
/// observed after the owning runtime has let go of it.
#[derive(Debug)]
pub struct Ticker {
    task: JoinHandle<()>,
}

impl Ticker {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Timed multi-question quiz.
///
/// Every transition is a no-op once the quiz has completed, and the
/// transition that completes it is the only one returning a `Completion`.
#[derive(Debug)]
pub struct QuizRuntime {
    current_index: usize,
    answers: AnswerSet,
    time_remaining_seconds: u32,
    completed: bool,
    ticker: Option<Ticker>,
}

impl QuizRuntime {
    /// `total_questions` must be at least 1.
    pub fn new(total_questions: usize, duration_seconds: u32) -> Self {
        debug_assert!(total_questions > 0, "a quiz needs at least one question");
        Self {
            current_index: 0,
            answers: vec![UNANSWERED; total_questions],
            time_remaining_seconds: duration_seconds,
            completed: false,
            ticker: None,
        }
    }

    /// Hands the countdown task to the runtime. A ticker armed after
    /// completion is cancelled immediately.
    pub fn arm(&mut self, ticker: Ticker) {
        if self.completed {
            ticker.cancel();
            return;
        }
        if let Some(previous) = self.ticker.replace(ticker) {
            previous.cancel();
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> &[i32] {
        &self.answers
    }

    pub fn time_remaining_seconds(&self) -> u32 {
        self.time_remaining_seconds
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.answers.len()
    }

    /// Selection at the current question, if any.
    pub fn selected_option(&self) -> Option<usize> {
        usize::try_from(self.answers[self.current_index]).ok()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| **a != UNANSWERED).count()
    }

    pub fn is_armed(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Records `option_index` for the current question without moving on.
    pub fn select_answer(&mut self, option_index: usize) {
        if self.completed {
            return;
        }
        self.answers[self.current_index] = i32::try_from(option_index).unwrap_or(UNANSWERED);
    }

    /// Moves to the next question, or completes the quiz from the last one.
    pub fn advance(&mut self) -> Option<Completion> {
        if self.completed {
            return None;
        }
        if self.is_last() {
            return Some(self.complete(CompletionReason::Finished));
        }
        self.current_index += 1;
        None
    }

    /// Moves to the previous question; no-op at the first one.
    pub fn retreat(&mut self) {
        if self.completed || self.current_index == 0 {
            return;
        }
        self.current_index -= 1;
    }

    /// One countdown second.
    pub fn tick(&mut self) -> Option<Completion> {
        if self.completed {
            return None;
        }
        self.time_remaining_seconds = self.time_remaining_seconds.saturating_sub(1);
        if self.time_remaining_seconds == 0 {
            return Some(self.complete(CompletionReason::TimedOut));
        }
        None
    }

    fn complete(&mut self, reason: CompletionReason) -> Completion {
        self.completed = true;
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        Completion {
            answers: self.answers.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_runtime_is_unanswered() {
        let runtime = QuizRuntime::new(3, 300);
        assert_eq!(runtime.answers(), &[UNANSWERED; 3]);
        assert_eq!(runtime.current_index(), 0);
        assert_eq!(runtime.time_remaining_seconds(), 300);
        assert_eq!(runtime.selected_option(), None);
        assert!(!runtime.is_completed());
    }

    #[test]
    fn test_select_answer_does_not_advance() {
        let mut runtime = QuizRuntime::new(3, 300);
        runtime.select_answer(2);
        runtime.select_answer(1);
        assert_eq!(runtime.current_index(), 0);
        assert_eq!(runtime.answers(), &[1, UNANSWERED, UNANSWERED]);
        assert_eq!(runtime.selected_option(), Some(1));
        assert_eq!(runtime.answered_count(), 1);
    }

    #[test]
    fn test_advance_completes_after_n_calls() {
        let n = 4;
        let mut runtime = QuizRuntime::new(n, 300);
        let mut completions = Vec::new();
        for call in 1..=n {
            if let Some(c) = runtime.advance() {
                completions.push((call, c));
            }
        }
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].0, n);
        assert_eq!(completions[0].1.reason, CompletionReason::Finished);
        assert!(runtime.is_completed());

        // Extra calls and ticks stay silent.
        assert!(runtime.advance().is_none());
        assert!(runtime.tick().is_none());
    }

    #[test]
    fn test_retreat_at_first_question_is_noop() {
        let mut runtime = QuizRuntime::new(2, 300);
        runtime.retreat();
        assert_eq!(runtime.current_index(), 0);
        runtime.advance();
        runtime.retreat();
        assert_eq!(runtime.current_index(), 0);
    }

    #[test]
    fn test_navigation_keeps_answers() {
        let mut runtime = QuizRuntime::new(3, 300);
        runtime.select_answer(0);
        runtime.advance();
        runtime.select_answer(3);
        runtime.retreat();
        assert_eq!(runtime.selected_option(), Some(0));
        runtime.advance();
        assert_eq!(runtime.selected_option(), Some(3));
    }

    #[test]
    fn test_timeout_after_exact_tick_count() {
        let duration = 5 * 60;
        let mut runtime = QuizRuntime::new(2, duration);
        for _ in 1..duration {
            assert!(runtime.tick().is_none());
        }
        assert_eq!(runtime.time_remaining_seconds(), 1);

        let completion = runtime.tick().expect("last tick completes");
        assert_eq!(completion.reason, CompletionReason::TimedOut);
        assert_eq!(completion.answers, vec![UNANSWERED, UNANSWERED]);

        for _ in 0..10 {
            assert!(runtime.tick().is_none());
        }
        assert_eq!(runtime.time_remaining_seconds(), 0);
    }

    #[test]
    fn test_completed_runtime_ignores_input() {
        let mut runtime = QuizRuntime::new(2, 300);
        runtime.advance();
        runtime.select_answer(1);
        runtime.advance().expect("completes");

        runtime.select_answer(0);
        runtime.retreat();
        assert_eq!(runtime.current_index(), 1);
        assert_eq!(runtime.answers(), &[UNANSWERED, 1]);
        assert_eq!(runtime.time_remaining_seconds(), 300);
    }

    #[test]
    fn test_advance_at_last_does_not_move_pointer() {
        let mut runtime = QuizRuntime::new(1, 300);
        assert!(runtime.is_last());
        runtime.advance().expect("single question completes");
        assert_eq!(runtime.current_index(), 0);
    }

    #[tokio::test]
    async fn test_completion_cancels_ticker() {
        let mut runtime = QuizRuntime::new(1, 300);
        let task = tokio::spawn(std::future::pending::<()>());
        runtime.arm(Ticker::new(task));
        assert!(runtime.is_armed());

        runtime.advance().expect("completes");
        assert!(!runtime.is_armed());
    }

    #[tokio::test]
    async fn test_arming_completed_runtime_cancels_ticker() {
        let mut runtime = QuizRuntime::new(1, 300);
        runtime.advance();
        let task = tokio::spawn(std::future::pending::<()>());
        let probe = task.abort_handle();
        runtime.arm(Ticker::new(task));
        assert!(!runtime.is_armed());
        for _ in 0..10 {
            if probe.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(probe.is_finished());
    }
}
