//! Quiz state machine with penalized scoring.
//!
//! # Responsibility
//! - Walk a capsule's quiz one question at a time.
//! - Count first-time correct answers and wrong attempts.
//! - Record the final score through the progress tracker on completion.
//!
//! # Invariants
//! - Each question index adds at most one point to `score`.
//! - Every wrong attempt adds one penalty, whether or not a retry follows.
//! - `final_score = clamp(0, 100, round(100 * score / total) - 5 * penalties)`.
//! - A session always has at least one question.

use crate::model::capsule::{Capsule, CapsuleId, QuizItem};
use crate::model::progress::Progress;
use crate::repo::capsule_repo::RepoError;
use crate::repo::progress_repo::ProgressTracker;
use crate::store::KvStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// How long the UI shows a correct answer before calling `advance`.
pub const CORRECT_ANSWER_DELAY: Duration = Duration::from_millis(800);
/// Points subtracted from the final percentage per wrong attempt.
pub const PENALTY_PER_MISTAKE: i64 = 5;
/// Final score at or above which a run counts as passed.
pub const PASSING_SCORE: u8 = 70;

/// Position of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    AwaitingAnswer {
        question_index: usize,
    },
    AnswerRevealed {
        question_index: usize,
        was_correct: bool,
    },
    Finished {
        final_score: u8,
    },
}

impl QuizState {
    fn name(self) -> &'static str {
        match self {
            Self::AwaitingAnswer { .. } => "awaiting_answer",
            Self::AnswerRevealed { .. } => "answer_revealed",
            Self::Finished { .. } => "finished",
        }
    }
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_index: usize,
    pub selected: usize,
    pub was_correct: bool,
    pub correct_index: usize,
    pub explanation: String,
}

/// Result card shown after the last question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSummary {
    pub correct: usize,
    pub total: usize,
    pub mistakes: usize,
    pub final_score: u8,
    pub passed: bool,
}

/// Errors from quiz session transitions.
#[derive(Debug)]
pub enum QuizError {
    /// Capsule has no quiz items; callers show an empty state instead.
    NoQuestions,
    /// Requested action is not valid from the current state.
    InvalidTransition {
        action: &'static str,
        state: QuizState,
    },
    /// Selected choice does not exist on the current question.
    ChoiceOutOfRange { selected: usize, choices: usize },
    /// Recording the final score failed.
    Repo(RepoError),
}

impl Display for QuizError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoQuestions => write!(f, "capsule has no quiz questions"),
            Self::InvalidTransition { action, state } => {
                write!(f, "cannot {action} while quiz is {}", state.name())
            }
            Self::ChoiceOutOfRange { selected, choices } => write!(
                f,
                "choice {selected} is out of range for a question with {choices} choices"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QuizError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for QuizError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// One run through a capsule's quiz.
#[derive(Debug, Clone)]
pub struct QuizSession {
    capsule_id: CapsuleId,
    items: Vec<QuizItem>,
    state: QuizState,
    score: usize,
    penalties: usize,
    credited: Vec<bool>,
}

impl QuizSession {
    /// Starts a session at the first question.
    ///
    /// # Errors
    /// - `QuizError::NoQuestions` when the capsule quiz is empty.
    pub fn start(capsule: &Capsule) -> Result<Self, QuizError> {
        if capsule.quiz.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        Ok(Self {
            capsule_id: capsule.id.clone(),
            items: capsule.quiz.clone(),
            state: QuizState::AwaitingAnswer { question_index: 0 },
            score: 0,
            penalties: 0,
            credited: vec![false; capsule.quiz.len()],
        })
    }

    pub fn capsule_id(&self) -> &str {
        &self.capsule_id
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn penalties(&self) -> usize {
        self.penalties
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Question shown in the current state; `None` once finished.
    pub fn current_item(&self) -> Option<&QuizItem> {
        match self.state {
            QuizState::AwaitingAnswer { question_index }
            | QuizState::AnswerRevealed { question_index, .. } => self.items.get(question_index),
            QuizState::Finished { .. } => None,
        }
    }

    /// Checks `selected` against the current question.
    ///
    /// A correct answer earns a point the first time the question is
    /// answered correctly; a wrong one adds a penalty.
    pub fn submit_answer(&mut self, selected: usize) -> Result<AnswerFeedback, QuizError> {
        let QuizState::AwaitingAnswer { question_index } = self.state else {
            return Err(self.invalid("submit an answer"));
        };
        let item = &self.items[question_index];
        if selected >= item.choices.len() {
            return Err(QuizError::ChoiceOutOfRange {
                selected,
                choices: item.choices.len(),
            });
        }

        let was_correct = selected == item.correct;
        let feedback = AnswerFeedback {
            question_index,
            selected,
            was_correct,
            correct_index: item.correct,
            explanation: item.explanation.clone(),
        };

        if was_correct {
            if !self.credited[question_index] {
                self.credited[question_index] = true;
                self.score += 1;
            }
        } else {
            self.penalties += 1;
        }
        self.state = QuizState::AnswerRevealed {
            question_index,
            was_correct,
        };
        Ok(feedback)
    }

    /// Re-asks the current question after a wrong answer. No scoring effect.
    pub fn retry(&mut self) -> Result<(), QuizError> {
        match self.state {
            QuizState::AnswerRevealed {
                question_index,
                was_correct: false,
            } => {
                self.state = QuizState::AwaitingAnswer { question_index };
                Ok(())
            }
            _ => Err(self.invalid("retry")),
        }
    }

    /// Moves past a revealed answer.
    ///
    /// After the last question the session finishes and the final score is
    /// recorded for the capsule. Advancing from a wrong answer skips the
    /// question without a point. If recording fails the session still ends
    /// in `Finished` and the error is returned.
    pub fn advance<S: KvStore>(
        &mut self,
        tracker: &ProgressTracker<S>,
    ) -> Result<QuizState, QuizError> {
        let QuizState::AnswerRevealed { question_index, .. } = self.state else {
            return Err(self.invalid("advance"));
        };

        let next = question_index + 1;
        if next < self.items.len() {
            self.state = QuizState::AwaitingAnswer {
                question_index: next,
            };
            return Ok(self.state);
        }

        let final_score = final_score(self.score, self.items.len(), self.penalties);
        self.state = QuizState::Finished { final_score };
        let progress = tracker.record_quiz_score(&self.capsule_id, i64::from(final_score))?;
        info!(
            "event=quiz_finish module=quiz status=ok id={} score={} total={} penalties={} final={} best={}",
            self.capsule_id,
            self.score,
            self.items.len(),
            self.penalties,
            final_score,
            progress.best_score
        );
        Ok(self.state)
    }

    /// Starts over from the first question after finishing.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        if !matches!(self.state, QuizState::Finished { .. }) {
            return Err(self.invalid("restart"));
        }
        self.state = QuizState::AwaitingAnswer { question_index: 0 };
        self.score = 0;
        self.penalties = 0;
        self.credited.iter_mut().for_each(|flag| *flag = false);
        Ok(())
    }

    /// Result card; available only once finished.
    pub fn summary(&self) -> Option<QuizSummary> {
        let QuizState::Finished { final_score } = self.state else {
            return None;
        };
        Some(QuizSummary {
            correct: self.score,
            total: self.items.len(),
            mistakes: self.penalties,
            final_score,
            passed: final_score >= PASSING_SCORE,
        })
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            state: self.state,
        }
    }
}

/// Computes the penalized percentage for a finished run.
///
/// The raw percentage rounds half up before penalties are applied.
pub fn final_score(score: usize, total: usize, penalties: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = score.min(total) as i64;
    let total = total as i64;
    let percent = (200 * score + total) / (2 * total);
    let penalty = PENALTY_PER_MISTAKE.saturating_mul(penalties as i64);
    Progress::clamp_score(percent.saturating_sub(penalty))
}

#[cfg(test)]
mod tests {
    use super::final_score;

    #[test]
    fn rounds_half_up_before_penalties() {
        assert_eq!(final_score(1, 8, 0), 13);
        assert_eq!(final_score(2, 3, 0), 67);
        assert_eq!(final_score(1, 3, 0), 33);
    }

    #[test]
    fn penalties_clamp_at_zero() {
        assert_eq!(final_score(1, 4, 10), 0);
        assert_eq!(final_score(5, 5, 1), 95);
        assert_eq!(final_score(2, 4, 3), 35);
    }
}
