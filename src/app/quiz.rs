use color_eyre::{Result, eyre::WrapErr};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: usize,
}

impl Question {
    fn new(prompt: &str, options: &[&str], answer: usize) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Asking { index: usize },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    Empty,
    NoOptions { question: usize },
    AnswerOutOfRange { question: usize, answer: usize },
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::Empty => f.write_str("quiz has no questions"),
            QuizError::NoOptions { question } => {
                write!(f, "question {} has no options", question + 1)
            }
            QuizError::AnswerOutOfRange { question, answer } => write!(
                f,
                "question {} names answer {} which is not one of its options",
                question + 1,
                answer
            ),
        }
    }
}

impl std::error::Error for QuizError {}

/// Linear multiple-choice quiz. Transitions return a new value and leave `self` untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Vec<Question>,
    phase: QuizPhase,
    score: usize,
}

impl Default for Quiz {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        for (index, question) in questions.iter().enumerate() {
            if question.options.is_empty() {
                return Err(QuizError::NoOptions { question: index });
            }
            if question.answer >= question.options.len() {
                return Err(QuizError::AnswerOutOfRange {
                    question: index,
                    answer: question.answer,
                });
            }
        }
        Ok(Self {
            questions,
            phase: QuizPhase::Asking { index: 0 },
            score: 0,
        })
    }

    pub fn builtin() -> Self {
        Self {
            questions: vec![
                Question::new(
                    "What does reading a contract's view function cost?",
                    &["Nothing, it runs on the node", "Gas paid by the caller", "A fixed fee"],
                    0,
                ),
                Question::new(
                    "What must happen before a state change is final?",
                    &["The wallet signs it", "It is mined into a block", "The page reloads"],
                    1,
                ),
                Question::new(
                    "Which key signs a transaction?",
                    &["The contract's key", "The node's key", "The sender account's key"],
                    2,
                ),
            ],
            phase: QuizPhase::Asking { index: 0 },
            score: 0,
        }
    }

    /// Loads a question set from a JSON array of `{ prompt, options, answer }` objects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path).wrap_err_with(|| format!("failed to read quiz {}", path.display()))?;
        let questions: Vec<Question> =
            serde_json::from_slice(&raw).wrap_err("failed to parse quiz questions")?;
        Quiz::new(questions).wrap_err_with(|| format!("invalid quiz {}", path.display()))
    }

    pub fn select(&self, option: usize) -> Quiz {
        let mut next = self.clone();
        let QuizPhase::Asking { index } = self.phase else {
            return next;
        };
        let question = &self.questions[index];
        if option >= question.options.len() {
            return next;
        }
        if option == question.answer {
            next.score += 1;
        }
        next.phase = if index + 1 < self.questions.len() {
            QuizPhase::Asking { index: index + 1 }
        } else {
            QuizPhase::Completed
        };
        next
    }

    pub fn restart(&self) -> Quiz {
        Quiz {
            questions: self.questions.clone(),
            phase: QuizPhase::Asking { index: 0 },
            score: 0,
        }
    }

    pub fn current(&self) -> Option<(usize, &Question)> {
        match self.phase {
            QuizPhase::Asking { index } => self.questions.get(index).map(|q| (index, q)),
            QuizPhase::Completed => None,
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.phase, QuizPhase::Completed)
    }
}
