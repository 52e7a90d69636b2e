//! LLM-judged smoke tests of answer quality.
//!
//! Each case runs the full query pipeline and asks a judge model whether the
//! answer matches the expected one. Results are non-deterministic.

use pdfrag_llm::{LlmError, LlmProvider, Message};
use serde::{Deserialize, Serialize};

use crate::query::{QueryError, RagPipeline};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvalCase {
    pub question: String,
    pub expected: String,
}

impl EvalCase {
    #[must_use]
    pub fn new(question: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            expected: expected.into(),
        }
    }
}

#[must_use]
pub fn default_cases() -> Vec<EvalCase> {
    vec![
        EvalCase::new(
            "How much total money does a player start with in Monopoly? (Answer with the number only)",
            "$1500",
        ),
        EvalCase::new(
            "How many points does the longest continuous train get in Ticket to Ride? (Answer with the number only)",
            "10 points",
        ),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("judge model failed: {0}")]
    Judge(#[source] LlmError),
    #[error("cannot determine 'true' or 'false' from verdict: {0:?}")]
    AmbiguousVerdict(String),
}

#[must_use]
pub fn build_eval_prompt(expected: &str, actual: &str) -> String {
    format!(
        "\nExpected Response: {expected}\nActual Response: {actual}\n---\n\
         (Answer with 'true' or 'false') Does the actual response match the expected response? \n"
    )
}

/// Interpret a judge reply. `true` wins when both words appear.
///
/// # Errors
///
/// Returns [`EvalError::AmbiguousVerdict`] if the reply contains neither word.
pub fn parse_verdict(raw: &str) -> Result<bool, EvalError> {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.contains("true") {
        Ok(true)
    } else if cleaned.contains("false") {
        Ok(false)
    } else {
        Err(EvalError::AmbiguousVerdict(cleaned))
    }
}

#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub case: EvalCase,
    pub actual: String,
    /// Normalized judge reply.
    pub verdict: String,
    pub passed: bool,
}

pub struct Evaluator<'a, P, J> {
    pipeline: &'a RagPipeline<P>,
    judge: J,
}

impl<'a, P: LlmProvider, J: LlmProvider> Evaluator<'a, P, J> {
    #[must_use]
    pub fn new(pipeline: &'a RagPipeline<P>, judge: J) -> Self {
        Self { pipeline, judge }
    }

    /// Answer one case and have the judge grade it.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or the judge fails, or the verdict is ambiguous.
    pub async fn evaluate(&self, case: &EvalCase) -> Result<EvalOutcome, EvalError> {
        let response = self.pipeline.query(&case.question).await?;
        let prompt = build_eval_prompt(&case.expected, &response.text);
        let raw = self
            .judge
            .chat(&[Message::user(prompt)])
            .await
            .map_err(EvalError::Judge)?;
        let passed = parse_verdict(&raw)?;
        tracing::info!(question = %case.question, passed, "evaluated case");

        Ok(EvalOutcome {
            case: case.clone(),
            actual: response.text,
            verdict: raw.trim().to_lowercase(),
            passed,
        })
    }

    /// Evaluate every case in order; one failing case does not stop the rest.
    pub async fn run(&self, cases: &[EvalCase]) -> Vec<Result<EvalOutcome, EvalError>> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.evaluate(case).await);
        }
        results
    }
}
