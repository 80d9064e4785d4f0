//! Structured view of a path-event message
//!
//! Analyzers encode step semantics in the message text. `StepKind::parse`
//! turns that text into a tagged variant once, so the highlighter can match
//! on the variant instead of re-testing prefixes.
//!
//! Prefix tests run in a fixed priority order and the first match wins.

const CALLING_PREFIX: &str = "Calling '";
const ENTERED_CALL_PREFIX: &str = "Entered call from ";
const RETURNING_PREFIX: &str = "Returning from '";
const RETURNED_ALLOCATED_MEMORY: &str = "Returned allocated memory";
const ASSUMING_CONDITION_PREFIX: &str = "Assuming the condition";
const ASSUMING_PREFIX: &str = "Assuming";
const ENTERING_LOOP_BODY: &str = "Entering loop body";
const LOOP_BODY_EXECUTED_PREFIX: &str = "Loop body executed";
const LOOP_BACK: &str = "Looping back to the head of the loop";

/// Semantic kind of a single path event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind<'a> {
    /// `Calling '<function>'`
    Calling { function: &'a str },
    /// `Entered call from ...`
    EnteredCall,
    /// `Returning from '<function>'`
    Returning { function: &'a str },
    /// Exactly `Returned allocated memory`
    ReturnedAllocatedMemory,
    /// `Assuming the condition ...`
    AssumingCondition,
    /// Any other `Assuming...`
    Assuming,
    /// Exactly `Entering loop body`
    EnteringLoopBody,
    /// `Loop body executed ...`
    LoopBodyExecuted,
    /// Exactly `Looping back to the head of the loop`
    LoopBack,
    /// Anything else
    Plain,
}

impl<'a> StepKind<'a> {
    /// Classify a message by literal prefix / equality
    pub fn parse(msg: &'a str) -> Self {
        if let Some(rest) = msg.strip_prefix(CALLING_PREFIX) {
            return StepKind::Calling {
                function: strip_closing_quote(rest),
            };
        }
        if msg.starts_with(ENTERED_CALL_PREFIX) {
            return StepKind::EnteredCall;
        }
        if let Some(rest) = msg.strip_prefix(RETURNING_PREFIX) {
            return StepKind::Returning {
                function: strip_closing_quote(rest),
            };
        }
        if msg == RETURNED_ALLOCATED_MEMORY {
            return StepKind::ReturnedAllocatedMemory;
        }
        if msg.starts_with(ASSUMING_CONDITION_PREFIX) {
            return StepKind::AssumingCondition;
        }
        if msg.starts_with(ASSUMING_PREFIX) {
            return StepKind::Assuming;
        }
        if msg == ENTERING_LOOP_BODY {
            return StepKind::EnteringLoopBody;
        }
        if msg.starts_with(LOOP_BODY_EXECUTED_PREFIX) {
            return StepKind::LoopBodyExecuted;
        }
        if msg == LOOP_BACK {
            return StepKind::LoopBack;
        }
        StepKind::Plain
    }
}

fn strip_closing_quote(s: &str) -> &str {
    s.strip_suffix('\'').unwrap_or(s)
}
