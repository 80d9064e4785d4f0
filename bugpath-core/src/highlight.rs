//! Call-stack highlighting of path events
//!
//! Walks the steps of one report in order, tracking the functions that are
//! currently open and the background band that goes with the nesting depth.
//!
//! Invariants:
//! - The call stack never underflows; a return that does not match the
//!   innermost open call leaves the stack untouched
//! - Band colour is always `palette[depth % palette.len()]`
//! - A step is drawn in the band that was current before its own transition

use crate::step::StepKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default band colours, indexed by call depth
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#ffffff", "#e9dddd", "#dde0eb", "#e5e8e5", "#cbc2b6", "#b8ccea", "#c1c9cd", "#a7a28f",
];

/// Icon assigned to a step by the highlighter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepIcon {
    Default,
    Calling,
    EnteredCall,
    Returning,
    AssumingCondition,
    Assuming,
    EnteringLoopBody,
    LoopBodyExecuted,
    LoopBack,
}

impl StepIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepIcon::Default => "default",
            StepIcon::Calling => "calling",
            StepIcon::EnteredCall => "entered_call",
            StepIcon::Returning => "returning",
            StepIcon::AssumingCondition => "assuming_condition",
            StepIcon::Assuming => "assuming",
            StepIcon::EnteringLoopBody => "entering_loop_body",
            StepIcon::LoopBodyExecuted => "loop_body_executed",
            StepIcon::LoopBack => "loop_back",
        }
    }
}

/// Ordered, non-empty list of band colours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    pub fn new(colors: Vec<String>) -> Result<Self> {
        if colors.is_empty() {
            anyhow::bail!("palette must contain at least one colour");
        }
        Ok(Palette { colors })
    }

    /// Colour for a call depth; wraps around once depth exceeds the palette
    pub fn color_for_depth(&self, depth: usize) -> &str {
        &self.colors[depth % self.colors.len()]
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Band colour and icon for one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub bg_color: String,
    pub icon: StepIcon,
}

/// A return that could not be matched against the open call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackMismatch {
    /// Zero-based position of the offending step
    pub step_index: usize,
    /// Function named by the return step (`None` for anonymous returns)
    pub returned_from: Option<String>,
    /// Innermost open call at that point (`None` if nothing was open)
    pub stack_top: Option<String>,
}

impl fmt::Display for StackMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let returned = self.returned_from.as_deref().unwrap_or("<allocated memory>");
        match &self.stack_top {
            Some(top) => write!(
                f,
                "step {}: returned from '{}' while the innermost open call was '{}'",
                self.step_index, returned, top
            ),
            None => write!(
                f,
                "step {}: returned from '{}' with no open call",
                self.step_index, returned
            ),
        }
    }
}

/// Result of classifying one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub highlight: Highlight,
    pub mismatch: Option<StackMismatch>,
}

/// Transient per-report state: open calls and the current band
#[derive(Debug)]
pub struct HighlightStack<'p> {
    palette: &'p Palette,
    functions: Vec<String>,
    bg_color: &'p str,
    strict_allocation_returns: bool,
    processed: usize,
}

impl<'p> HighlightStack<'p> {
    pub fn new(palette: &'p Palette) -> Self {
        HighlightStack {
            palette,
            functions: Vec::new(),
            bg_color: palette.color_for_depth(0),
            strict_allocation_returns: false,
            processed: 0,
        }
    }

    /// Treat `Returned allocated memory` on an empty stack as a mismatch
    pub fn with_strict_allocation_returns(mut self, strict: bool) -> Self {
        self.strict_allocation_returns = strict;
        self
    }

    pub fn depth(&self) -> usize {
        self.functions.len()
    }

    pub fn top(&self) -> Option<&str> {
        self.functions.last().map(String::as_str)
    }

    pub fn bg_color(&self) -> &'p str {
        self.bg_color
    }

    /// Classify the next step and apply its stack transition
    pub fn classify(&mut self, msg: &str) -> Classified {
        let step_index = self.processed;
        self.processed += 1;

        let bg_color = self.bg_color.to_string();
        let mut mismatch = None;

        let icon = match StepKind::parse(msg) {
            StepKind::Calling { function } => {
                self.functions.push(function.to_string());
                self.refresh_color();
                StepIcon::Calling
            }
            StepKind::EnteredCall => StepIcon::EnteredCall,
            StepKind::Returning { function } => {
                if self.top() == Some(function) {
                    self.functions.pop();
                    self.refresh_color();
                    StepIcon::Returning
                } else {
                    mismatch = Some(self.mismatch(step_index, Some(function)));
                    StepIcon::Default
                }
            }
            StepKind::ReturnedAllocatedMemory => {
                if self.strict_allocation_returns && self.functions.is_empty() {
                    mismatch = Some(self.mismatch(step_index, None));
                    StepIcon::Default
                } else {
                    self.functions.pop();
                    self.refresh_color();
                    StepIcon::Returning
                }
            }
            StepKind::AssumingCondition => StepIcon::AssumingCondition,
            StepKind::Assuming => StepIcon::Assuming,
            StepKind::EnteringLoopBody => StepIcon::EnteringLoopBody,
            StepKind::LoopBodyExecuted => StepIcon::LoopBodyExecuted,
            StepKind::LoopBack => StepIcon::LoopBack,
            StepKind::Plain => StepIcon::Default,
        };

        Classified {
            highlight: Highlight { bg_color, icon },
            mismatch,
        }
    }

    fn refresh_color(&mut self) {
        let palette = self.palette;
        self.bg_color = palette.color_for_depth(self.functions.len());
    }

    fn mismatch(&self, step_index: usize, returned_from: Option<&str>) -> StackMismatch {
        let mismatch = StackMismatch {
            step_index,
            returned_from: returned_from.map(str::to_string),
            stack_top: self.top().map(str::to_string),
        };
        log::warn!("stack mismatch at {}", mismatch);
        mismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_has_eight_colours() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 8);
        assert_eq!(palette.color_for_depth(0), "#ffffff");
        assert_eq!(palette.color_for_depth(8), "#ffffff");
        assert_eq!(palette.color_for_depth(9), "#e9dddd");
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert!(Palette::new(Vec::new()).is_err());
    }

    #[test]
    fn test_call_then_return_restores_state() {
        let palette = Palette::default();
        let mut stack = HighlightStack::new(&palette);

        let call = stack.classify("Calling 'foo'");
        assert_eq!(call.highlight.icon, StepIcon::Calling);
        assert_eq!(call.highlight.bg_color, DEFAULT_PALETTE[0]);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.bg_color(), DEFAULT_PALETTE[1]);

        let entered = stack.classify("Entered call from 'main'");
        assert_eq!(entered.highlight.icon, StepIcon::EnteredCall);
        assert_eq!(entered.highlight.bg_color, DEFAULT_PALETTE[1]);

        let ret = stack.classify("Returning from 'foo'");
        assert_eq!(ret.highlight.icon, StepIcon::Returning);
        assert_eq!(ret.highlight.bg_color, DEFAULT_PALETTE[1]);
        assert!(ret.mismatch.is_none());
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.bg_color(), DEFAULT_PALETTE[0]);
    }

    #[test]
    fn test_return_on_empty_stack_is_reported() {
        let palette = Palette::default();
        let mut stack = HighlightStack::new(&palette);

        let ret = stack.classify("Returning from 'f'");
        assert_eq!(ret.highlight.icon, StepIcon::Default);
        assert_eq!(ret.highlight.bg_color, DEFAULT_PALETTE[0]);
        assert_eq!(stack.depth(), 0);

        let mismatch = ret.mismatch.expect("mismatch should be reported");
        assert_eq!(mismatch.step_index, 0);
        assert_eq!(mismatch.returned_from.as_deref(), Some("f"));
        assert_eq!(mismatch.stack_top, None);
    }

    #[test]
    fn test_mismatched_return_keeps_stack() {
        let palette = Palette::default();
        let mut stack = HighlightStack::new(&palette);
        stack.classify("Calling 'outer'");
        stack.classify("Calling 'inner'");

        let ret = stack.classify("Returning from 'outer'");
        assert_eq!(ret.highlight.icon, StepIcon::Default);
        assert_eq!(ret.highlight.bg_color, DEFAULT_PALETTE[2]);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top(), Some("inner"));

        let mismatch = ret.mismatch.unwrap();
        assert_eq!(mismatch.step_index, 2);
        assert_eq!(mismatch.stack_top.as_deref(), Some("inner"));
        assert_eq!(
            mismatch.to_string(),
            "step 2: returned from 'outer' while the innermost open call was 'inner'"
        );
    }

    #[test]
    fn test_returned_allocated_memory_pops_without_name_check() {
        let palette = Palette::default();
        let mut stack = HighlightStack::new(&palette);
        stack.classify("Calling 'malloc_wrapper'");

        let ret = stack.classify("Returned allocated memory");
        assert_eq!(ret.highlight.icon, StepIcon::Returning);
        assert_eq!(ret.highlight.bg_color, DEFAULT_PALETTE[1]);
        assert!(ret.mismatch.is_none());
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.bg_color(), DEFAULT_PALETTE[0]);
    }

    #[test]
    fn test_returned_allocated_memory_on_empty_stack() {
        let palette = Palette::default();
        let mut stack = HighlightStack::new(&palette);
        let ret = stack.classify("Returned allocated memory");
        assert_eq!(ret.highlight.icon, StepIcon::Returning);
        assert!(ret.mismatch.is_none());
        assert_eq!(stack.depth(), 0);

        let mut strict = HighlightStack::new(&palette).with_strict_allocation_returns(true);
        let ret = strict.classify("Returned allocated memory");
        assert_eq!(ret.highlight.icon, StepIcon::Default);
        let mismatch = ret.mismatch.unwrap();
        assert_eq!(mismatch.returned_from, None);
        assert_eq!(
            mismatch.to_string(),
            "step 0: returned from '<allocated memory>' with no open call"
        );
    }

    #[test]
    fn test_colour_wraps_past_palette_length() {
        let palette = Palette::new(vec!["#000000".to_string(), "#111111".to_string()]).unwrap();
        let mut stack = HighlightStack::new(&palette);
        stack.classify("Calling 'a'");
        assert_eq!(stack.bg_color(), "#111111");
        stack.classify("Calling 'b'");
        assert_eq!(stack.bg_color(), "#000000");
        stack.classify("Calling 'c'");
        assert_eq!(stack.bg_color(), "#111111");
    }

    #[test]
    fn test_non_stack_steps_keep_colour() {
        let palette = Palette::default();
        let mut stack = HighlightStack::new(&palette);
        stack.classify("Calling 'foo'");

        for (msg, icon) in [
            ("Assuming the condition is false", StepIcon::AssumingCondition),
            ("Assuming 'x' is not null", StepIcon::Assuming),
            ("Entering loop body", StepIcon::EnteringLoopBody),
            ("Loop body executed 2 times", StepIcon::LoopBodyExecuted),
            ("Looping back to the head of the loop", StepIcon::LoopBack),
            ("Null pointer value stored to 'p'", StepIcon::Default),
        ] {
            let c = stack.classify(msg);
            assert_eq!(c.highlight.icon, icon, "icon for {:?}", msg);
            assert_eq!(c.highlight.bg_color, DEFAULT_PALETTE[1]);
        }
        assert_eq!(stack.depth(), 1);
    }
}
