use crate::grammar::{Rule, RuleKind, Step};

/// Index of a saved frame inside a [`State`]
pub type FrameId = usize;

/// One active grammar rule.
///
/// `prev` points at the frame that was active when this one was pushed, so a
/// frame and its ancestors describe the full syntactic context of a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub kind: Option<RuleKind>,
    pub step: usize,
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub needs_separator: bool,
    pub prev: Option<FrameId>,
}

impl Frame {
    #[must_use]
    pub fn rule(&self) -> Option<Rule> {
        self.kind.map(RuleKind::rule)
    }

    /// The current step when the rule is a sequence
    #[must_use]
    pub fn current_step(&self) -> Option<Step> {
        match self.rule()? {
            Rule::Sequence(steps) => steps.get(self.step).copied(),
            Rule::Fork(_) => None,
        }
    }
}

/// Parser state between tokens.
///
/// Frames that were pushed and later popped stay in the arena; they are only
/// reachable through `prev` links of frames that still reference them.
#[derive(Debug, Clone, Default)]
pub struct State {
    frames: Vec<Frame>,
    pub(crate) current: Frame,
    pub levels: Vec<usize>,
    pub indent_level: Option<usize>,
    pub(crate) needs_advance: bool,
    pub(crate) in_block_string: bool,
}

/// The part of a [`State`] restored when a token cannot be placed anywhere
#[derive(Debug, Clone)]
pub(crate) struct Backup {
    current: Frame,
    levels: Vec<usize>,
    indent_level: Option<usize>,
    needs_advance: bool,
    in_block_string: bool,
}

impl State {
    #[must_use]
    pub const fn current(&self) -> &Frame {
        &self.current
    }

    #[must_use]
    pub const fn kind(&self) -> Option<RuleKind> {
        self.current.kind
    }

    #[must_use]
    pub const fn step(&self) -> usize {
        self.current.step
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.current.name.as_deref()
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.current.type_name.as_deref()
    }

    #[must_use]
    pub const fn in_block_string(&self) -> bool {
        self.in_block_string
    }

    /// The frame that was active before `frame` was pushed
    #[must_use]
    pub fn parent(&self, frame: &Frame) -> Option<&Frame> {
        frame.prev.and_then(|id| self.frames.get(id))
    }

    /// Frames with a rule, from the document root down to the current frame
    #[must_use]
    pub fn stack(&self) -> Vec<&Frame> {
        let mut stack = Vec::new();
        let mut frame = Some(&self.current);
        while let Some(f) = frame.filter(|f| f.kind.is_some()) {
            stack.push(f);
            frame = self.parent(f);
        }
        stack.reverse();
        stack
    }

    pub(crate) fn rule(&self) -> Option<Rule> {
        self.current.rule()
    }

    pub(crate) fn push_rule(&mut self, kind: RuleKind) {
        let id = self.frames.len();
        self.frames.push(self.current.clone());
        self.current = Frame {
            kind: Some(kind),
            step: 0,
            name: None,
            type_name: None,
            needs_separator: false,
            prev: Some(id),
        };
    }

    /// Returns false when already at the outermost frame
    pub(crate) fn pop_rule(&mut self) -> bool {
        match self.current.prev.and_then(|id| self.frames.get(id)) {
            Some(prev) => {
                self.current = prev.clone();
                true
            }
            None => false,
        }
    }

    /// Record a named type on the current frame and the frame two levels up
    pub(crate) fn set_named_type(&mut self, value: &str) {
        let grandparent = self
            .current
            .prev
            .and_then(|id| self.frames.get(id))
            .and_then(|parent| parent.prev);
        if let Some(frame) = grandparent.and_then(|id| self.frames.get_mut(id)) {
            frame.type_name = Some(value.to_string());
            self.current.name = Some(value.to_string());
        }
    }

    pub(crate) fn backup(&self) -> Backup {
        Backup {
            current: self.current.clone(),
            levels: self.levels.clone(),
            indent_level: self.indent_level,
            needs_advance: self.needs_advance,
            in_block_string: self.in_block_string,
        }
    }

    pub(crate) fn restore(&mut self, backup: Backup) {
        self.current = backup.current;
        self.levels = backup.levels;
        self.indent_level = backup.indent_level;
        self.needs_advance = backup.needs_advance;
        self.in_block_string = backup.in_block_string;
    }
}
