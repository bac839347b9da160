//! Current page tracking and bounds

/// Navigation commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavCommand {
    /// Go to a 1-based page, clamped to the document
    GoTo(usize),
    Next,
    Previous,
    First,
    Last,
}

/// Effects produced by navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavEffect {
    /// Display this page, rendering it first if needed
    Show(usize),
    /// Speculatively render a neighbouring page
    Prefetch(usize),
}

/// Current page within a document of known length
#[derive(Clone, Debug)]
pub struct Navigator {
    current: Option<usize>,
    total: usize,
    prefetch_radius: usize,
}

impl Navigator {
    #[must_use]
    pub fn new(prefetch_radius: usize) -> Self {
        Self {
            current: None,
            total: 0,
            prefetch_radius,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current.is_some_and(|c| c >= self.total)
    }

    /// Forget the current document
    pub fn clear(&mut self) {
        self.current = None;
        self.total = 0;
    }

    /// Start a freshly loaded document at page 1
    #[must_use]
    pub fn reset(&mut self, total: usize) -> Vec<NavEffect> {
        self.total = total;
        if total == 0 {
            self.current = None;
            return vec![];
        }
        self.current = Some(1);
        self.effects_for(1)
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: NavCommand) -> Vec<NavEffect> {
        let Some(current) = self.current else {
            return vec![];
        };

        let target = match cmd {
            NavCommand::GoTo(page) => page.clamp(1, self.total),
            NavCommand::Next => {
                if current >= self.total {
                    return vec![];
                }
                current + 1
            }
            NavCommand::Previous => {
                if current <= 1 {
                    return vec![];
                }
                current - 1
            }
            NavCommand::First => 1,
            NavCommand::Last => self.total,
        };

        self.current = Some(target);
        self.effects_for(target)
    }

    fn effects_for(&self, page: usize) -> Vec<NavEffect> {
        let mut effects = vec![NavEffect::Show(page)];
        for offset in 1..=self.prefetch_radius {
            if page > offset {
                effects.push(NavEffect::Prefetch(page - offset));
            }
            if page + offset <= self.total {
                effects.push(NavEffect::Prefetch(page + offset));
            }
        }
        effects
    }
}
