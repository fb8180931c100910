/// Cosmetic pipeline stage shown while a job is processing.
///
/// Ordered: comparisons follow pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    Analyst,
    Strategist,
    Generator,
    End,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Start,
        Stage::Analyst,
        Stage::Strategist,
        Stage::Generator,
        Stage::End,
    ];

    /// Furthest stage the decorative timeline may light up. `End` is reserved
    /// for the poller's success.
    pub const LAST_DECORATIVE: Stage = Stage::Generator;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Start => "Start (S3)",
            Stage::Analyst => "Analyst agent",
            Stage::Strategist => "Strategist agent",
            Stage::Generator => "Generator agent",
            Stage::End => "End (script)",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::End
    }
}
