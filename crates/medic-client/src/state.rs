use medic_types::api::CodeStatus;

/// Where the reveal is, for the code currently known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// No code on display; a redacted placeholder is shown.
    Locked,
    /// Code received, reveal animation in flight.
    Animating,
    /// Code on display. Terminal for this code: only an explicit reset
    /// (deletion) leaves this phase.
    Revealed,
}

/// One-way reveal state machine: Locked -> Animating -> Revealed.
///
/// Both the 30-second poll and gateway wake-ups funnel their observations
/// through [`observe`](RevealState::observe), so the transitions must be
/// idempotent: re-observing the same server status is a no-op, and a code
/// that has been revealed never animates again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealState {
    code: Option<String>,
    phase: RevealPhase,
}

impl RevealState {
    pub fn new() -> Self {
        Self {
            code: None,
            phase: RevealPhase::Locked,
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        self.phase == RevealPhase::Animating
    }

    pub fn is_revealed(&self) -> bool {
        self.phase == RevealPhase::Revealed
    }

    /// Apply a retrieval result. Returns true when this observation started
    /// the reveal animation — the caller is then responsible for calling
    /// [`finish_reveal`](Self::finish_reveal) after the reveal delay.
    ///
    /// `Unavailable` is deliberately a no-op: only an explicit reset clears
    /// a displayed code.
    pub fn observe(&mut self, status: CodeStatus, code: Option<String>) -> bool {
        let Some(code) = code else {
            return false;
        };
        if status != CodeStatus::Available {
            return false;
        }

        // Same code, already animating or revealed: nothing to do.
        if self.code.as_deref() == Some(code.as_str()) && self.phase != RevealPhase::Locked {
            return false;
        }

        self.code = Some(code);
        self.phase = RevealPhase::Animating;
        true
    }

    /// Complete the animation. No-op unless currently animating; returns
    /// whether anything changed.
    pub fn finish_reveal(&mut self) -> bool {
        if self.phase != RevealPhase::Animating {
            return false;
        }
        self.phase = RevealPhase::Revealed;
        true
    }

    /// Back to Locked with the code cleared, from any phase. Used after a
    /// successful deletion.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for RevealState {
    fn default() -> Self {
        Self::new()
    }
}
