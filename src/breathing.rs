use clap::ValueEnum;

/// Pacing techniques for the breathing practice. The numbers are the classic
/// inhale-hold-exhale(-hold) counts in seconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum BreathingTechnique {
    Box,
    FourSevenEight,
    PhysiologicalSigh,
    CyclicSighing,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathPhase {
    pub fn label(&self) -> &'static str {
        match self {
            BreathPhase::Inhale => "breathe in",
            BreathPhase::Hold => "hold",
            BreathPhase::Exhale => "breathe out",
        }
    }
}

impl BreathingTechnique {
    pub fn label(&self) -> &'static str {
        match self {
            BreathingTechnique::Box => "Box 4-4-4-4",
            BreathingTechnique::FourSevenEight => "4-7-8",
            BreathingTechnique::PhysiologicalSigh => "Physiological Sigh 2-0-6",
            BreathingTechnique::CyclicSighing => "Cyclic Sighing 10-0-10",
        }
    }

    /// Timing table in tenths of a second. Zero-length holds are omitted so
    /// the clock never sits on an empty segment.
    pub fn pattern(&self) -> &'static [(BreathPhase, u32)] {
        use BreathPhase::*;
        match self {
            BreathingTechnique::Box => &[(Inhale, 40), (Hold, 40), (Exhale, 40), (Hold, 40)],
            BreathingTechnique::FourSevenEight => &[(Inhale, 40), (Hold, 70), (Exhale, 80)],
            BreathingTechnique::PhysiologicalSigh => &[(Inhale, 20), (Exhale, 60)],
            BreathingTechnique::CyclicSighing => &[(Inhale, 100), (Exhale, 100)],
        }
    }

    pub fn cycle_tenths(&self) -> u32 {
        self.pattern().iter().map(|(_, t)| t).sum()
    }

    pub fn next(&self) -> BreathingTechnique {
        match self {
            BreathingTechnique::Box => BreathingTechnique::FourSevenEight,
            BreathingTechnique::FourSevenEight => BreathingTechnique::PhysiologicalSigh,
            BreathingTechnique::PhysiologicalSigh => BreathingTechnique::CyclicSighing,
            BreathingTechnique::CyclicSighing => BreathingTechnique::Box,
        }
    }
}

/// The high-frequency timeline behind the inhale/hold/exhale indicator.
///
/// Advances one tenth of a second per 100ms tick, independently of the
/// session countdown; it is a rendering aid only and never influences when a
/// session completes.
#[derive(Debug, Clone)]
pub struct BreathClock {
    technique: BreathingTechnique,
    tenths: u32,
}

impl BreathClock {
    pub fn new(technique: BreathingTechnique) -> Self {
        Self { technique, tenths: 0 }
    }

    pub fn technique(&self) -> BreathingTechnique {
        self.technique
    }

    pub fn on_tick(&mut self) {
        self.tenths += 1;
    }

    pub fn cycles_completed(&self) -> u32 {
        self.tenths / self.technique.cycle_tenths()
    }

    /// Current phase and 0.0..1.0 progress within it.
    pub fn phase(&self) -> (BreathPhase, f64) {
        let mut pos = self.tenths % self.technique.cycle_tenths();
        for &(phase, len) in self.technique.pattern() {
            if pos < len {
                return (phase, pos as f64 / len as f64);
            }
            pos -= len;
        }
        // Unreachable: pos < cycle_tenths and the segments sum to it
        (BreathPhase::Inhale, 0.0)
    }
}
