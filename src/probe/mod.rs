//! Environment probe boundary
//!
//! Root/emulator/debugger/hook detection and friends live outside this
//! crate. The core consumes them only through this opaque interface: an
//! aggregate risk score plus a list of findings, fed into the vault's
//! advisory anti-copy policy. How the numbers are computed is none of the
//! core's business.

/// One detector finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskFinding {
    /// Detector category, e.g. "root", "emulator", "proxy".
    pub kind: String,
    /// Human-readable description of what was observed.
    pub description: String,
    /// Severity from 1 (informational) to 5 (critical).
    pub risk_level: u8,
}

/// Opaque view of the runtime environment's trustworthiness.
pub trait EnvironmentProbe: Send + Sync {
    /// Aggregate risk score, 0 (clean) to 100 (hostile).
    fn risk_score(&self) -> u8;

    /// Individual findings backing the score.
    fn findings(&self) -> Vec<RiskFinding>;
}

/// Probe that reports a clean environment. Default when none is injected.
pub struct TrustedEnvironment;

impl EnvironmentProbe for TrustedEnvironment {
    fn risk_score(&self) -> u8 {
        0
    }

    fn findings(&self) -> Vec<RiskFinding> {
        Vec::new()
    }
}
