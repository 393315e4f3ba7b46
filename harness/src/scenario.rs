use crate::expectation::Op;
use noise_trap_math::modulus::PlainModulus;

/// Which budget the zone percentages are relative to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BaselinePolicy {
    /// Budget of the freshly encrypted seed.
    #[default]
    Fresh,
    /// Budget right after the setup operation.
    AfterSetup,
}

/// `count` applications of `op`, observed every `batch` applications.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackStage {
    pub op: Op,
    pub count: usize,
    #[cfg_attr(feature = "serde", serde(default = "default_batch"))]
    pub batch: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Option<String>,
}

#[cfg(feature = "serde")]
fn default_batch() -> usize {
    1
}

impl AttackStage {
    pub fn new(op: Op, count: usize) -> Self {
        Self {
            op,
            count,
            batch: 1,
            label: None,
        }
    }

    pub fn batch(mut self, batch: usize) -> Self {
        self.batch = batch;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.op.to_string())
    }

    /// Number of observations this stage produces when run to completion.
    pub fn batches(&self) -> usize {
        self.count.div_ceil(self.batch.max(1))
    }
}

/// Everything the attack driver needs to run one scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioConfig {
    pub name: String,
    pub plain_modulus: PlainModulus,
    pub seed: u64,
    /// The legitimate operation applied before the attack plan starts.
    #[cfg_attr(feature = "serde", serde(default))]
    pub setup: Option<Op>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub baseline: BaselinePolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub halt_on_danger_zone: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stages: Vec<AttackStage>,
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>, plain_modulus: PlainModulus, seed: u64) -> Self {
        Self {
            name: name.into(),
            plain_modulus,
            seed,
            setup: None,
            baseline: BaselinePolicy::Fresh,
            halt_on_danger_zone: false,
            stages: Vec::new(),
        }
    }

    pub fn setup(mut self, op: Op) -> Self {
        self.setup = Some(op);
        self
    }

    pub fn baseline(mut self, baseline: BaselinePolicy) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn halt_on_danger_zone(mut self, halt_on_danger_zone: bool) -> Self {
        self.halt_on_danger_zone = halt_on_danger_zone;
        self
    }

    pub fn stage(mut self, stage: AttackStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Operations across all stages.
    pub fn attack_ops(&self) -> usize {
        self.stages.iter().map(|stage| stage.count).sum()
    }

    /// Label of the observation taken before the attack plan starts.
    pub fn initial_label(&self) -> String {
        match self.setup {
            Some(Op::Square) => format!("{0} × {0}", self.seed),
            Some(op) => format!("{} {op}", self.seed),
            None => format!("Initial ({})", self.seed),
        }
    }
}
