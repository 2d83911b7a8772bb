use serde::{Deserialize, Serialize};

/// Blast-radius classification attached to every proposed action.
///
/// Ordered so that threshold comparisons (`risk > max_risk`) read directly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One proposed host operation: a risk tag plus the command payload.
///
/// The risk tag arrives from the plan generator and may be re-assigned by the
/// policy engine during classification; the command parameters may be clamped
/// at the same time. After classification the action is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub risk: RiskLevel,
    #[serde(flatten)]
    pub command: Command,
}

/// The closed set of editor commands the core knows how to gate.
///
/// Adding a variant here forces the policy classification match to be
/// extended; the compiler, not a runtime test, catches an unhandled kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(tag = "command", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    CreateObject {
        class_name: String,
        count: u32,
        #[serde(default)]
        name_prefix: Option<String>,
        #[serde(default)]
        location: Option<[f64; 3]>,
    },
    DuplicateObjects {
        targets: TargetSet,
        count: u32,
        #[serde(default)]
        offset: Option<[f64; 3]>,
    },
    ModifyObjects {
        targets: TargetSet,
        property: String,
        value: serde_json::Value,
    },
    DeleteObjects {
        targets: TargetSet,
    },
    AssignAsset {
        targets: TargetSet,
        asset_path: String,
        kind: AssetKind,
    },
    ScatterObjects {
        class_name: String,
        density: f64,
        count_min: u32,
        count_max: u32,
        width_min: f64,
        width_max: f64,
    },
    SculptTerrain {
        operation: SculptOp,
        brush: BrushParams,
    },
    PaintTerrain {
        layer_name: String,
        brush: BrushParams,
    },
    GenerateTerrain {
        width: u32,
        height: u32,
        #[serde(default)]
        seed: Option<u64>,
    },
    SetLightIntensity {
        targets: TargetSet,
        intensity: f64,
    },
    SetExposure {
        compensation: f64,
    },
    Transaction {
        control: TransactionControl,
    },
    QueryScene {
        #[serde(default)]
        filter: Option<String>,
    },
}

/// Which host objects an action applies to.
///
/// `Selection` is the host's live selection; its cardinality is unknown to
/// the core and is estimated from policy config where a count is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSet {
    Named { names: Vec<String> },
    Selection,
}

impl TargetSet {
    /// Number of objects this set is expected to touch.
    pub fn cardinality(&self, selection_estimate: u64) -> u64 {
        match self {
            Self::Named { names } => names.len() as u64,
            Self::Selection => selection_estimate,
        }
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, Self::Selection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    Material,
    Mesh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SculptOp {
    Raise,
    Lower,
    Smooth,
    Flatten,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionControl {
    Begin,
    Commit,
    Abort,
}

/// Area-effect brush for terrain sculpting and painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushParams {
    pub size: f64,
    pub strength: f64,
    pub falloff: f64,
}
