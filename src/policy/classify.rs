use super::{ExecutionMode, PolicyConfig};
use crate::action::{Action, Command, RiskLevel, TargetSet};
use serde::Serialize;

const MIN_BRUSH_SIZE: f64 = 1.0;
const MAX_BRUSH_FALLOFF: f64 = 1.0;
const MIN_DENSITY: f64 = 0.01;
const MAX_DENSITY: f64 = 10.0;
const MAX_LIGHT_INTENSITY: f64 = 100_000.0;
const MAX_EXPOSURE_COMPENSATION: f64 = 8.0;
const MAX_TERRAIN_DIM: u32 = 8192;
/// One change-unit per this many affected terrain cells.
const TERRAIN_CHANGE_DIVISOR: f64 = 1024.0;

const ALLOWED_ASSET_PREFIXES: [&str; 2] = ["/Game/", "/Engine/"];

const TERRAIN_APPROVAL_NOTE: &str = "terrain operations always require explicit approval";
const SELECTION_DELETE_NOTE: &str =
    "deleting the current selection is not permitted; name delete targets explicitly";

/// Outcome of classifying one proposed action against policy.
///
/// `action` is a clamped copy with its risk re-assigned; the caller's value
/// is never touched. `estimated_changes` is independent of approval status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub action: Action,
    pub approved: bool,
    pub hard_denied: bool,
    pub message: Option<String>,
    pub estimated_changes: u64,
}

impl Classification {
    pub fn risk(&self) -> RiskLevel {
        self.action.risk
    }
}

/// Per-kind rule effects accumulated while walking one command.
#[derive(Default)]
struct RuleOutcome {
    notes: Vec<String>,
    clamped: bool,
    disallowed: bool,
    standing_approval: bool,
    hard_denied: bool,
    estimated_changes: u64,
}

/// Classify one proposed action: risk, approval, clamped parameters, cost.
pub fn classify(action: &Action, config: &PolicyConfig, mode: ExecutionMode) -> Classification {
    let mut action = action.clone();
    let outcome = apply_rules(&mut action.command, config);

    if outcome.hard_denied {
        tracing::warn!(command = %action.command, "action hard-denied by policy");
        return Classification {
            action,
            approved: false,
            hard_denied: true,
            message: join_notes(outcome.notes),
            estimated_changes: outcome.estimated_changes,
        };
    }

    if outcome.disallowed {
        action.risk = RiskLevel::High;
    } else if outcome.clamped {
        action.risk = action.risk.max(RiskLevel::Medium);
    }

    let requires_approval = outcome.disallowed || outcome.clamped || outcome.standing_approval;
    let approved =
        !requires_approval && mode == ExecutionMode::Autonomous && action.risk == RiskLevel::Low;

    if requires_approval {
        tracing::debug!(
            command = %action.command,
            risk = %action.risk,
            "approval withheld by policy"
        );
    }

    Classification {
        action,
        approved,
        hard_denied: false,
        message: join_notes(outcome.notes),
        estimated_changes: outcome.estimated_changes,
    }
}

fn join_notes(notes: Vec<String>) -> Option<String> {
    if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    }
}

#[allow(clippy::too_many_lines)]
fn apply_rules(command: &mut Command, config: &PolicyConfig) -> RuleOutcome {
    let mut out = RuleOutcome::default();

    match command {
        Command::CreateObject {
            class_name, count, ..
        } => {
            check_allowed_class(class_name, config, &mut out);
            clamp_u32("count", count, 1, config.max_create_count, &mut out);
            out.estimated_changes = u64::from(*count);
        }
        Command::DuplicateObjects { targets, count, .. } => {
            truncate_targets(targets, config, &mut out);
            clamp_u32("count", count, 1, config.max_duplicate_count, &mut out);
            out.estimated_changes =
                targets.cardinality(config.selection_estimate) * u64::from(*count);
        }
        Command::ModifyObjects { targets, .. } => {
            truncate_targets(targets, config, &mut out);
            out.estimated_changes = targets.cardinality(config.selection_estimate);
        }
        Command::DeleteObjects { targets } => match targets {
            TargetSet::Selection => {
                out.hard_denied = true;
                out.notes.push(SELECTION_DELETE_NOTE.to_string());
                out.estimated_changes = config.selection_estimate;
            }
            TargetSet::Named { names } => {
                if names.len() > config.max_delete_named {
                    out.hard_denied = true;
                    out.notes.push(format!(
                        "refusing to delete {} named objects (limit {})",
                        names.len(),
                        config.max_delete_named
                    ));
                }
                out.estimated_changes = names.len() as u64;
            }
        },
        Command::AssignAsset {
            targets,
            asset_path,
            ..
        } => {
            if !ALLOWED_ASSET_PREFIXES
                .iter()
                .any(|prefix| asset_path.starts_with(prefix))
            {
                out.disallowed = true;
                out.notes.push(format!(
                    "asset path '{asset_path}' must start with /Game/ or /Engine/"
                ));
            }
            truncate_targets(targets, config, &mut out);
            out.estimated_changes = targets.cardinality(config.selection_estimate);
        }
        Command::ScatterObjects {
            class_name,
            density,
            count_min,
            count_max,
            width_min,
            width_max,
        } => {
            check_allowed_class(class_name, config, &mut out);
            repair_range_u32(count_min, count_max);
            repair_range_f64(width_min, width_max);
            clamp_f64("density", density, MIN_DENSITY, MAX_DENSITY, &mut out);
            clamp_u32("count_max", count_max, 1, config.max_create_count, &mut out);
            if *count_min > *count_max {
                clamp_u32("count_min", count_min, 1, *count_max, &mut out);
            }
            out.estimated_changes = u64::from(*count_max);
        }
        Command::SculptTerrain { brush, .. } => {
            clamp_brush(brush, config, &mut out);
            out.standing_approval = true;
            out.notes.push(TERRAIN_APPROVAL_NOTE.to_string());
            out.estimated_changes = brush_change_estimate(brush.size);
        }
        Command::PaintTerrain { brush, .. } => {
            clamp_brush(brush, config, &mut out);
            out.standing_approval = true;
            out.notes.push(TERRAIN_APPROVAL_NOTE.to_string());
            out.estimated_changes = brush_change_estimate(brush.size);
        }
        Command::GenerateTerrain { width, height, .. } => {
            clamp_u32("terrain width", width, 1, MAX_TERRAIN_DIM, &mut out);
            clamp_u32("terrain height", height, 1, MAX_TERRAIN_DIM, &mut out);
            out.standing_approval = true;
            out.notes.push(TERRAIN_APPROVAL_NOTE.to_string());
            out.estimated_changes =
                area_change_estimate(f64::from(*width) * f64::from(*height));
        }
        Command::SetLightIntensity { targets, intensity } => {
            truncate_targets(targets, config, &mut out);
            clamp_f64("intensity", intensity, 0.0, MAX_LIGHT_INTENSITY, &mut out);
            out.estimated_changes = targets.cardinality(config.selection_estimate);
        }
        Command::SetExposure { compensation } => {
            clamp_f64(
                "exposure compensation",
                compensation,
                -MAX_EXPOSURE_COMPENSATION,
                MAX_EXPOSURE_COMPENSATION,
                &mut out,
            );
            out.estimated_changes = 1;
        }
        Command::Transaction { .. } | Command::QueryScene { .. } => {
            out.estimated_changes = 0;
        }
    }

    out
}

fn check_allowed_class(class_name: &str, config: &PolicyConfig, out: &mut RuleOutcome) {
    if !config
        .allowed_classes
        .iter()
        .any(|allowed| allowed == class_name)
    {
        out.disallowed = true;
        out.notes.push(format!(
            "object class '{class_name}' is not on the spawn allow-list"
        ));
    }
}

fn clamp_u32(label: &str, value: &mut u32, min: u32, max: u32, out: &mut RuleOutcome) {
    let requested = *value;
    let clamped = requested.clamp(min, max);
    if clamped != requested {
        *value = clamped;
        out.clamped = true;
        out.notes
            .push(format!("{label} clamped from {requested} to {clamped}"));
    }
}

fn clamp_f64(label: &str, value: &mut f64, min: f64, max: f64, out: &mut RuleOutcome) {
    let requested = *value;
    let clamped = if requested.is_finite() {
        requested.clamp(min, max)
    } else {
        min
    };
    if (clamped - requested).abs() > f64::EPSILON || !requested.is_finite() {
        *value = clamped;
        out.clamped = true;
        out.notes
            .push(format!("{label} clamped from {requested} to {clamped}"));
    }
}

/// Paired min/max repair: swapped silently, never forcing re-approval.
fn repair_range_u32(min: &mut u32, max: &mut u32) {
    if *min > *max {
        std::mem::swap(min, max);
    }
}

fn repair_range_f64(min: &mut f64, max: &mut f64) {
    if *min > *max {
        std::mem::swap(min, max);
    }
}

fn truncate_targets(targets: &mut TargetSet, config: &PolicyConfig, out: &mut RuleOutcome) {
    if let TargetSet::Named { names } = targets {
        if names.len() > config.max_named_targets {
            let requested = names.len();
            names.truncate(config.max_named_targets);
            out.clamped = true;
            out.notes.push(format!(
                "target list truncated from {requested} to {} names",
                config.max_named_targets
            ));
        }
    }
}

fn clamp_brush(
    brush: &mut crate::action::BrushParams,
    config: &PolicyConfig,
    out: &mut RuleOutcome,
) {
    clamp_f64(
        "brush size",
        &mut brush.size,
        MIN_BRUSH_SIZE,
        config.max_brush_size,
        out,
    );
    clamp_f64(
        "brush strength",
        &mut brush.strength,
        0.0,
        config.max_brush_strength,
        out,
    );
    clamp_f64("brush falloff", &mut brush.falloff, 0.0, MAX_BRUSH_FALLOFF, out);
}

fn brush_change_estimate(size: f64) -> u64 {
    area_change_estimate(size * size)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn area_change_estimate(area: f64) -> u64 {
    ((area / TERRAIN_CHANGE_DIVISOR).ceil() as u64).max(1)
}
