use super::{ExecutionMode, PolicyConfig, annotate_plan, classify};
use crate::action::{
    Action, AssetKind, BrushParams, Command, RiskLevel, SculptOp, TargetSet, TransactionControl,
};

fn low(command: Command) -> Action {
    Action {
        risk: RiskLevel::Low,
        command,
    }
}

fn named(names: &[&str]) -> TargetSet {
    TargetSet::Named {
        names: names.iter().map(ToString::to_string).collect(),
    }
}

fn create(class_name: &str, count: u32) -> Command {
    Command::CreateObject {
        class_name: class_name.to_string(),
        count,
        name_prefix: None,
        location: None,
    }
}

fn brush(size: f64, strength: f64, falloff: f64) -> BrushParams {
    BrushParams {
        size,
        strength,
        falloff,
    }
}

#[test]
fn low_risk_autonomous_is_auto_approved() {
    let classification = classify(
        &low(create("PointLight", 2)),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(classification.approved);
    assert!(!classification.hard_denied);
    assert_eq!(classification.risk(), RiskLevel::Low);
}

#[test]
fn low_risk_interactive_requires_approval() {
    let classification = classify(
        &low(create("PointLight", 2)),
        &PolicyConfig::default(),
        ExecutionMode::Interactive,
    );

    assert!(!classification.approved);
}

#[test]
fn medium_risk_autonomous_requires_approval() {
    let action = Action {
        risk: RiskLevel::Medium,
        command: create("PointLight", 2),
    };
    let classification = classify(&action, &PolicyConfig::default(), ExecutionMode::Autonomous);

    assert!(!classification.approved);
    assert_eq!(classification.risk(), RiskLevel::Medium);
}

#[test]
fn classify_leaves_the_caller_action_untouched() {
    let action = low(create("PointLight", 9_999));
    let config = PolicyConfig::default();

    let classification = classify(&action, &config, ExecutionMode::Autonomous);

    match (&action.command, &classification.action.command) {
        (
            Command::CreateObject { count: original, .. },
            Command::CreateObject { count: clamped, .. },
        ) => {
            assert_eq!(*original, 9_999);
            assert_eq!(*clamped, config.max_create_count);
        }
        other => panic!("unexpected commands: {other:?}"),
    }
}

#[test]
fn disallowed_class_forces_high_risk_and_withholds_approval() {
    let classification = classify(
        &low(create("GameModeBase", 1)),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
    assert!(!classification.hard_denied);
    assert_eq!(classification.risk(), RiskLevel::High);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("allow-list")
    );
}

#[test]
fn count_clamp_forces_medium_risk_and_reapproval() {
    let classification = classify(
        &low(create("PointLight", 500)),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
    assert_eq!(classification.risk(), RiskLevel::Medium);
    let message = classification.message.as_deref().unwrap();
    assert!(message.contains("count clamped from 500 to 25"), "{message}");
}

#[test]
fn scatter_range_repair_is_silent() {
    let classification = classify(
        &low(Command::ScatterObjects {
            class_name: "FoliageActor".to_string(),
            density: 1.0,
            count_min: 8,
            count_max: 3,
            width_min: 50.0,
            width_max: 10.0,
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    // Swapped bounds alone never force re-approval.
    assert!(classification.approved);
    assert!(classification.message.is_none());
    match classification.action.command {
        Command::ScatterObjects {
            count_min,
            count_max,
            width_min,
            width_max,
            ..
        } => {
            assert_eq!((count_min, count_max), (3, 8));
            assert_eq!((width_min, width_max), (10.0, 50.0));
        }
        other => panic!("expected scatter_objects, got {other}"),
    }
}

#[test]
fn scatter_density_clamp_withholds_approval() {
    let classification = classify(
        &low(Command::ScatterObjects {
            class_name: "FoliageActor".to_string(),
            density: 250.0,
            count_min: 1,
            count_max: 5,
            width_min: 1.0,
            width_max: 2.0,
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
    assert_eq!(classification.risk(), RiskLevel::Medium);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("density clamped")
    );
}

#[test]
fn delete_by_selection_is_hard_denied() {
    let classification = classify(
        &low(Command::DeleteObjects {
            targets: TargetSet::Selection,
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(classification.hard_denied);
    assert!(!classification.approved);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("current selection")
    );
}

#[test]
fn delete_over_named_limit_is_hard_denied() {
    let names: Vec<String> = (0..11).map(|i| format!("Prop_{i}")).collect();
    let classification = classify(
        &low(Command::DeleteObjects {
            targets: TargetSet::Named { names },
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(classification.hard_denied);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("refusing to delete 11 named objects (limit 10)")
    );
}

#[test]
fn delete_within_named_limit_passes_through() {
    let classification = classify(
        &low(Command::DeleteObjects {
            targets: named(&["Prop_1", "Prop_2"]),
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.hard_denied);
    assert!(classification.approved);
    assert_eq!(classification.estimated_changes, 2);
}

#[test]
fn terrain_sculpt_always_requires_approval() {
    let classification = classify(
        &low(Command::SculptTerrain {
            operation: SculptOp::Raise,
            brush: brush(100.0, 0.5, 0.5),
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    // In-range brush, low risk, autonomous mode: still gated.
    assert!(!classification.approved);
    assert!(!classification.hard_denied);
    assert_eq!(classification.risk(), RiskLevel::Low);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("explicit approval")
    );
}

#[test]
fn terrain_generate_always_requires_approval() {
    let classification = classify(
        &low(Command::GenerateTerrain {
            width: 512,
            height: 512,
            seed: Some(7),
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
}

#[test]
fn oversized_brush_is_clamped_with_message() {
    let classification = classify(
        &low(Command::PaintTerrain {
            layer_name: "grass".to_string(),
            brush: brush(100_000.0, 5.0, 2.0),
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    let message = classification.message.as_deref().unwrap();
    assert!(message.contains("brush size clamped"), "{message}");
    assert!(message.contains("brush strength clamped"), "{message}");
    assert!(message.contains("brush falloff clamped"), "{message}");
    assert_eq!(classification.risk(), RiskLevel::Medium);
}

#[test]
fn asset_path_outside_virtual_roots_is_disallowed() {
    let classification = classify(
        &low(Command::AssignAsset {
            targets: named(&["Wall_01"]),
            asset_path: "C:/Temp/evil.uasset".to_string(),
            kind: AssetKind::Material,
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
    assert_eq!(classification.risk(), RiskLevel::High);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("/Game/ or /Engine/")
    );
}

#[test]
fn asset_path_under_game_root_is_allowed() {
    let classification = classify(
        &low(Command::AssignAsset {
            targets: named(&["Wall_01"]),
            asset_path: "/Game/Materials/M_Brick".to_string(),
            kind: AssetKind::Material,
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(classification.approved);
    assert!(classification.message.is_none());
}

#[test]
fn long_target_list_is_truncated_at_medium_risk() {
    let names: Vec<String> = (0..30).map(|i| format!("Wall_{i}")).collect();
    let classification = classify(
        &low(Command::ModifyObjects {
            targets: TargetSet::Named { names },
            property: "visible".to_string(),
            value: serde_json::json!(false),
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
    assert_eq!(classification.risk(), RiskLevel::Medium);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("truncated from 30 to 25")
    );
    match classification.action.command {
        Command::ModifyObjects { targets, .. } => assert_eq!(targets.cardinality(0), 25),
        other => panic!("expected modify_objects, got {other}"),
    }
}

#[test]
fn light_intensity_is_clamped_into_fixed_range() {
    let classification = classify(
        &low(Command::SetLightIntensity {
            targets: named(&["Sun"]),
            intensity: 9_000_000.0,
        }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("intensity clamped")
    );
}

#[test]
fn exposure_compensation_is_clamped_into_fixed_range() {
    let classification = classify(
        &low(Command::SetExposure { compensation: -40.0 }),
        &PolicyConfig::default(),
        ExecutionMode::Autonomous,
    );

    assert!(!classification.approved);
    assert!(
        classification
            .message
            .as_deref()
            .unwrap()
            .contains("exposure compensation clamped from -40 to -8")
    );
}

#[test]
fn change_estimates_follow_action_shape() {
    let config = PolicyConfig::default();
    let mode = ExecutionMode::Autonomous;

    let create_cost = classify(&low(create("PointLight", 4)), &config, mode);
    assert_eq!(create_cost.estimated_changes, 4);

    let duplicate_cost = classify(
        &low(Command::DuplicateObjects {
            targets: named(&["A", "B", "C"]),
            count: 5,
            offset: None,
        }),
        &config,
        mode,
    );
    assert_eq!(duplicate_cost.estimated_changes, 15);

    let modify_selection_cost = classify(
        &low(Command::ModifyObjects {
            targets: TargetSet::Selection,
            property: "visible".to_string(),
            value: serde_json::json!(true),
        }),
        &config,
        mode,
    );
    assert_eq!(
        modify_selection_cost.estimated_changes,
        config.selection_estimate
    );

    let sculpt_cost = classify(
        &low(Command::SculptTerrain {
            operation: SculptOp::Smooth,
            brush: brush(64.0, 0.5, 0.5),
        }),
        &config,
        mode,
    );
    assert_eq!(sculpt_cost.estimated_changes, 4); // 64*64 / 1024

    let transaction_cost = classify(
        &low(Command::Transaction {
            control: TransactionControl::Begin,
        }),
        &config,
        mode,
    );
    assert_eq!(transaction_cost.estimated_changes, 0);

    let query_cost = classify(&low(Command::QueryScene { filter: None }), &config, mode);
    assert_eq!(query_cost.estimated_changes, 0);
}

#[test]
fn budget_fold_hard_denies_first_overflowing_action() {
    let config = PolicyConfig {
        max_session_change_units: 10,
        ..PolicyConfig::default()
    };

    let actions = vec![
        low(create("PointLight", 6)),
        low(create("PointLight", 6)), // 12 > 10: denied, contributes nothing
        low(create("PointLight", 3)), // 9 <= 10: still admitted
    ];

    let annotated = annotate_plan(&actions, &config, ExecutionMode::Autonomous);

    assert!(!annotated[0].hard_denied);
    assert!(annotated[1].hard_denied);
    assert!(
        annotated[1]
            .message
            .as_deref()
            .unwrap()
            .contains("session change budget exceeded: 12 estimated change-units over limit 10")
    );
    assert!(!annotated[2].hard_denied);
    assert!(annotated[2].approved);
}

#[test]
fn budget_fold_skips_rule_denied_actions_entirely() {
    let config = PolicyConfig {
        max_session_change_units: 12,
        ..PolicyConfig::default()
    };

    let actions = vec![
        low(Command::DeleteObjects {
            targets: TargetSet::Selection,
        }),
        low(create("PointLight", 12)),
    ];

    let annotated = annotate_plan(&actions, &config, ExecutionMode::Autonomous);

    // The selection delete is denied by rule, so its estimate never counts
    // against the budget and the create still fits.
    assert!(annotated[0].hard_denied);
    assert!(!annotated[1].hard_denied);
}

#[test]
fn budget_fold_preserves_pre_overflow_classifications() {
    let config = PolicyConfig {
        max_session_change_units: 5,
        ..PolicyConfig::default()
    };

    let actions = vec![low(create("PointLight", 5)), low(create("PointLight", 1))];
    let annotated = annotate_plan(&actions, &config, ExecutionMode::Autonomous);

    assert!(annotated[0].approved);
    assert!(annotated[0].message.is_none());
    assert!(annotated[1].hard_denied);
}
