// ==========================================
// 盘点对账流程集成测试
// ==========================================
// 测试目标: 盘点表导入 → 差异 → 暂存 → 提交（两种提交策略）
// ==========================================

mod helpers;

use std::io::Write;

use coil_yard::api::YardApi;
use coil_yard::config::{config_keys, CommitPolicy, ConfigManager, EngineConfig};
use coil_yard::domain::{Coil, CoilStatus, StockTakeStatus};
use coil_yard::engine::reconciliation::ReconcileReason;
use coil_yard::engine::{ChangeOutcome, PendingChange, YardRepositories};
use coil_yard::logging;
use helpers::yard_builder::{assert_bidirectional, CoilBuilder, YardBuilder, BAY, ZONE};

fn write_sheet(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "coil_barcode,placeholder_id,description").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

#[test]
fn test_best_effort_commit_reports_failure_and_reconciles() {
    logging::init_test();
    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let repos = YardRepositories::sqlite(test_helpers::shared_connection(&db_path).unwrap());
    let yard = YardBuilder::new(4).build(&repos);
    for barcode in ["R1", "R2", "R3", "R4"] {
        CoilBuilder::new(barcode).create(&repos);
    }
    let api = YardApi::new(repos.clone(), EngineConfig::default());
    api.assign("R1", &yard.ground[0]).unwrap();
    api.assign("R2", &yard.ground[1]).unwrap();
    api.assign("R3", &yard.ground[2]).unwrap();

    // R1 确认; R2 实际在 B-04; R3 未盘到; R4 (系统未入位) 在 B-03
    let sheet = write_sheet(&[
        "R1,B-01-L1,",
        "R2 3.2X1250X1500 21.5,B-04-L1,",
        "R4,B-03-L1,",
    ]);
    let imported = api
        .import_stock_take(sheet.path(), BAY, Some(ZONE), None)
        .unwrap();
    assert_eq!(imported.stock_take.system_count, 3);
    assert_eq!(imported.stock_take.physical_count, 3);
    let st_id = imported.stock_take.id.clone();

    let diff = api.open_reconciliation(&st_id).unwrap();
    assert_eq!(diff.confirmed.len(), 1);
    assert_eq!(diff.misplaced.len(), 1);
    assert_eq!(diff.missing().count(), 1);
    assert!(diff
        .to_place
        .iter()
        .any(|p| p.coil.barcode == "R4" && p.reason == ReconcileReason::UnassignedInSystem));

    // 第 2 条失败: B-03 仍被 R3 占用
    let changes = vec![
        PendingChange::Assign {
            coil_barcode: "R2".to_string(),
            target_position_id: yard.ground[3].clone(),
        },
        PendingChange::Assign {
            coil_barcode: "R4".to_string(),
            target_position_id: yard.ground[2].clone(),
        },
        PendingChange::MarkMissing {
            coil_barcode: "R3".to_string(),
            position_id: yard.ground[2].clone(),
        },
    ];
    for change in changes {
        api.stage_pending_change(&st_id, change).unwrap();
    }

    let report = api.commit_reconciliation(&st_id).unwrap();
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.results[1].outcome, ChangeOutcome::Failed(_)));
    assert_eq!(
        report.results[1].error().map(|e| e.code()),
        Some("position_occupied")
    );
    assert_eq!(report.stock_take_status, StockTakeStatus::Reconciled);

    let stored = repos.stock_takes.get(&st_id).unwrap().unwrap();
    assert_eq!(stored.status, StockTakeStatus::Reconciled);

    let r3 = repos.coils.filter(&|c: &Coil| c.barcode == "R3").unwrap().remove(0);
    assert_eq!(r3.status, CoilStatus::Incoming);
    assert!(r3.current_stacking_position_id.is_none());
    assert_bidirectional(&repos);

    // 已对账的盘点单不能再开会话
    assert_eq!(
        api.open_reconciliation(&st_id).unwrap_err().code(),
        "already_reconciled"
    );
}

#[test]
fn test_strict_policy_from_config_table() {
    let (_temp_file, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::shared_connection(&db_path).unwrap();
    ConfigManager::from_connection(conn.clone())
        .unwrap()
        .set_global_config_value(config_keys::COMMIT_POLICY, "strict")
        .unwrap();

    let api = YardApi::from_connection(conn).unwrap();
    assert_eq!(api.config().commit_policy, CommitPolicy::Strict);

    let repos = api.repositories().clone();
    let yard = YardBuilder::new(2).with_bridges().build(&repos);
    for barcode in ["T1", "T2", "T3"] {
        CoilBuilder::new(barcode).create(&repos);
    }

    let sheet = write_sheet(&["T1,B-01-L1,", "T2,B-02-L1,", "T3,B-01-L2-B,"]);
    let st_id = api
        .import_stock_take(sheet.path(), BAY, Some(ZONE), Some("strict run"))
        .unwrap()
        .stock_take
        .id;
    let diff = api.open_reconciliation(&st_id).unwrap();
    assert_eq!(diff.to_place.len(), 3);

    // 先放跨接层再放地面层: 预演即失败,不写入
    let order = [("T3", &yard.bridges[0]), ("T1", &yard.ground[0]), ("T2", &yard.ground[1])];
    for (barcode, target) in order {
        api.stage_pending_change(
            &st_id,
            PendingChange::Assign {
                coil_barcode: barcode.to_string(),
                target_position_id: target.clone(),
            },
        )
        .unwrap();
    }
    let rejected = api.commit_reconciliation(&st_id).unwrap();
    assert!(rejected.dry_run_rejected);
    assert!(repos.movements.list().unwrap().is_empty());

    // 调整顺序后提交成功
    let t3 = api.unstage_pending_change(&st_id, 0).unwrap().unwrap();
    api.stage_pending_change(&st_id, t3).unwrap();
    let report = api.commit_reconciliation(&st_id).unwrap();
    assert!(!report.dry_run_rejected);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.stock_take_status, StockTakeStatus::Reconciled);

    assert!(api.diff_stock_take(&st_id).unwrap().is_clean());
    assert_bidirectional(&repos);
}
