use super::*;
use crate::config::CommitPolicy;
use crate::domain::{CoilStatus, FoundCoil, MovementType, StockTake, StockTakeStatus};
use crate::engine::allocation::AllocationService;
use crate::engine::error::{AllocationError, ReconcileError};
use crate::engine::stock_take::StockTakeBuilder;
use crate::engine::test_support::{YardFixture, BAY, ZONE};
use crate::repository::store::EntityStore;

// ==========================================
// 测试辅助函数
// ==========================================

/// 按库位号放入钢卷
fn place(yard: &YardFixture, service: &AllocationService, barcode: &str, position_id: &str) {
    yard.coil(barcode);
    service.assign(barcode, position_id).unwrap();
}

fn save(yard: &YardFixture, builder: StockTakeBuilder) -> StockTake {
    let positions = yard.positions.list().unwrap();
    yard.stock_takes.create(builder.complete(&positions)).unwrap()
}

// ==========================================
// 差异计算
// ==========================================

#[test]
fn test_misplaced_coil_yields_unplace_and_place() {
    let (yard, [g1, g2, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g2);

    let mut builder = StockTakeBuilder::new(BAY, Some(ZONE));
    builder.record_found("C1", "X-01-L1").unwrap();
    let st = save(&yard, builder);

    let diff = diff_stock_take(&st, &yard.coils.list().unwrap(), &yard.positions.list().unwrap());
    assert_eq!(diff.misplaced.len(), 1);
    assert_eq!(diff.misplaced[0].system_placeholder_id, "X-02-L1");
    assert_eq!(diff.misplaced[0].found_placeholder_id, "X-01-L1");

    assert_eq!(diff.to_unplace.len(), 1);
    assert_eq!(diff.to_unplace[0].position.placeholder_id, "X-02-L1");
    assert_eq!(diff.to_unplace[0].reason, ReconcileReason::Misplaced);

    assert_eq!(diff.to_place.len(), 1);
    assert_eq!(diff.to_place[0].target_placeholder_id, "X-01-L1");
    assert_eq!(diff.to_place[0].target_position_id.as_deref(), Some(g1.as_str()));
    assert_eq!(diff.to_place[0].reason, ReconcileReason::Relocating);
    assert!(diff.confirmed.is_empty());
}

#[test]
fn test_repeated_observation_uses_last_placeholder() {
    let (yard, [g1, g2, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);

    let mut st = save(&yard, StockTakeBuilder::new(BAY, Some(ZONE)));
    for placeholder in ["X-01-L1", "X-02-L1"] {
        st.coils_found.push(FoundCoil {
            coil_barcode: "C1".to_string(),
            found_at_placeholder_id: placeholder.to_string(),
        });
    }

    let diff = diff_stock_take(&st, &yard.coils.list().unwrap(), &yard.positions.list().unwrap());
    assert!(diff.confirmed.is_empty());
    assert_eq!(diff.misplaced.len(), 1);
    assert_eq!(diff.misplaced[0].found_placeholder_id, "X-02-L1");
    assert_eq!(diff.to_place.len(), 1);
    assert_eq!(diff.to_place[0].target_position_id.as_deref(), Some(g2.as_str()));
}

#[test]
fn test_coil_not_found_physically_is_missing() {
    let (yard, [g1, g2, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);
    place(&yard, &service, "C3", &g2);

    let mut builder = StockTakeBuilder::new(BAY, Some(ZONE));
    builder.record_found("C1", "X-01-L1").unwrap();
    let st = save(&yard, builder);

    let diff = diff_stock_take(&st, &yard.coils.list().unwrap(), &yard.positions.list().unwrap());
    assert_eq!(diff.confirmed.len(), 1);
    assert_eq!(diff.confirmed[0].coil_barcode, "C1");

    let missing: Vec<&ToUnplace> = diff.missing().collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].coil.barcode, "C3");
    assert_eq!(missing[0].reason.as_str(), "not found physically");
    assert!(!diff.is_clean());
}

#[test]
fn test_unassigned_and_pass_through_lists() {
    let (yard, [g1, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    yard.coil("C5"); // 未分配、未盘到、应在库
    yard.coil_with_status("C6", CoilStatus::Shipped); // 已发运,不提示
    yard.coil("C7"); // 未分配,盘到 → 待放入
    place(&yard, &service, "C1", &g1);

    let mut builder = StockTakeBuilder::new(BAY, Some(ZONE));
    builder.record_found("C1", "X-01-L1").unwrap();
    builder.record_found("C7", "X-03-L1").unwrap();
    builder.record_found("GHOST", "X-02-L1").unwrap();
    builder
        .record_non_traceable(Some("??"), "label torn", "X-02-L1")
        .unwrap();
    let st = save(&yard, builder);

    let diff = diff_stock_take(&st, &yard.coils.list().unwrap(), &yard.positions.list().unwrap());
    let unassigned: Vec<&str> = diff.unassigned.iter().map(|c| c.barcode.as_str()).collect();
    assert_eq!(unassigned, vec!["C5"]);
    assert_eq!(diff.to_place.len(), 1);
    assert_eq!(diff.to_place[0].reason, ReconcileReason::UnassignedInSystem);
    assert_eq!(diff.unknown_barcodes, vec!["GHOST"]);
    assert_eq!(diff.non_traceable.len(), 1);
    assert_eq!(diff.non_traceable[0].description, "label torn");
}

#[test]
fn test_diff_is_repeatable() {
    let (yard, [g1, g2, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);
    place(&yard, &service, "C2", &g2);

    let mut builder = StockTakeBuilder::new(BAY, Some(ZONE));
    builder.record_found("C2", "X-03-L1").unwrap();
    builder.mark_empty("X-01-L1").unwrap();
    let st = save(&yard, builder);

    let coils = yard.coils.list().unwrap();
    let positions = yard.positions.list().unwrap();
    let first = diff_stock_take(&st, &coils, &positions);
    let second = diff_stock_take(&st, &coils, &positions);
    assert_eq!(first, second);
    assert_eq!(first.empty_placeholders, vec!["X-01-L1"]);
}

// ==========================================
// 暂存 / 提交 / 取消
// ==========================================

#[test]
fn test_commit_continues_past_failure_and_reconciles() {
    let (yard, [g1, g2, g3, _]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);
    place(&yard, &service, "C2", &g2);
    yard.coil("C4");

    let st = save(&yard, StockTakeBuilder::new(BAY, Some(ZONE)));
    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();

    session
        .stage(PendingChange::MarkMissing {
            coil_barcode: "C1".to_string(),
            position_id: g1.clone(),
        })
        .unwrap();
    // 目标库位已被 C2 占用 → 前置条件失败
    session
        .stage(PendingChange::Assign {
            coil_barcode: "C4".to_string(),
            target_position_id: g2.clone(),
        })
        .unwrap();
    session
        .stage(PendingChange::Assign {
            coil_barcode: "C4".to_string(),
            target_position_id: g3.clone(),
        })
        .unwrap();

    let report = session.commit(&service, CommitPolicy::BestEffort).unwrap();
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 2);
    assert!(matches!(
        report.results[1].error(),
        Some(AllocationError::PositionOccupied { .. })
    ));
    assert_eq!(report.stock_take_status, StockTakeStatus::Reconciled);
    assert!(session.pending().is_empty());

    let stored = yard.stock_takes.get(&st.id).unwrap().unwrap();
    assert_eq!(stored.status, StockTakeStatus::Reconciled);
    assert_eq!(yard.coil_by_barcode("C1").status, CoilStatus::Incoming);
    assert_eq!(yard.position(&g3).coil_barcode.as_deref(), Some("C4"));
    yard.assert_consistent();

    // 已对账不可再次提交
    session
        .stage(PendingChange::Unassign {
            coil_barcode: "C2".to_string(),
            position_id: g2.clone(),
        })
        .unwrap();
    let err = session.commit(&service, CommitPolicy::BestEffort).unwrap_err();
    assert!(matches!(err, ReconcileError::AlreadyReconciled(_)));
}

#[test]
fn test_misplaced_assign_runs_as_shuffle() {
    let (yard, [g1, g2, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g2);

    let mut builder = StockTakeBuilder::new(BAY, Some(ZONE));
    builder.record_found("C1", "X-01-L1").unwrap();
    let st = save(&yard, builder);

    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();
    let diff = session.diff(&yard.repos()).unwrap();
    let target = diff.to_place[0].target_position_id.clone().unwrap();
    assert_eq!(target, g1);

    session
        .stage(PendingChange::Assign {
            coil_barcode: "C1".to_string(),
            target_position_id: target,
        })
        .unwrap();
    let report = session.commit(&service, CommitPolicy::BestEffort).unwrap();
    assert_eq!(report.succeeded(), 1);

    let last = yard.movements().pop().unwrap();
    assert_eq!(last.movement_type, MovementType::Shuffle);
    assert_eq!(last.reason, RECONCILIATION_REASON);
    assert!(session.diff(&yard.repos()).unwrap().is_clean());
    yard.assert_consistent();
}

#[test]
fn test_stale_pointer_after_partial_remove_is_repaired() {
    let (yard, [g1, g2, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);

    // 库位已清空,钢卷更新失败: 钢卷仍指向 X-01-L1
    yard.coils.fail_next_update();
    let err = service.remove(&g1).unwrap_err();
    assert!(matches!(err, AllocationError::InconsistentState { .. }));
    assert_eq!(yard.coil_by_barcode("C1").current_stacking_position_id.as_deref(), Some(g1.as_str()));
    assert!(yard.position(&g1).coil_barcode.is_none());

    // 在悬空库位盘到: 不能算作已确认
    let mut builder = StockTakeBuilder::new(BAY, Some(ZONE));
    builder.record_found("C1", "X-01-L1").unwrap();
    let st = save(&yard, builder);
    let diff = diff_stock_take(&st, &yard.coils.list().unwrap(), &yard.positions.list().unwrap());
    assert!(diff.confirmed.is_empty());
    assert!(diff.misplaced.is_empty());
    assert!(diff.to_unplace.is_empty());
    assert_eq!(diff.to_place.len(), 1);
    assert_eq!(diff.to_place[0].reason, ReconcileReason::UnassignedInSystem);

    // 在别处盘到: 放入盘到库位即可修复
    let mut builder = StockTakeBuilder::new(BAY, Some(ZONE));
    builder.record_found("C1", "X-02-L1").unwrap();
    let st = save(&yard, builder);
    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();
    let diff = session.diff(&yard.repos()).unwrap();
    assert!(diff.to_unplace.is_empty());
    assert_eq!(diff.to_place[0].reason, ReconcileReason::UnassignedInSystem);
    let target = diff.to_place[0].target_position_id.clone().unwrap();
    assert_eq!(target, g2);

    session
        .stage(PendingChange::Assign {
            coil_barcode: "C1".to_string(),
            target_position_id: target,
        })
        .unwrap();
    let report = session.commit(&service, CommitPolicy::BestEffort).unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.stock_take_status, StockTakeStatus::Reconciled);

    let coil = yard.coil_by_barcode("C1");
    assert_eq!(coil.current_stacking_position_id.as_deref(), Some(g2.as_str()));
    assert_eq!(coil.status, CoilStatus::InYard);
    assert_eq!(yard.position(&g2).coil_barcode.as_deref(), Some("C1"));
    assert_eq!(yard.movements().pop().unwrap().movement_type, MovementType::Receipt);
    yard.assert_consistent();
}

#[test]
fn test_stale_pointer_repair_still_checks_target() {
    let (yard, [g1, g2, _, b]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);
    place(&yard, &service, "C2", &g2);
    yard.coils.fail_next_update();
    service.remove(&g1).unwrap_err();

    // 常规放入仍拒绝悬空引用
    let err = service.assign("C1", &g2).unwrap_err();
    assert!(matches!(err, AllocationError::AlreadyPlaced { .. }));

    let st = save(&yard, StockTakeBuilder::new(BAY, Some(ZONE)));
    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();
    session
        .stage(PendingChange::Assign {
            coil_barcode: "C1".to_string(),
            target_position_id: g2.clone(),
        })
        .unwrap();
    // 下层 X-01-L1 已空
    session
        .stage(PendingChange::Assign {
            coil_barcode: "C1".to_string(),
            target_position_id: b.clone(),
        })
        .unwrap();

    let report = session.commit(&service, CommitPolicy::BestEffort).unwrap();
    assert_eq!(report.failed(), 2);
    assert!(matches!(
        report.results[0].error(),
        Some(AllocationError::PositionOccupied { .. })
    ));
    assert!(matches!(
        report.results[1].error(),
        Some(AllocationError::LowerLayerIncomplete { .. })
    ));
    assert_eq!(yard.position(&g2).coil_barcode.as_deref(), Some("C2"));
    assert!(yard.position(&b).coil_barcode.is_none());
}

#[test]
fn test_strict_policy_rejects_without_writes() {
    let (yard, [g1, g2, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);
    place(&yard, &service, "C2", &g2);

    let st = save(&yard, StockTakeBuilder::new(BAY, Some(ZONE)));
    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();
    session
        .stage(PendingChange::Unassign {
            coil_barcode: "C1".to_string(),
            position_id: g1.clone(),
        })
        .unwrap();
    // 库位存放的是 C2
    session
        .stage(PendingChange::MarkMissing {
            coil_barcode: "C9".to_string(),
            position_id: g2.clone(),
        })
        .unwrap();

    let movements_before = yard.movements().len();
    let report = session.commit(&service, CommitPolicy::Strict).unwrap();
    assert!(report.dry_run_rejected);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.stock_take_status, StockTakeStatus::Completed);

    // 未写入
    assert_eq!(yard.movements().len(), movements_before);
    assert_eq!(yard.position(&g1).coil_barcode.as_deref(), Some("C1"));
    let stored = yard.stock_takes.get(&st.id).unwrap().unwrap();
    assert_eq!(stored.status, StockTakeStatus::Completed);
    // 暂存保留,可修正后重提
    assert_eq!(session.pending().len(), 2);
}

#[test]
fn test_strict_policy_applies_when_rehearsal_passes() {
    let (yard, [g1, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);

    let st = save(&yard, StockTakeBuilder::new(BAY, Some(ZONE)));
    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();
    session
        .stage(PendingChange::Unassign {
            coil_barcode: "C1".to_string(),
            position_id: g1.clone(),
        })
        .unwrap();

    let report = session.commit(&service, CommitPolicy::Strict).unwrap();
    assert!(!report.dry_run_rejected);
    assert_eq!(report.stock_take_status, StockTakeStatus::Reconciled);
    assert_eq!(yard.coil_by_barcode("C1").status, CoilStatus::InYard);
}

#[test]
fn test_cancel_and_empty_commit() {
    let (yard, [g1, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);

    let st = save(&yard, StockTakeBuilder::new(BAY, Some(ZONE)));
    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();
    let change = PendingChange::MarkMissing {
        coil_barcode: "C1".to_string(),
        position_id: g1.clone(),
    };
    assert_eq!(session.stage(change.clone()).unwrap(), 0);
    // 同一变更只保留一份
    assert_eq!(session.stage(change).unwrap(), 0);

    session.cancel();
    assert!(session.pending().is_empty());
    assert_eq!(yard.position(&g1).coil_barcode.as_deref(), Some("C1"));

    let err = session.commit(&service, CommitPolicy::BestEffort).unwrap_err();
    assert!(matches!(err, ReconcileError::NothingToCommit));

    let err = session
        .stage(PendingChange::Unassign {
            coil_barcode: " ".to_string(),
            position_id: g1.clone(),
        })
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidChange(_)));
}

#[test]
fn test_status_update_failure_returns_report() {
    let (yard, [g1, ..]) = YardFixture::standard();
    let service = AllocationService::new(yard.repos());
    place(&yard, &service, "C1", &g1);

    let st = save(&yard, StockTakeBuilder::new(BAY, Some(ZONE)));
    let mut session = ReconciliationSession::load(&yard.repos(), &st.id).unwrap();
    session
        .stage(PendingChange::Unassign {
            coil_barcode: "C1".to_string(),
            position_id: g1.clone(),
        })
        .unwrap();

    yard.stock_takes.fail_next_update();
    match session.commit(&service, CommitPolicy::BestEffort) {
        Err(ReconcileError::StatusUpdate { report, .. }) => {
            assert_eq!(report.succeeded(), 1);
            assert_eq!(report.stock_take_status, StockTakeStatus::Completed);
        }
        other => panic!("unexpected: {:?}", other),
    }
}
