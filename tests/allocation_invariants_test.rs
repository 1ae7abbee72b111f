// ==========================================
// 分配操作不变量测试
// ==========================================
// 测试目标: 任意成功/失败的操作序列之后,钢卷↔库位双向引用保持一致;
//           写入中途失败时返回 InconsistentState 而非静默成功
// ==========================================

mod helpers;

use std::sync::Arc;

use coil_yard::domain::{Coil, CoilMovement, GroundLocation, StackingPosition, StockTake};
use coil_yard::engine::{AllocationError, AllocationService, WriteStep, YardRepositories};
use coil_yard::repository::{EntityStore, MemoryStore};
use helpers::yard_builder::{assert_bidirectional, CoilBuilder, YardBuilder};

#[test]
fn test_mixed_operation_sequence_keeps_references_consistent() {
    let repos = YardRepositories::in_memory();
    let yard = YardBuilder::new(4).with_bridges().build(&repos);
    let barcodes = ["M1", "M2", "M3", "M4", "M5", "M6"];
    for barcode in barcodes {
        CoilBuilder::new(barcode).create(&repos);
    }
    let service = AllocationService::new(repos.clone());

    let targets: Vec<&String> = yard.ground.iter().chain(yard.bridges.iter()).collect();

    // 确定性的伪随机序列: 成功与被拒绝的操作交错
    let mut rejected = 0;
    for step in 0..60usize {
        let barcode = barcodes[(step * 7) % barcodes.len()];
        let target = targets[(step * 5 + 3) % targets.len()];
        let result = match step % 3 {
            0 => service.assign(barcode, target),
            1 => service.shuffle(barcode, target, "sequence", None),
            _ => service.remove(target),
        };
        if let Err(e) = result {
            assert!(e.is_precondition(), "unexpected error at step {}: {:?}", step, e);
            rejected += 1;
        }
        assert_bidirectional(&repos);
    }
    assert!(rejected > 0);

    let placed = repos
        .coils
        .list()
        .unwrap()
        .iter()
        .filter(|c| c.is_placed())
        .count();
    assert!(placed <= targets.len());
    assert!(!repos.movements.list().unwrap().is_empty());
}

#[test]
fn test_partial_failure_surfaces_inconsistent_state() {
    let coils = Arc::new(MemoryStore::<Coil>::new());
    let positions = Arc::new(MemoryStore::<StackingPosition>::new());
    let repos = YardRepositories::new(
        coils.clone(),
        positions.clone(),
        Arc::new(MemoryStore::<GroundLocation>::new()),
        Arc::new(MemoryStore::<CoilMovement>::new()),
        Arc::new(MemoryStore::<StockTake>::new()),
    );
    let yard = YardBuilder::new(2).build(&repos);
    CoilBuilder::new("F1").create(&repos);
    let service = AllocationService::new(repos.clone());

    // 库位写入成功,钢卷写入失败
    coils.fail_next_update();
    let err = service.assign("F1", &yard.ground[0]).unwrap_err();
    match &err {
        AllocationError::InconsistentState {
            coil_barcode,
            position_id,
            step,
            ..
        } => {
            assert_eq!(coil_barcode, "F1");
            assert_eq!(position_id, &yard.ground[0]);
            assert_eq!(*step, WriteStep::CoilUpdate);
        }
        other => panic!("Expected InconsistentState, got {:?}", other),
    }
    assert!(err.is_fatal());
    assert_eq!(err.code(), "inconsistent_state");

    // 首次写入即失败: 无任何变更
    CoilBuilder::new("F2").create(&repos);
    positions.fail_next_update();
    let err = service.assign("F2", &yard.ground[1]).unwrap_err();
    assert!(matches!(err, AllocationError::Store(_)));
    assert!(positions.get(&yard.ground[1]).unwrap().unwrap().coil_barcode.is_none());
    let f2 = coils.filter(&|c: &Coil| c.barcode == "F2").unwrap().remove(0);
    assert!(f2.current_stacking_position_id.is_none());
}
