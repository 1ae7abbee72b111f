// ==========================================
// 引擎单元测试辅助: 内存库区构造器
// ==========================================

use crate::domain::{
    Coil, CoilMovement, CoilStatus, GroundLocation, StackingPosition, StockTake,
};
use crate::engine::repositories::YardRepositories;
use crate::repository::memory::MemoryStore;
use crate::repository::store::EntityStore;
use std::sync::Arc;

pub(crate) const BAY: &str = "X";
pub(crate) const ZONE: &str = "Z1";

/// 内存库区（保留具体存储句柄以便故障注入）
pub(crate) struct YardFixture {
    pub coils: Arc<MemoryStore<Coil>>,
    pub positions: Arc<MemoryStore<StackingPosition>>,
    pub locations: Arc<MemoryStore<GroundLocation>>,
    pub movements: Arc<MemoryStore<CoilMovement>>,
    pub stock_takes: Arc<MemoryStore<StockTake>>,
}

impl YardFixture {
    pub fn new() -> Self {
        Self {
            coils: Arc::new(MemoryStore::new()),
            positions: Arc::new(MemoryStore::new()),
            locations: Arc::new(MemoryStore::new()),
            movements: Arc::new(MemoryStore::new()),
            stock_takes: Arc::new(MemoryStore::new()),
        }
    }

    /// 三个地面库位 X-01..X-03 + 一个跨接 X-01/X-02 的二层库位
    ///
    /// 返回 (g1, g2, g3, bridge) 库位 ID
    pub fn standard() -> (Self, [String; 4]) {
        let yard = Self::new();
        let l1 = yard.location("X-01");
        let l2 = yard.location("X-02");
        let l3 = yard.location("X-03");
        let g1 = yard.ground(&l1, "X-01-L1");
        let g2 = yard.ground(&l2, "X-02-L1");
        let g3 = yard.ground(&l3, "X-03-L1");
        let b = yard.bridging("X-01-L2-B", 2, &[&l1, &l2]);
        (yard, [g1, g2, g3, b])
    }

    pub fn repos(&self) -> YardRepositories {
        YardRepositories::new(
            self.coils.clone(),
            self.positions.clone(),
            self.locations.clone(),
            self.movements.clone(),
            self.stock_takes.clone(),
        )
    }

    pub fn location(&self, code: &str) -> String {
        self.locations
            .create(GroundLocation::new(code, BAY, ZONE, 50.0))
            .unwrap()
            .id
    }

    pub fn ground(&self, location_id: &str, placeholder: &str) -> String {
        self.positions
            .create(StackingPosition::ground(placeholder, location_id, BAY, ZONE))
            .unwrap()
            .id
    }

    pub fn bridging(&self, placeholder: &str, layer: u8, supports: &[&str]) -> String {
        self.positions
            .create(StackingPosition::bridging(
                placeholder,
                layer,
                supports[0],
                supports,
                BAY,
                ZONE,
            ))
            .unwrap()
            .id
    }

    pub fn coil(&self, barcode: &str) -> Coil {
        self.coils.create(Coil::incoming(barcode, 12.5)).unwrap()
    }

    pub fn coil_with_status(&self, barcode: &str, status: CoilStatus) -> Coil {
        let mut coil = Coil::incoming(barcode, 12.5);
        coil.status = status;
        self.coils.create(coil).unwrap()
    }

    pub fn position(&self, id: &str) -> StackingPosition {
        self.positions.get(id).unwrap().unwrap()
    }

    pub fn coil_by_barcode(&self, barcode: &str) -> Coil {
        self.coils
            .list()
            .unwrap()
            .into_iter()
            .find(|c| c.barcode == barcode)
            .unwrap()
    }

    pub fn movements(&self) -> Vec<CoilMovement> {
        self.movements.list().unwrap()
    }

    /// 钢卷 ↔ 库位双向一致
    pub fn assert_consistent(&self) {
        let positions = self.positions.list().unwrap();
        for coil in self.coils.list().unwrap() {
            let holders: Vec<&StackingPosition> = positions
                .iter()
                .filter(|p| p.coil_barcode.as_deref() == Some(coil.barcode.as_str()))
                .collect();
            match &coil.current_stacking_position_id {
                Some(id) => {
                    assert_eq!(holders.len(), 1, "coil {} should have one holder", coil.barcode);
                    assert_eq!(&holders[0].id, id);
                }
                None => assert!(holders.is_empty(), "coil {} is unassigned but held", coil.barcode),
            }
        }
    }
}
