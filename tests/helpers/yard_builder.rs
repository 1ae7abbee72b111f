// ==========================================
// 测试库区构建器 - 用于集成测试
// ==========================================

use coil_yard::domain::{Coil, GroundLocation, StackingPosition};
use coil_yard::engine::YardRepositories;

pub const BAY: &str = "B";
pub const ZONE: &str = "Z2";

// ==========================================
// YardBuilder - 一行地面库位 + 相邻跨接库位
// ==========================================
//
//   L2:    B-01-L2-B   B-02-L2-B   ...
//   L1:  B-01-L1   B-02-L1   B-03-L1  ...
//
pub struct YardBuilder {
    ground_count: usize,
    with_bridges: bool,
}

/// 构建结果（库位 ID 按库位号顺序）
pub struct BuiltYard {
    pub locations: Vec<GroundLocation>,
    pub ground: Vec<String>,
    pub bridges: Vec<String>,
}

impl YardBuilder {
    pub fn new(ground_count: usize) -> Self {
        Self {
            ground_count,
            with_bridges: false,
        }
    }

    pub fn with_bridges(mut self) -> Self {
        self.with_bridges = true;
        self
    }

    pub fn build(self, repos: &YardRepositories) -> BuiltYard {
        let locations: Vec<GroundLocation> = (1..=self.ground_count)
            .map(|n| {
                let code = format!("{}-{:02}", BAY, n);
                repos
                    .locations
                    .create(GroundLocation::new(&code, BAY, ZONE, 40.0).with_grid(1, n as i32))
                    .expect("create location")
            })
            .collect();

        let ground = locations
            .iter()
            .map(|l| {
                let placeholder = format!("{}-L1", l.location_code);
                repos
                    .positions
                    .create(StackingPosition::ground(&placeholder, &l.id, BAY, ZONE))
                    .expect("create ground position")
                    .id
            })
            .collect();

        let bridges = if self.with_bridges {
            locations
                .windows(2)
                .map(|pair| {
                    let placeholder = format!("{}-L2-B", pair[0].location_code);
                    repos
                        .positions
                        .create(StackingPosition::bridging(
                            &placeholder,
                            2,
                            &pair[0].id,
                            &[&pair[0].id, &pair[1].id],
                            BAY,
                            ZONE,
                        ))
                        .expect("create bridging position")
                        .id
                })
                .collect()
        } else {
            Vec::new()
        };

        BuiltYard {
            locations,
            ground,
            bridges,
        }
    }
}

// ==========================================
// Coil 构建器
// ==========================================
pub struct CoilBuilder {
    coil: Coil,
}

impl CoilBuilder {
    pub fn new(barcode: &str) -> Self {
        Self {
            coil: Coil::incoming(barcode, 21.5),
        }
    }

    pub fn create(self, repos: &YardRepositories) -> Coil {
        repos.coils.create(self.coil).expect("create coil")
    }
}

/// 钢卷 ↔ 库位双向一致
pub fn assert_bidirectional(repos: &YardRepositories) {
    let positions = repos.positions.list().expect("list positions");
    for coil in repos.coils.list().expect("list coils") {
        let holders: Vec<&StackingPosition> = positions
            .iter()
            .filter(|p| p.coil_barcode.as_deref() == Some(coil.barcode.as_str()))
            .collect();
        match &coil.current_stacking_position_id {
            Some(id) => {
                assert_eq!(holders.len(), 1, "coil {} must have exactly one holder", coil.barcode);
                assert_eq!(&holders[0].id, id, "coil {} holder mismatch", coil.barcode);
            }
            None => assert!(holders.is_empty(), "unplaced coil {} is still held", coil.barcode),
        }
    }
}
