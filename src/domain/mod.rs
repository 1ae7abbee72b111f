// ==========================================
// 钢卷库区管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、状态迁移表
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod coil;
pub mod entity;
pub mod location;
pub mod movement;
pub mod position;
pub mod stock_take;
pub mod types;

// 重导出核心类型
pub use coil::{Coil, CoilPatch};
pub use entity::{Entity, Immutable};
pub use location::{GroundLocation, LocationPatch};
pub use movement::CoilMovement;
pub use position::{PositionPatch, StackingPosition};
pub use stock_take::{FoundCoil, NonTraceableCoil, StockTake, StockTakePatch};
pub use types::{
    CoilPriority, CoilStatus, MovementType, PositionType, RemovalKind, StatusOperation,
    StockTakeStatus,
};
