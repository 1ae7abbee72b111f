// ==========================================
// 钢卷库区管理系统 - 引擎层
// ==========================================
// 职责: 库位承托图、层级校验、分配操作、盘点对账
// 红线: Engine 不拼 SQL, 只通过 YardRepositories 访问存储
// 红线: 所有拒绝必须输出原因
// ==========================================

pub mod allocation;
pub mod error;
pub mod graph;
pub mod layout;
pub mod occupancy;
pub mod reconciliation;
pub mod repositories;
pub mod shuffle_priority;
pub mod stock_take;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

// 重导出核心引擎
pub use allocation::{AllocationOutcome, AllocationService};
pub use error::{AllocationError, AllocationResult, ReconcileError, WriteStep};
pub use graph::{build_position_graph, GraphScope, PositionGraph, PositionNode};
pub use layout::{LayoutError, LocationGridSpec, YardLayout};
pub use occupancy::{LayerOccupancy, LocationOccupancy, OccupancyState};
pub use reconciliation::{
    diff_stock_take, ChangeOutcome, ChangeResult, CommitReport, PendingChange,
    ReconciliationDiff, ReconciliationSession,
};
pub use repositories::YardRepositories;
pub use shuffle_priority::ShuffleCandidate;
pub use stock_take::{StockTakeBuilder, StockTakeError};
pub use validator::{can_occupy, can_vacate, LayerCheck, LayerViolation};
