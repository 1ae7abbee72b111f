// ==========================================
// 钢卷库区管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供实体存储契约与实现 (内存 / SQLite)
// 约束: 所有查询使用参数化
// ==========================================

pub mod coil_repo;
pub mod error;
pub mod location_repo;
pub mod memory;
pub mod movement_repo;
pub mod position_repo;
pub mod sqlite_store;
pub mod stock_take_repo;
pub mod store;

// 重导出核心仓储
pub use coil_repo::CoilRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use location_repo::LocationRepository;
pub use memory::MemoryStore;
pub use movement_repo::MovementRepository;
pub use position_repo::PositionRepository;
pub use sqlite_store::{SqliteEntity, SqliteStore};
pub use stock_take_repo::StockTakeRepository;
pub use store::EntityStore;
