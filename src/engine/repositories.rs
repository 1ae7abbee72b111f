// ==========================================
// 钢卷库区管理系统 - 引擎仓储聚合
// ==========================================
// 职责: 聚合库位引擎所需的全部实体存储,作为显式依赖注入
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::domain::{Coil, CoilMovement, GroundLocation, StackingPosition, StockTake};
use crate::repository::memory::MemoryStore;
use crate::repository::sqlite_store::SqliteStore;
use crate::repository::store::EntityStore;

/// 库位引擎仓储集合
///
/// 引擎只通过此结构访问外部存储; 测试时整体替换为内存实现。
#[derive(Clone)]
pub struct YardRepositories {
    pub coils: Arc<dyn EntityStore<Coil>>,
    pub positions: Arc<dyn EntityStore<StackingPosition>>,
    pub locations: Arc<dyn EntityStore<GroundLocation>>,
    pub movements: Arc<dyn EntityStore<CoilMovement>>,
    pub stock_takes: Arc<dyn EntityStore<StockTake>>,
}

impl YardRepositories {
    /// 创建新的仓储集合
    pub fn new(
        coils: Arc<dyn EntityStore<Coil>>,
        positions: Arc<dyn EntityStore<StackingPosition>>,
        locations: Arc<dyn EntityStore<GroundLocation>>,
        movements: Arc<dyn EntityStore<CoilMovement>>,
        stock_takes: Arc<dyn EntityStore<StockTake>>,
    ) -> Self {
        Self {
            coils,
            positions,
            locations,
            movements,
            stock_takes,
        }
    }

    /// 全内存仓储
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::<Coil>::new()),
            Arc::new(MemoryStore::<StackingPosition>::new()),
            Arc::new(MemoryStore::<GroundLocation>::new()),
            Arc::new(MemoryStore::<CoilMovement>::new()),
            Arc::new(MemoryStore::<StockTake>::new()),
        )
    }

    /// 共享同一 SQLite 连接的仓储
    ///
    /// 说明: 调用方需先执行 `db::init_schema`
    pub fn sqlite(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(SqliteStore::<Coil>::from_connection(conn.clone())),
            Arc::new(SqliteStore::<StackingPosition>::from_connection(conn.clone())),
            Arc::new(SqliteStore::<GroundLocation>::from_connection(conn.clone())),
            Arc::new(SqliteStore::<CoilMovement>::from_connection(conn.clone())),
            Arc::new(SqliteStore::<StockTake>::from_connection(conn)),
        )
    }
}
