// ==========================================
// 钢卷库区管理系统 - 库区 API
// ==========================================
// 职责: 面向界面层的统一入口
//       库位图查询、层级校验、分配操作、库区布局、盘点录入与对账会话
// 红线: 钢卷↔库位的双向引用只经由 AllocationService 修改
// ==========================================

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, EngineConfig};
use crate::domain::{
    CoilMovement, GroundLocation, RemovalKind, StackingPosition, StockTake,
};
use crate::engine::allocation::{AllocationOutcome, AllocationService};
use crate::engine::error::ReconcileError;
use crate::engine::graph::{build_position_graph, GraphScope, PositionGraph};
use crate::engine::layout::{self, LocationGridSpec, YardLayout};
use crate::engine::occupancy::{self, LayerOccupancy, LocationOccupancy};
use crate::engine::reconciliation::{
    diff_stock_take, CommitReport, PendingChange, ReconciliationDiff, ReconciliationSession,
};
use crate::engine::repositories::YardRepositories;
use crate::engine::shuffle_priority::{rank_shuffle_candidates, ShuffleCandidate};
use crate::engine::stock_take::StockTakeBuilder;
use crate::engine::validator::{self, LayerCheck};
use crate::importer::{SheetImportSummary, StockTakeSheetImporter};

mod allocation_ops;
mod layout_ops;
mod queries;
mod reconciliation_ops;

pub use reconciliation_ops::StockTakeImportResponse;

// ==========================================
// YardApi - 库区 API
// ==========================================

/// 库区API
///
/// 职责：
/// 1. 库位承托图与层级校验查询
/// 2. 放入 / 移出 / 倒垛 / 待发 / 装车
/// 3. 地面库位与堆垛库位维护
/// 4. 盘点录入、差异计算、对账会话（暂存 / 提交 / 放弃）
pub struct YardApi {
    repos: YardRepositories,
    config: EngineConfig,
    allocation: AllocationService,
    layout: YardLayout,
    // stock_take_id → 对账会话
    sessions: Mutex<HashMap<String, ReconciliationSession>>,
}

impl YardApi {
    /// 创建新的YardApi实例
    ///
    /// # 参数
    /// - repos: 实体存储集合
    /// - config: 引擎配置
    pub fn new(repos: YardRepositories, config: EngineConfig) -> Self {
        Self {
            allocation: AllocationService::new(repos.clone()),
            layout: YardLayout::new(repos.clone(), config.clone()),
            repos,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// 基于 SQLite 连接创建（配置从 config_kv 读取）
    ///
    /// 说明: 调用方需先执行 `db::init_schema`
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .and_then(|manager| manager.load_engine_config())
            .map_err(|e| ApiError::Config(e.to_string()))?;
        info!(commit_policy = %config.commit_policy, "库区 API 已初始化");
        Ok(Self::new(YardRepositories::sqlite(conn), config))
    }

    /// 指定操作人（写入移动记录）
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.allocation = AllocationService::new(self.repos.clone()).with_actor(actor);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repositories(&self) -> &YardRepositories {
        &self.repos
    }
}

fn require_text(value: &str, what: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", what)));
    }
    Ok(())
}
