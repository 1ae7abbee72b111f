// ==========================================
// 钢卷库区管理系统 - 核心库
// ==========================================
// 职责: 堆垛库位分配、层级承托校验、盘点对账
// 技术栈: Rust + SQLite
// 系统定位: 库区操作支持 (人工最终控制权)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 条码与盘点表
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CoilPriority, CoilStatus, MovementType, PositionType, RemovalKind, StatusOperation,
    StockTakeStatus,
};

// 领域实体
pub use domain::{Coil, CoilMovement, GroundLocation, StackingPosition, StockTake};

// 引擎
pub use engine::{
    build_position_graph, can_occupy, can_vacate, diff_stock_take, AllocationError,
    AllocationService, PendingChange, PositionGraph, ReconcileError, ReconciliationSession,
    YardRepositories,
};

// 配置
pub use config::{CommitPolicy, EngineConfig};

// API
pub use api::{ApiError, YardApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "钢卷库区管理系统";
