// ==========================================
// 钢卷库区管理系统 - API层错误类型
// ==========================================
// 职责: 汇总引擎/仓储/导入错误,提供稳定错误码与本地化提示
// 红线: 所有拒绝必须包含显式原因
// ==========================================

use crate::engine::error::{AllocationError, ReconcileError};
use crate::engine::layout::LayoutError;
use crate::engine::stock_take::StockTakeError;
use crate::i18n;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与查找
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    // ==========================================
    // 引擎错误
    // ==========================================
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("盘点录入错误: {0}")]
    StockTakeEntry(#[from] StockTakeError),

    // ==========================================
    // 导入 / 配置 / 存储
    // ==========================================
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            RepositoryError::LockError(msg) => {
                ApiError::InternalError(format!("数据库锁获取失败: {}", msg))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// 稳定错误码（前端据此分支,也是本地化键 `errors.<code>` 的后缀）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Allocation(e) => e.code(),
            ApiError::Reconcile(e) => e.code(),
            ApiError::Layout(LayoutError::Store(_)) => "store_error",
            ApiError::Layout(_) => "layout_error",
            ApiError::StockTakeEntry(_) => "stock_take_entry_error",
            ApiError::Import(_) => "import_error",
            ApiError::Config(_) => "config_error",
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => "store_error",
        }
    }

    /// 面向操作员的本地化提示
    pub fn user_message(&self) -> String {
        let code = self.code();
        match self {
            ApiError::Allocation(e) => e.user_message(),
            ApiError::Reconcile(e) => e.user_message(),
            ApiError::NotFound { entity, id } => {
                i18n::error_message(code, &[("entity", entity), ("id", id)])
            }
            ApiError::InvalidInput(detail)
            | ApiError::Config(detail)
            | ApiError::DatabaseError(detail)
            | ApiError::InternalError(detail) => i18n::error_message(code, &[("detail", detail)]),
            ApiError::Layout(e) => i18n::error_message(code, &[("detail", &e.to_string())]),
            ApiError::StockTakeEntry(e) => i18n::error_message(code, &[("detail", &e.to_string())]),
            ApiError::Import(e) => i18n::error_message(code, &[("detail", &e.to_string())]),
        }
    }

    /// 是否为写入中途失败（需人工核对）
    pub fn needs_manual_check(&self) -> bool {
        match self {
            ApiError::Allocation(e) => e.is_fatal(),
            ApiError::Reconcile(ReconcileError::StatusUpdate { report, .. }) => {
                report.has_inconsistency()
            }
            _ => false,
        }
    }
}

/// API层 Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
