// ==========================================
// 钢卷库区管理系统 - 引擎层错误类型
// ==========================================
// 分类:
// (a) 前置条件违反: 写入前检查,不发生任何存储变更
// (b) 记录未找到
// (c) 多步写入中途失败: 无自动补偿,必须人工对账
// ==========================================

use crate::domain::types::{CoilStatus, StatusOperation};
use crate::engine::reconciliation::CommitReport;
use crate::i18n;
use crate::repository::error::RepositoryError;
use std::fmt;
use thiserror::Error;

// ==========================================
// WriteStep - 多步写入的步骤标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    SourcePositionClear, // 清空原库位
    TargetPositionSet,   // 写入目标库位
    CoilUpdate,          // 更新钢卷位置/状态
    MovementLog,         // 追加移动记录
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStep::SourcePositionClear => write!(f, "source_position_clear"),
            WriteStep::TargetPositionSet => write!(f, "target_position_set"),
            WriteStep::CoilUpdate => write!(f, "coil_update"),
            WriteStep::MovementLog => write!(f, "movement_log"),
        }
    }
}

// ==========================================
// AllocationError - 分配操作错误
// ==========================================
#[derive(Error, Debug)]
pub enum AllocationError {
    // ===== (b) 未找到 =====
    #[error("记录未找到: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    // ===== (a) 前置条件 =====
    #[error("库位 {placeholder_id} 已被钢卷 {occupant} 占用")]
    PositionOccupied {
        placeholder_id: String,
        occupant: String,
    },

    #[error("钢卷 {coil_barcode} 已在库位 {position_id},请使用倒垛")]
    AlreadyPlaced {
        coil_barcode: String,
        position_id: String,
    },

    #[error("钢卷 {coil_barcode} 当前未分配库位")]
    NotPlaced { coil_barcode: String },

    #[error("库位 {placeholder_id} 为空")]
    PositionEmpty { placeholder_id: String },

    #[error("库位 {placeholder_id} 当前存放 {actual},而非 {expected}")]
    CoilMismatch {
        placeholder_id: String,
        expected: String,
        actual: String,
    },

    #[error("下层未放满: 库位 {placeholder_id} (L{layer}) 缺少承托 {missing:?}")]
    LowerLayerIncomplete {
        placeholder_id: String,
        layer: u8,
        missing: Vec<String>,
    },

    #[error("上层依赖此库位: {placeholder_id} 上方仍有钢卷 {dependents:?}")]
    UpperLayerDependent {
        placeholder_id: String,
        dependents: Vec<String>,
    },

    #[error("无效的状态转换: 钢卷 {coil_barcode} 状态 {from} 不允许执行 {operation}")]
    InvalidStatusTransition {
        coil_barcode: String,
        from: CoilStatus,
        operation: StatusOperation,
    },

    #[error("库位 {placeholder_id} 未启用")]
    PositionInactive { placeholder_id: String },

    // ===== 写入前的存储错误 (无变更) =====
    #[error("存储访问失败: {0}")]
    Store(#[from] RepositoryError),

    // ===== (c) 中途失败 =====
    #[error("数据不一致: 钢卷 {coil_barcode} 库位 {position_id} 在步骤 {step} 失败,需人工对账: {source}")]
    InconsistentState {
        coil_barcode: String,
        position_id: String,
        step: WriteStep,
        #[source]
        source: RepositoryError,
    },
}

impl AllocationError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        AllocationError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// 是否为前置条件违反（未发生写入,可换目标后重试）
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AllocationError::PositionOccupied { .. }
                | AllocationError::AlreadyPlaced { .. }
                | AllocationError::NotPlaced { .. }
                | AllocationError::PositionEmpty { .. }
                | AllocationError::CoilMismatch { .. }
                | AllocationError::LowerLayerIncomplete { .. }
                | AllocationError::UpperLayerDependent { .. }
                | AllocationError::InvalidStatusTransition { .. }
                | AllocationError::PositionInactive { .. }
        )
    }

    /// 是否需要人工介入
    pub fn is_fatal(&self) -> bool {
        matches!(self, AllocationError::InconsistentState { .. })
    }

    /// 稳定错误码（用于国际化与前端分支）
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::NotFound { .. } => "not_found",
            AllocationError::PositionOccupied { .. } => "position_occupied",
            AllocationError::AlreadyPlaced { .. } => "already_placed",
            AllocationError::NotPlaced { .. } => "not_placed",
            AllocationError::PositionEmpty { .. } => "position_empty",
            AllocationError::CoilMismatch { .. } => "coil_mismatch",
            AllocationError::LowerLayerIncomplete { .. } => "lower_layer_incomplete",
            AllocationError::UpperLayerDependent { .. } => "upper_layer_dependent",
            AllocationError::InvalidStatusTransition { .. } => "invalid_status_transition",
            AllocationError::PositionInactive { .. } => "position_inactive",
            AllocationError::Store(_) => "store_error",
            AllocationError::InconsistentState { .. } => "inconsistent_state",
        }
    }

    /// 面向操作员的本地化提示
    pub fn user_message(&self) -> String {
        let code = self.code();
        match self {
            AllocationError::NotFound { entity, id } => {
                i18n::error_message(code, &[("entity", entity), ("id", id)])
            }
            AllocationError::PositionOccupied {
                placeholder_id,
                occupant,
            } => i18n::error_message(code, &[("position", placeholder_id), ("coil", occupant)]),
            AllocationError::AlreadyPlaced {
                coil_barcode,
                position_id,
            } => i18n::error_message(code, &[("coil", coil_barcode), ("position", position_id)]),
            AllocationError::NotPlaced { coil_barcode } => {
                i18n::error_message(code, &[("coil", coil_barcode)])
            }
            AllocationError::PositionEmpty { placeholder_id }
            | AllocationError::PositionInactive { placeholder_id } => {
                i18n::error_message(code, &[("position", placeholder_id)])
            }
            AllocationError::CoilMismatch {
                placeholder_id,
                expected,
                actual,
            } => i18n::error_message(
                code,
                &[("position", placeholder_id), ("expected", expected), ("actual", actual)],
            ),
            AllocationError::LowerLayerIncomplete {
                placeholder_id,
                layer,
                ..
            } => i18n::error_message(
                code,
                &[("position", placeholder_id), ("layer", &layer.to_string())],
            ),
            AllocationError::UpperLayerDependent {
                placeholder_id,
                dependents,
            } => i18n::error_message(
                code,
                &[
                    ("position", placeholder_id),
                    ("count", &dependents.len().to_string()),
                ],
            ),
            AllocationError::InvalidStatusTransition {
                coil_barcode, from, ..
            } => i18n::error_message(code, &[("coil", coil_barcode), ("status", from.as_str())]),
            AllocationError::Store(e) => i18n::error_message(code, &[("detail", &e.to_string())]),
            AllocationError::InconsistentState {
                coil_barcode,
                position_id,
                step,
                ..
            } => i18n::error_message(
                code,
                &[
                    ("coil", coil_barcode),
                    ("position", position_id),
                    ("step", &step.to_string()),
                ],
            ),
        }
    }
}

/// Result 类型别名
pub type AllocationResult<T> = Result<T, AllocationError>;

// ==========================================
// ReconcileError - 盘点对账错误
// ==========================================
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("盘点单不存在: {0}")]
    StockTakeNotFound(String),

    #[error("盘点单已对账,不可重复提交: {0}")]
    AlreadyReconciled(String),

    #[error("没有待提交的变更")]
    NothingToCommit,

    #[error("无效的待提交变更: {0}")]
    InvalidChange(String),

    #[error("存储访问失败: {0}")]
    Store(#[from] RepositoryError),

    #[error("变更已执行,但盘点单 {stock_take_id} 状态更新失败: {source}")]
    StatusUpdate {
        stock_take_id: String,
        report: Box<CommitReport>,
        #[source]
        source: RepositoryError,
    },
}

impl ReconcileError {
    pub fn code(&self) -> &'static str {
        match self {
            ReconcileError::StockTakeNotFound(_) => "stock_take_not_found",
            ReconcileError::AlreadyReconciled(_) => "already_reconciled",
            ReconcileError::NothingToCommit => "nothing_to_commit",
            ReconcileError::InvalidChange(_) => "invalid_change",
            ReconcileError::Store(_) => "store_error",
            ReconcileError::StatusUpdate { .. } => "status_update_failed",
        }
    }

    pub fn user_message(&self) -> String {
        let code = self.code();
        match self {
            ReconcileError::NothingToCommit => i18n::error_message(code, &[]),
            ReconcileError::StockTakeNotFound(detail)
            | ReconcileError::AlreadyReconciled(detail)
            | ReconcileError::InvalidChange(detail) => {
                i18n::error_message(code, &[("detail", detail)])
            }
            ReconcileError::Store(e) => i18n::error_message(code, &[("detail", &e.to_string())]),
            ReconcileError::StatusUpdate { stock_take_id, .. } => {
                i18n::error_message(code, &[("detail", stock_take_id)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let occupied = AllocationError::PositionOccupied {
            placeholder_id: "A-01-L1".to_string(),
            occupant: "C9".to_string(),
        };
        assert!(occupied.is_precondition());
        assert!(!occupied.is_fatal());
        assert_eq!(occupied.code(), "position_occupied");

        let broken = AllocationError::InconsistentState {
            coil_barcode: "C1".to_string(),
            position_id: "p1".to_string(),
            step: WriteStep::CoilUpdate,
            source: RepositoryError::StoreUnavailable("timeout".to_string()),
        };
        assert!(broken.is_fatal());
        assert!(!broken.is_precondition());
        assert!(broken.to_string().contains("coil_update"));
    }
}
