// ==========================================
// 钢卷库区管理系统 - 领域类型定义
// ==========================================
// 职责: 封闭枚举 + 状态迁移表
// 红线: 状态只能由迁移表给出,禁止在调用点直接拼字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 钢卷状态 (Coil Status)
// ==========================================
// 序列化格式: snake_case (与实体存储一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoilStatus {
    Incoming,  // 待入库
    InYard,    // 在库
    InProcess, // 加工中
    Outgoing,  // 待发运
    Shipped,   // 已发运
}

impl fmt::Display for CoilStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl CoilStatus {
    /// 转换为存储字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            CoilStatus::Incoming => "incoming",
            CoilStatus::InYard => "in_yard",
            CoilStatus::InProcess => "in_process",
            CoilStatus::Outgoing => "outgoing",
            CoilStatus::Shipped => "shipped",
        }
    }

    /// 从存储字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "incoming" => Some(CoilStatus::Incoming),
            "in_yard" => Some(CoilStatus::InYard),
            "in_process" => Some(CoilStatus::InProcess),
            "outgoing" => Some(CoilStatus::Outgoing),
            "shipped" => Some(CoilStatus::Shipped),
            _ => None,
        }
    }

    /// 是否预期仍在库区内（盘点"未分配"判定用）
    pub fn expected_in_yard(&self) -> bool {
        !matches!(self, CoilStatus::Shipped | CoilStatus::Outgoing)
    }

    /// 状态迁移表
    ///
    /// # 参数
    /// - op: 触发迁移的操作
    ///
    /// # 返回
    /// - Some(status): 操作完成后钢卷应处的状态
    /// - None: 当前状态不允许执行该操作
    pub fn transition(&self, op: StatusOperation) -> Option<CoilStatus> {
        use CoilStatus::*;
        match (op, *self) {
            (StatusOperation::Assign, Incoming | InYard | InProcess) => Some(InYard),
            (StatusOperation::Remove(RemovalKind::Direct), Incoming | InYard | InProcess | Outgoing) => {
                Some(Incoming)
            }
            (StatusOperation::Remove(RemovalKind::ReconcileUnassign), s) if s != Shipped => Some(InYard),
            (StatusOperation::Remove(RemovalKind::MarkMissing), s) if s != Shipped => Some(Incoming),
            (StatusOperation::Shuffle, s @ (InYard | InProcess | Outgoing)) => Some(s),
            (StatusOperation::MarkOutgoing, InYard | InProcess) => Some(Outgoing),
            (StatusOperation::Dispatch, InYard | InProcess | Outgoing) => Some(Shipped),
            _ => None,
        }
    }
}

// ==========================================
// 下架类型 (Removal Kind)
// ==========================================
// 不同入口的下架对应不同的目标状态,见 CoilStatus::transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalKind {
    Direct,            // 库位界面直接下架
    ReconcileUnassign, // 盘点对账: 解除分配(实物仍在库)
    MarkMissing,       // 盘点对账: 标记丢失
}

impl RemovalKind {
    /// 移动记录中的去向描述
    pub fn destination_label(&self) -> &'static str {
        match self {
            RemovalKind::Direct | RemovalKind::ReconcileUnassign => "Unassigned",
            RemovalKind::MarkMissing => "Missing",
        }
    }

    /// 移动记录中的原因描述
    pub fn reason(&self) -> &'static str {
        match self {
            RemovalKind::Direct => "Removed from stacking position",
            RemovalKind::ReconcileUnassign => "Removed during reconciliation",
            RemovalKind::MarkMissing => "Marked missing during stock take",
        }
    }
}

// ==========================================
// 状态迁移操作 (Status Operation)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOperation {
    Assign,
    Remove(RemovalKind),
    Shuffle,
    MarkOutgoing,
    Dispatch,
}

impl fmt::Display for StatusOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusOperation::Assign => write!(f, "assign"),
            StatusOperation::Remove(kind) => write!(f, "remove({:?})", kind),
            StatusOperation::Shuffle => write!(f, "shuffle"),
            StatusOperation::MarkOutgoing => write!(f, "mark_outgoing"),
            StatusOperation::Dispatch => write!(f, "dispatch"),
        }
    }
}

// ==========================================
// 库位类型 (Position Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    Ground,   // 地面层 (L1)
    Bridging, // 跨接层 (L2/L3)
}

impl PositionType {
    /// 按层号推导库位类型
    pub fn for_layer(layer: u8) -> Self {
        if layer <= 1 {
            PositionType::Ground
        } else {
            PositionType::Bridging
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionType::Ground => "ground",
            PositionType::Bridging => "bridging",
        }
    }
}

// ==========================================
// 移动类型 (Movement Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Receipt, // 入位
    Shuffle, // 倒垛
    Return,  // 下架
    Loading, // 装车
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "receipt",
            MovementType::Shuffle => "shuffle",
            MovementType::Return => "return",
            MovementType::Loading => "loading",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 盘点单状态 (Stock Take Status)
// ==========================================
// 顺序: Completed < Reconciled, 只允许前进
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockTakeStatus {
    Completed,  // 盘点完成,待对账
    Reconciled, // 已对账
}

impl StockTakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockTakeStatus::Completed => "completed",
            StockTakeStatus::Reconciled => "reconciled",
        }
    }

    /// 是否允许迁移到目标状态（单调前进）
    pub fn can_advance_to(&self, next: StockTakeStatus) -> bool {
        next > *self
    }
}

// ==========================================
// 倒垛优先级 (Coil Priority)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoilPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl CoilPriority {
    /// 优先级基础分
    pub fn weight(&self) -> u32 {
        match self {
            CoilPriority::Urgent => 40,
            CoilPriority::High => 30,
            CoilPriority::Medium => 10,
            CoilPriority::Low => 0,
        }
    }
}
