// ==========================================
// 钢卷库区管理系统 - 盘点单
// ==========================================
// 用途: 某跨/区在某时刻的实物盘点快照
// 红线: 对账后仅状态字段可变,且状态单调前进
// ==========================================

use crate::domain::entity::Entity;
use crate::domain::types::StockTakeStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 盘点发现的钢卷 (钢卷号 → 实物所在库位号)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundCoil {
    pub coil_barcode: String,
    pub found_at_placeholder_id: String,
}

/// 无法追溯的钢卷 (系统不认识的实物)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonTraceableCoil {
    pub barcode: Option<String>,
    pub description: String,
    pub found_at_placeholder_id: String,
}

// ==========================================
// StockTake - 盘点单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTake {
    pub id: String,
    pub stock_take_date: NaiveDateTime,
    pub location: String,
    pub bay: String,
    pub zone: Option<String>,
    pub physical_count: i64,
    pub system_count: i64,
    pub variance: i64, // physical - system
    pub coils_found: Vec<FoundCoil>,
    pub non_traceable_coils: Vec<NonTraceableCoil>,
    pub empty_placeholders: Vec<String>,
    pub remarks: Option<String>,
    pub status: StockTakeStatus,
}

impl StockTake {
    pub fn is_reconciled(&self) -> bool {
        self.status == StockTakeStatus::Reconciled
    }
}

/// 盘点单局部更新（仅状态）
#[derive(Debug, Clone, Default)]
pub struct StockTakePatch {
    pub(crate) status: Option<StockTakeStatus>,
}

impl StockTakePatch {
    pub(crate) fn status(status: StockTakeStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}

impl Entity for StockTake {
    type Patch = StockTakePatch;
    const ENTITY_NAME: &'static str = "StockTake";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &StockTakePatch) {
        if let Some(status) = patch.status {
            // 状态只允许前进
            if self.status.can_advance_to(status) {
                self.status = status;
            }
        }
    }
}
