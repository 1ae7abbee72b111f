// ==========================================
// 钢卷库区管理系统 - 钢卷移动记录
// ==========================================
// 红线: 只增不改不删 (审计追踪)
// ==========================================

use crate::domain::entity::{Entity, Immutable};
use crate::domain::types::MovementType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// CoilMovement - 移动记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoilMovement {
    pub id: String,
    pub coil_barcode: String,
    pub from_location: String, // 来源库位号 / Unassigned
    pub to_location: String,   // 目标库位号 / Unassigned / Missing / 车牌
    pub movement_type: MovementType,
    pub movement_date: NaiveDateTime,
    pub moved_by: String,
    pub reason: String,
    pub remarks: Option<String>,
}

impl CoilMovement {
    pub fn new(
        coil_barcode: &str,
        from_location: &str,
        to_location: &str,
        movement_type: MovementType,
        moved_by: &str,
        reason: &str,
    ) -> Self {
        Self {
            id: String::new(),
            coil_barcode: coil_barcode.to_string(),
            from_location: from_location.to_string(),
            to_location: to_location.to_string(),
            movement_type,
            movement_date: chrono::Utc::now().naive_utc(),
            moved_by: moved_by.to_string(),
            reason: reason.to_string(),
            remarks: None,
        }
    }

    pub fn with_remarks(mut self, remarks: Option<String>) -> Self {
        self.remarks = remarks.filter(|r| !r.trim().is_empty());
        self
    }
}

impl Entity for CoilMovement {
    type Patch = Immutable;
    const ENTITY_NAME: &'static str = "CoilMovement";
    const APPEND_ONLY: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &Immutable) {
        match *patch {}
    }
}
