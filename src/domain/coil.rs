// ==========================================
// 钢卷库区管理系统 - 钢卷
// ==========================================
// 红线: current_stacking_position_id 与库位 coil_barcode 双向一致
//       (仅分配引擎可写)
// ==========================================

use crate::domain::entity::Entity;
use crate::domain::types::{CoilPriority, CoilStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Coil - 钢卷
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coil {
    pub id: String,
    pub barcode: String, // 全局唯一钢卷号
    pub weight_tons: f64,
    pub thickness_mm: Option<f64>,
    pub width_mm: Option<f64>,
    pub diameter_mm: Option<f64>,
    pub coil_type: Option<String>,
    pub status: CoilStatus,
    pub current_stacking_position_id: Option<String>, // None = 未分配
    pub storage_location: Option<String>,             // 主地面库位编码 (展示用)
    pub received_date: Option<NaiveDateTime>,
    pub last_moved_date: Option<NaiveDateTime>,
    pub priority: Option<CoilPriority>,
}

impl Coil {
    /// 创建待入库钢卷
    pub fn incoming(barcode: &str, weight_tons: f64) -> Self {
        Self {
            id: String::new(),
            barcode: barcode.to_string(),
            weight_tons,
            thickness_mm: None,
            width_mm: None,
            diameter_mm: None,
            coil_type: None,
            status: CoilStatus::Incoming,
            current_stacking_position_id: None,
            storage_location: None,
            received_date: Some(chrono::Utc::now().naive_utc()),
            last_moved_date: None,
            priority: None,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.current_stacking_position_id.is_some()
    }
}

/// 钢卷局部更新
///
/// 位置/状态字段仅分配引擎可写; 优先级与类型属于业务主数据,对外开放。
#[derive(Debug, Clone, Default)]
pub struct CoilPatch {
    pub(crate) current_stacking_position_id: Option<Option<String>>,
    pub(crate) storage_location: Option<Option<String>>,
    pub(crate) status: Option<CoilStatus>,
    pub(crate) last_moved_date: Option<NaiveDateTime>,
    pub(crate) priority: Option<Option<CoilPriority>>,
    pub(crate) coil_type: Option<Option<String>>,
}

impl CoilPatch {
    /// 放置/移出库位
    pub(crate) fn placement(
        position_id: Option<String>,
        storage_location: Option<String>,
        status: Option<CoilStatus>,
        moved_at: NaiveDateTime,
    ) -> Self {
        Self {
            current_stacking_position_id: Some(position_id),
            storage_location: Some(storage_location),
            status,
            last_moved_date: Some(moved_at),
            ..Self::default()
        }
    }

    /// 仅状态变更
    pub(crate) fn status_only(status: CoilStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: Option<CoilPriority>) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn coil_type(mut self, coil_type: Option<String>) -> Self {
        self.coil_type = Some(coil_type);
        self
    }
}

impl Entity for Coil {
    type Patch = CoilPatch;
    const ENTITY_NAME: &'static str = "Coil";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &CoilPatch) {
        if let Some(position) = &patch.current_stacking_position_id {
            self.current_stacking_position_id = position.clone();
        }
        if let Some(location) = &patch.storage_location {
            self.storage_location = location.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(moved) = patch.last_moved_date {
            self.last_moved_date = Some(moved);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(coil_type) = &patch.coil_type {
            self.coil_type = coil_type.clone();
        }
    }
}
