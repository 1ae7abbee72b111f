// ==========================================
// 钢卷库区管理系统 - 堆垛库位
// ==========================================
// 用途: 占用单元 (一个库位同一时刻最多一卷)
// 红线: coil_barcode 只能经由分配引擎写入
// ==========================================

use crate::domain::entity::Entity;
use crate::domain::types::PositionType;
use serde::{Deserialize, Serialize};

// ==========================================
// StackingPosition - 堆垛库位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingPosition {
    pub id: String,
    pub placeholder_id: String, // 库位号 (如 A-01-01-L2-B)
    pub layer: u8,              // 层号 1..=3
    #[serde(rename = "type")]
    pub position_type: PositionType,
    pub primary_ground_location_id: String,
    pub primary_ground_location_code: Option<String>,
    pub supported_by_ground_location_ids: Vec<String>, // 有序承托地面库位
    pub bay: String,
    pub zone: Option<String>,
    pub coil_barcode: Option<String>, // 占用钢卷 (None = 空)
    pub is_active: bool,
    pub is_visible: bool,
}

impl StackingPosition {
    /// 创建地面层库位（承托集合仅含主库位）
    pub fn ground(placeholder_id: &str, primary_location_id: &str, bay: &str, zone: &str) -> Self {
        Self {
            id: String::new(),
            placeholder_id: placeholder_id.to_string(),
            layer: 1,
            position_type: PositionType::Ground,
            primary_ground_location_id: primary_location_id.to_string(),
            primary_ground_location_code: None,
            supported_by_ground_location_ids: vec![primary_location_id.to_string()],
            bay: bay.to_string(),
            zone: Some(zone.to_string()),
            coil_barcode: None,
            is_active: true,
            is_visible: true,
        }
    }

    /// 创建跨接层库位
    pub fn bridging(
        placeholder_id: &str,
        layer: u8,
        primary_location_id: &str,
        supports: &[&str],
        bay: &str,
        zone: &str,
    ) -> Self {
        Self {
            id: String::new(),
            placeholder_id: placeholder_id.to_string(),
            layer,
            position_type: PositionType::for_layer(layer),
            primary_ground_location_id: primary_location_id.to_string(),
            primary_ground_location_code: None,
            supported_by_ground_location_ids: supports.iter().map(|s| s.to_string()).collect(),
            bay: bay.to_string(),
            zone: Some(zone.to_string()),
            coil_barcode: None,
            is_active: true,
            is_visible: true,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.coil_barcode.is_some()
    }

    /// 盘点范围判定: 同跨、同区(若指定)、启用且可见
    pub fn in_scope(&self, bay: &str, zone: Option<&str>) -> bool {
        self.bay == bay
            && zone.map_or(true, |z| self.zone.as_deref() == Some(z))
            && self.is_active
            && self.is_visible
    }
}

/// 堆垛库位局部更新
///
/// 配置字段通过公开的构造方法设置;
/// 占用字段 (coil_barcode) 仅分配引擎可写。
#[derive(Debug, Clone, Default)]
pub struct PositionPatch {
    pub(crate) coil_barcode: Option<Option<String>>,
    pub(crate) placeholder_id: Option<String>,
    pub(crate) supported_by_ground_location_ids: Option<Vec<String>>,
    pub(crate) is_active: Option<bool>,
    pub(crate) is_visible: Option<bool>,
}

impl PositionPatch {
    pub(crate) fn occupancy(coil_barcode: Option<String>) -> Self {
        Self {
            coil_barcode: Some(coil_barcode),
            ..Self::default()
        }
    }

    pub fn placeholder_id(mut self, placeholder_id: &str) -> Self {
        self.placeholder_id = Some(placeholder_id.to_string());
        self
    }

    pub fn supports(mut self, ids: Vec<String>) -> Self {
        self.supported_by_ground_location_ids = Some(ids);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn visible(mut self, is_visible: bool) -> Self {
        self.is_visible = Some(is_visible);
        self
    }

    /// 是否触及占用关系
    pub fn touches_occupancy(&self) -> bool {
        self.coil_barcode.is_some()
    }
}

impl Entity for StackingPosition {
    type Patch = PositionPatch;
    const ENTITY_NAME: &'static str = "StackingPosition";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &PositionPatch) {
        if let Some(barcode) = &patch.coil_barcode {
            self.coil_barcode = barcode.clone();
        }
        if let Some(placeholder) = &patch.placeholder_id {
            self.placeholder_id = placeholder.clone();
        }
        if let Some(supports) = &patch.supported_by_ground_location_ids {
            self.supported_by_ground_location_ids = supports.clone();
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        if let Some(visible) = patch.is_visible {
            self.is_visible = visible;
        }
    }
}
