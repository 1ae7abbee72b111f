// ==========================================
// 钢卷库区管理系统 - 地面库位
// ==========================================
// 用途: 库区物理网格单元,堆垛库位的承载基础
// ==========================================

use crate::domain::entity::Entity;
use serde::{Deserialize, Serialize};

// ==========================================
// GroundLocation - 地面库位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundLocation {
    pub id: String,
    pub location_code: String, // 库位编码 (唯一, 如 A-01-01)
    pub bay: String,           // 跨
    pub zone: String,          // 区
    pub row_num: Option<i32>,  // 网格行号
    pub col_num: Option<i32>,  // 网格列号
    pub capacity_tons: f64,    // 承重能力 (吨)
    pub is_active: bool,
    pub is_visible: bool,
}

impl GroundLocation {
    /// 创建新的地面库位（主键由存储分配）
    pub fn new(location_code: &str, bay: &str, zone: &str, capacity_tons: f64) -> Self {
        Self {
            id: String::new(),
            location_code: location_code.to_string(),
            bay: bay.to_string(),
            zone: zone.to_string(),
            row_num: None,
            col_num: None,
            capacity_tons,
            is_active: true,
            is_visible: true,
        }
    }

    /// 设置网格坐标
    pub fn with_grid(mut self, row_num: i32, col_num: i32) -> Self {
        self.row_num = Some(row_num);
        self.col_num = Some(col_num);
        self
    }

    /// 是否处于指定范围（zone 为 None 表示整跨）
    pub fn in_scope(&self, bay: &str, zone: Option<&str>) -> bool {
        self.bay == bay && zone.map_or(true, |z| self.zone == z)
    }
}

/// 地面库位局部更新
#[derive(Debug, Clone, Default)]
pub struct LocationPatch {
    pub capacity_tons: Option<f64>,
    pub row_num: Option<Option<i32>>,
    pub col_num: Option<Option<i32>>,
    pub is_active: Option<bool>,
    pub is_visible: Option<bool>,
}

impl Entity for GroundLocation {
    type Patch = LocationPatch;
    const ENTITY_NAME: &'static str = "StorageLocation";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn apply_patch(&mut self, patch: &LocationPatch) {
        if let Some(capacity) = patch.capacity_tons {
            self.capacity_tons = capacity;
        }
        if let Some(row) = patch.row_num {
            self.row_num = row;
        }
        if let Some(col) = patch.col_num {
            self.col_num = col;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        if let Some(visible) = patch.is_visible {
            self.is_visible = visible;
        }
    }
}
