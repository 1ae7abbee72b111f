// ==========================================
// 钢卷库区管理系统 - 堆垛库位数据仓储
// ==========================================
// 对齐: stacking_position 表
// 说明: supported_by_ground_location_ids 以 JSON 数组存储
// ==========================================

use crate::domain::position::StackingPosition;
use crate::domain::types::PositionType;
use crate::repository::error::RepositoryResult;
use crate::repository::sqlite_store::{
    boolean, conversion_error, json, opt_text, parse_json, text, SqliteEntity, SqliteStore,
};
use rusqlite::types::Value;
use rusqlite::Row;

/// 堆垛库位仓储
pub type PositionRepository = SqliteStore<StackingPosition>;

fn parse_position_type(idx: usize, raw: &str) -> rusqlite::Result<PositionType> {
    match raw {
        "ground" => Ok(PositionType::Ground),
        "bridging" => Ok(PositionType::Bridging),
        other => Err(conversion_error(idx, format!("未知库位类型: {}", other))),
    }
}

impl SqliteEntity for StackingPosition {
    const TABLE: &'static str = "stacking_position";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "placeholder_id",
        "layer",
        "position_type",
        "primary_ground_location_id",
        "primary_ground_location_code",
        "supported_by_ground_location_ids",
        "bay",
        "zone",
        "coil_barcode",
        "is_active",
        "is_visible",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let position_type: String = row.get(3)?;
        let supports: String = row.get(6)?;
        Ok(StackingPosition {
            id: row.get(0)?,
            placeholder_id: row.get(1)?,
            layer: row.get(2)?,
            position_type: parse_position_type(3, &position_type)?,
            primary_ground_location_id: row.get(4)?,
            primary_ground_location_code: row.get(5)?,
            supported_by_ground_location_ids: parse_json(6, supports)?,
            bay: row.get(7)?,
            zone: row.get(8)?,
            coil_barcode: row.get(9)?,
            is_active: row.get(10)?,
            is_visible: row.get(11)?,
        })
    }

    fn to_values(&self) -> RepositoryResult<Vec<Value>> {
        Ok(vec![
            text(&self.id),
            text(&self.placeholder_id),
            Value::Integer(self.layer as i64),
            text(self.position_type.as_str()),
            text(&self.primary_ground_location_id),
            opt_text(self.primary_ground_location_code.as_deref()),
            json(&self.supported_by_ground_location_ids)?,
            text(&self.bay),
            opt_text(self.zone.as_deref()),
            opt_text(self.coil_barcode.as_deref()),
            boolean(self.is_active),
            boolean(self.is_visible),
        ])
    }
}
