// ==========================================
// 钢卷库区管理系统 - 地面库位数据仓储
// ==========================================
// 对齐: storage_location 表
// ==========================================

use crate::domain::location::GroundLocation;
use crate::repository::error::RepositoryResult;
use crate::repository::sqlite_store::{boolean, text, SqliteEntity, SqliteStore};
use rusqlite::types::Value;
use rusqlite::Row;

/// 地面库位仓储
pub type LocationRepository = SqliteStore<GroundLocation>;

impl SqliteEntity for GroundLocation {
    const TABLE: &'static str = "storage_location";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "location_code",
        "bay",
        "zone",
        "row_num",
        "col_num",
        "capacity_tons",
        "is_active",
        "is_visible",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(GroundLocation {
            id: row.get(0)?,
            location_code: row.get(1)?,
            bay: row.get(2)?,
            zone: row.get(3)?,
            row_num: row.get(4)?,
            col_num: row.get(5)?,
            capacity_tons: row.get(6)?,
            is_active: row.get(7)?,
            is_visible: row.get(8)?,
        })
    }

    fn to_values(&self) -> RepositoryResult<Vec<Value>> {
        Ok(vec![
            text(&self.id),
            text(&self.location_code),
            text(&self.bay),
            text(&self.zone),
            self.row_num.map(|v| Value::Integer(v as i64)).unwrap_or(Value::Null),
            self.col_num.map(|v| Value::Integer(v as i64)).unwrap_or(Value::Null),
            Value::Real(self.capacity_tons),
            boolean(self.is_active),
            boolean(self.is_visible),
        ])
    }
}
