// ==========================================
// 钢卷库区管理系统 - 移动记录数据仓储
// ==========================================
// 对齐: coil_movement 表
// 红线: 只增不删 (SqliteStore::delete 拒绝 APPEND_ONLY 实体)
// ==========================================

use crate::domain::movement::CoilMovement;
use crate::domain::types::MovementType;
use crate::repository::error::RepositoryResult;
use crate::repository::sqlite_store::{
    conversion_error, opt_text, text, SqliteEntity, SqliteStore, DATETIME_FORMAT,
};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::Row;

/// 移动记录仓储
pub type MovementRepository = SqliteStore<CoilMovement>;

fn parse_movement_type(idx: usize, raw: &str) -> rusqlite::Result<MovementType> {
    match raw {
        "receipt" => Ok(MovementType::Receipt),
        "shuffle" => Ok(MovementType::Shuffle),
        "return" => Ok(MovementType::Return),
        "loading" => Ok(MovementType::Loading),
        other => Err(conversion_error(idx, format!("未知移动类型: {}", other))),
    }
}

impl SqliteEntity for CoilMovement {
    const TABLE: &'static str = "coil_movement";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "coil_barcode",
        "from_location",
        "to_location",
        "movement_type",
        "movement_date",
        "moved_by",
        "reason",
        "remarks",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let movement_type: String = row.get(4)?;
        let movement_date: String = row.get(5)?;
        let movement_date = NaiveDateTime::parse_from_str(&movement_date, DATETIME_FORMAT)
            .map_err(|e| conversion_error(5, e.to_string()))?;

        Ok(CoilMovement {
            id: row.get(0)?,
            coil_barcode: row.get(1)?,
            from_location: row.get(2)?,
            to_location: row.get(3)?,
            movement_type: parse_movement_type(4, &movement_type)?,
            movement_date,
            moved_by: row.get(6)?,
            reason: row.get(7)?,
            remarks: row.get(8)?,
        })
    }

    fn to_values(&self) -> RepositoryResult<Vec<Value>> {
        Ok(vec![
            text(&self.id),
            text(&self.coil_barcode),
            text(&self.from_location),
            text(&self.to_location),
            text(self.movement_type.as_str()),
            text(&self.movement_date.format(DATETIME_FORMAT).to_string()),
            text(&self.moved_by),
            text(&self.reason),
            opt_text(self.remarks.as_deref()),
        ])
    }
}
