// ==========================================
// 钢卷库区管理系统 - 钢卷数据仓储
// ==========================================
// 对齐: coil 表
// ==========================================

use crate::domain::coil::Coil;
use crate::domain::types::{CoilPriority, CoilStatus};
use crate::repository::error::RepositoryResult;
use crate::repository::sqlite_store::{
    conversion_error, datetime, opt_text, parse_datetime, text, SqliteEntity, SqliteStore,
};
use rusqlite::types::Value;
use rusqlite::Row;

/// 钢卷仓储
pub type CoilRepository = SqliteStore<Coil>;

fn priority_to_str(priority: CoilPriority) -> &'static str {
    match priority {
        CoilPriority::Low => "low",
        CoilPriority::Medium => "medium",
        CoilPriority::High => "high",
        CoilPriority::Urgent => "urgent",
    }
}

fn str_to_priority(s: &str) -> Option<CoilPriority> {
    match s {
        "low" => Some(CoilPriority::Low),
        "medium" => Some(CoilPriority::Medium),
        "high" => Some(CoilPriority::High),
        "urgent" => Some(CoilPriority::Urgent),
        _ => None,
    }
}

fn opt_real(v: Option<f64>) -> Value {
    v.map(Value::Real).unwrap_or(Value::Null)
}

impl SqliteEntity for Coil {
    const TABLE: &'static str = "coil";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "barcode",
        "weight_tons",
        "thickness_mm",
        "width_mm",
        "diameter_mm",
        "coil_type",
        "status",
        "current_stacking_position_id",
        "storage_location",
        "received_date",
        "last_moved_date",
        "priority",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(7)?;
        let status = CoilStatus::parse(&status)
            .ok_or_else(|| conversion_error(7, format!("未知钢卷状态: {}", status)))?;
        let priority: Option<String> = row.get(12)?;

        Ok(Coil {
            id: row.get(0)?,
            barcode: row.get(1)?,
            weight_tons: row.get(2)?,
            thickness_mm: row.get(3)?,
            width_mm: row.get(4)?,
            diameter_mm: row.get(5)?,
            coil_type: row.get(6)?,
            status,
            current_stacking_position_id: row.get(8)?,
            storage_location: row.get(9)?,
            received_date: parse_datetime(row.get(10)?),
            last_moved_date: parse_datetime(row.get(11)?),
            priority: priority.as_deref().and_then(str_to_priority),
        })
    }

    fn to_values(&self) -> RepositoryResult<Vec<Value>> {
        Ok(vec![
            text(&self.id),
            text(&self.barcode),
            Value::Real(self.weight_tons),
            opt_real(self.thickness_mm),
            opt_real(self.width_mm),
            opt_real(self.diameter_mm),
            opt_text(self.coil_type.as_deref()),
            text(self.status.as_str()),
            opt_text(self.current_stacking_position_id.as_deref()),
            opt_text(self.storage_location.as_deref()),
            datetime(self.received_date),
            datetime(self.last_moved_date),
            opt_text(self.priority.map(priority_to_str)),
        ])
    }
}
