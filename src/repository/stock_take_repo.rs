// ==========================================
// 钢卷库区管理系统 - 盘点单数据仓储
// ==========================================
// 对齐: stock_take 表
// 说明: 盘点明细 (发现钢卷/不可追溯钢卷/空库位) 以 JSON 存储
// ==========================================

use crate::domain::stock_take::StockTake;
use crate::domain::types::StockTakeStatus;
use crate::repository::error::RepositoryResult;
use crate::repository::sqlite_store::{
    conversion_error, json, opt_text, parse_json, text, SqliteEntity, SqliteStore,
    DATETIME_FORMAT,
};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::Row;

/// 盘点单仓储
pub type StockTakeRepository = SqliteStore<StockTake>;

fn parse_status(idx: usize, raw: &str) -> rusqlite::Result<StockTakeStatus> {
    match raw {
        "completed" => Ok(StockTakeStatus::Completed),
        "reconciled" => Ok(StockTakeStatus::Reconciled),
        other => Err(conversion_error(idx, format!("未知盘点状态: {}", other))),
    }
}

impl SqliteEntity for StockTake {
    const TABLE: &'static str = "stock_take";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "stock_take_date",
        "location",
        "bay",
        "zone",
        "physical_count",
        "system_count",
        "variance",
        "coils_found_json",
        "non_traceable_coils_json",
        "empty_placeholders_json",
        "remarks",
        "status",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let date: String = row.get(1)?;
        let stock_take_date = NaiveDateTime::parse_from_str(&date, DATETIME_FORMAT)
            .map_err(|e| conversion_error(1, e.to_string()))?;
        let status: String = row.get(12)?;

        Ok(StockTake {
            id: row.get(0)?,
            stock_take_date,
            location: row.get(2)?,
            bay: row.get(3)?,
            zone: row.get(4)?,
            physical_count: row.get(5)?,
            system_count: row.get(6)?,
            variance: row.get(7)?,
            coils_found: parse_json(8, row.get(8)?)?,
            non_traceable_coils: parse_json(9, row.get(9)?)?,
            empty_placeholders: parse_json(10, row.get(10)?)?,
            remarks: row.get(11)?,
            status: parse_status(12, &status)?,
        })
    }

    fn to_values(&self) -> RepositoryResult<Vec<Value>> {
        Ok(vec![
            text(&self.id),
            text(&self.stock_take_date.format(DATETIME_FORMAT).to_string()),
            text(&self.location),
            text(&self.bay),
            opt_text(self.zone.as_deref()),
            Value::Integer(self.physical_count),
            Value::Integer(self.system_count),
            Value::Integer(self.variance),
            json(&self.coils_found)?,
            json(&self.non_traceable_coils)?,
            json(&self.empty_placeholders)?,
            opt_text(self.remarks.as_deref()),
            text(self.status.as_str()),
        ])
    }
}
