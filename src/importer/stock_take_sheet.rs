// ==========================================
// 钢卷库区管理系统 - 盘点表导入
// ==========================================
// 列: coil_barcode / placeholder_id / description(可选)
// 行规则:
// - 有钢卷号 → 盘到钢卷 (复合条码取钢卷号)
// - 无钢卷号、有描述 → 无法追溯钢卷
// - 两者皆无 → 空库位
// 单行录入失败不中断,记入 skipped
// ==========================================

use crate::engine::stock_take::StockTakeBuilder;
use crate::importer::barcode::coil_id_from_barcode;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

const BARCODE_COLUMNS: &[&str] = &["coil_barcode", "barcode", "钢卷号"];
const PLACEHOLDER_COLUMNS: &[&str] = &["placeholder_id", "position", "库位号"];
const DESCRIPTION_COLUMNS: &[&str] = &["description", "描述"];

/// 被跳过的行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row: usize, // 数据行号 (从 1 开始,不含表头)
    pub message: String,
}

/// 导入汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetImportSummary {
    pub found: usize,
    pub non_traceable: usize,
    pub empty: usize,
    pub skipped: Vec<RowIssue>,
}

fn column<'r>(record: &'r RawRecord, names: &[&str]) -> Option<&'r str> {
    names
        .iter()
        .find_map(|n| record.get(*n))
        .map(|v| v.as_str())
        .filter(|v| !v.is_empty())
}

/// 盘点表导入器
pub struct StockTakeSheetImporter;

impl StockTakeSheetImporter {
    /// 从文件导入到盘点录入
    pub fn import_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        builder: &mut StockTakeBuilder,
    ) -> ImportResult<SheetImportSummary> {
        let records = UniversalFileParser.parse(file_path.as_ref())?;
        let summary = self.apply_records(&records, builder)?;
        info!(
            file = %file_path.as_ref().display(),
            found = summary.found,
            non_traceable = summary.non_traceable,
            empty = summary.empty,
            skipped = summary.skipped.len(),
            "盘点表导入完成"
        );
        Ok(summary)
    }

    /// 将行记录写入盘点录入
    ///
    /// # 错误
    /// - MissingColumn: 首行缺少库位号列
    pub fn apply_records(
        &self,
        records: &[RawRecord],
        builder: &mut StockTakeBuilder,
    ) -> ImportResult<SheetImportSummary> {
        if let Some(first) = records.first() {
            if !PLACEHOLDER_COLUMNS.iter().any(|c| first.contains_key(*c)) {
                return Err(ImportError::MissingColumn("placeholder_id"));
            }
        }

        let mut summary = SheetImportSummary::default();
        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let Some(placeholder) = column(record, PLACEHOLDER_COLUMNS) else {
                summary.skipped.push(RowIssue {
                    row,
                    message: "库位号为空".to_string(),
                });
                continue;
            };

            let barcode = column(record, BARCODE_COLUMNS).and_then(coil_id_from_barcode);
            let description = column(record, DESCRIPTION_COLUMNS);

            let result = match (barcode, description) {
                (Some(barcode), _) => builder
                    .record_found(&barcode, placeholder)
                    .map(|_| summary.found += 1),
                (None, Some(description)) => builder
                    .record_non_traceable(None, description, placeholder)
                    .map(|_| summary.non_traceable += 1),
                (None, None) => builder
                    .mark_empty(placeholder)
                    .map(|_| summary.empty += 1),
            };

            if let Err(e) = result {
                warn!(row, placeholder_id = %placeholder, error = %e, "盘点表行被跳过");
                summary.skipped.push(RowIssue {
                    row,
                    message: e.to_string(),
                });
            }
        }

        Ok(summary)
    }
}
