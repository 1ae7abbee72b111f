// ==========================================
// 钢卷库区管理系统 - 盘点录入
// ==========================================
// 职责: 记录盘到的钢卷、无法追溯的钢卷与确认为空的库位,
//       完成时计算系统数/实盘数/差异
// 规则:
// - 已有盘到记录的库位不能标记为空; 已标记为空的库位不能再记录钢卷
// - 系统数 = 范围内已占用库位数
// - 实盘数 = 盘到钢卷数 + 无法追溯钢卷数
// - 差异 = 实盘数 - 系统数
// ==========================================

use crate::domain::{FoundCoil, NonTraceableCoil, StackingPosition, StockTake, StockTakeStatus};
use chrono::{NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockTakeError {
    #[error("钢卷号不能为空")]
    EmptyBarcode,

    #[error("钢卷 {0} 已记录")]
    DuplicateObservation(String),

    #[error("库位 {0} 已有盘到记录,不能标记为空")]
    PlaceholderHasObservation(String),

    #[error("库位 {0} 已标记为空")]
    AlreadyMarkedEmpty(String),

    #[error("库位 {0} 已标记为空,不能记录钢卷")]
    PlaceholderMarkedEmpty(String),
}

/// 盘点范围内的库位: 同跨、同区(若指定)、启用且可见
pub fn positions_in_scope<'a>(
    positions: &'a [StackingPosition],
    bay: &str,
    zone: Option<&str>,
) -> Vec<&'a StackingPosition> {
    positions.iter().filter(|p| p.in_scope(bay, zone)).collect()
}

// ==========================================
// StockTakeBuilder - 盘点录入
// ==========================================
#[derive(Debug, Clone)]
pub struct StockTakeBuilder {
    bay: String,
    zone: Option<String>,
    stock_take_date: NaiveDateTime,
    coils_found: Vec<FoundCoil>,
    non_traceable: Vec<NonTraceableCoil>,
    empty_placeholders: Vec<String>,
    remarks: Option<String>,
}

impl StockTakeBuilder {
    pub fn new(bay: &str, zone: Option<&str>) -> Self {
        Self {
            bay: bay.to_string(),
            zone: zone.map(|z| z.to_string()),
            stock_take_date: Utc::now().naive_utc(),
            coils_found: Vec::new(),
            non_traceable: Vec::new(),
            empty_placeholders: Vec::new(),
            remarks: None,
        }
    }

    pub fn at(mut self, stock_take_date: NaiveDateTime) -> Self {
        self.stock_take_date = stock_take_date;
        self
    }

    pub fn remarks(mut self, remarks: &str) -> Self {
        self.remarks = Some(remarks.to_string()).filter(|r| !r.trim().is_empty());
        self
    }

    fn has_observation(&self, placeholder_id: &str) -> bool {
        self.coils_found
            .iter()
            .any(|f| f.found_at_placeholder_id == placeholder_id)
            || self
                .non_traceable
                .iter()
                .any(|n| n.found_at_placeholder_id == placeholder_id)
    }

    fn ensure_not_empty_marked(&self, placeholder_id: &str) -> Result<(), StockTakeError> {
        if self.empty_placeholders.iter().any(|p| p == placeholder_id) {
            return Err(StockTakeError::PlaceholderMarkedEmpty(placeholder_id.to_string()));
        }
        Ok(())
    }

    /// 记录盘到的钢卷
    pub fn record_found(
        &mut self,
        coil_barcode: &str,
        placeholder_id: &str,
    ) -> Result<(), StockTakeError> {
        let barcode = coil_barcode.trim();
        if barcode.is_empty() {
            return Err(StockTakeError::EmptyBarcode);
        }
        if self.coils_found.iter().any(|f| f.coil_barcode == barcode) {
            return Err(StockTakeError::DuplicateObservation(barcode.to_string()));
        }
        self.ensure_not_empty_marked(placeholder_id)?;

        self.coils_found.push(FoundCoil {
            coil_barcode: barcode.to_string(),
            found_at_placeholder_id: placeholder_id.to_string(),
        });
        Ok(())
    }

    /// 记录无法追溯的钢卷
    pub fn record_non_traceable(
        &mut self,
        barcode: Option<&str>,
        description: &str,
        placeholder_id: &str,
    ) -> Result<(), StockTakeError> {
        self.ensure_not_empty_marked(placeholder_id)?;
        self.non_traceable.push(NonTraceableCoil {
            barcode: barcode
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            description: description.to_string(),
            found_at_placeholder_id: placeholder_id.to_string(),
        });
        Ok(())
    }

    /// 标记库位为空
    pub fn mark_empty(&mut self, placeholder_id: &str) -> Result<(), StockTakeError> {
        if self.has_observation(placeholder_id) {
            return Err(StockTakeError::PlaceholderHasObservation(placeholder_id.to_string()));
        }
        if self.empty_placeholders.iter().any(|p| p == placeholder_id) {
            return Err(StockTakeError::AlreadyMarkedEmpty(placeholder_id.to_string()));
        }
        self.empty_placeholders.push(placeholder_id.to_string());
        Ok(())
    }

    /// 取消空库位标记
    pub fn unmark_empty(&mut self, placeholder_id: &str) -> bool {
        let before = self.empty_placeholders.len();
        self.empty_placeholders.retain(|p| p != placeholder_id);
        self.empty_placeholders.len() != before
    }

    /// 完成盘点（状态 completed）
    ///
    /// # 参数
    /// - positions: 当前全部库位,用于计算系统数
    pub fn complete(self, positions: &[StackingPosition]) -> StockTake {
        let system_count = positions_in_scope(positions, &self.bay, self.zone.as_deref())
            .iter()
            .filter(|p| p.is_occupied())
            .count() as i64;
        let physical_count = (self.coils_found.len() + self.non_traceable.len()) as i64;
        let location = match &self.zone {
            Some(zone) => format!("Bay {} - Zone {}", self.bay, zone),
            None => format!("Bay {}", self.bay),
        };

        StockTake {
            id: String::new(),
            stock_take_date: self.stock_take_date,
            location,
            bay: self.bay,
            zone: self.zone,
            physical_count,
            system_count,
            variance: physical_count - system_count,
            coils_found: self.coils_found,
            non_traceable_coils: self.non_traceable,
            empty_placeholders: self.empty_placeholders,
            remarks: self.remarks,
            status: StockTakeStatus::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(placeholder: &str, bay: &str, coil: Option<&str>) -> StackingPosition {
        let mut p = StackingPosition::ground(placeholder, "loc", bay, "Z1");
        p.coil_barcode = coil.map(|c| c.to_string());
        p
    }

    #[test]
    fn test_counts_and_variance() {
        let positions = vec![
            position("A-01-L1", "A", Some("C1")),
            position("A-02-L1", "A", Some("C2")),
            position("A-03-L1", "A", None),
            position("B-01-L1", "B", Some("C9")),
        ];

        let mut builder = StockTakeBuilder::new("A", Some("Z1"));
        builder.record_found("C1", "A-01-L1").unwrap();
        builder
            .record_non_traceable(None, "rusty coil, no tag", "A-03-L1")
            .unwrap();
        builder.mark_empty("A-02-L1").unwrap();

        let st = builder.complete(&positions);
        assert_eq!(st.system_count, 2);
        assert_eq!(st.physical_count, 2);
        assert_eq!(st.variance, 0);
        assert_eq!(st.status, StockTakeStatus::Completed);
        assert_eq!(st.location, "Bay A - Zone Z1");
    }

    #[test]
    fn test_empty_mark_rules() {
        let mut builder = StockTakeBuilder::new("A", None);
        builder.record_found("C1", "A-01-L1").unwrap();

        assert_eq!(
            builder.mark_empty("A-01-L1"),
            Err(StockTakeError::PlaceholderHasObservation("A-01-L1".to_string()))
        );
        builder.mark_empty("A-02-L1").unwrap();
        assert_eq!(
            builder.mark_empty("A-02-L1"),
            Err(StockTakeError::AlreadyMarkedEmpty("A-02-L1".to_string()))
        );
        assert_eq!(
            builder.record_found("C2", "A-02-L1"),
            Err(StockTakeError::PlaceholderMarkedEmpty("A-02-L1".to_string()))
        );

        assert!(builder.unmark_empty("A-02-L1"));
        builder.record_found("C2", "A-02-L1").unwrap();
    }

    #[test]
    fn test_duplicate_and_blank_barcodes() {
        let mut builder = StockTakeBuilder::new("A", None);
        builder.record_found(" C1 ", "A-01-L1").unwrap();
        assert_eq!(
            builder.record_found("C1", "A-02-L1"),
            Err(StockTakeError::DuplicateObservation("C1".to_string()))
        );
        assert_eq!(builder.record_found("  ", "A-02-L1"), Err(StockTakeError::EmptyBarcode));
    }
}
