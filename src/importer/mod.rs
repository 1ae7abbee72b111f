// ==========================================
// 钢卷库区管理系统 - 导入层
// ==========================================
// 职责: 条码解析、盘点表 (CSV/Excel) 导入
// 说明: 条码在进入引擎之前已解析为钢卷号
// ==========================================

pub mod barcode;
pub mod error;
pub mod file_parser;
pub mod stock_take_sheet;

pub use barcode::{coil_id_from_barcode, parse_complex_barcode, ParsedBarcode};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, RawRecord, SheetParser, UniversalFileParser};
pub use stock_take_sheet::{RowIssue, SheetImportSummary, StockTakeSheetImporter};
