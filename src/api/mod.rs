// ==========================================
// 钢卷库区管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供界面层调用
// ==========================================

pub mod error;
pub mod yard_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use yard_api::{StockTakeImportResponse, YardApi};
