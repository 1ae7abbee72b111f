// ==========================================
// 钢卷库区管理系统 - 分配操作引擎
// ==========================================
// 职责: 放入/移出/倒垛/待发/装车
// 红线: 钢卷 ↔ 库位双向引用只允许经由本模块写入
// 红线: 所有前置条件在第一次写入前校验完毕
// 红线: 第一次写入之后的失败一律上报 InconsistentState,不自动重试
// ==========================================
// 写入顺序: 库位 → 钢卷 → 移动记录
// ==========================================

mod core;


pub use core::{AllocationOutcome, AllocationService, DEFAULT_ACTOR};
