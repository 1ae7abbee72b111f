// ==========================================
// 钢卷库区管理系统 - 盘点对账
// ==========================================
// 职责: 盘点快照与系统状态比对 + 暂存/提交/取消对账变更
// 输入: StockTake + Coil + StackingPosition
// 输出: ReconciliationDiff / CommitReport
// ==========================================

mod diff;
mod session;

#[cfg(test)]
mod tests;

pub use diff::{
    diff_stock_take, Confirmed, Misplaced, ReconcileReason, ReconciliationDiff, ToPlace, ToUnplace,
};
pub use session::{
    ChangeOutcome, ChangeResult, CommitReport, PendingChange, ReconciliationSession,
    RECONCILIATION_REASON,
};
