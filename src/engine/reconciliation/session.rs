// ==========================================
// 钢卷库区管理系统 - 盘点对账会话
// ==========================================
// 职责: 暂存用户确认的变更,提交时按顺序经由分配操作执行
// 红线: 暂存/取消不产生任何存储写入
// 红线: 单条失败不回滚,结果逐条上报
// ==========================================

use crate::config::CommitPolicy;
use crate::domain::{
    Coil, CoilMovement, GroundLocation, RemovalKind, StackingPosition, StockTake, StockTakePatch,
    StockTakeStatus,
};
use crate::engine::allocation::{AllocationOutcome, AllocationService};
use crate::engine::error::{AllocationError, ReconcileError};
use crate::engine::repositories::YardRepositories;
use crate::engine::reconciliation::diff::{diff_stock_take, ReconciliationDiff};
use crate::repository::memory::MemoryStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 对账放入/倒垛的移动原因
pub const RECONCILIATION_REASON: &str = "Stock take reconciliation";

// ==========================================
// PendingChange - 待提交变更
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PendingChange {
    /// 放入盘到的库位（钢卷已在别处时执行倒垛）
    Assign {
        coil_barcode: String,
        target_position_id: String,
    },
    /// 解除分配（实物仍在库）
    Unassign {
        coil_barcode: String,
        position_id: String,
    },
    /// 标记丢失
    MarkMissing {
        coil_barcode: String,
        position_id: String,
    },
}

impl PendingChange {
    pub fn coil_barcode(&self) -> &str {
        match self {
            PendingChange::Assign { coil_barcode, .. }
            | PendingChange::Unassign { coil_barcode, .. }
            | PendingChange::MarkMissing { coil_barcode, .. } => coil_barcode,
        }
    }

    pub fn position_id(&self) -> &str {
        match self {
            PendingChange::Assign {
                target_position_id, ..
            } => target_position_id,
            PendingChange::Unassign { position_id, .. }
            | PendingChange::MarkMissing { position_id, .. } => position_id,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            PendingChange::Assign { .. } => "assign",
            PendingChange::Unassign { .. } => "unassign",
            PendingChange::MarkMissing { .. } => "mark_missing",
        }
    }

    fn validate(&self) -> Result<(), ReconcileError> {
        if self.coil_barcode().trim().is_empty() || self.position_id().trim().is_empty() {
            return Err(ReconcileError::InvalidChange(format!(
                "{}: 钢卷号与库位不能为空",
                self.action()
            )));
        }
        Ok(())
    }

    /// 经由分配操作执行
    fn apply(&self, service: &AllocationService) -> Result<AllocationOutcome, AllocationError> {
        match self {
            PendingChange::Assign {
                coil_barcode,
                target_position_id,
            } => service.place_for_reconciliation(
                coil_barcode,
                target_position_id,
                RECONCILIATION_REASON,
            ),
            PendingChange::Unassign {
                coil_barcode,
                position_id,
            } => service.remove_expecting(position_id, coil_barcode, RemovalKind::ReconcileUnassign),
            PendingChange::MarkMissing {
                coil_barcode,
                position_id,
            } => service.remove_expecting(position_id, coil_barcode, RemovalKind::MarkMissing),
        }
    }
}

// ==========================================
// CommitReport - 提交结果
// ==========================================
#[derive(Debug)]
pub enum ChangeOutcome {
    Applied(AllocationOutcome),
    Failed(AllocationError),
    /// 严格模式下因前序失败未执行
    Skipped,
}

#[derive(Debug)]
pub struct ChangeResult {
    pub change: PendingChange,
    pub outcome: ChangeOutcome,
}

impl ChangeResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ChangeOutcome::Applied(_))
    }

    pub fn error(&self) -> Option<&AllocationError> {
        match &self.outcome {
            ChangeOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CommitReport {
    pub stock_take_id: String,
    pub policy: CommitPolicy,
    pub results: Vec<ChangeResult>,
    /// 严格模式预演失败,未写入任何变更
    pub dry_run_rejected: bool,
    pub stock_take_status: StockTakeStatus,
}

impl CommitReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error().is_some()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ChangeOutcome::Skipped))
            .count()
    }

    /// 是否存在需人工对账的中途失败
    pub fn has_inconsistency(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.error().map_or(false, AllocationError::is_fatal))
    }
}

// ==========================================
// ReconciliationSession - 对账会话
// ==========================================
#[derive(Debug, Clone)]
pub struct ReconciliationSession {
    stock_take: StockTake,
    pending: Vec<PendingChange>,
}

impl ReconciliationSession {
    /// 打开对账会话（已对账的盘点单不可再打开）
    pub fn open(stock_take: StockTake) -> Result<Self, ReconcileError> {
        if stock_take.is_reconciled() {
            return Err(ReconcileError::AlreadyReconciled(stock_take.id));
        }
        Ok(Self {
            stock_take,
            pending: Vec::new(),
        })
    }

    /// 从存储加载盘点单并打开会话
    pub fn load(repos: &YardRepositories, stock_take_id: &str) -> Result<Self, ReconcileError> {
        let stock_take = repos
            .stock_takes
            .get(stock_take_id)?
            .ok_or_else(|| ReconcileError::StockTakeNotFound(stock_take_id.to_string()))?;
        Self::open(stock_take)
    }

    pub fn stock_take(&self) -> &StockTake {
        &self.stock_take
    }

    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    /// 以当前存储状态计算差异
    pub fn diff(&self, repos: &YardRepositories) -> Result<ReconciliationDiff, ReconcileError> {
        let coils = repos.coils.list()?;
        let positions = repos.positions.list()?;
        Ok(diff_stock_take(&self.stock_take, &coils, &positions))
    }

    /// 暂存变更,返回其序号（重复的同一变更只保留一份）
    pub fn stage(&mut self, change: PendingChange) -> Result<usize, ReconcileError> {
        change.validate()?;
        if let Some(idx) = self.pending.iter().position(|c| *c == change) {
            return Ok(idx);
        }
        self.pending.push(change);
        Ok(self.pending.len() - 1)
    }

    /// 撤销某条暂存变更
    pub fn unstage(&mut self, index: usize) -> Option<PendingChange> {
        if index < self.pending.len() {
            Some(self.pending.remove(index))
        } else {
            None
        }
    }

    /// 放弃全部暂存变更（不写存储）
    pub fn cancel(&mut self) {
        if !self.pending.is_empty() {
            info!(
                stock_take_id = %self.stock_take.id,
                discarded = self.pending.len(),
                "放弃暂存的对账变更"
            );
        }
        self.pending.clear();
    }

    /// 提交暂存变更
    ///
    /// # 策略
    /// - BestEffort: 逐条执行,全部尝试后置为已对账
    /// - Strict: 先在内存副本上预演,全部通过才实际执行;执行中遇失败即停止,盘点单保持 completed
    ///
    /// # 错误
    /// - NothingToCommit: 无暂存变更
    /// - AlreadyReconciled: 盘点单已被其他会话对账
    /// - StatusUpdate: 变更已执行但盘点单状态写入失败（报告随错误返回）
    #[instrument(skip(self, service), fields(stock_take_id = %self.stock_take.id, pending = self.pending.len()))]
    pub fn commit(
        &mut self,
        service: &AllocationService,
        policy: CommitPolicy,
    ) -> Result<CommitReport, ReconcileError> {
        if self.pending.is_empty() {
            return Err(ReconcileError::NothingToCommit);
        }

        let repos = service.repositories();
        let current = repos
            .stock_takes
            .get(&self.stock_take.id)?
            .ok_or_else(|| ReconcileError::StockTakeNotFound(self.stock_take.id.clone()))?;
        if current.is_reconciled() {
            return Err(ReconcileError::AlreadyReconciled(current.id));
        }

        if policy == CommitPolicy::Strict {
            let rehearsal = rehearse(repos, &self.pending)?;
            if rehearsal.iter().any(|r| !r.is_success()) {
                warn!(
                    stock_take_id = %self.stock_take.id,
                    "严格模式预演失败,未写入任何变更"
                );
                return Ok(CommitReport {
                    stock_take_id: self.stock_take.id.clone(),
                    policy,
                    results: rehearsal,
                    dry_run_rejected: true,
                    stock_take_status: current.status,
                });
            }
        }

        let results = apply_all(service, &self.pending, policy);
        let completed = policy == CommitPolicy::BestEffort || results.iter().all(ChangeResult::is_success);

        let mut report = CommitReport {
            stock_take_id: self.stock_take.id.clone(),
            policy,
            results,
            dry_run_rejected: false,
            stock_take_status: current.status,
        };

        if !completed {
            warn!(
                stock_take_id = %report.stock_take_id,
                succeeded = report.succeeded(),
                failed = report.failed(),
                skipped = report.skipped(),
                "严格模式提交中断,盘点单保持 completed"
            );
            return Ok(report);
        }

        if let Err(source) = repos.stock_takes.update(
            &self.stock_take.id,
            &StockTakePatch::status(StockTakeStatus::Reconciled),
        ) {
            error!(
                stock_take_id = %report.stock_take_id,
                error = %source,
                "变更已执行,盘点单状态更新失败"
            );
            return Err(ReconcileError::StatusUpdate {
                stock_take_id: report.stock_take_id.clone(),
                report: Box::new(report),
                source,
            });
        }

        report.stock_take_status = StockTakeStatus::Reconciled;
        self.stock_take.status = StockTakeStatus::Reconciled;
        self.pending.clear();

        info!(
            stock_take_id = %report.stock_take_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            inconsistent = report.has_inconsistency(),
            "盘点对账已提交"
        );
        Ok(report)
    }
}

/// 按顺序执行; 严格模式遇失败后其余标记为 Skipped
fn apply_all(
    service: &AllocationService,
    changes: &[PendingChange],
    policy: CommitPolicy,
) -> Vec<ChangeResult> {
    let mut results = Vec::with_capacity(changes.len());
    let mut halted = false;

    for change in changes {
        let outcome = if halted {
            ChangeOutcome::Skipped
        } else {
            match change.apply(service) {
                Ok(outcome) => ChangeOutcome::Applied(outcome),
                Err(e) => {
                    warn!(
                        action = change.action(),
                        coil_barcode = %change.coil_barcode(),
                        position_id = %change.position_id(),
                        code = e.code(),
                        "对账变更执行失败"
                    );
                    halted = policy == CommitPolicy::Strict;
                    ChangeOutcome::Failed(e)
                }
            }
        };
        results.push(ChangeResult {
            change: change.clone(),
            outcome,
        });
    }

    results
}

/// 在当前状态的内存副本上预演全部变更
fn rehearse(
    repos: &YardRepositories,
    changes: &[PendingChange],
) -> Result<Vec<ChangeResult>, ReconcileError> {
    let shadow = YardRepositories::new(
        Arc::new(MemoryStore::<Coil>::with_records(repos.coils.list()?)),
        Arc::new(MemoryStore::<StackingPosition>::with_records(repos.positions.list()?)),
        Arc::new(MemoryStore::<GroundLocation>::with_records(repos.locations.list()?)),
        Arc::new(MemoryStore::<CoilMovement>::new()),
        Arc::new(MemoryStore::<StockTake>::new()),
    );
    let service = AllocationService::new(shadow);
    Ok(apply_all(&service, changes, CommitPolicy::Strict))
}
