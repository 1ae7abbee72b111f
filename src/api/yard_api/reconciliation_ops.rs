use super::*;
use std::sync::MutexGuard;

/// 盘点表导入响应
#[derive(Debug, Clone, Serialize)]
pub struct StockTakeImportResponse {
    pub stock_take: StockTake,
    pub summary: SheetImportSummary,
}

impl YardApi {
    fn lock_sessions(&self) -> ApiResult<MutexGuard<'_, HashMap<String, ReconciliationSession>>> {
        self.sessions
            .lock()
            .map_err(|e| ApiError::InternalError(format!("对账会话锁获取失败: {}", e)))
    }

    // ==========================================
    // 盘点录入
    // ==========================================

    /// 完成盘点录入并保存（计算系统数/实盘数/差异）
    pub fn save_stock_take(&self, builder: StockTakeBuilder) -> ApiResult<StockTake> {
        let positions = self.repos.positions.list()?;
        let stock_take = self.repos.stock_takes.create(builder.complete(&positions))?;
        info!(
            stock_take_id = %stock_take.id,
            location = %stock_take.location,
            variance = stock_take.variance,
            "盘点单已保存"
        );
        Ok(stock_take)
    }

    /// 从盘点表文件导入并保存盘点单
    ///
    /// # 参数
    /// - file_path: CSV / Excel 文件
    /// - bay / zone: 盘点范围
    pub fn import_stock_take<P: AsRef<Path>>(
        &self,
        file_path: P,
        bay: &str,
        zone: Option<&str>,
        remarks: Option<&str>,
    ) -> ApiResult<StockTakeImportResponse> {
        require_text(bay, "跨")?;
        let mut builder = StockTakeBuilder::new(bay, zone);
        if let Some(remarks) = remarks {
            builder = builder.remarks(remarks);
        }
        let summary = StockTakeSheetImporter.import_file(file_path, &mut builder)?;
        let stock_take = self.save_stock_take(builder)?;
        Ok(StockTakeImportResponse {
            stock_take,
            summary,
        })
    }

    pub fn list_stock_takes(&self) -> ApiResult<Vec<StockTake>> {
        let mut stock_takes = self.repos.stock_takes.list()?;
        stock_takes.sort_by(|a, b| b.stock_take_date.cmp(&a.stock_take_date));
        Ok(stock_takes)
    }

    // ==========================================
    // 差异计算与对账会话
    // ==========================================

    /// 计算盘点单与当前系统状态的差异（只读）
    pub fn diff_stock_take(&self, stock_take_id: &str) -> ApiResult<ReconciliationDiff> {
        require_text(stock_take_id, "盘点单ID")?;
        let stock_take = self
            .repos
            .stock_takes
            .get(stock_take_id)?
            .ok_or_else(|| ReconcileError::StockTakeNotFound(stock_take_id.to_string()))?;
        let coils = self.repos.coils.list()?;
        let positions = self.repos.positions.list()?;
        Ok(diff_stock_take(&stock_take, &coils, &positions))
    }

    /// 打开对账会话并返回当前差异（已打开则沿用原会话）
    pub fn open_reconciliation(&self, stock_take_id: &str) -> ApiResult<ReconciliationDiff> {
        require_text(stock_take_id, "盘点单ID")?;
        let mut sessions = self.lock_sessions()?;
        if !sessions.contains_key(stock_take_id) {
            let session = ReconciliationSession::load(&self.repos, stock_take_id)?;
            sessions.insert(stock_take_id.to_string(), session);
        }
        match sessions.get(stock_take_id) {
            Some(session) => Ok(session.diff(&self.repos)?),
            None => Err(ApiError::InternalError(format!(
                "对账会话丢失: {}",
                stock_take_id
            ))),
        }
    }

    fn with_session<T>(
        &self,
        stock_take_id: &str,
        f: impl FnOnce(&mut ReconciliationSession) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(stock_take_id)
            .ok_or_else(|| ApiError::not_found("ReconciliationSession", stock_take_id))?;
        f(session)
    }

    /// 暂存一条对账变更,返回其序号
    pub fn stage_pending_change(&self, stock_take_id: &str, change: PendingChange) -> ApiResult<usize> {
        self.with_session(stock_take_id, |session| Ok(session.stage(change)?))
    }

    /// 撤销一条暂存变更
    pub fn unstage_pending_change(
        &self,
        stock_take_id: &str,
        index: usize,
    ) -> ApiResult<Option<PendingChange>> {
        self.with_session(stock_take_id, |session| Ok(session.unstage(index)))
    }

    pub fn pending_changes(&self, stock_take_id: &str) -> ApiResult<Vec<PendingChange>> {
        self.with_session(stock_take_id, |session| Ok(session.pending().to_vec()))
    }

    /// 按配置的提交策略提交暂存变更
    ///
    /// # 返回
    /// - Ok(CommitReport): 逐条结果; 严格模式预演失败时 dry_run_rejected = true,会话保留
    ///
    /// # 说明
    /// - 变更已执行后会话即关闭（含盘点单状态写入失败的情况）
    pub fn commit_reconciliation(&self, stock_take_id: &str) -> ApiResult<CommitReport> {
        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(stock_take_id)
            .ok_or_else(|| ApiError::not_found("ReconciliationSession", stock_take_id))?;

        match session.commit(&self.allocation, self.config.commit_policy) {
            Ok(report) => {
                if !report.dry_run_rejected {
                    sessions.remove(stock_take_id);
                }
                Ok(report)
            }
            Err(e @ ReconcileError::StatusUpdate { .. })
            | Err(e @ ReconcileError::AlreadyReconciled(_)) => {
                sessions.remove(stock_take_id);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 放弃对账: 丢弃全部暂存变更并关闭会话（不写存储）
    pub fn cancel_reconciliation(&self, stock_take_id: &str) -> ApiResult<()> {
        let mut sessions = self.lock_sessions()?;
        match sessions.remove(stock_take_id) {
            Some(mut session) => {
                session.cancel();
                Ok(())
            }
            None => {
                warn!(stock_take_id = %stock_take_id, "放弃对账: 会话不存在");
                Ok(())
            }
        }
    }
}
