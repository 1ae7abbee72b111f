use super::*;

impl YardApi {
    // ==========================================
    // 分配操作接口
    // ==========================================

    /// 放入: 未分配钢卷 → 空库位
    ///
    /// # 返回
    /// - Ok(AllocationOutcome): 新状态与移动记录
    /// - Err(ApiError::Allocation): 前置条件不满足 / 写入失败
    pub fn assign(&self, coil_barcode: &str, position_id: &str) -> ApiResult<AllocationOutcome> {
        require_text(coil_barcode, "钢卷号")?;
        require_text(position_id, "库位ID")?;
        Ok(self.allocation.assign(coil_barcode, position_id)?)
    }

    /// 移出（直接移出,钢卷回到 incoming）
    pub fn remove(&self, position_id: &str) -> ApiResult<AllocationOutcome> {
        self.remove_with(position_id, RemovalKind::Direct)
    }

    /// 按指定类型移出
    pub fn remove_with(&self, position_id: &str, kind: RemovalKind) -> ApiResult<AllocationOutcome> {
        require_text(position_id, "库位ID")?;
        Ok(self.allocation.remove_with(position_id, kind)?)
    }

    /// 倒垛
    ///
    /// # 参数
    /// - reason: 倒垛原因（必填,写入移动记录）
    /// - remarks: 备注
    pub fn shuffle(
        &self,
        coil_barcode: &str,
        new_position_id: &str,
        reason: &str,
        remarks: Option<&str>,
    ) -> ApiResult<AllocationOutcome> {
        require_text(coil_barcode, "钢卷号")?;
        require_text(new_position_id, "目标库位ID")?;
        require_text(reason, "倒垛原因")?;
        Ok(self
            .allocation
            .shuffle(coil_barcode, new_position_id, reason, remarks)?)
    }

    /// 标记待发（不离开库位）
    pub fn mark_outgoing(&self, coil_barcode: &str) -> ApiResult<AllocationOutcome> {
        require_text(coil_barcode, "钢卷号")?;
        Ok(self.allocation.mark_outgoing(coil_barcode)?)
    }

    /// 装车发运
    pub fn dispatch(&self, coil_barcode: &str, vehicle: &str) -> ApiResult<AllocationOutcome> {
        require_text(coil_barcode, "钢卷号")?;
        require_text(vehicle, "车牌号")?;
        Ok(self.allocation.dispatch(coil_barcode, vehicle)?)
    }
}
