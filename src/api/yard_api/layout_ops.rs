use super::*;

impl YardApi {
    // ==========================================
    // 库区布局接口
    // ==========================================

    /// 批量生成地面库位
    pub fn create_ground_locations(&self, spec: &LocationGridSpec) -> ApiResult<Vec<GroundLocation>> {
        require_text(&spec.bay, "跨")?;
        require_text(&spec.zone, "区")?;
        Ok(self.layout.create_ground_locations(spec)?)
    }

    /// 创建堆垛库位（校验层号、类型、承托）
    pub fn create_position(&self, position: StackingPosition) -> ApiResult<StackingPosition> {
        require_text(&position.placeholder_id, "库位号")?;
        Ok(self.layout.create_position(position)?)
    }

    /// 删除堆垛库位（占用中拒绝）
    pub fn delete_position(&self, position_id: &str) -> ApiResult<()> {
        require_text(position_id, "库位ID")?;
        Ok(self.layout.delete_position(position_id)?)
    }

    /// 某地面库位的承托候选（含自身）
    pub fn support_candidates(&self, location_id: &str) -> ApiResult<Vec<GroundLocation>> {
        require_text(location_id, "地面库位ID")?;
        let locations = self.repos.locations.list()?;
        let primary = locations
            .iter()
            .find(|l| l.id == location_id)
            .ok_or_else(|| ApiError::not_found("GroundLocation", location_id))?;
        Ok(
            layout::support_candidates(primary, &locations, self.config.support_search_radius)
                .into_iter()
                .cloned()
                .collect(),
        )
    }
}
