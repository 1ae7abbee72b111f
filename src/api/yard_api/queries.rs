use super::*;

impl YardApi {
    // ==========================================
    // 库位图与层级校验
    // ==========================================

    /// 构建库位承托图
    ///
    /// # 参数
    /// - scope: 可选的跨/区过滤,None 为全库区
    pub fn position_graph(&self, scope: Option<&GraphScope>) -> ApiResult<PositionGraph> {
        let positions = self.repos.positions.list()?;
        let locations = self.repos.locations.list()?;
        Ok(build_position_graph(&positions, &locations, scope))
    }

    fn graph_with_position(&self, position_id: &str) -> ApiResult<(PositionGraph, StackingPosition)> {
        require_text(position_id, "库位ID")?;
        let graph = self.position_graph(None)?;
        let position = graph
            .position(position_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("StackingPosition", position_id))?;
        Ok((graph, position))
    }

    /// 库位当前能否放入钢卷（不含占用检查）
    ///
    /// # 返回
    /// - Ok(Ok(())): 下层承托完整
    /// - Ok(Err(LayerViolation)): 不可放入及原因
    pub fn can_occupy(&self, position_id: &str) -> ApiResult<LayerCheck> {
        let (graph, position) = self.graph_with_position(position_id)?;
        Ok(validator::can_occupy(&position, &graph))
    }

    /// 库位当前能否移出钢卷
    pub fn can_vacate(&self, position_id: &str) -> ApiResult<LayerCheck> {
        let (graph, position) = self.graph_with_position(position_id)?;
        Ok(validator::can_vacate(&position, &graph))
    }

    // ==========================================
    // 占用与查询
    // ==========================================

    pub fn location_occupancy(&self, scope: Option<&GraphScope>) -> ApiResult<Vec<LocationOccupancy>> {
        Ok(occupancy::location_occupancy(&self.position_graph(scope)?))
    }

    pub fn layer_occupancy(&self, scope: Option<&GraphScope>) -> ApiResult<Vec<LayerOccupancy>> {
        Ok(occupancy::layer_occupancy(&self.position_graph(scope)?))
    }

    /// 可放入的空库位（启用、可见、承托完整）
    pub fn available_positions(&self, scope: Option<&GraphScope>) -> ApiResult<Vec<StackingPosition>> {
        let graph = self.position_graph(scope)?;
        Ok(occupancy::available_positions(&graph)
            .into_iter()
            .cloned()
            .collect())
    }

    /// 查找存放某钢卷的库位
    pub fn locate_coil(&self, coil_barcode: &str) -> ApiResult<Option<StackingPosition>> {
        require_text(coil_barcode, "钢卷号")?;
        let graph = self.position_graph(None)?;
        Ok(occupancy::find_coil(&graph, coil_barcode).cloned())
    }

    /// 钢卷移动历史（按时间升序）
    pub fn coil_movements(&self, coil_barcode: &str) -> ApiResult<Vec<CoilMovement>> {
        require_text(coil_barcode, "钢卷号")?;
        let barcode = coil_barcode.to_string();
        let mut movements = self
            .repos
            .movements
            .filter(&|m: &CoilMovement| m.coil_barcode == barcode)?;
        movements.sort_by(|a, b| a.movement_date.cmp(&b.movement_date));
        Ok(movements)
    }

    /// 倒垛候选（按评分降序）
    pub fn shuffle_candidates(&self, now: NaiveDateTime) -> ApiResult<Vec<ShuffleCandidate>> {
        let coils = self.repos.coils.list()?;
        Ok(rank_shuffle_candidates(&coils, now, &self.config))
    }
}
