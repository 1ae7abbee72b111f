// ==========================================
// 钢卷库区管理系统 - 占用统计
// ==========================================
// 职责: 按地面库位/层汇总占用情况,查找钢卷,列出可放库位
// ==========================================

use crate::domain::StackingPosition;
use crate::engine::graph::PositionGraph;
use crate::engine::validator::can_occupy;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyState {
    Empty,
    Partial,
    Full,
}

impl OccupancyState {
    fn of(occupied: usize, total: usize) -> Self {
        if occupied == 0 {
            OccupancyState::Empty
        } else if occupied >= total {
            OccupancyState::Full
        } else {
            OccupancyState::Partial
        }
    }
}

/// 单个地面库位的占用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationOccupancy {
    pub location_id: String,
    pub location_code: String,
    pub occupied: usize,
    pub total: usize,
    pub state: OccupancyState,
}

/// 单层的占用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerOccupancy {
    pub layer: u8,
    pub occupied: usize,
    pub total: usize,
}

/// 按主地面库位汇总（仅统计启用的库位,按库位编码排序）
pub fn location_occupancy(graph: &PositionGraph) -> Vec<LocationOccupancy> {
    let mut by_location: BTreeMap<String, LocationOccupancy> = BTreeMap::new();

    for node in graph.nodes().filter(|n| n.position.is_active) {
        let position = &node.position;
        let code = node
            .primary_location
            .as_ref()
            .map(|l| l.location_code.clone())
            .or_else(|| position.primary_ground_location_code.clone())
            .unwrap_or_else(|| position.primary_ground_location_id.clone());

        let entry = by_location
            .entry(code.clone())
            .or_insert_with(|| LocationOccupancy {
                location_id: position.primary_ground_location_id.clone(),
                location_code: code,
                occupied: 0,
                total: 0,
                state: OccupancyState::Empty,
            });
        entry.total += 1;
        if position.is_occupied() {
            entry.occupied += 1;
        }
    }

    by_location
        .into_values()
        .map(|mut l| {
            l.state = OccupancyState::of(l.occupied, l.total);
            l
        })
        .collect()
}

/// 按层汇总
pub fn layer_occupancy(graph: &PositionGraph) -> Vec<LayerOccupancy> {
    let mut by_layer: BTreeMap<u8, (usize, usize)> = BTreeMap::new();
    for node in graph.nodes().filter(|n| n.position.is_active) {
        let entry = by_layer.entry(node.layer()).or_insert((0, 0));
        entry.1 += 1;
        if node.position.is_occupied() {
            entry.0 += 1;
        }
    }
    by_layer
        .into_iter()
        .map(|(layer, (occupied, total))| LayerOccupancy {
            layer,
            occupied,
            total,
        })
        .collect()
}

/// 查找存放某钢卷的库位
pub fn find_coil<'g>(graph: &'g PositionGraph, coil_barcode: &str) -> Option<&'g StackingPosition> {
    graph.holding(coil_barcode).map(|n| &n.position)
}

/// 可放入的库位: 启用、可见、为空且下层承托已满
pub fn available_positions(graph: &PositionGraph) -> Vec<&StackingPosition> {
    graph
        .nodes()
        .map(|n| &n.position)
        .filter(|p| p.is_active && p.is_visible && !p.is_occupied())
        .filter(|p| can_occupy(p, graph).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroundLocation;

    fn fixture() -> PositionGraph {
        let mut l1 = GroundLocation::new("A-01", "A", "Z1", 50.0);
        l1.id = "l1".to_string();
        let mut l2 = GroundLocation::new("A-02", "A", "Z1", 50.0);
        l2.id = "l2".to_string();

        let mut g1 = StackingPosition::ground("A-01-L1", "l1", "A", "Z1");
        g1.id = "g1".to_string();
        g1.coil_barcode = Some("C1".to_string());
        let mut g2 = StackingPosition::ground("A-02-L1", "l2", "A", "Z1");
        g2.id = "g2".to_string();
        let mut b = StackingPosition::bridging("A-01-L2-B", 2, "l1", &["l1", "l2"], "A", "Z1");
        b.id = "b".to_string();

        PositionGraph::build(&[g1, g2, b], &[l1, l2])
    }

    #[test]
    fn test_location_and_layer_summaries() {
        let graph = fixture();
        let locations = location_occupancy(&graph);
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].location_code, "A-01");
        assert_eq!(locations[0].total, 2);
        assert_eq!(locations[0].state, OccupancyState::Partial);
        assert_eq!(locations[1].state, OccupancyState::Empty);

        let layers = layer_occupancy(&graph);
        assert_eq!(layers[0], LayerOccupancy { layer: 1, occupied: 1, total: 2 });
        assert_eq!(layers[1], LayerOccupancy { layer: 2, occupied: 0, total: 1 });
    }

    #[test]
    fn test_find_and_available() {
        let graph = fixture();
        assert_eq!(find_coil(&graph, "C1").map(|p| p.id.as_str()), Some("g1"));
        assert!(find_coil(&graph, "C2").is_none());

        // 二层库位下层未满,不可放
        let available: Vec<&str> = available_positions(&graph)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(available, vec!["g2"]);
    }
}
