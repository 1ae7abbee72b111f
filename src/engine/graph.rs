// ==========================================
// 钢卷库区管理系统 - 库位承托图构建
// ==========================================
// 职责: 由地面库位 + 堆垛库位推导承托关系
// 输入: StackingPosition + GroundLocation (可按跨/区过滤)
// 输出: 每个库位的主库位/承托库位/下层承托库位集合,以及上层依赖反向索引
// 红线: 纯函数,不访问存储
// ==========================================

use crate::domain::{GroundLocation, StackingPosition};
use std::collections::HashMap;

/// 构图范围（跨 + 可选区）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphScope {
    pub bay: String,
    pub zone: Option<String>,
}

impl GraphScope {
    pub fn new(bay: &str, zone: Option<&str>) -> Self {
        Self {
            bay: bay.to_string(),
            zone: zone.map(|z| z.to_string()),
        }
    }

    fn contains_position(&self, position: &StackingPosition) -> bool {
        position.bay == self.bay
            && self
                .zone
                .as_deref()
                .map_or(true, |z| position.zone.as_deref() == Some(z))
    }

    fn contains_location(&self, location: &GroundLocation) -> bool {
        location.in_scope(&self.bay, self.zone.as_deref())
    }
}

// ==========================================
// PositionNode - 图节点
// ==========================================
#[derive(Debug, Clone)]
pub struct PositionNode {
    pub position: StackingPosition,
    /// 主地面库位（记录缺失时为 None）
    pub primary_location: Option<GroundLocation>,
    /// 承托地面库位（按 supported_by 顺序,仅含能解析到的记录）
    pub supporting_locations: Vec<GroundLocation>,
    /// 承托地面库位中找不到记录的 ID
    pub unresolved_location_ids: Vec<String>,
    /// 下一层承托库位 ID (layer > 1)
    pub supporting_positions: Vec<String>,
    /// 承托地面库位中没有下一层库位的 ID (layer > 1)
    pub unsupported_location_ids: Vec<String>,
    /// 正上方一层依赖本库位的库位 ID
    pub dependents: Vec<String>,
}

impl PositionNode {
    pub fn id(&self) -> &str {
        &self.position.id
    }

    pub fn layer(&self) -> u8 {
        self.position.layer
    }

    /// 承托结构是否完整
    pub fn is_structurally_supported(&self) -> bool {
        self.layer() <= 1
            || (!self.position.supported_by_ground_location_ids.is_empty()
                && self.unsupported_location_ids.is_empty())
    }
}

// ==========================================
// PositionGraph - 库位承托图
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PositionGraph {
    nodes: HashMap<String, PositionNode>,
    order: Vec<String>,
    by_placeholder: HashMap<String, String>,
    by_barcode: HashMap<String, String>,
}

impl PositionGraph {
    /// 构建全量承托图
    pub fn build(positions: &[StackingPosition], locations: &[GroundLocation]) -> Self {
        build_position_graph(positions, locations, None)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn node(&self, position_id: &str) -> Option<&PositionNode> {
        self.nodes.get(position_id)
    }

    pub fn position(&self, position_id: &str) -> Option<&StackingPosition> {
        self.nodes.get(position_id).map(|n| &n.position)
    }

    /// 按库位号查找
    pub fn by_placeholder(&self, placeholder_id: &str) -> Option<&PositionNode> {
        self.by_placeholder
            .get(placeholder_id)
            .and_then(|id| self.nodes.get(id))
    }

    /// 查找存放指定钢卷的库位
    pub fn holding(&self, coil_barcode: &str) -> Option<&PositionNode> {
        self.by_barcode
            .get(coil_barcode)
            .and_then(|id| self.nodes.get(id))
    }

    /// 按输入顺序遍历节点
    pub fn nodes(&self) -> impl Iterator<Item = &PositionNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// 某层的全部节点
    pub fn layer_nodes(&self, layer: u8) -> impl Iterator<Item = &PositionNode> {
        self.nodes().filter(move |n| n.layer() == layer)
    }

    /// 库位当前是否被占用
    pub fn is_occupied(&self, position_id: &str) -> bool {
        self.position(position_id)
            .map_or(false, StackingPosition::is_occupied)
    }
}

/// 构建库位承托图
///
/// # 参数
/// - positions: 堆垛库位
/// - locations: 地面库位
/// - scope: 可选的跨/区过滤
///
/// # 规则
/// - L(N) 库位 P 的下层承托 = 所有 L(N-1) 且主地面库位 ∈ P.supported_by 的库位
/// - 反向索引: Q 的 dependents = 所有以 Q 为下层承托的 L(N+1) 库位
pub fn build_position_graph(
    positions: &[StackingPosition],
    locations: &[GroundLocation],
    scope: Option<&GraphScope>,
) -> PositionGraph {
    let locations_by_id: HashMap<&str, &GroundLocation> = locations
        .iter()
        .filter(|l| scope.map_or(true, |s| s.contains_location(l)))
        .map(|l| (l.id.as_str(), l))
        .collect();

    let in_scope: Vec<&StackingPosition> = positions
        .iter()
        .filter(|p| scope.map_or(true, |s| s.contains_position(p)))
        .collect();

    // (layer, primary_location_id) → position ids
    let mut by_layer_and_primary: HashMap<(u8, &str), Vec<&str>> = HashMap::new();
    for position in &in_scope {
        by_layer_and_primary
            .entry((position.layer, position.primary_ground_location_id.as_str()))
            .or_default()
            .push(position.id.as_str());
    }

    let mut graph = PositionGraph::default();

    for position in &in_scope {
        let mut supporting_locations = Vec::new();
        let mut unresolved_location_ids = Vec::new();
        for loc_id in &position.supported_by_ground_location_ids {
            match locations_by_id.get(loc_id.as_str()) {
                Some(loc) => supporting_locations.push((*loc).clone()),
                None => unresolved_location_ids.push(loc_id.clone()),
            }
        }

        let mut supporting_positions = Vec::new();
        let mut unsupported_location_ids = Vec::new();
        if position.layer > 1 {
            for loc_id in &position.supported_by_ground_location_ids {
                match by_layer_and_primary.get(&(position.layer - 1, loc_id.as_str())) {
                    Some(ids) => {
                        for id in ids {
                            if !supporting_positions.iter().any(|s: &String| s == id) {
                                supporting_positions.push(id.to_string());
                            }
                        }
                    }
                    None => unsupported_location_ids.push(loc_id.clone()),
                }
            }
        }

        let node = PositionNode {
            position: (*position).clone(),
            primary_location: locations_by_id
                .get(position.primary_ground_location_id.as_str())
                .map(|l| (*l).clone()),
            supporting_locations,
            unresolved_location_ids,
            supporting_positions,
            unsupported_location_ids,
            dependents: Vec::new(),
        };

        graph
            .by_placeholder
            .insert(position.placeholder_id.clone(), position.id.clone());
        if let Some(barcode) = &position.coil_barcode {
            graph.by_barcode.insert(barcode.clone(), position.id.clone());
        }
        graph.order.push(position.id.clone());
        graph.nodes.insert(position.id.clone(), node);
    }

    // 反向索引
    let edges: Vec<(String, String)> = graph
        .nodes()
        .flat_map(|n| {
            n.supporting_positions
                .iter()
                .map(move |below| (below.clone(), n.id().to_string()))
        })
        .collect();
    for (below, above) in edges {
        if let Some(node) = graph.nodes.get_mut(&below) {
            node.dependents.push(above);
        }
    }

    graph
}
