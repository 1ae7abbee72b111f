// ==========================================
// 钢卷库区管理系统 - 层级依赖校验
// ==========================================
// 职责: 判定库位能否放入/移出钢卷
// 规则:
// - can_occupy: L1 恒可放; L(N) 需全部下层承托库位已占用
// - can_vacate: 正上方一层依赖库位全部为空
// 红线: 纯判定,违规是面向用户的拒绝,不可重试
// ==========================================

use crate::domain::StackingPosition;
use crate::engine::error::AllocationError;
use crate::engine::graph::PositionGraph;
use std::fmt;

// ==========================================
// LayerViolation - 层级规则违规
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerViolation {
    /// 下层未放满（missing: 空的承托库位号 / 无下层库位的地面库位 ID）
    LowerLayerIncomplete {
        placeholder_id: String,
        layer: u8,
        missing: Vec<String>,
    },
    /// 上层依赖（dependents: 已占用的上层库位号）
    UpperLayerDependent {
        placeholder_id: String,
        dependents: Vec<String>,
    },
}

impl fmt::Display for LayerViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerViolation::LowerLayerIncomplete { placeholder_id, .. } => {
                write!(f, "lower layer incomplete: {}", placeholder_id)
            }
            LayerViolation::UpperLayerDependent { placeholder_id, .. } => {
                write!(f, "upper layer depends on this position: {}", placeholder_id)
            }
        }
    }
}

impl From<LayerViolation> for AllocationError {
    fn from(v: LayerViolation) -> Self {
        match v {
            LayerViolation::LowerLayerIncomplete {
                placeholder_id,
                layer,
                missing,
            } => AllocationError::LowerLayerIncomplete {
                placeholder_id,
                layer,
                missing,
            },
            LayerViolation::UpperLayerDependent {
                placeholder_id,
                dependents,
            } => AllocationError::UpperLayerDependent {
                placeholder_id,
                dependents,
            },
        }
    }
}

/// 校验结果
pub type LayerCheck = Result<(), LayerViolation>;

/// 库位能否放入钢卷
pub fn can_occupy(position: &StackingPosition, graph: &PositionGraph) -> LayerCheck {
    check_occupy(position, graph, None)
}

/// 假设 vacated 库位已清空时,库位能否放入钢卷
///
/// 倒垛场景: 原库位先清空再放入新库位,两者作为一个整体校验
pub fn can_occupy_after_vacating(
    position: &StackingPosition,
    graph: &PositionGraph,
    vacated_position_id: &str,
) -> LayerCheck {
    check_occupy(position, graph, Some(vacated_position_id))
}

/// 库位能否移出钢卷
pub fn can_vacate(position: &StackingPosition, graph: &PositionGraph) -> LayerCheck {
    let dependents = match graph.node(&position.id) {
        Some(node) => &node.dependents,
        None => return Ok(()),
    };

    let occupied: Vec<String> = dependents
        .iter()
        .filter_map(|id| graph.position(id))
        .filter(|p| p.is_occupied())
        .map(|p| p.placeholder_id.clone())
        .collect();

    if occupied.is_empty() {
        Ok(())
    } else {
        Err(LayerViolation::UpperLayerDependent {
            placeholder_id: position.placeholder_id.clone(),
            dependents: occupied,
        })
    }
}

fn check_occupy(
    position: &StackingPosition,
    graph: &PositionGraph,
    vacated: Option<&str>,
) -> LayerCheck {
    if position.layer <= 1 {
        return Ok(());
    }

    let incomplete = |missing: Vec<String>| LayerViolation::LowerLayerIncomplete {
        placeholder_id: position.placeholder_id.clone(),
        layer: position.layer,
        missing,
    };

    let node = match graph.node(&position.id) {
        Some(node) => node,
        None => return Err(incomplete(position.supported_by_ground_location_ids.clone())),
    };

    if position.supported_by_ground_location_ids.is_empty() {
        return Err(incomplete(Vec::new()));
    }

    let mut missing: Vec<String> = node.unsupported_location_ids.clone();
    for below_id in &node.supporting_positions {
        let Some(below) = graph.position(below_id) else {
            missing.push(below_id.clone());
            continue;
        };
        let filled = below.is_occupied() && vacated != Some(below.id.as_str());
        if !filled {
            missing.push(below.placeholder_id.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(incomplete(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroundLocation;

    fn loc(id: &str) -> GroundLocation {
        let mut l = GroundLocation::new(id, "X", "Z", 40.0);
        l.id = id.to_string();
        l
    }

    fn ground(id: &str, coil: Option<&str>) -> StackingPosition {
        let mut p = StackingPosition::ground(&format!("{}-L1", id), id, "X", "Z");
        p.id = id.to_string();
        p.coil_barcode = coil.map(|c| c.to_string());
        p
    }

    fn bridge(id: &str, supports: &[&str], coil: Option<&str>) -> StackingPosition {
        let mut p = StackingPosition::bridging(id, 2, supports[0], supports, "X", "Z");
        p.id = id.to_string();
        p.coil_barcode = coil.map(|c| c.to_string());
        p
    }

    fn graph(positions: &[StackingPosition]) -> PositionGraph {
        PositionGraph::build(positions, &[loc("a"), loc("a2")])
    }

    #[test]
    fn test_ground_layer_always_occupiable() {
        let positions = vec![ground("a", None)];
        assert!(can_occupy(&positions[0], &graph(&positions)).is_ok());
    }

    #[test]
    fn test_bridging_requires_all_supports_occupied() {
        // 全空
        let positions = vec![ground("a", None), ground("a2", None), bridge("b", &["a", "a2"], None)];
        let err = can_occupy(&positions[2], &graph(&positions)).unwrap_err();
        match err {
            LayerViolation::LowerLayerIncomplete { missing, .. } => {
                assert_eq!(missing, vec!["a-L1", "a2-L1"])
            }
            other => panic!("unexpected: {:?}", other),
        }

        // 边界: 只差一个
        let positions = vec![ground("a", Some("C1")), ground("a2", None), bridge("b", &["a", "a2"], None)];
        assert!(can_occupy(&positions[2], &graph(&positions)).is_err());

        // 全满
        let positions = vec![
            ground("a", Some("C1")),
            ground("a2", Some("C2")),
            bridge("b", &["a", "a2"], None),
        ];
        assert!(can_occupy(&positions[2], &graph(&positions)).is_ok());
    }

    #[test]
    fn test_bridging_without_supports_is_rejected() {
        let mut orphan = bridge("b", &["a"], None);
        orphan.supported_by_ground_location_ids.clear();
        let positions = vec![ground("a", Some("C1")), orphan];
        assert!(can_occupy(&positions[1], &graph(&positions)).is_err());
    }

    #[test]
    fn test_can_vacate_blocks_on_occupied_dependent() {
        let positions = vec![ground("a", Some("C1")), ground("a2", Some("C3")), bridge("b", &["a", "a2"], Some("C2"))];
        let err = can_vacate(&positions[0], &graph(&positions)).unwrap_err();
        assert_eq!(
            err,
            LayerViolation::UpperLayerDependent {
                placeholder_id: "a-L1".to_string(),
                dependents: vec!["b".to_string()],
            }
        );

        let positions = vec![ground("a", Some("C1")), ground("a2", Some("C3")), bridge("b", &["a", "a2"], None)];
        assert!(can_vacate(&positions[0], &graph(&positions)).is_ok());
    }

    #[test]
    fn test_occupy_after_vacating_support() {
        // 目标库位压在原库位上方: 原库位清空后目标不可放
        let positions = vec![ground("a", Some("C1")), ground("a2", Some("C2")), bridge("b", &["a", "a2"], None)];
        let g = graph(&positions);
        assert!(can_occupy(&positions[2], &g).is_ok());
        assert!(can_occupy_after_vacating(&positions[2], &g, "a").is_err());
    }
}
