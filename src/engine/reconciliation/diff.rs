// ==========================================
// 钢卷库区管理系统 - 盘点差异计算
// ==========================================
// 输入: StockTake 快照 + 当前钢卷/库位状态
// 输出: 待放入 / 待移出(丢失) / 已确认 / 错位 / 未分配 五类清单
// 红线: 纯函数,相同输入多次调用结果完全一致
// ==========================================

use crate::domain::{Coil, NonTraceableCoil, StackingPosition, StockTake};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// 分类原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileReason {
    UnassignedInSystem, // 系统未分配,实物在库位
    Relocating,         // 错位钢卷的目标库位
    Misplaced,          // 错位钢卷的系统库位
    NotFoundPhysically, // 系统有,实物未盘到
}

impl ReconcileReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileReason::UnassignedInSystem => "unassigned in system",
            ReconcileReason::Relocating => "relocating",
            ReconcileReason::Misplaced => "misplaced",
            ReconcileReason::NotFoundPhysically => "not found physically",
        }
    }
}

impl fmt::Display for ReconcileReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 待放入
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToPlace {
    pub coil: Coil,
    pub target_placeholder_id: String,
    /// 库位号能解析到库位时的库位 ID
    pub target_position_id: Option<String>,
    pub reason: ReconcileReason,
}

/// 待移出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToUnplace {
    pub coil: Coil,
    pub position: StackingPosition,
    pub reason: ReconcileReason,
}

/// 已确认（系统库位与实物一致）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmed {
    pub coil_barcode: String,
    pub placeholder_id: String,
}

/// 错位
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Misplaced {
    pub coil: Coil,
    /// 系统记录的库位号
    pub system_placeholder_id: String,
    pub found_placeholder_id: String,
}

// ==========================================
// ReconciliationDiff - 对账差异
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationDiff {
    pub to_place: Vec<ToPlace>,
    pub to_unplace: Vec<ToUnplace>,
    pub confirmed: Vec<Confirmed>,
    pub misplaced: Vec<Misplaced>,
    /// 系统未分配、实物未盘到、且应在库的钢卷（仅提示）
    pub unassigned: Vec<Coil>,
    /// 以下原样透传,不参与差异计算
    pub non_traceable: Vec<NonTraceableCoil>,
    pub empty_placeholders: Vec<String>,
    /// 盘到但系统中不存在的钢卷号
    pub unknown_barcodes: Vec<String>,
}

impl ReconciliationDiff {
    /// 系统与实物完全一致
    pub fn is_clean(&self) -> bool {
        self.to_place.is_empty()
            && self.to_unplace.is_empty()
            && self.misplaced.is_empty()
            && self.unknown_barcodes.is_empty()
    }

    /// 丢失（未盘到）的条目
    pub fn missing(&self) -> impl Iterator<Item = &ToUnplace> {
        self.to_unplace
            .iter()
            .filter(|u| u.reason == ReconcileReason::NotFoundPhysically)
    }
}

/// 计算盘点差异
///
/// # 参数
/// - stock_take: 盘点快照
/// - coils: 全部钢卷
/// - positions: 全部库位（范围按盘点单的跨/区过滤）
///
/// # 分类规则
/// 1. 盘到且系统未分配 → 待放入
/// 2. 盘到但库位号不同 → 错位: 待移出(原库位) + 待放入(盘到库位)
/// 3. 盘到且库位号一致 → 已确认
/// 4. 范围内库位上的钢卷未盘到 → 待移出(丢失)
/// 5. 未分配、未盘到、应在库 → 未分配(仅提示)
///
/// # 说明
/// - 钢卷的库位引用指向的库位未存放该钢卷时（分配操作中途失败残留）,按未分配处理
/// - 同一钢卷号多次盘到时以最后一次记录的库位号为准
pub fn diff_stock_take(
    stock_take: &StockTake,
    coils: &[Coil],
    positions: &[StackingPosition],
) -> ReconciliationDiff {
    let zone = stock_take.zone.as_deref();

    // 盘到: 钢卷号 → 库位号（按首次出现排序,库位号取最后一次）
    let mut found: Vec<(&str, &str)> = Vec::new();
    let mut found_index: HashMap<&str, usize> = HashMap::new();
    for f in &stock_take.coils_found {
        let barcode = f.coil_barcode.as_str();
        let placeholder = f.found_at_placeholder_id.as_str();
        match found_index.get(barcode) {
            Some(&idx) => found[idx].1 = placeholder,
            None => {
                found_index.insert(barcode, found.len());
                found.push((barcode, placeholder));
            }
        }
    }

    let coils_by_barcode: HashMap<&str, &Coil> =
        coils.iter().map(|c| (c.barcode.as_str(), c)).collect();
    let positions_by_id: HashMap<&str, &StackingPosition> =
        positions.iter().map(|p| (p.id.as_str(), p)).collect();
    let positions_by_placeholder: HashMap<&str, &StackingPosition> = positions
        .iter()
        .map(|p| (p.placeholder_id.as_str(), p))
        .collect();

    let mut diff = ReconciliationDiff {
        non_traceable: stock_take.non_traceable_coils.clone(),
        empty_placeholders: stock_take.empty_placeholders.clone(),
        ..ReconciliationDiff::default()
    };

    for (barcode, found_placeholder) in &found {
        let Some(coil) = coils_by_barcode.get(barcode) else {
            diff.unknown_barcodes.push(barcode.to_string());
            continue;
        };
        let target_position_id = positions_by_placeholder
            .get(found_placeholder)
            .map(|p| p.id.clone());

        let Some(current) = resolve_current(coil, &positions_by_id) else {
            diff.to_place.push(ToPlace {
                coil: (*coil).clone(),
                target_placeholder_id: found_placeholder.to_string(),
                target_position_id,
                reason: ReconcileReason::UnassignedInSystem,
            });
            continue;
        };

        if current.placeholder_id == *found_placeholder {
            diff.confirmed.push(Confirmed {
                coil_barcode: coil.barcode.clone(),
                placeholder_id: found_placeholder.to_string(),
            });
            continue;
        }

        diff.misplaced.push(Misplaced {
            coil: (*coil).clone(),
            system_placeholder_id: current.placeholder_id.clone(),
            found_placeholder_id: found_placeholder.to_string(),
        });
        diff.to_unplace.push(ToUnplace {
            coil: (*coil).clone(),
            position: current.clone(),
            reason: ReconcileReason::Misplaced,
        });
        diff.to_place.push(ToPlace {
            coil: (*coil).clone(),
            target_placeholder_id: found_placeholder.to_string(),
            target_position_id,
            reason: ReconcileReason::Relocating,
        });
    }

    // 范围内库位上未盘到的钢卷
    for position in positions.iter().filter(|p| p.in_scope(&stock_take.bay, zone)) {
        let Some(barcode) = position.coil_barcode.as_deref() else {
            continue;
        };
        if found_index.contains_key(barcode) {
            continue;
        }
        if let Some(coil) = coils_by_barcode.get(barcode) {
            diff.to_unplace.push(ToUnplace {
                coil: (*coil).clone(),
                position: position.clone(),
                reason: ReconcileReason::NotFoundPhysically,
            });
        }
    }

    diff.unassigned = coils
        .iter()
        .filter(|c| {
            resolve_current(c, &positions_by_id).is_none()
                && !found_index.contains_key(c.barcode.as_str())
                && c.status.expected_in_yard()
        })
        .cloned()
        .collect();

    diff
}

/// 钢卷当前所在库位: 引用的库位须确实存放该钢卷
fn resolve_current<'a>(
    coil: &Coil,
    positions_by_id: &HashMap<&str, &'a StackingPosition>,
) -> Option<&'a StackingPosition> {
    let position = *positions_by_id.get(coil.current_stacking_position_id.as_deref()?)?;
    (position.coil_barcode.as_deref() == Some(coil.barcode.as_str())).then_some(position)
}
