// ==========================================
// 钢卷库区管理系统 - 倒垛优先级
// ==========================================
// 评分 = 优先级基础分 + min(2 × 在库天数, 40)
// 需倒垛 = 评分 > 阈值 或 在库天数 > 天数阈值
// ==========================================

use crate::config::EngineConfig;
use crate::domain::{Coil, CoilStatus};
use chrono::NaiveDateTime;
use serde::Serialize;

/// 在库天数部分的封顶分
const AGE_SCORE_CAP: u32 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShuffleCandidate {
    pub coil_barcode: String,
    pub position_id: Option<String>,
    pub days_in_yard: i64,
    pub score: u32,
    pub needs_shuffle: bool,
}

/// 在库天数（无入库日期按 0 计）
pub fn days_in_yard(coil: &Coil, now: NaiveDateTime) -> i64 {
    coil.received_date
        .map(|received| (now - received).num_days().max(0))
        .unwrap_or(0)
}

pub fn shuffle_score(coil: &Coil, now: NaiveDateTime) -> u32 {
    let base = coil.priority.map(|p| p.weight()).unwrap_or(0);
    let age = (days_in_yard(coil, now).min(i64::from(AGE_SCORE_CAP)) as u32) * 2;
    base + age.min(AGE_SCORE_CAP)
}

/// 在库钢卷按倒垛评分降序排列（同分按钢卷号）
pub fn rank_shuffle_candidates(
    coils: &[Coil],
    now: NaiveDateTime,
    config: &EngineConfig,
) -> Vec<ShuffleCandidate> {
    let mut ranked: Vec<ShuffleCandidate> = coils
        .iter()
        .filter(|c| c.status == CoilStatus::InYard)
        .map(|coil| {
            let days = days_in_yard(coil, now);
            let score = shuffle_score(coil, now);
            ShuffleCandidate {
                coil_barcode: coil.barcode.clone(),
                position_id: coil.current_stacking_position_id.clone(),
                days_in_yard: days,
                score,
                needs_shuffle: score > config.shuffle_priority_threshold
                    || days > config.shuffle_max_days_in_yard,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.coil_barcode.cmp(&b.coil_barcode))
    });
    ranked
}
