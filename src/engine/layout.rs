// ==========================================
// 钢卷库区管理系统 - 库区布局
// ==========================================
// 职责: 地面库位批量生成、库位号建议、承托候选、库位定义校验、库位增删
// 红线: 已占用的库位不可删除
// ==========================================

use crate::config::EngineConfig;
use crate::domain::{GroundLocation, PositionType, StackingPosition};
use crate::engine::repositories::YardRepositories;
use crate::repository::error::RepositoryError;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("编号范围无效: {start}..={end}")]
    InvalidRange { start: u32, end: u32 },

    #[error("网格容量不足: {count} 个库位超出 {rows}×{cols}")]
    GridOverflow { count: usize, rows: u32, cols: u32 },

    #[error("层号 {layer} 超出范围 1..={max}")]
    InvalidLayer { layer: u8, max: u8 },

    #[error("层号 {layer} 的库位类型应为 {expected}")]
    TypeMismatch { layer: u8, expected: &'static str },

    #[error("地面层库位只能由其主库位承托")]
    GroundSupportMismatch,

    #[error("第 {layer} 层库位需要 2-3 个承托库位,实际 {count} 个")]
    SupportCount { layer: u8, count: usize },

    #[error("承托库位 {location_id} 没有第 {layer} 层库位")]
    UnsupportedLocation { location_id: String, layer: u8 },

    #[error("库位号重复: {0}")]
    DuplicatePlaceholder(String),

    #[error("库位 {placeholder_id} 存放钢卷 {coil_barcode},不可删除")]
    PositionOccupied {
        placeholder_id: String,
        coil_barcode: String,
    },

    #[error("库位不存在: {0}")]
    PositionNotFound(String),

    #[error("存储访问失败: {0}")]
    Store(#[from] RepositoryError),
}

// ==========================================
// 地面库位批量生成
// ==========================================

/// 批量生成参数
#[derive(Debug, Clone)]
pub struct LocationGridSpec {
    pub prefix: String, // 编码前缀,如 "A-"
    pub start: u32,
    pub end: u32,
    pub digits: usize, // 补零位数
    pub rows: u32,
    pub cols: u32,
    pub bay: String,
    pub zone: String,
    pub capacity_tons: f64,
}

/// 按行优先铺满网格
pub fn generate_ground_locations(spec: &LocationGridSpec) -> Result<Vec<GroundLocation>, LayoutError> {
    if spec.end < spec.start {
        return Err(LayoutError::InvalidRange {
            start: spec.start,
            end: spec.end,
        });
    }
    let count = (spec.end - spec.start + 1) as usize;
    if spec.cols == 0 || count > (spec.rows as usize) * (spec.cols as usize) {
        return Err(LayoutError::GridOverflow {
            count,
            rows: spec.rows,
            cols: spec.cols,
        });
    }

    Ok((spec.start..=spec.end)
        .enumerate()
        .map(|(i, n)| {
            let code = format!("{}{:0width$}", spec.prefix, n, width = spec.digits);
            let row = (i as u32 / spec.cols + 1) as i32;
            let col = (i as u32 % spec.cols + 1) as i32;
            GroundLocation::new(&code, &spec.bay, &spec.zone, spec.capacity_tons).with_grid(row, col)
        })
        .collect())
}

/// 建议库位号: 地面层 `<code>-L1`,跨接层 `<code>-L<n>-B`
pub fn suggest_placeholder_id(location_code: &str, layer: u8) -> String {
    if layer <= 1 {
        format!("{}-L1", location_code)
    } else {
        format!("{}-L{}-B", location_code, layer)
    }
}

/// 承托候选: 主库位本身 + 同跨同区、行列距离在半径内的启用库位
pub fn support_candidates<'a>(
    primary: &GroundLocation,
    locations: &'a [GroundLocation],
    radius: i32,
) -> Vec<&'a GroundLocation> {
    let mut candidates: Vec<&GroundLocation> = locations
        .iter()
        .filter(|l| l.id == primary.id)
        .collect();

    let (Some(row), Some(col)) = (primary.row_num, primary.col_num) else {
        return candidates;
    };

    candidates.extend(locations.iter().filter(|l| {
        l.id != primary.id
            && l.is_active
            && l.bay == primary.bay
            && l.zone == primary.zone
            && matches!(
                (l.row_num, l.col_num),
                (Some(r), Some(c)) if (r - row).abs() <= radius && (c - col).abs() <= radius
            )
    }));
    candidates
}

/// 库位定义校验
///
/// # 规则
/// 1. 层号在 1..=max_layer
/// 2. 类型与层号一致
/// 3. 地面层仅由主库位承托
/// 4. 跨接层 2-3 个承托,且每个承托库位都有下一层库位
/// 5. 库位号不重复
pub fn validate_position_definition(
    position: &StackingPosition,
    existing: &[StackingPosition],
    config: &EngineConfig,
) -> Result<(), LayoutError> {
    if position.layer < 1 || position.layer > config.max_layer {
        return Err(LayoutError::InvalidLayer {
            layer: position.layer,
            max: config.max_layer,
        });
    }

    let expected = PositionType::for_layer(position.layer);
    if position.position_type != expected {
        return Err(LayoutError::TypeMismatch {
            layer: position.layer,
            expected: expected.as_str(),
        });
    }

    let supports = &position.supported_by_ground_location_ids;
    if position.layer == 1 {
        if supports.len() != 1 || supports[0] != position.primary_ground_location_id {
            return Err(LayoutError::GroundSupportMismatch);
        }
    } else {
        if !(2..=3).contains(&supports.len()) {
            return Err(LayoutError::SupportCount {
                layer: position.layer,
                count: supports.len(),
            });
        }
        let below = position.layer - 1;
        for location_id in supports {
            let supported = existing
                .iter()
                .any(|p| p.layer == below && &p.primary_ground_location_id == location_id);
            if !supported {
                return Err(LayoutError::UnsupportedLocation {
                    location_id: location_id.clone(),
                    layer: below,
                });
            }
        }
    }

    if existing
        .iter()
        .any(|p| p.placeholder_id == position.placeholder_id && p.id != position.id)
    {
        return Err(LayoutError::DuplicatePlaceholder(position.placeholder_id.clone()));
    }

    Ok(())
}

// ==========================================
// YardLayout - 库区布局维护
// ==========================================
pub struct YardLayout {
    repos: YardRepositories,
    config: EngineConfig,
}

impl YardLayout {
    pub fn new(repos: YardRepositories, config: EngineConfig) -> Self {
        Self { repos, config }
    }

    /// 批量创建地面库位
    pub fn create_ground_locations(
        &self,
        spec: &LocationGridSpec,
    ) -> Result<Vec<GroundLocation>, LayoutError> {
        let locations = generate_ground_locations(spec)?;
        let created = self.repos.locations.bulk_create(locations)?;
        info!(count = created.len(), bay = %spec.bay, zone = %spec.zone, "批量创建地面库位");
        Ok(created)
    }

    /// 校验后创建堆垛库位（新库位一律为空）
    pub fn create_position(&self, mut position: StackingPosition) -> Result<StackingPosition, LayoutError> {
        position.coil_barcode = None;
        let existing = self.repos.positions.list()?;
        validate_position_definition(&position, &existing, &self.config)?;

        if position.primary_ground_location_code.is_none() {
            position.primary_ground_location_code = self
                .repos
                .locations
                .get(&position.primary_ground_location_id)?
                .map(|l| l.location_code);
        }
        Ok(self.repos.positions.create(position)?)
    }

    /// 删除堆垛库位（占用中不可删除）
    pub fn delete_position(&self, position_id: &str) -> Result<(), LayoutError> {
        let position = self
            .repos
            .positions
            .get(position_id)?
            .ok_or_else(|| LayoutError::PositionNotFound(position_id.to_string()))?;
        if let Some(coil_barcode) = position.coil_barcode {
            return Err(LayoutError::PositionOccupied {
                placeholder_id: position.placeholder_id,
                coil_barcode,
            });
        }
        self.repos.positions.delete(position_id)?;
        info!(placeholder_id = %position.placeholder_id, "删除堆垛库位");
        Ok(())
    }
}
