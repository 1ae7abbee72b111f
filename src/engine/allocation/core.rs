// ==========================================
// 钢卷库区管理系统 - 分配操作引擎
// ==========================================
// 职责: 放入/移出/倒垛/待发/装车
// 输入: YardRepositories (每次调用重新读取库位快照)
// 输出: AllocationOutcome + CoilMovement 审计记录
// ==========================================

use crate::domain::{
    Coil, CoilMovement, CoilPatch, CoilStatus, MovementType, PositionPatch, RemovalKind,
    StackingPosition, StatusOperation,
};
use crate::engine::error::{AllocationError, AllocationResult, WriteStep};
use crate::engine::graph::PositionGraph;
use crate::engine::repositories::YardRepositories;
use crate::engine::validator::{can_occupy, can_occupy_after_vacating, can_vacate};
use crate::repository::error::RepositoryResult;
use chrono::Utc;
use tracing::{error, info, instrument, warn};

/// 未指定操作人时的移动记录操作人
pub const DEFAULT_ACTOR: &str = "user";

/// 移动记录中"未分配"的去向/来源
const UNASSIGNED: &str = "Unassigned";

// ==========================================
// AllocationOutcome - 操作结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    pub coil_barcode: String,
    pub from_placeholder: Option<String>, // 原库位号
    pub to_placeholder: Option<String>,   // 新库位号
    pub status: CoilStatus,               // 操作后的钢卷状态
    pub movement: Option<CoilMovement>,   // 待发标记不产生移动记录
}

// ==========================================
// WriteSequence - 多步写入跟踪
// ==========================================
// 第一次写入成功之前的失败 → Store (无变更)
// 之后的失败 → InconsistentState (需人工对账)
struct WriteSequence<'a> {
    operation: &'static str,
    coil_barcode: &'a str,
    position_id: &'a str,
    started: bool,
}

impl<'a> WriteSequence<'a> {
    fn new(operation: &'static str, coil_barcode: &'a str, position_id: &'a str) -> Self {
        Self {
            operation,
            coil_barcode,
            position_id,
            started: false,
        }
    }

    fn run<T>(
        &mut self,
        step: WriteStep,
        write: impl FnOnce() -> RepositoryResult<T>,
    ) -> AllocationResult<T> {
        match write() {
            Ok(value) => {
                self.started = true;
                Ok(value)
            }
            Err(source) if !self.started => {
                warn!(
                    operation = self.operation,
                    coil_barcode = %self.coil_barcode,
                    position_id = %self.position_id,
                    step = %step,
                    error = %source,
                    "首次写入失败,未发生任何变更"
                );
                Err(AllocationError::Store(source))
            }
            Err(source) => {
                error!(
                    operation = self.operation,
                    coil_barcode = %self.coil_barcode,
                    position_id = %self.position_id,
                    step = %step,
                    error = %source,
                    "写入中途失败,钢卷与库位数据不一致,需人工对账"
                );
                Err(AllocationError::InconsistentState {
                    coil_barcode: self.coil_barcode.to_string(),
                    position_id: self.position_id.to_string(),
                    step,
                    source,
                })
            }
        }
    }
}

// ==========================================
// AllocationService - 分配操作
// ==========================================
pub struct AllocationService {
    repos: YardRepositories,
    actor: String,
}

impl AllocationService {
    /// 创建分配服务
    pub fn new(repos: YardRepositories) -> Self {
        Self {
            repos,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    /// 指定移动记录的操作人
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    pub fn repositories(&self) -> &YardRepositories {
        &self.repos
    }

    /// 读取当前全量库位图
    pub fn load_graph(&self) -> AllocationResult<PositionGraph> {
        let positions = self.repos.positions.list()?;
        let locations = self.repos.locations.list()?;
        Ok(PositionGraph::build(&positions, &locations))
    }

    /// 按钢卷号读取钢卷
    pub fn find_coil(&self, coil_barcode: &str) -> AllocationResult<Coil> {
        let barcode = coil_barcode.to_string();
        self.repos
            .coils
            .filter(&|c: &Coil| c.barcode == barcode)?
            .into_iter()
            .next()
            .ok_or_else(|| AllocationError::not_found("Coil", coil_barcode))
    }

    // ==========================================
    // 放入 (receipt)
    // ==========================================

    /// 将未分配的钢卷放入库位
    ///
    /// # 前置条件
    /// - 钢卷存在且未分配库位
    /// - 目标库位存在、启用、为空
    /// - 目标库位下层承托已放满
    #[instrument(skip(self), fields(actor = %self.actor))]
    pub fn assign(
        &self,
        coil_barcode: &str,
        target_position_id: &str,
    ) -> AllocationResult<AllocationOutcome> {
        observe("assign", self.assign_inner(coil_barcode, target_position_id, None, false))
    }

    /// 盘点对账放入
    ///
    /// - 钢卷确实存放在原库位: 倒垛到目标库位
    /// - 钢卷库位引用悬空（原库位不存在或未存放该钢卷）: 忽略悬空引用,按未分配放入
    ///
    /// 目标库位仍需启用、为空且下层承托已放满
    pub(crate) fn place_for_reconciliation(
        &self,
        coil_barcode: &str,
        target_position_id: &str,
        reason: &str,
    ) -> AllocationResult<AllocationOutcome> {
        let coil = self.find_coil(coil_barcode)?;
        let held = match &coil.current_stacking_position_id {
            Some(id) => self
                .repos
                .positions
                .get(id)?
                .map_or(false, |p| p.coil_barcode.as_deref() == Some(coil.barcode.as_str())),
            None => false,
        };
        if held {
            observe(
                "shuffle",
                self.shuffle_inner(coil_barcode, target_position_id, reason, None),
            )
        } else {
            observe(
                "assign",
                self.assign_inner(coil_barcode, target_position_id, Some(reason), true),
            )
        }
    }

    fn assign_inner(
        &self,
        coil_barcode: &str,
        target_position_id: &str,
        reason: Option<&str>,
        repair_stale_pointer: bool,
    ) -> AllocationResult<AllocationOutcome> {
        let coil = self.find_coil(coil_barcode)?;
        let graph = self.load_graph()?;
        if let Some(current) = &coil.current_stacking_position_id {
            let held = graph
                .position(current)
                .map_or(false, |p| p.coil_barcode.as_deref() == Some(coil.barcode.as_str()));
            if held || !repair_stale_pointer {
                return Err(AllocationError::AlreadyPlaced {
                    coil_barcode: coil.barcode.clone(),
                    position_id: current.clone(),
                });
            }
            warn!(
                coil_barcode = %coil.barcode,
                stale_position_id = %current,
                "钢卷库位引用悬空,按未分配放入"
            );
        }

        let target = require_position(&graph, target_position_id)?;
        ensure_free(target)?;
        if let Some(holder) = graph.holding(&coil.barcode) {
            return Err(AllocationError::AlreadyPlaced {
                coil_barcode: coil.barcode.clone(),
                position_id: holder.id().to_string(),
            });
        }
        can_occupy(target, &graph)?;
        let status = transition(&coil, StatusOperation::Assign)?;

        let now = Utc::now().naive_utc();
        let location_code = location_code_of(&graph, target);
        let reason = match reason {
            Some(r) => r.to_string(),
            None => format!("Placed into {} (Layer {})", target.placeholder_id, target.layer),
        };
        let movement = CoilMovement::new(
            &coil.barcode,
            UNASSIGNED,
            &target.placeholder_id,
            MovementType::Receipt,
            &self.actor,
            &reason,
        );

        let mut seq = WriteSequence::new("assign", &coil.barcode, &target.id);
        seq.run(WriteStep::TargetPositionSet, || {
            self.repos.positions.update(
                &target.id,
                &PositionPatch::occupancy(Some(coil.barcode.clone())),
            )
        })?;
        seq.run(WriteStep::CoilUpdate, || {
            self.repos.coils.update(
                &coil.id,
                &CoilPatch::placement(Some(target.id.clone()), location_code, Some(status), now),
            )
        })?;
        let movement = seq.run(WriteStep::MovementLog, || self.repos.movements.create(movement))?;

        Ok(AllocationOutcome {
            coil_barcode: coil.barcode.clone(),
            from_placeholder: None,
            to_placeholder: Some(target.placeholder_id.clone()),
            status,
            movement: Some(movement),
        })
    }

    // ==========================================
    // 移出 (return)
    // ==========================================

    /// 从库位直接移出钢卷（状态回到 incoming）
    #[instrument(skip(self), fields(actor = %self.actor))]
    pub fn remove(&self, position_id: &str) -> AllocationResult<AllocationOutcome> {
        self.remove_with(position_id, RemovalKind::Direct)
    }

    /// 按指定下架类型移出钢卷
    #[instrument(skip(self), fields(actor = %self.actor))]
    pub fn remove_with(
        &self,
        position_id: &str,
        kind: RemovalKind,
    ) -> AllocationResult<AllocationOutcome> {
        observe("remove", self.remove_inner(position_id, kind, None))
    }

    /// 移出钢卷,并要求库位当前存放的正是该钢卷
    pub(crate) fn remove_expecting(
        &self,
        position_id: &str,
        coil_barcode: &str,
        kind: RemovalKind,
    ) -> AllocationResult<AllocationOutcome> {
        observe("remove", self.remove_inner(position_id, kind, Some(coil_barcode)))
    }

    fn remove_inner(
        &self,
        position_id: &str,
        kind: RemovalKind,
        expected: Option<&str>,
    ) -> AllocationResult<AllocationOutcome> {
        let graph = self.load_graph()?;
        let position = require_position(&graph, position_id)?;
        let barcode = position
            .coil_barcode
            .clone()
            .ok_or_else(|| AllocationError::PositionEmpty {
                placeholder_id: position.placeholder_id.clone(),
            })?;
        if let Some(expected) = expected {
            if expected != barcode {
                return Err(AllocationError::CoilMismatch {
                    placeholder_id: position.placeholder_id.clone(),
                    expected: expected.to_string(),
                    actual: barcode,
                });
            }
        }

        let coil = self.find_coil(&barcode)?;
        can_vacate(position, &graph)?;
        let status = transition(&coil, StatusOperation::Remove(kind))?;

        let now = Utc::now().naive_utc();
        let movement = CoilMovement::new(
            &coil.barcode,
            &position.placeholder_id,
            kind.destination_label(),
            MovementType::Return,
            &self.actor,
            kind.reason(),
        );

        let mut seq = WriteSequence::new("remove", &coil.barcode, &position.id);
        seq.run(WriteStep::SourcePositionClear, || {
            self.repos
                .positions
                .update(&position.id, &PositionPatch::occupancy(None))
        })?;
        seq.run(WriteStep::CoilUpdate, || {
            self.repos
                .coils
                .update(&coil.id, &CoilPatch::placement(None, None, Some(status), now))
        })?;
        let movement = seq.run(WriteStep::MovementLog, || self.repos.movements.create(movement))?;

        Ok(AllocationOutcome {
            coil_barcode: coil.barcode.clone(),
            from_placeholder: Some(position.placeholder_id.clone()),
            to_placeholder: None,
            status,
            movement: Some(movement),
        })
    }

    // ==========================================
    // 倒垛 (shuffle)
    // ==========================================

    /// 将已在库的钢卷移到另一库位
    ///
    /// 原库位可移出 + 新库位可放入(按原库位已清空计算) 作为整体在写入前校验
    #[instrument(skip(self, remarks), fields(actor = %self.actor))]
    pub fn shuffle(
        &self,
        coil_barcode: &str,
        new_position_id: &str,
        reason: &str,
        remarks: Option<&str>,
    ) -> AllocationResult<AllocationOutcome> {
        observe(
            "shuffle",
            self.shuffle_inner(coil_barcode, new_position_id, reason, remarks),
        )
    }

    fn shuffle_inner(
        &self,
        coil_barcode: &str,
        new_position_id: &str,
        reason: &str,
        remarks: Option<&str>,
    ) -> AllocationResult<AllocationOutcome> {
        let coil = self.find_coil(coil_barcode)?;
        let old_id = coil
            .current_stacking_position_id
            .clone()
            .ok_or_else(|| AllocationError::NotPlaced {
                coil_barcode: coil.barcode.clone(),
            })?;

        let graph = self.load_graph()?;
        let old = require_position(&graph, &old_id)?;
        if old.coil_barcode.as_deref() != Some(coil.barcode.as_str()) {
            return Err(AllocationError::CoilMismatch {
                placeholder_id: old.placeholder_id.clone(),
                expected: coil.barcode.clone(),
                actual: old.coil_barcode.clone().unwrap_or_default(),
            });
        }
        let target = require_position(&graph, new_position_id)?;
        ensure_free(target)?;
        can_vacate(old, &graph)?;
        can_occupy_after_vacating(target, &graph, &old.id)?;
        let status = transition(&coil, StatusOperation::Shuffle)?;

        let now = Utc::now().naive_utc();
        let location_code = location_code_of(&graph, target);
        let movement = CoilMovement::new(
            &coil.barcode,
            &old.placeholder_id,
            &target.placeholder_id,
            MovementType::Shuffle,
            &self.actor,
            reason,
        )
        .with_remarks(remarks.map(|r| r.to_string()));

        let mut seq = WriteSequence::new("shuffle", &coil.barcode, &target.id);
        seq.run(WriteStep::SourcePositionClear, || {
            self.repos
                .positions
                .update(&old.id, &PositionPatch::occupancy(None))
        })?;
        seq.run(WriteStep::TargetPositionSet, || {
            self.repos.positions.update(
                &target.id,
                &PositionPatch::occupancy(Some(coil.barcode.clone())),
            )
        })?;
        seq.run(WriteStep::CoilUpdate, || {
            self.repos.coils.update(
                &coil.id,
                &CoilPatch::placement(Some(target.id.clone()), location_code, Some(status), now),
            )
        })?;
        let movement = seq.run(WriteStep::MovementLog, || self.repos.movements.create(movement))?;

        Ok(AllocationOutcome {
            coil_barcode: coil.barcode.clone(),
            from_placeholder: Some(old.placeholder_id.clone()),
            to_placeholder: Some(target.placeholder_id.clone()),
            status,
            movement: Some(movement),
        })
    }

    // ==========================================
    // 待发 / 装车
    // ==========================================

    /// 标记钢卷待发（加入发运单）,不改变库位
    #[instrument(skip(self))]
    pub fn mark_outgoing(&self, coil_barcode: &str) -> AllocationResult<AllocationOutcome> {
        observe("mark_outgoing", self.mark_outgoing_inner(coil_barcode))
    }

    fn mark_outgoing_inner(&self, coil_barcode: &str) -> AllocationResult<AllocationOutcome> {
        let coil = self.find_coil(coil_barcode)?;
        let status = transition(&coil, StatusOperation::MarkOutgoing)?;
        self.repos
            .coils
            .update(&coil.id, &CoilPatch::status_only(status))?;

        Ok(AllocationOutcome {
            coil_barcode: coil.barcode.clone(),
            from_placeholder: None,
            to_placeholder: None,
            status,
            movement: None,
        })
    }

    /// 装车发运: 若在库位则先移出,状态置为 shipped
    #[instrument(skip(self), fields(actor = %self.actor))]
    pub fn dispatch(&self, coil_barcode: &str, vehicle: &str) -> AllocationResult<AllocationOutcome> {
        observe("dispatch", self.dispatch_inner(coil_barcode, vehicle))
    }

    fn dispatch_inner(&self, coil_barcode: &str, vehicle: &str) -> AllocationResult<AllocationOutcome> {
        let coil = self.find_coil(coil_barcode)?;
        let graph = self.load_graph()?;
        let source = match &coil.current_stacking_position_id {
            Some(id) => {
                let position = require_position(&graph, id)?;
                can_vacate(position, &graph)?;
                Some(position)
            }
            None => None,
        };
        let status = transition(&coil, StatusOperation::Dispatch)?;

        let now = Utc::now().naive_utc();
        let from = source
            .map(|p| p.placeholder_id.clone())
            .or_else(|| coil.storage_location.clone())
            .unwrap_or_else(|| UNASSIGNED.to_string());
        let movement = CoilMovement::new(
            &coil.barcode,
            &from,
            vehicle,
            MovementType::Loading,
            &self.actor,
            "Loaded for shipment",
        );

        let position_id = source.map(|p| p.id.as_str()).unwrap_or_default();
        let mut seq = WriteSequence::new("dispatch", &coil.barcode, position_id);
        if let Some(position) = source {
            // 库位仍指向该钢卷时才清空
            if position.coil_barcode.as_deref() == Some(coil.barcode.as_str()) {
                seq.run(WriteStep::SourcePositionClear, || {
                    self.repos
                        .positions
                        .update(&position.id, &PositionPatch::occupancy(None))
                })?;
            }
        }
        seq.run(WriteStep::CoilUpdate, || {
            self.repos
                .coils
                .update(&coil.id, &CoilPatch::placement(None, None, Some(status), now))
        })?;
        let movement = seq.run(WriteStep::MovementLog, || self.repos.movements.create(movement))?;

        Ok(AllocationOutcome {
            coil_barcode: coil.barcode.clone(),
            from_placeholder: source.map(|p| p.placeholder_id.clone()),
            to_placeholder: None,
            status,
            movement: Some(movement),
        })
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn require_position<'g>(
    graph: &'g PositionGraph,
    position_id: &str,
) -> AllocationResult<&'g StackingPosition> {
    graph
        .position(position_id)
        .ok_or_else(|| AllocationError::not_found("StackingPosition", position_id))
}

/// 目标库位必须启用且为空
fn ensure_free(target: &StackingPosition) -> AllocationResult<()> {
    if !target.is_active {
        return Err(AllocationError::PositionInactive {
            placeholder_id: target.placeholder_id.clone(),
        });
    }
    if let Some(occupant) = &target.coil_barcode {
        return Err(AllocationError::PositionOccupied {
            placeholder_id: target.placeholder_id.clone(),
            occupant: occupant.clone(),
        });
    }
    Ok(())
}

fn transition(coil: &Coil, op: StatusOperation) -> AllocationResult<CoilStatus> {
    coil.status
        .transition(op)
        .ok_or_else(|| AllocationError::InvalidStatusTransition {
            coil_barcode: coil.barcode.clone(),
            from: coil.status,
            operation: op,
        })
}

/// 主地面库位编码（钢卷上的展示字段）
fn location_code_of(graph: &PositionGraph, position: &StackingPosition) -> Option<String> {
    position.primary_ground_location_code.clone().or_else(|| {
        graph
            .node(&position.id)
            .and_then(|n| n.primary_location.as_ref())
            .map(|l| l.location_code.clone())
    })
}

/// 统一记录操作结果
fn observe(
    operation: &'static str,
    result: AllocationResult<AllocationOutcome>,
) -> AllocationResult<AllocationOutcome> {
    match &result {
        Ok(outcome) => info!(
            operation,
            coil_barcode = %outcome.coil_barcode,
            from = ?outcome.from_placeholder,
            to = ?outcome.to_placeholder,
            status = %outcome.status,
            "分配操作完成"
        ),
        Err(e) if e.is_precondition() => warn!(
            operation,
            code = e.code(),
            error = %e,
            "分配操作被拒绝"
        ),
        Err(e) if !e.is_fatal() => warn!(operation, code = e.code(), error = %e, "分配操作失败"),
        // InconsistentState 已在 WriteSequence 中记录
        Err(_) => {}
    }
    result
}
