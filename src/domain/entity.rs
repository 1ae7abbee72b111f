// ==========================================
// 钢卷库区管理系统 - 实体契约
// ==========================================
// 职责: 约定实体存储所需的最小能力(主键 + 局部更新)
// 说明: 局部更新通过 Patch 类型表达,占用关系字段仅 crate 内可写
// ==========================================

/// 可被实体存储管理的记录
pub trait Entity: Clone + Send + Sync + 'static {
    /// 局部更新载荷
    type Patch: Send + Sync;

    /// 实体名称（用于错误信息/日志）
    const ENTITY_NAME: &'static str;

    /// 只增不删（审计类实体）
    const APPEND_ONLY: bool = false;

    /// 主键
    fn id(&self) -> &str;

    /// 由存储在创建时分配主键
    fn set_id(&mut self, id: String);

    /// 应用局部更新
    fn apply_patch(&mut self, patch: &Self::Patch);
}

/// 不可变实体的 Patch 类型（无法构造）
#[derive(Debug, Clone, Copy)]
pub enum Immutable {}
