// ==========================================
// 钢卷库区管理系统 - 实体存储契约
// ==========================================
// 职责: 定义引擎访问外部实体存储的唯一接口
// 红线: Repository 不含业务规则,只做 CRUD
// 说明: 跨实体类型的调用之间不假设事务
// ==========================================

use crate::domain::entity::Entity;
use crate::repository::error::RepositoryResult;

// ==========================================
// EntityStore Trait
// ==========================================
// 实现者: MemoryStore (测试/嵌入) / SqliteStore (rusqlite)
pub trait EntityStore<T: Entity>: Send + Sync {
    /// 列出全部记录
    fn list(&self) -> RepositoryResult<Vec<T>>;

    /// 按谓词过滤
    fn filter(&self, predicate: &dyn Fn(&T) -> bool) -> RepositoryResult<Vec<T>> {
        Ok(self.list()?.into_iter().filter(|r| predicate(r)).collect())
    }

    /// 按主键读取
    ///
    /// # 返回
    /// - Ok(None): 记录不存在
    fn get(&self, id: &str) -> RepositoryResult<Option<T>>;

    /// 创建记录（主键为空时由存储分配）
    ///
    /// # 返回
    /// - 带主键的记录
    fn create(&self, record: T) -> RepositoryResult<T>;

    /// 局部更新
    ///
    /// # 错误
    /// - NotFound: 主键不存在
    fn update(&self, id: &str, patch: &T::Patch) -> RepositoryResult<()>;

    /// 删除记录
    fn delete(&self, id: &str) -> RepositoryResult<()>;

    /// 批量创建
    fn bulk_create(&self, records: Vec<T>) -> RepositoryResult<Vec<T>> {
        records.into_iter().map(|r| self.create(r)).collect()
    }
}

/// 分配新主键
pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
