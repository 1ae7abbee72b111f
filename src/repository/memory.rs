// ==========================================
// 钢卷库区管理系统 - 内存实体存储
// ==========================================
// 用途: 单元测试 / 嵌入式调用方的进程内存储
// 支持: 故障注入 (模拟远端调用失败)
// ==========================================

use crate::domain::entity::Entity;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{new_record_id, EntityStore};
use std::sync::{Mutex, MutexGuard};

/// 故障注入计划
#[derive(Debug, Default)]
struct FaultPlan {
    /// 剩余多少次 update 成功后失败 (Some(0) = 下一次即失败)
    update_after: Option<usize>,
    /// 剩余多少次 create 成功后失败
    create_after: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum FaultKind {
    Update,
    Create,
}

impl FaultPlan {
    fn should_fail(counter: &mut Option<usize>) -> bool {
        match counter {
            Some(0) => {
                *counter = None;
                true
            }
            Some(n) => {
                *n -= 1;
                false
            }
            None => false,
        }
    }
}

// ==========================================
// MemoryStore - 内存实体存储
// ==========================================
pub struct MemoryStore<T: Entity> {
    records: Mutex<Vec<T>>,
    faults: Mutex<FaultPlan>,
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            faults: Mutex::new(FaultPlan::default()),
        }
    }

    /// 以已有记录初始化（缺失主键的记录会被分配主键）
    pub fn with_records(records: Vec<T>) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.records.lock() {
            for mut record in records {
                if record.id().is_empty() {
                    record.set_id(new_record_id());
                }
                guard.push(record);
            }
        }
        store
    }

    /// 下一次 update 失败
    pub fn fail_next_update(&self) {
        self.fail_update_after(0);
    }

    /// 再成功 n 次 update 后失败一次
    pub fn fail_update_after(&self, n: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.update_after = Some(n);
        }
    }

    /// 下一次 create 失败
    pub fn fail_next_create(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.create_after = Some(0);
        }
    }

    /// 当前记录数
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_records(&self) -> RepositoryResult<MutexGuard<'_, Vec<T>>> {
        self.records
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn injected(&self, kind: FaultKind) -> RepositoryResult<bool> {
        let mut faults = self
            .faults
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let counter = match kind {
            FaultKind::Update => &mut faults.update_after,
            FaultKind::Create => &mut faults.create_after,
        };
        Ok(FaultPlan::should_fail(counter))
    }
}

impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    fn list(&self) -> RepositoryResult<Vec<T>> {
        Ok(self.get_records()?.clone())
    }

    fn get(&self, id: &str) -> RepositoryResult<Option<T>> {
        Ok(self.get_records()?.iter().find(|r| r.id() == id).cloned())
    }

    fn create(&self, mut record: T) -> RepositoryResult<T> {
        if self.injected(FaultKind::Create)? {
            return Err(RepositoryError::StoreUnavailable(format!(
                "{} create 注入失败",
                T::ENTITY_NAME
            )));
        }

        let mut records = self.get_records()?;
        if record.id().is_empty() {
            record.set_id(new_record_id());
        } else if records.iter().any(|r| r.id() == record.id()) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "{} id={}",
                T::ENTITY_NAME,
                record.id()
            )));
        }
        records.push(record.clone());
        Ok(record)
    }

    fn update(&self, id: &str, patch: &T::Patch) -> RepositoryResult<()> {
        if self.injected(FaultKind::Update)? {
            return Err(RepositoryError::StoreUnavailable(format!(
                "{} update 注入失败: id={}",
                T::ENTITY_NAME,
                id
            )));
        }

        let mut records = self.get_records()?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| RepositoryError::not_found(T::ENTITY_NAME, id))?;
        record.apply_patch(patch);
        Ok(())
    }

    fn delete(&self, id: &str) -> RepositoryResult<()> {
        if T::APPEND_ONLY {
            return Err(RepositoryError::ImmutableEntity(T::ENTITY_NAME.to_string()));
        }
        let mut records = self.get_records()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(RepositoryError::not_found(T::ENTITY_NAME, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoilMovement, GroundLocation, LocationPatch, MovementType};

    #[test]
    fn test_create_assigns_id_and_get() {
        let store = MemoryStore::<GroundLocation>::new();
        let created = store.create(GroundLocation::new("A-01", "A", "Z1", 50.0)).unwrap();
        assert!(!created.id.is_empty());

        let found = store.get(&created.id).unwrap().unwrap();
        assert_eq!(found.location_code, "A-01");
    }

    #[test]
    fn test_update_applies_patch() {
        let store = MemoryStore::<GroundLocation>::new();
        let created = store.create(GroundLocation::new("A-01", "A", "Z1", 50.0)).unwrap();

        let patch = LocationPatch {
            capacity_tons: Some(80.0),
            ..LocationPatch::default()
        };
        store.update(&created.id, &patch).unwrap();
        assert_eq!(store.get(&created.id).unwrap().unwrap().capacity_tons, 80.0);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = MemoryStore::<GroundLocation>::new();
        let err = store.update("nope", &LocationPatch::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_fail_update_after() {
        let store = MemoryStore::<GroundLocation>::new();
        let created = store.create(GroundLocation::new("A-01", "A", "Z1", 50.0)).unwrap();
        store.fail_update_after(1);

        assert!(store.update(&created.id, &LocationPatch::default()).is_ok());
        assert!(store.update(&created.id, &LocationPatch::default()).is_err());
        // 故障只触发一次
        assert!(store.update(&created.id, &LocationPatch::default()).is_ok());
    }

    #[test]
    fn test_movements_are_append_only() {
        let store = MemoryStore::<CoilMovement>::new();
        let m = store
            .create(CoilMovement::new("C1", "Unassigned", "A-01-L1", MovementType::Receipt, "user", "test"))
            .unwrap();
        let err = store.delete(&m.id).unwrap_err();
        assert!(matches!(err, RepositoryError::ImmutableEntity(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_filter_and_bulk_create() {
        let store = MemoryStore::<GroundLocation>::new();
        store
            .bulk_create(vec![
                GroundLocation::new("A-01", "A", "Z1", 50.0),
                GroundLocation::new("A-02", "A", "Z2", 50.0),
                GroundLocation::new("B-01", "B", "Z1", 50.0),
            ])
            .unwrap();

        let bay_a = store.filter(&|l: &GroundLocation| l.bay == "A").unwrap();
        assert_eq!(bay_a.len(), 2);
    }
}
