// ==========================================
// 钢卷库区管理系统 - SQLite 实体存储
// ==========================================
// 职责: 以 rusqlite 实现 EntityStore
// 约束: 所有查询使用参数化
// 说明: update 为"读取-应用 Patch-整行回写",list 型字段存为 JSON 文本
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entity::Entity;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{new_record_id, EntityStore};
use rusqlite::{params_from_iter, types::Value, Connection, OptionalExtension, Row};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteEntity - 行映射契约
// ==========================================
pub trait SqliteEntity: Entity {
    /// 表名
    const TABLE: &'static str;

    /// 列名（第一列必须为主键 id）
    const COLUMNS: &'static [&'static str];

    /// 行 → 实体
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// 实体 → 参数（顺序与 COLUMNS 一致）
    fn to_values(&self) -> RepositoryResult<Vec<Value>>;
}

// ==========================================
// SqliteStore - SQLite 实体存储
// ==========================================
pub struct SqliteStore<T: SqliteEntity> {
    conn: Arc<Mutex<Connection>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SqliteEntity> SqliteStore<T> {
    /// 打开数据库文件创建存储
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建存储（多个实体共享同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            _marker: PhantomData,
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn select_sql() -> String {
        format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
    }

    fn insert_sql() -> String {
        let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders
        )
    }

    fn update_sql() -> String {
        let assignments = T::COLUMNS[1..]
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", c, i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE {} SET {} WHERE id = ?1", T::TABLE, assignments)
    }

    fn find_in(conn: &Connection, id: &str) -> RepositoryResult<Option<T>> {
        let sql = format!("{} WHERE id = ?1", Self::select_sql());
        let record = conn.query_row(&sql, [id], |row| T::from_row(row)).optional()?;
        Ok(record)
    }

    fn prepare_for_insert(mut record: T) -> T {
        if record.id().is_empty() {
            record.set_id(new_record_id());
        }
        record
    }
}

impl<T: SqliteEntity> EntityStore<T> for SqliteStore<T> {
    fn list(&self) -> RepositoryResult<Vec<T>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY rowid", Self::select_sql());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| T::from_row(row))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn get(&self, id: &str) -> RepositoryResult<Option<T>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, id)
    }

    fn create(&self, record: T) -> RepositoryResult<T> {
        let record = Self::prepare_for_insert(record);
        let conn = self.get_conn()?;
        conn.execute(&Self::insert_sql(), params_from_iter(record.to_values()?))?;
        Ok(record)
    }

    fn update(&self, id: &str, patch: &T::Patch) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut record =
            Self::find_in(&tx, id)?.ok_or_else(|| RepositoryError::not_found(T::ENTITY_NAME, id))?;
        record.apply_patch(patch);
        tx.execute(&Self::update_sql(), params_from_iter(record.to_values()?))?;

        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: &str) -> RepositoryResult<()> {
        if T::APPEND_ONLY {
            return Err(RepositoryError::ImmutableEntity(T::ENTITY_NAME.to_string()));
        }
        let conn = self.get_conn()?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        let rows = conn.execute(&sql, [id])?;
        if rows == 0 {
            return Err(RepositoryError::not_found(T::ENTITY_NAME, id));
        }
        Ok(())
    }

    fn bulk_create(&self, records: Vec<T>) -> RepositoryResult<Vec<T>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let sql = Self::insert_sql();
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            let record = Self::prepare_for_insert(record);
            tx.execute(&sql, params_from_iter(record.to_values()?))?;
            created.push(record);
        }

        tx.commit()?;
        Ok(created)
    }
}

// ==========================================
// 行映射辅助函数
// ==========================================

/// 日期时间存储格式
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub(crate) fn opt_text(s: Option<&str>) -> Value {
    s.map(text).unwrap_or(Value::Null)
}

pub(crate) fn boolean(b: bool) -> Value {
    Value::Integer(b as i64)
}

pub(crate) fn datetime(dt: Option<chrono::NaiveDateTime>) -> Value {
    dt.map(|d| Value::Text(d.format(DATETIME_FORMAT).to_string()))
        .unwrap_or(Value::Null)
}

pub(crate) fn json<S: serde::Serialize>(value: &S) -> RepositoryResult<Value> {
    Ok(Value::Text(serde_json::to_string(value)?))
}

pub(crate) fn parse_datetime(raw: Option<String>) -> Option<chrono::NaiveDateTime> {
    raw.and_then(|s| chrono::NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT).ok())
}

pub(crate) fn parse_json<D: serde::de::DeserializeOwned>(
    idx: usize,
    raw: String,
) -> rusqlite::Result<D> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::<dyn std::error::Error + Send + Sync>::from(message),
    )
}
