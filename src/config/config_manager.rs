// ==========================================
// 钢卷库区管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config::{CommitPolicy, EngineConfig};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析数值配置,缺失或格式错误时使用默认值
    fn get_parsed_or_default<T: FromStr + Copy + std::fmt::Display>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, Box<dyn Error>> {
        match self.get_global_config_value(key)? {
            Some(raw) => Ok(raw.trim().parse::<T>().unwrap_or_else(|_| {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                default
            })),
            None => Ok(default),
        }
    }

    /// 构建引擎参数（逐项回退到默认值）
    pub fn load_engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        let defaults = EngineConfig::default();

        let commit_policy = match self.get_global_config_value(config_keys::COMMIT_POLICY)? {
            Some(raw) => CommitPolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(raw_value = %raw, "提交策略配置无法识别，使用 best_effort");
                defaults.commit_policy
            }),
            None => defaults.commit_policy,
        };

        Ok(EngineConfig {
            commit_policy,
            shuffle_priority_threshold: self.get_parsed_or_default(
                config_keys::SHUFFLE_PRIORITY_THRESHOLD,
                defaults.shuffle_priority_threshold,
            )?,
            shuffle_max_days_in_yard: self.get_parsed_or_default(
                config_keys::SHUFFLE_MAX_DAYS_IN_YARD,
                defaults.shuffle_max_days_in_yard,
            )?,
            max_layer: self.get_parsed_or_default(config_keys::MAX_LAYER, defaults.max_layer)?,
            support_search_radius: self.get_parsed_or_default(
                config_keys::SUPPORT_SEARCH_RADIUS,
                defaults.support_search_radius,
            )?,
        })
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖现有的global配置
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 盘点对账
    pub const COMMIT_POLICY: &str = "commit_policy";

    // 倒垛
    pub const SHUFFLE_PRIORITY_THRESHOLD: &str = "shuffle_priority_threshold";
    pub const SHUFFLE_MAX_DAYS_IN_YARD: &str = "shuffle_max_days_in_yard";

    // 库区布局
    pub const MAX_LAYER: &str = "max_layer";
    pub const SUPPORT_SEARCH_RADIUS: &str = "support_search_radius";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = manager().load_engine_config().unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let m = manager();
        m.set_global_config_value(config_keys::COMMIT_POLICY, "strict").unwrap();
        m.set_global_config_value(config_keys::MAX_LAYER, "2").unwrap();
        m.set_global_config_value(config_keys::SHUFFLE_MAX_DAYS_IN_YARD, "abc").unwrap();

        let config = m.load_engine_config().unwrap();
        assert_eq!(config.commit_policy, CommitPolicy::Strict);
        assert_eq!(config.max_layer, 2);
        assert_eq!(config.shuffle_max_days_in_yard, 30);
    }

    #[test]
    fn test_snapshot_restore() {
        let m = manager();
        m.set_global_config_value(config_keys::SHUFFLE_PRIORITY_THRESHOLD, "55").unwrap();
        let snapshot = m.get_config_snapshot().unwrap();

        m.set_global_config_value(config_keys::SHUFFLE_PRIORITY_THRESHOLD, "10").unwrap();
        assert_eq!(m.restore_config_from_snapshot(&snapshot).unwrap(), 1);
        assert_eq!(
            m.get_global_config_value(config_keys::SHUFFLE_PRIORITY_THRESHOLD).unwrap(),
            Some("55".to_string())
        );
    }
}
