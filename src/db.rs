// ==========================================
// 钢卷库区管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 提供幂等的建表脚本
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 默认数据库路径
///
/// 优先级: 环境变量 COIL_YARD_DB_PATH > 用户数据目录 > 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("COIL_YARD_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./coil_yard.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("coil-yard");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("coil_yard.db");
        }
    }
    path.to_string_lossy().to_string()
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表脚本
///
/// 说明: 库位与钢卷之间的引用不建外键,
/// 双向一致性由分配引擎维护（与远端实体存储的语义保持一致）。
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS storage_location (
    id TEXT PRIMARY KEY,
    location_code TEXT NOT NULL UNIQUE,
    bay TEXT NOT NULL,
    zone TEXT NOT NULL,
    row_num INTEGER,
    col_num INTEGER,
    capacity_tons REAL NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_visible INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS stacking_position (
    id TEXT PRIMARY KEY,
    placeholder_id TEXT NOT NULL UNIQUE,
    layer INTEGER NOT NULL CHECK (layer BETWEEN 1 AND 3),
    position_type TEXT NOT NULL,
    primary_ground_location_id TEXT NOT NULL,
    primary_ground_location_code TEXT,
    supported_by_ground_location_ids TEXT NOT NULL,
    bay TEXT NOT NULL,
    zone TEXT,
    coil_barcode TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_visible INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_stacking_position_bay_zone
    ON stacking_position (bay, zone);

CREATE TABLE IF NOT EXISTS coil (
    id TEXT PRIMARY KEY,
    barcode TEXT NOT NULL UNIQUE,
    weight_tons REAL NOT NULL,
    thickness_mm REAL,
    width_mm REAL,
    diameter_mm REAL,
    coil_type TEXT,
    status TEXT NOT NULL,
    current_stacking_position_id TEXT,
    storage_location TEXT,
    received_date TEXT,
    last_moved_date TEXT,
    priority TEXT
);

CREATE TABLE IF NOT EXISTS coil_movement (
    id TEXT PRIMARY KEY,
    coil_barcode TEXT NOT NULL,
    from_location TEXT NOT NULL,
    to_location TEXT NOT NULL,
    movement_type TEXT NOT NULL,
    movement_date TEXT NOT NULL,
    moved_by TEXT NOT NULL,
    reason TEXT NOT NULL,
    remarks TEXT
);

CREATE INDEX IF NOT EXISTS idx_coil_movement_barcode
    ON coil_movement (coil_barcode);

CREATE TABLE IF NOT EXISTS stock_take (
    id TEXT PRIMARY KEY,
    stock_take_date TEXT NOT NULL,
    location TEXT NOT NULL,
    bay TEXT NOT NULL,
    zone TEXT,
    physical_count INTEGER NOT NULL,
    system_count INTEGER NOT NULL,
    variance INTEGER NOT NULL,
    coils_found_json TEXT NOT NULL,
    non_traceable_coils_json TEXT NOT NULL,
    empty_placeholders_json TEXT NOT NULL,
    remarks TEXT,
    status TEXT NOT NULL
);
"#;

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
