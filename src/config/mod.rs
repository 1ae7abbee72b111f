// ==========================================
// 钢卷库区管理系统 - 配置层
// ==========================================
// 职责: 引擎参数与系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::{CommitPolicy, EngineConfig};
