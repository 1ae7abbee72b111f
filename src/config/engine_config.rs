// ==========================================
// 钢卷库区管理系统 - 引擎参数
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 盘点提交策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// 逐条执行,失败不中断,全部尝试后将盘点单置为已对账
    #[default]
    BestEffort,
    /// 先在内存副本上预演全部变更,任一失败则不写入;
    /// 实际写入时遇到失败立即停止,盘点单保持 completed
    Strict,
}

impl CommitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitPolicy::BestEffort => "best_effort",
            CommitPolicy::Strict => "strict",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "best_effort" | "best-effort" => Some(CommitPolicy::BestEffort),
            "strict" => Some(CommitPolicy::Strict),
            _ => None,
        }
    }
}

impl fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// EngineConfig - 引擎参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub commit_policy: CommitPolicy,
    /// 倒垛评分阈值（严格大于即需倒垛）
    pub shuffle_priority_threshold: u32,
    /// 在库天数阈值（严格大于即需倒垛）
    pub shuffle_max_days_in_yard: i64,
    /// 最高层数
    pub max_layer: u8,
    /// 承托候选的行/列搜索半径
    pub support_search_radius: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commit_policy: CommitPolicy::BestEffort,
            shuffle_priority_threshold: 40,
            shuffle_max_days_in_yard: 30,
            max_layer: 3,
            support_search_radius: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_policy_parse() {
        assert_eq!(CommitPolicy::parse("STRICT"), Some(CommitPolicy::Strict));
        assert_eq!(CommitPolicy::parse("best-effort"), Some(CommitPolicy::BestEffort));
        assert_eq!(CommitPolicy::parse("sometimes"), None);
        assert_eq!(CommitPolicy::default(), CommitPolicy::BestEffort);
    }
}
