// ==========================================
// 仓储资产导入引擎 - 领域类型定义
// ==========================================
// 职责: 导入实体族、实体 ID 等基础类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 持久化实体 ID（由持久化协作方分配，SQLite rowid）
pub type EntityId = i64;

// ==========================================
// 导入实体族 (Entity Family)
// ==========================================
// 每个实体族对应一套 FieldSchema
// 序列化格式: 小写（与数据库/配置键一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityFamily {
    Activos, // 电脑类资产（父实体: 责任人）
    Pdas,    // PDA 设备
    Tablets, // 平板设备
}

impl EntityFamily {
    pub const ALL: [EntityFamily; 3] = [
        EntityFamily::Activos,
        EntityFamily::Pdas,
        EntityFamily::Tablets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityFamily::Activos => "activos",
            EntityFamily::Pdas => "pdas",
            EntityFamily::Tablets => "tablets",
        }
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "activos" | "assets" | "activo" => Ok(EntityFamily::Activos),
            "pdas" | "pda" => Ok(EntityFamily::Pdas),
            "tablets" | "tablet" => Ok(EntityFamily::Tablets),
            other => Err(format!("未知的实体族: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_round_trip_str() {
        for family in EntityFamily::ALL {
            assert_eq!(family.as_str().parse::<EntityFamily>().unwrap(), family);
        }
    }

    #[test]
    fn test_family_aliases() {
        assert_eq!("Assets".parse::<EntityFamily>().unwrap(), EntityFamily::Activos);
        assert_eq!(" PDA ".parse::<EntityFamily>().unwrap(), EntityFamily::Pdas);
        assert!("laptops".parse::<EntityFamily>().is_err());
    }

    #[test]
    fn test_family_serde_lowercase() {
        let json = serde_json::to_string(&EntityFamily::Tablets).unwrap();
        assert_eq!(json, "\"tablets\"");
    }
}
