// ==========================================
// 仓储资产导入引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 电子表格 → 父/子实体对账导入（资产、PDA、平板）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 字段模式与导入对象
pub mod domain;

// 导入层 - 列识别/延续/校验/父实体解析
pub mod importer;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ColumnMapping, EntityFamily, EntityId, FieldSchema, FieldSpec, ImportBatch, ImportOutcome,
    RawRow, RowMessage,
};

// 导入引擎
pub use importer::{
    builtin_schema, HeaderClassifier, ImportObserver, ImportOrchestrator, ImportSink,
};

// API
pub use api::{ImportApi, ImportApiResponse, ImportPreview, MappingOverride};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "asset-import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_builtin_schemas_are_valid() {
        for family in EntityFamily::ALL {
            assert!(importer::ensure_schema(&builtin_schema(family)).is_ok());
        }
    }
}
