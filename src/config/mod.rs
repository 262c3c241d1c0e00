// ==========================================
// 仓储资产导入引擎 - 配置层
// ==========================================
// 职责: 语言、界面预览上限、字段模式覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
