// ==========================================
// 仓储资产导入引擎 - 导入层
// ==========================================
// 职责: 电子表格 → 父/子实体（资产、PDA、平板）
// 流程: 列识别 → 规范化 → 上下文延续 → 校验 → 父实体解析 → 子实体创建
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod activity;
pub mod carry_forward;
pub mod entity_resolver;
pub mod error;
pub mod file_parser;
pub mod header_classifier;
pub mod import_trait;
pub mod orchestrator;
pub mod row_normalizer;
pub mod row_validator;
pub mod schemas;

// 重导出核心类型
pub use activity::{ImportActivity, ImportActivityGuard};
pub use carry_forward::{ContextCarryForward, ImportContext};
pub use entity_resolver::{composite_key, composite_key_of, EntityResolver, ParentEntityCache};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use header_classifier::HeaderClassifier;
pub use orchestrator::{ensure_schema, ImportOrchestrator};
pub use row_normalizer::RowNormalizer;
pub use row_validator::{IssueKind, RowValidator, ValidationIssue};
pub use schemas::{assets_schema, builtin_schema, pdas_schema, tablets_schema};

// 重导出 Trait 接口
pub use import_trait::{FileParser, ImportObserver, ImportSink, NoopObserver, ProgressFn};
