// ==========================================
// 仓储资产导入引擎 - 领域模型层
// ==========================================
// 职责: 定义字段模式、导入中间对象、结果类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use import::{
    ChildRecord, ColumnAssignment, ColumnMapping, FieldMap, ImportBatch, ImportOutcome,
    NormalizedRow, ParentRecord, ParsedSheet, RawRow, RowMessage,
};
pub use schema::{FieldSchema, FieldSpec};
pub use types::{EntityFamily, EntityId};
