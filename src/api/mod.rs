// ==========================================
// 仓储资产导入引擎 - API 层
// ==========================================
// 职责: 提供导入 API 接口,供命令行/界面调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse, ImportPreview, MappingOverride};
