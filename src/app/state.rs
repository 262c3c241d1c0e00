// ==========================================
// 仓储资产导入引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiResult, ImportApi};
use crate::config::ConfigManager;
use crate::repository::InventoryRepositoryImpl;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "ASSET_IMPORT_DB_PATH";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 导入API
    pub import_api: Arc<ImportApi<InventoryRepositoryImpl, ConfigManager>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动建表）
    pub fn new(db_path: String) -> ApiResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);
        let import_api = Arc::new(ImportApi::open(&db_path)?);
        Ok(Self {
            db_path,
            import_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 ASSET_IMPORT_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./asset_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("asset-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("asset_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
