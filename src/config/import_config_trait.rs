// ==========================================
// 仓储资产导入引擎 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::schema::FieldSchema;
use crate::domain::types::EntityFamily;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入 API 所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取界面/消息语言
    ///
    /// # 默认值
    /// - "es"
    async fn get_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 获取界面展示的错误条数上限（引擎始终返回完整列表）
    ///
    /// # 默认值
    /// - 10
    async fn get_error_preview_limit(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取提交前预览的数据行数
    ///
    /// # 默认值
    /// - 5
    async fn get_preview_rows(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取覆写的字段模式
    ///
    /// # 返回
    /// - Ok(Some(schema)): 已配置覆写
    /// - Ok(None): 使用内置模式
    async fn get_custom_schema(
        &self,
        family: EntityFamily,
    ) -> Result<Option<FieldSchema>, Box<dyn Error>>;
}
