// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use asset_import::config::ImportConfigReader;
use asset_import::domain::{EntityFamily, FieldSchema};
use std::collections::HashMap;
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub locale: String,
    pub error_preview_limit: usize,
    pub preview_rows: usize,
    pub schemas: HashMap<EntityFamily, FieldSchema>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            locale: "es".to_string(),
            error_preview_limit: 10,
            preview_rows: 5,
            schemas: HashMap::new(),
        }
    }
}

impl MockConfig {
    /// 错误预览条数
    pub fn with_error_limit(limit: usize) -> Self {
        Self {
            error_preview_limit: limit,
            ..Self::default()
        }
    }

    /// 字段模式覆写
    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.schemas.insert(schema.family, schema);
        self
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.locale.clone())
    }

    async fn get_error_preview_limit(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.error_preview_limit)
    }

    async fn get_preview_rows(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.preview_rows)
    }

    async fn get_custom_schema(
        &self,
        family: EntityFamily,
    ) -> Result<Option<FieldSchema>, Box<dyn Error>> {
        Ok(self.schemas.get(&family).cloned())
    }
}
