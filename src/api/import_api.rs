// ==========================================
// 仓储资产导入引擎 - 导入 API
// ==========================================
// 职责: 面向界面/命令行的导入入口
// 流程: 预览（列映射 + 试运行校验）→ 人工覆写映射 → 提交导入 → 记录批次
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::import::{
    ChildRecord, ColumnMapping, ImportBatch, ImportOutcome, ParentRecord, ParsedSheet, RawRow,
    RowMessage,
};
use crate::domain::schema::FieldSchema;
use crate::domain::types::{EntityFamily, EntityId};
use crate::i18n;
use crate::importer::{
    builtin_schema, ensure_schema, FileParser, ImportActivity, ImportObserver,
    ImportOrchestrator, UniversalFileParser,
};
use crate::repository::{InventoryRepository, InventoryRepositoryImpl, RepositorySink};
use serde::{Deserialize, Serialize};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 人工覆写的列映射（field 为 None 表示取消映射）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOverride {
    pub header: String,
    pub field: Option<String>,
}

impl MappingOverride {
    /// 解析 "表头=字段" 形式（字段为空表示取消映射）
    pub fn parse(raw: &str) -> ApiResult<Self> {
        let (header, field) = raw
            .split_once('=')
            .ok_or_else(|| ApiError::InvalidInput(format!("映射格式应为 表头=字段: {}", raw)))?;
        let field = field.trim();
        Ok(Self {
            header: header.trim().to_string(),
            field: (!field.is_empty()).then(|| field.to_string()),
        })
    }
}

/// 提交前预览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub family: EntityFamily,
    pub headers: Vec<String>,
    pub mapping: ColumnMapping,
    pub unmapped_headers: Vec<String>,
    /// 前 N 行原始数据
    pub sample_rows: Vec<RawRow>,
    /// 试运行校验消息（文件顺序）
    pub validation: Vec<RowMessage>,
    pub total_rows: usize,
}

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID
    pub batch_id: String,
    pub family: EntityFamily,
    /// 完整结果（含全部错误与提示）
    pub outcome: ImportOutcome,
    /// 本地化汇总文案
    pub summary: String,
    /// 界面展示用的错误预览（按配置截断）
    pub error_preview: Vec<RowMessage>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
    /// 批次记录是否已写入（行数据已保存，批次写入失败时为 false）
    pub batch_recorded: bool,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi<R, C>
where
    R: InventoryRepository,
    C: ImportConfigReader,
{
    repo: R,
    config: C,
    parser: Box<dyn FileParser>,
    orchestrator: ImportOrchestrator,
    activity: ImportActivity,
}

impl ImportApi<InventoryRepositoryImpl, ConfigManager> {
    /// 基于 SQLite 文件创建 API（仓储与配置共用同一连接）
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(conn));

        let repo = InventoryRepositoryImpl::from_connection(conn.clone())?;
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::new(repo, config))
    }
}

impl<R, C> ImportApi<R, C>
where
    R: InventoryRepository,
    C: ImportConfigReader,
{
    pub fn new(repo: R, config: C) -> Self {
        Self {
            repo,
            config,
            parser: Box::new(UniversalFileParser),
            orchestrator: ImportOrchestrator::new(),
            activity: ImportActivity::new(),
        }
    }

    /// 替换文件解析器
    pub fn with_parser(mut self, parser: Box<dyn FileParser>) -> Self {
        self.parser = parser;
        self
    }

    /// 导入进行中标志（供实时刷新协作方查询）
    pub fn activity(&self) -> ImportActivity {
        self.activity.clone()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// 获取生效的字段模式（配置覆写优先）
    pub async fn resolve_schema(&self, family: EntityFamily) -> ApiResult<FieldSchema> {
        let custom = self
            .config
            .get_custom_schema(family)
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let schema = custom.unwrap_or_else(|| builtin_schema(family));
        ensure_schema(&schema)?;
        Ok(schema)
    }

    async fn apply_configured_locale(&self) -> ApiResult<()> {
        let locale = self
            .config
            .get_locale()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        i18n::apply_locale(&locale);
        Ok(())
    }

    fn parse_file(&self, file_path: &Path) -> ApiResult<ParsedSheet> {
        Ok(self.parser.parse(file_path)?)
    }

    /// 生成列映射并应用人工覆写
    fn build_mapping(
        &self,
        sheet: &ParsedSheet,
        schema: &FieldSchema,
        overrides: &[MappingOverride],
    ) -> ApiResult<ColumnMapping> {
        let mut mapping = self.orchestrator.classify(&sheet.headers, schema);
        for o in overrides {
            if let Some(field) = &o.field {
                if !schema.contains(field) {
                    return Err(ApiError::InvalidInput(format!(
                        "字段 {} 不属于 {} 模式",
                        field, schema.family
                    )));
                }
            }
            if !mapping.assign_header(&o.header, o.field.clone()) {
                return Err(ApiError::InvalidInput(format!("文件中没有列: {}", o.header)));
            }
        }
        Ok(mapping)
    }

    /// 预览导入
    ///
    /// # 参数
    /// - file_path: 文件路径（.xlsx/.xls/.csv）
    /// - family: 实体族
    /// - overrides: 人工覆写的列映射
    pub async fn preview(
        &self,
        file_path: &Path,
        family: EntityFamily,
        overrides: &[MappingOverride],
    ) -> ApiResult<ImportPreview> {
        self.apply_configured_locale().await?;
        let schema = self.resolve_schema(family).await?;
        let preview_rows = self
            .config
            .get_preview_rows()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let sheet = self.parse_file(file_path)?;
        let mapping = self.build_mapping(&sheet, &schema, overrides)?;
        let validation = self
            .orchestrator
            .validate_rows(&mapping, &sheet.rows, &schema);

        Ok(ImportPreview {
            family,
            unmapped_headers: mapping
                .unmapped_headers()
                .into_iter()
                .map(str::to_string)
                .collect(),
            sample_rows: sheet.rows.iter().take(preview_rows).cloned().collect(),
            total_rows: sheet.total_rows(),
            headers: sheet.headers,
            mapping,
            validation,
        })
    }

    /// 提交导入
    ///
    /// # 参数
    /// - file_path: 文件路径（.xlsx/.xls/.csv）
    /// - family: 实体族
    /// - overrides: 人工覆写的列映射
    /// - observer: 进度与取消
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 行级失败记录在 outcome 中
    /// - Err(ApiError): 文件/模式/配置错误，或已有导入在进行
    #[instrument(skip(self, overrides, observer), fields(file = %file_path.display(), family = %family))]
    pub async fn import_file<O>(
        &self,
        file_path: &Path,
        family: EntityFamily,
        overrides: &[MappingOverride],
        observer: &mut O,
    ) -> ApiResult<ImportApiResponse>
    where
        O: ImportObserver + ?Sized,
    {
        let _guard = self.activity.begin().ok_or(ApiError::ImportInProgress)?;
        let start_time = Instant::now();

        self.apply_configured_locale().await?;
        let schema = self.resolve_schema(family).await?;
        let limit = self
            .config
            .get_error_preview_limit()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let sheet = self.parse_file(file_path)?;
        let mapping = self.build_mapping(&sheet, &schema, overrides)?;

        let batch_id = Uuid::new_v4().to_string();
        let sink = RepositorySink::new(&self.repo, &schema, batch_id.clone());
        let outcome = self
            .orchestrator
            .run_with_mapping(&mapping, &sheet.rows, &schema, &sink, observer)
            .await?;

        // 行数据已写入，之后的失败只影响批次记录，结果照常返回
        let elapsed_ms = start_time.elapsed().as_millis() as i64;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        let batch = ImportBatch::from_outcome(batch_id.clone(), family, file_name, &outcome, elapsed_ms);
        let batch_recorded = match self.repo.insert_batch(&batch).await {
            Ok(()) => {
                info!(batch_id = %batch_id, elapsed_ms, "导入批次已记录");
                true
            }
            Err(e) => {
                warn!(batch_id = %batch_id, error = %e, "导入批次记录失败，行数据已保存");
                false
            }
        };

        Ok(ImportApiResponse {
            batch_id,
            family,
            summary: outcome.summary_message(),
            error_preview: outcome.error_preview(limit).to_vec(),
            outcome,
            elapsed_ms,
            batch_recorded,
        })
    }

    /// 父实体列表（创建顺序）
    pub async fn list_parents(&self, family: EntityFamily) -> ApiResult<Vec<ParentRecord>> {
        Ok(self.repo.list_parents(family).await?)
    }

    /// 子实体列表（创建顺序）
    pub async fn list_children(&self, parent_id: EntityId) -> ApiResult<Vec<ChildRecord>> {
        Ok(self.repo.list_children(parent_id).await?)
    }

    /// 最近的导入批次
    pub async fn recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        Ok(self.repo.get_recent_batches(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::NoopObserver;
    use std::io::Write;

    fn memory_api() -> ImportApi<InventoryRepositoryImpl, ConfigManager> {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let repo = InventoryRepositoryImpl::from_connection(conn.clone()).unwrap();
        let config = ConfigManager::from_connection(conn).unwrap();
        ImportApi::new(repo, config)
    }

    // 导入会按配置切换全局语言，与 i18n 测试串行
    fn locale_guard() -> std::sync::MutexGuard<'static, ()> {
        crate::i18n::LOCALE_TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_preview_then_import() {
        let _locale = locale_guard();
        let api = memory_api();
        let file = csv_file(
            "Unidad,Responsable,Equipo,Fecha compra\n\
             Almacén,Ana,Laptop,2020\n\
             ,,Monitor,2021\n",
        );

        let preview = api
            .preview(file.path(), EntityFamily::Activos, &[])
            .await
            .unwrap();
        assert_eq!(preview.total_rows, 2);
        assert_eq!(preview.unmapped_headers, vec!["Fecha compra".to_string()]);
        assert!(preview.validation.is_empty());

        let mut observer = NoopObserver;
        let response = api
            .import_file(file.path(), EntityFamily::Activos, &[], &mut observer)
            .await
            .unwrap();
        assert_eq!(response.outcome.succeeded, 2);
        assert_eq!(response.outcome.parents_created, 1);
        assert!(!api.activity().is_active());

        let batches = api.recent_batches(5).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].batch_id, response.batch_id);
    }

    #[tokio::test]
    async fn test_override_unknown_header_rejected() {
        let _locale = locale_guard();
        let api = memory_api();
        let file = csv_file("Unidad,Responsable,Equipo\nAlmacén,Ana,Laptop\n");
        let overrides = vec![MappingOverride {
            header: "No existe".to_string(),
            field: Some("equipo".to_string()),
        }];

        let result = api
            .preview(file.path(), EntityFamily::Activos, &overrides)
            .await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_import_rejected_while_active() {
        let _locale = locale_guard();
        let api = memory_api();
        let file = csv_file("Unidad,Responsable,Equipo\nAlmacén,Ana,Laptop\n");
        let activity = api.activity();
        let _guard = activity.begin().unwrap();

        let mut observer = NoopObserver;
        let result = api
            .import_file(file.path(), EntityFamily::Activos, &[], &mut observer)
            .await;
        assert!(matches!(result, Err(ApiError::ImportInProgress)));
        assert!(api.list_parents(EntityFamily::Activos).await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_mapping_override() {
        let o = MappingOverride::parse(" Serie antigua = numero_serie ").unwrap();
        assert_eq!(o.header, "Serie antigua");
        assert_eq!(o.field.as_deref(), Some("numero_serie"));

        let o = MappingOverride::parse("Fecha=").unwrap();
        assert!(o.field.is_none());

        assert!(matches!(
            MappingOverride::parse("sin igual"),
            Err(ApiError::InvalidInput(_))
        ));
    }
}
