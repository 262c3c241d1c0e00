// ==========================================
// 仓储资产导入引擎 - 导入协作方 Trait
// ==========================================
// 职责: 定义导入引擎与外部协作方之间的接口（不包含实现）
// 协作方: 文件解码 / 持久化 / 进度与取消
// ==========================================

use crate::domain::import::{FieldMap, ParsedSheet};
use crate::domain::types::EntityId;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 将文件解码为表头 + 数据行
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表格
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 表头（第 1 行）与数据行（文件顺序，跳过全空行）
    /// - Err: 文件不存在、格式错误
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

// ==========================================
// ImportSink Trait
// ==========================================
// 用途: 持久化协作方（每次调用都新建记录，去重由引擎负责）
// 实现者: RepositorySink（SQLite）、测试中的记录型 Mock
#[async_trait]
pub trait ImportSink: Send + Sync {
    /// 新建父实体
    ///
    /// # 参数
    /// - fields: 父实体字段（复合键字段 + 父属性，保持原始大小写）
    async fn create_parent(&self, fields: &FieldMap) -> ImportResult<EntityId>;

    /// 新建子实体并挂到父实体下
    ///
    /// # 参数
    /// - parent_id: 已解析的父实体 ID
    /// - fields: 子实体字段（除父实体字段外的全部规范字段）
    async fn create_child(&self, parent_id: EntityId, fields: &FieldMap)
        -> ImportResult<EntityId>;
}

// ==========================================
// ImportObserver Trait
// ==========================================
// 用途: 进度回报 + 取消检查（每行轮询一次）
pub trait ImportObserver: Send {
    /// 每处理完一行调用一次（无论成败）
    fn on_progress(&mut self, _current: usize, _total: usize) {}

    /// 调用方请求中止时返回 true
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// 不关心进度的调用方
pub struct NoopObserver;

impl ImportObserver for NoopObserver {}

/// 以闭包回报进度
pub struct ProgressFn<F>(pub F);

impl<F> ImportObserver for ProgressFn<F>
where
    F: FnMut(usize, usize) + Send,
{
    fn on_progress(&mut self, current: usize, total: usize) {
        (self.0)(current, total)
    }
}
