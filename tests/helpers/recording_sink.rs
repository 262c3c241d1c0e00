// ==========================================
// 记录调用的内存 Sink / 取消观察者
// ==========================================

use async_trait::async_trait;
use asset_import::domain::{EntityId, FieldMap};
use asset_import::importer::{ImportError, ImportObserver, ImportResult, ImportSink};
use std::sync::Mutex;

/// 单次 sink 调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Parent { id: EntityId, fields: FieldMap },
    Child { id: EntityId, parent_id: EntityId, fields: FieldMap },
}

/// 按顺序记录全部调用；可对指定值模拟持久化失败
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    next_id: Mutex<EntityId>,
    fail_child_on: Option<String>,
    fail_parent_on: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 子实体任一字段等于 value 时 create_child 失败
    pub fn failing_child(value: &str) -> Self {
        Self {
            fail_child_on: Some(value.to_string()),
            ..Self::default()
        }
    }

    /// 父实体任一字段等于 value 时 create_parent 失败
    pub fn failing_parent(value: &str) -> Self {
        Self {
            fail_parent_on: Some(value.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn parents(&self) -> Vec<(EntityId, FieldMap)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Parent { id, fields } => Some((id, fields)),
                SinkCall::Child { .. } => None,
            })
            .collect()
    }

    pub fn children(&self) -> Vec<(EntityId, FieldMap)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Child { parent_id, fields, .. } => Some((parent_id, fields)),
                SinkCall::Parent { .. } => None,
            })
            .collect()
    }

    fn next(&self) -> EntityId {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    fn hits(target: &Option<String>, fields: &FieldMap) -> bool {
        target
            .as_deref()
            .is_some_and(|v| fields.values().any(|f| f == v))
    }
}

#[async_trait]
impl ImportSink for RecordingSink {
    async fn create_parent(&self, fields: &FieldMap) -> ImportResult<EntityId> {
        if Self::hits(&self.fail_parent_on, fields) {
            return Err(ImportError::Persistence("parent rejected".into()));
        }
        let id = self.next();
        self.calls.lock().unwrap().push(SinkCall::Parent {
            id,
            fields: fields.clone(),
        });
        Ok(id)
    }

    async fn create_child(&self, parent_id: EntityId, fields: &FieldMap) -> ImportResult<EntityId> {
        if Self::hits(&self.fail_child_on, fields) {
            return Err(ImportError::Persistence("child rejected".into()));
        }
        let id = self.next();
        self.calls.lock().unwrap().push(SinkCall::Child {
            id,
            parent_id,
            fields: fields.clone(),
        });
        Ok(id)
    }
}

/// 处理完 limit 行后请求取消
pub struct CancelAfter {
    pub limit: usize,
    pub seen: usize,
    pub progress: Vec<(usize, usize)>,
}

impl CancelAfter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: 0,
            progress: Vec::new(),
        }
    }
}

impl ImportObserver for CancelAfter {
    fn on_progress(&mut self, current: usize, total: usize) {
        self.seen = current;
        self.progress.push((current, total));
    }

    fn is_cancelled(&self) -> bool {
        self.seen >= self.limit
    }
}
