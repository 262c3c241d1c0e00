// ==========================================
// 仓储资产导入引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::schema::FieldSchema;
use crate::domain::types::EntityFamily;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
            init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取非负整数配置；格式错误时记录告警并使用默认值
    fn get_usize_or_default(&self, key: &str, default: usize) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.trim().parse::<usize>().unwrap_or_else(|_| {
            warn!(config_key = key, raw_value = %value, "配置格式错误，使用默认值");
            default
        }))
    }

    /// 保存字段模式覆写（存储于 config_kv: import/schema/{family}）
    pub fn set_custom_schema(&self, schema: &FieldSchema) -> Result<(), Box<dyn Error>> {
        let raw = serde_json::to_string(schema)?;
        self.set_global_config_value(&config_keys::schema_key(schema.family), &raw)
    }

    /// 获取所有配置的快照（键有序）
    pub fn get_config_snapshot(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOCALE, crate::i18n::DEFAULT_LOCALE)?;
        Ok(value.trim().to_string())
    }

    async fn get_error_preview_limit(&self) -> Result<usize, Box<dyn Error>> {
        self.get_usize_or_default(config_keys::ERROR_PREVIEW_LIMIT, 10)
    }

    async fn get_preview_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_usize_or_default(config_keys::PREVIEW_ROWS, 5)
    }

    async fn get_custom_schema(
        &self,
        family: EntityFamily,
    ) -> Result<Option<FieldSchema>, Box<dyn Error>> {
        let raw = match self.get_config_value(&config_keys::schema_key(family))? {
            Some(v) => v,
            None => return Ok(None),
        };

        let schema: FieldSchema = serde_json::from_str(&raw)?;
        if schema.family != family {
            warn!(
                config_family = %schema.family,
                requested = %family,
                "字段模式覆写的实体族不一致，忽略覆写"
            );
            return Ok(None);
        }
        Ok(Some(schema.normalized()))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::EntityFamily;

    // 界面语言（es / en / zh-CN）
    pub const LOCALE: &str = "import/locale";

    // 界面错误预览条数
    pub const ERROR_PREVIEW_LIMIT: &str = "import/error_preview_limit";

    // 提交前预览行数
    pub const PREVIEW_ROWS: &str = "import/preview_rows";

    // 字段模式覆写 (JSON)
    pub const SCHEMA_PREFIX: &str = "import/schema/";

    pub fn schema_key(family: EntityFamily) -> String {
        format!("{}{}", SCHEMA_PREFIX, family.as_str())
    }
}
