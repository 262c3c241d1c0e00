// ==========================================
// 仓储资产导入引擎 - 命令行入口
// ==========================================
// 子命令: preview（列映射 + 试运行校验）、import（提交导入）
// ==========================================

use anyhow::Context;
use asset_import::api::ApiError;
use asset_import::app::{get_default_db_path, AppState};
use asset_import::i18n::{t, t_with_args};
use asset_import::importer::ImportObserver;
use asset_import::{logging, EntityFamily, MappingOverride};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "asset-import", version, about = "仓储资产表格导入")]
struct Cli {
    /// SQLite 数据库路径（默认: 用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 预览列映射与校验结果，不写入数据库
    Preview(FileArgs),
    /// 导入文件
    Import(FileArgs),
}

#[derive(Args, Debug)]
struct FileArgs {
    /// 表格文件（.xlsx/.xls/.csv）
    file: PathBuf,

    /// 实体族: activos / pdas / tablets
    #[arg(long, value_parser = parse_family)]
    family: EntityFamily,

    /// 人工覆写列映射，形如 "表头=字段"（字段留空表示取消映射）
    #[arg(long = "map", value_parser = parse_override)]
    overrides: Vec<MappingOverride>,
}

fn parse_family(raw: &str) -> Result<EntityFamily, String> {
    raw.parse()
}

fn parse_override(raw: &str) -> Result<MappingOverride, String> {
    MappingOverride::parse(raw).map_err(|e| e.to_string())
}

/// 文件不存在时给出本地化提示，其余错误附加操作上下文
fn api_failure(err: ApiError, action: &str, file: &Path) -> anyhow::Error {
    match err {
        ApiError::NotFound(path) => {
            anyhow::anyhow!(t_with_args("import.file_not_found", &[("path", &path)]))
        }
        other => anyhow::Error::new(other).context(format!("{}: {}", action, file.display())),
    }
}

// ==========================================
// 进度输出 + Ctrl-C 取消
// ==========================================
struct CliObserver {
    cancelled: Arc<AtomicBool>,
}

impl ImportObserver for CliObserver {
    fn on_progress(&mut self, current: usize, total: usize) {
        let line = t_with_args(
            "import.progress",
            &[("current", &current.to_string()), ("total", &total.to_string())],
        );
        eprint!("\r{}", line);
        if current == total {
            eprintln!();
        }
        let _ = std::io::stderr().flush();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("{} {} 使用数据库: {}", asset_import::APP_NAME, asset_import::VERSION, db_path);
    let state = AppState::new(db_path).context("初始化应用状态失败")?;
    let api = state.import_api.clone();

    match cli.command {
        Command::Preview(args) => {
            let preview = api
                .preview(&args.file, args.family, &args.overrides)
                .await
                .map_err(|e| api_failure(e, "预览失败", &args.file))?;

            for column in preview.mapping.columns() {
                println!(
                    "{:<30} -> {}",
                    column.header,
                    column.field.as_deref().unwrap_or("-")
                );
            }
            if !preview.unmapped_headers.is_empty() {
                println!(
                    "{}",
                    t_with_args(
                        "import.unmapped_headers",
                        &[("headers", &preview.unmapped_headers.join(", "))],
                    )
                );
            }
            println!(
                "{}",
                t_with_args(
                    "import.validation_count",
                    &[("count", &preview.validation.len().to_string())],
                )
            );
            for msg in &preview.validation {
                println!("  {}", msg.message);
            }
        }
        Command::Import(args) => {
            let cancelled = Arc::new(AtomicBool::new(false));
            let flag = cancelled.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    flag.store(true, Ordering::SeqCst);
                }
            });

            let mut observer = CliObserver { cancelled };
            let response = api
                .import_file(&args.file, args.family, &args.overrides, &mut observer)
                .await
                .map_err(|e| api_failure(e, "导入失败", &args.file))?;

            println!("{}", response.summary);
            for err in &response.error_preview {
                println!("  {}", err.message);
            }
            let hidden = response.outcome.errors.len() - response.error_preview.len();
            if hidden > 0 {
                println!("  ... (+{})", hidden);
            }
            if response.batch_recorded {
                println!("batch: {} ({} ms)", response.batch_id, response.elapsed_ms);
            } else {
                eprintln!("{}", t("import.batch_not_recorded"));
            }
        }
    }

    Ok(())
}
