// ==========================================
// MCA 线索管理系统 - 命令行入口
// ==========================================
// 命令: import / export / template / fields / calendar
// 线索簿以 JSON 文件保存；配置保存在 SQLite
// ==========================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mca_leads::api::{ConfigApi, ImportApi, LeadApi};
use mca_leads::config::ConfigManager;
use mca_leads::engine::{LeadBook, LeadFilter};
use mca_leads::{db, logging, LeadStatus};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "mca-leads")]
#[command(about = "MCA 线索表格导入导出工具")]
#[command(version)]
struct Cli {
    /// 配置数据库路径（默认: $MCA_LEADS_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导入 .xlsx / .xls / .csv 文件并合并进线索簿
    Import {
        file: PathBuf,

        /// 线索簿文件
        #[arg(long, default_value = "leads.json")]
        book: PathBuf,

        /// 新线索负责人（默认取配置）
        #[arg(long)]
        assignee: Option<String>,
    },

    /// 导出线索到 xlsx
    Export {
        #[arg(long, default_value = "leads.json")]
        book: PathBuf,

        /// 输出目录
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// 用户显示名映射文件（JSON: {"用户ID": "显示名"}）
        #[arg(long)]
        users: Option<PathBuf>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        assigned_to: Option<String>,

        #[arg(long)]
        search: Option<String>,
    },

    /// 写出导入模板
    Template {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// 字段注册表维护
    Fields {
        #[command(subcommand)]
        action: FieldsAction,
    },

    /// 跟进日历
    Calendar {
        #[arg(long, default_value = "leads.json")]
        book: PathBuf,

        /// 日期（YYYY-MM-DD，默认今天）
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum FieldsAction {
    /// 列出当前字段
    List,
    /// 重置为默认字段
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let db_path = cli
        .db
        .unwrap_or_else(|| PathBuf::from(db::default_db_path()));
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
    }
    info!(db_path = %db_path.display(), version = mca_leads::VERSION, "{}", mca_leads::APP_NAME);

    let config_manager = Arc::new(
        ConfigManager::new(&db_path.to_string_lossy())
            .with_context(|| format!("无法打开配置数据库: {}", db_path.display()))?,
    );

    match cli.command {
        Commands::Import {
            file,
            book,
            assignee,
        } => {
            let mut lead_book = load_book(&book).await?;
            let response = ImportApi::new(config_manager)
                .import_leads(&mut lead_book, &file, assignee.as_deref())
                .await?;
            save_book(&book, &lead_book).await?;
            print_json(&response)?;
        }
        Commands::Export {
            book,
            out,
            users,
            status,
            assigned_to,
            search,
        } => {
            let lead_book = load_book(&book).await?;
            let status = status
                .map(|s| {
                    LeadStatus::from_label(&s).with_context(|| format!("未知线索状态: {}", s))
                })
                .transpose()?;
            let filter = LeadFilter {
                search,
                status,
                assigned_to,
            };
            let leads: Vec<_> = lead_book.filter(&filter).into_iter().cloned().collect();
            let users = load_users(users.as_deref()).await?;

            let response = ImportApi::new(config_manager)
                .export_leads(&leads, &users, &out)
                .await?;
            print_json(&response)?;
        }
        Commands::Template { out } => {
            let response = ImportApi::new(config_manager).export_template(&out).await?;
            print_json(&response)?;
        }
        Commands::Fields { action } => {
            let api = ConfigApi::new(config_manager);
            let view = match action {
                FieldsAction::List => api.list_fields()?,
                FieldsAction::Reset => api.reset_fields()?,
            };
            print_json(&view)?;
        }
        Commands::Calendar { book, date } => {
            let lead_book = load_book(&book).await?;
            let calendar = LeadApi::new(config_manager).calendar(&lead_book, date);
            print_json(&calendar)?;
        }
    }

    Ok(())
}

/// 读取线索簿；文件不存在时返回空线索簿
async fn load_book(path: &Path) -> anyhow::Result<LeadBook> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("线索簿文件格式错误: {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LeadBook::new()),
        Err(e) => Err(e).with_context(|| format!("无法读取线索簿: {}", path.display())),
    }
}

async fn save_book(path: &Path, book: &LeadBook) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(book)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("无法写入线索簿: {}", path.display()))
}

async fn load_users(path: Option<&Path>) -> anyhow::Result<HashMap<String, String>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("无法读取用户映射: {}", path.display()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
