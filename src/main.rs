use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use upload_gateway::utils::{progress_bar, record_line};
use upload_gateway::{
    Config,
    FileInfo,
    GatewayOptions,
    MemoryRecordClient,
    ProgressCallback,
    UploadGateway,
    UploadInput,
    UploadStatus,
};

#[derive(Parser, Debug)]
#[command(name = "upload-gateway", version, about = "Manage upload records on the record service")]
struct Cli {
    /// TOML 配置文件，不指定时读取环境变量
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出上传记录
    List,
    /// 查看单条记录
    Get { id: i64 },
    /// 已完成的上传历史
    History,
    /// 校验本地文件
    Validate { path: PathBuf },
    /// 校验并创建一条 pending 记录
    Create { path: PathBuf },
    /// 模拟上传进度
    Simulate { id: i64 },
    /// 删除记录
    Delete { id: i64 },
    /// 为一组记录开启会话
    Session {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// 完成会话
    CompleteSession { id: i64 },
    /// 使用内存客户端完整走一遍流程
    Demo {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    Ok(config)
}

fn print_progress() -> ProgressCallback {
    Arc::new(|progress: u8| {
        print!("\r{}", progress_bar(progress, 30));
        let _ = std::io::stdout().flush();
        if progress == 100 {
            println!();
        }
    })
}

async fn create_from_path(gateway: &UploadGateway, path: &Path) -> anyhow::Result<i64> {
    let file = FileInfo::from_path(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    gateway.validate_file(&file)?;

    let input = UploadInput::new()
        .name(file.name.clone())
        .size(file.size)
        .mime_type(file.mime_type.clone());
    let record = gateway.create(input)
        .await?
        .context("Record service returned no created record")?;

    println!("{}", record_line(&record));
    Ok(record.id)
}

async fn simulate(gateway: &UploadGateway, id: i64) -> anyhow::Result<()> {
    if let Some(record) = gateway.get_by_id(id).await? {
        if !record.status.can_transition_to(UploadStatus::Uploading) {
            bail!("Upload {} is {} and can't be simulated again", id, record.status);
        }
    }

    if let Some(record) = gateway.simulate_upload(id, Some(print_progress())).await? {
        println!("{}", record_line(&record));
    }
    Ok(())
}

async fn demo(paths: &[PathBuf]) -> anyhow::Result<()> {
    let gateway = UploadGateway::with_options(Arc::new(MemoryRecordClient::new()), GatewayOptions::default());

    let mut files = Vec::new();
    for path in paths {
        let id = create_from_path(&gateway, path).await?;
        simulate(&gateway, id).await?;
        if let Some(record) = gateway.get_by_id(id).await? {
            files.push(UploadInput::from(&record));
        }
    }

    let session = gateway.create_session(&files)
        .await?
        .context("Record service returned no created session")?;
    let session = gateway.complete_session(session.id).await?;
    info!(session = session.id, files = ?session.file_ids, total_size = session.total_size, "demo session completed");

    for record in gateway.get_history().await? {
        println!("{}", record_line(&record));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Command::Demo { paths } = &cli.command {
        return demo(paths).await;
    }

    let config = load_config(cli.config.as_ref())?;
    let gateway = UploadGateway::from_config(&config)?;

    match cli.command {
        Command::List => {
            for record in gateway.list_all().await? {
                println!("{}", record_line(&record));
            }
        }
        Command::Get { id } => match gateway.get_by_id(id).await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => bail!("Upload {} not found", id),
        },
        Command::History => {
            for record in gateway.get_history().await? {
                println!("{}", record_line(&record));
            }
        }
        Command::Validate { path } => {
            let file = FileInfo::from_path(&path).await?;
            gateway.validate_file(&file)?;
            println!("{} is valid ({}, {} bytes)", file.name, file.mime_type, file.size);
        }
        Command::Create { path } => {
            create_from_path(&gateway, &path).await?;
        }
        Command::Simulate { id } => simulate(&gateway, id).await?,
        Command::Delete { id } => {
            if !gateway.delete(id).await? {
                bail!("Upload {} was not deleted", id);
            }
        }
        Command::Session { ids } => {
            let mut files = Vec::with_capacity(ids.len());
            for id in ids {
                let record = gateway.get_by_id(id)
                    .await?
                    .with_context(|| format!("Upload {} not found", id))?;
                files.push(UploadInput::from(&record));
            }
            if let Some(session) = gateway.create_session(&files).await? {
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
        }
        Command::CompleteSession { id } => {
            let session = gateway.complete_session(id).await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Command::Demo { .. } => {}
    }

    Ok(())
}
