use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use snapshot_streamer::config::{self, ApplicationConfig};
use snapshot_streamer::export::{ExportOrchestrator, ExportStatus};
use snapshot_streamer::series::InMemorySeries;
use snapshot_streamer::utils::init_logging;

/// 匯出一份圖表快照並推送至接收端
#[derive(Parser, Debug)]
#[command(name = "snapshot_streamer", version, about)]
struct Args {
    /// 序列資料檔（JSON：instrument、bars、auxiliary）
    #[arg(long)]
    series: PathBuf,

    /// 接收端 WebSocket 位址，覆寫配置檔
    #[arg(long)]
    endpoint: Option<String>,

    /// 快照輸出目錄，覆寫配置檔
    #[arg(long)]
    out_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化配置
    let mut app_config: ApplicationConfig = config::init_config()?.clone();
    if let Some(endpoint) = args.endpoint {
        app_config.transport.endpoint = endpoint;
    }
    if let Some(out_dir) = args.out_dir {
        app_config.sink.directory = out_dir;
    }

    // 初始化日誌系統
    init_logging(&app_config.log).map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    let series = InMemorySeries::from_json_file(&args.series)
        .with_context(|| format!("無法載入序列資料 {}", args.series.display()))?;

    let orchestrator = ExportOrchestrator::from_config(&app_config)?;
    let report = orchestrator.run_once(&series).await;
    orchestrator.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.status {
        ExportStatus::Completed => {
            info!("匯出完成");
            Ok(())
        }
        ExportStatus::Degraded => {
            warn!("匯出完成，但部分步驟失敗");
            Ok(())
        }
        ExportStatus::Failed | ExportStatus::AlreadyRun => Err(anyhow!(
            "匯出失敗: {}",
            report.error.unwrap_or_else(|| "未執行".to_string())
        )),
    }
}
