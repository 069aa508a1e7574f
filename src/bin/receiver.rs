use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use snapshot_streamer::config::{self, ApplicationConfig, Validator};
use snapshot_streamer::receiver::SnapshotReceiver;
use snapshot_streamer::utils::init_logging;

/// 接收並保存最新的圖表快照
#[derive(Parser, Debug)]
#[command(name = "snapshot_receiver", version, about)]
struct Args {
    /// 監聽主機，覆寫配置檔
    #[arg(long)]
    host: Option<String>,

    /// 監聽埠，覆寫配置檔
    #[arg(long)]
    port: Option<u16>,

    /// 最新快照的資料檔，覆寫配置檔
    #[arg(long)]
    data_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化配置
    let mut app_config: ApplicationConfig = config::init_config()?.clone();
    if let Some(host) = args.host {
        app_config.receiver.host = host;
    }
    if let Some(port) = args.port {
        app_config.receiver.port = port;
    }
    if let Some(data_file) = args.data_file {
        app_config.receiver.data_file = data_file;
    }
    app_config.receiver.validate()?;

    // 初始化日誌系統
    init_logging(&app_config.log).map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    let receiver = Arc::new(SnapshotReceiver::new(app_config.receiver.clone()));
    let listener = receiver.bind().await?;
    let server = tokio::spawn(Arc::clone(&receiver).serve(listener));

    // 等待關閉信號
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("接收到關閉信號，正在退出...");
            server.abort();
            Ok(())
        }
        Err(err) => {
            error!("無法監聽關閉信號: {}", err);
            Err(anyhow!("無法監聽關閉信號: {}", err))
        }
    }
}
