use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::validation::{ValidationError, ValidationUtils, Validator};

/// 應用程序配置結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub log: LogConfig,
    pub transport: TransportConfig,
    pub sink: SinkConfig,
    pub export: ExportConfig,
    pub receiver: ReceiverConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.log.validate()?;
        self.transport.validate()?;
        self.sink.validate()?;
        self.export.validate()?;
        self.receiver.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase().as_str(),
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase().as_str(),
            &["pretty", "json"],
            "log.format",
        )?;

        Ok(())
    }
}

/// 串流傳輸配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// 接收端 WebSocket 位址
    pub endpoint: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:9000/data".to_string(),
        }
    }
}

impl Validator for TransportConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::websocket_url(&self.endpoint, "transport.endpoint")?;
        Ok(())
    }
}

/// 快照儲存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// 快照檔案目錄
    pub directory: String,
    /// 儲存鍵後綴
    pub file_suffix: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            directory: "snapshots".to_string(),
            file_suffix: "_AllBars.json".to_string(),
        }
    }
}

impl Validator for SinkConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.directory, "sink.directory")?;
        ValidationUtils::not_empty(&self.file_suffix, "sink.file_suffix")?;

        if self.file_suffix.contains('/') || self.file_suffix.contains('\\') {
            return Err(ValidationError::InvalidValue(
                "sink.file_suffix 不可包含路徑分隔符".to_string(),
            ));
        }

        Ok(())
    }
}

/// 匯出流程配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// 開始讀取前的固定等待（毫秒），讓主機完成圖表與指標載入
    pub settle_delay_ms: u64,
    /// 就緒檢查的輪詢間隔（毫秒）
    pub readiness_poll_ms: u64,
    /// 就緒檢查的最長等待時間（毫秒），逾時後仍繼續匯出
    pub readiness_timeout_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 3500,
            readiness_poll_ms: 250,
            readiness_timeout_ms: 10_000,
        }
    }
}

impl Validator for ExportConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::in_range(self.settle_delay_ms, 0, 60_000, "export.settle_delay_ms")?;
        ValidationUtils::in_range(self.readiness_poll_ms, 10, 10_000, "export.readiness_poll_ms")?;
        ValidationUtils::in_range(
            self.readiness_timeout_ms,
            0,
            600_000,
            "export.readiness_timeout_ms",
        )?;

        Ok(())
    }
}

impl ExportConfig {
    /// 不等待的配置，供測試與離線匯出使用
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            readiness_poll_ms: 10,
            readiness_timeout_ms: 0,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn readiness_poll(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }
}

/// 快照接收端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub host: String,
    pub port: u16,
    /// 最新快照的持久化檔案
    pub data_file: String,
    /// 單一訊息大小上限（位元組）
    pub max_message_bytes: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            data_file: "live_market_data.json".to_string(),
            max_message_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Validator for ReceiverConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.host, "receiver.host")?;
        ValidationUtils::not_empty(&self.data_file, "receiver.data_file")?;
        ValidationUtils::in_range(
            self.max_message_bytes,
            1024,
            256 * 1024 * 1024,
            "receiver.max_message_bytes",
        )?;

        Ok(())
    }
}

impl ReceiverConfig {
    /// 監聽位址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApplicationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transport.endpoint, "ws://localhost:9000/data");
        assert_eq!(config.sink.file_suffix, "_AllBars.json");
        assert_eq!(config.export.settle_delay(), Duration::from_millis(3500));
        assert_eq!(config.receiver.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_invalid_log_level() {
        let log = LogConfig {
            level: "verbose".to_string(),
            ..LogConfig::default()
        };
        assert_matches!(log.validate(), Err(ValidationError::InvalidValue(_)));
    }

    #[test]
    fn test_transport_requires_websocket_scheme() {
        let transport = TransportConfig {
            endpoint: "http://localhost:9000/data".to_string(),
        };
        assert!(transport.validate().is_err());

        let transport = TransportConfig {
            endpoint: "wss://example.com/data".to_string(),
        };
        assert!(transport.validate().is_ok());
    }

    #[test]
    fn test_sink_suffix_must_not_contain_separator() {
        let sink = SinkConfig {
            file_suffix: "/AllBars.json".to_string(),
            ..SinkConfig::default()
        };
        assert!(sink.validate().is_err());
    }

    #[test]
    fn test_export_poll_range() {
        let export = ExportConfig {
            readiness_poll_ms: 0,
            ..ExportConfig::default()
        };
        assert_matches!(export.validate(), Err(ValidationError::RangeError { .. }));
        assert!(ExportConfig::immediate().validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ApplicationConfig =
            serde_json::from_str(r#"{"receiver": {"port": 9100}}"#).unwrap();
        assert_eq!(config.receiver.port, 9100);
        assert_eq!(config.receiver.host, "0.0.0.0");
        assert_eq!(config.log.level, "info");
    }
}
