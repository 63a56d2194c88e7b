//! 配置解析模块
//!
//! 支持 TOML（主）和 JSON（可选）格式。

use contracts::{DispatchConfig, StoreError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML（推荐）
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// 根据文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 配置
pub fn parse_toml(content: &str) -> Result<DispatchConfig, StoreError> {
    toml::from_str(content).map_err(|e| StoreError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 配置
pub fn parse_json(content: &str) -> Result<DispatchConfig, StoreError> {
    serde_json::from_str(content).map_err(|e| StoreError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 按指定格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<DispatchConfig, StoreError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
