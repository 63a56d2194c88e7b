//! 配置校验模块
//!
//! 校验规则：
//! - 配置类型上声明的字段约束 (`validator` derive)
//! - 队列名不以 '/' 开头，不含空白字符
//! - log_level 为已知级别或 `EnvFilter` 指令

use contracts::{DispatchConfig, StoreError};
use ::validator::Validate;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 校验 DispatchConfig
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &DispatchConfig) -> Result<(), StoreError> {
    validate_declared(config)?;
    validate_queue_name(config)?;
    validate_log_level(config)?;
    Ok(())
}

/// 校验 `#[validate(..)]` 声明的约束
fn validate_declared(config: &DispatchConfig) -> Result<(), StoreError> {
    config.validate().map_err(|errors| {
        let mut fields: Vec<_> = errors.errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        StoreError::config_validation(fields.join(", "), errors.to_string())
    })
}

fn validate_queue_name(config: &DispatchConfig) -> Result<(), StoreError> {
    let name = &config.queue.name;
    if name.starts_with('/') {
        return Err(StoreError::config_validation(
            "queue.name",
            format!("queue name must not start with '/', got '{name}'"),
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(StoreError::config_validation(
            "queue.name",
            format!("queue name must not contain whitespace, got '{name}'"),
        ));
    }
    Ok(())
}

fn validate_log_level(config: &DispatchConfig) -> Result<(), StoreError> {
    let level = config.observability.log_level.to_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) || level.contains('=') {
        return Ok(());
    }
    Err(StoreError::config_validation(
        "observability.log_level",
        format!(
            "unknown log level '{}', expected one of {:?} or a filter directive",
            config.observability.log_level, LOG_LEVELS
        ),
    ))
}
