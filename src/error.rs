//! # 统一错误处理模块
//!
//! 定义 vaspirin 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// vaspirin 统一错误类型
#[derive(Error, Debug)]
pub enum VaspirinError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    /// PROJECTION 文件语法错误，或离子数与数据文件不一致
    #[error("Invalid PROJECTION: {0}")]
    ProjectionError(String),

    /// 数据自洽性错误（能带索引越界、DOS 块长度不一致等）
    #[error("Inconsistent data: {0}")]
    InvalidData(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl VaspirinError {
    /// 构造解析错误的便捷函数
    pub fn parse(format: &str, path: &str, reason: impl Into<String>) -> Self {
        VaspirinError::ParseError {
            format: format.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, VaspirinError>;
