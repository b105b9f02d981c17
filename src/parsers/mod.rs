//! # 解析器模块
//!
//! 提供 VASP 输出文件（OUTCAR、DOSCAR、PROCAR）和用户分组文件 PROJECTION 的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: outcar, doscar, procar, splitter, projection

pub mod doscar;
pub mod outcar;
pub mod procar;
pub mod projection;
pub mod splitter;

use crate::error::{Result, VaspirinError};
use std::fs;
use std::path::Path;

/// 读取整个输入文件，文件不存在时报告 `FileNotFound`
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(VaspirinError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    fs::read_to_string(path).map_err(|e| VaspirinError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 返回第一个 `start` 标记之后、其后第一个 `end` 标记之前的文本
pub(crate) fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let rest = &text[from..];
    let to = rest.find(end)?;
    Some(&rest[..to])
}
