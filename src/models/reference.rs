//! # 能量零点参考
//!
//! 能带和 DOS 共用的能量参考选择：`vbm`、`efermi`（`e-fermi`/`ef`）或数值。
//! 参考值在设置时即解析为具体数值，读取时不再重新计算。
//!
//! ## 依赖关系
//! - 被 `models/band.rs`, `models/dos.rs` 使用
//! - 无外部模块依赖

/// 命名参考
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reference {
    /// 价带顶
    Vbm,
    /// Fermi 能级
    Fermi,
    /// 固定数值 (eV)
    Value(f64),
}

impl Reference {
    /// 解析参考字符串（大小写不敏感）
    ///
    /// 数字优先解析为 `Value`；无法识别的名称返回 `None`，由调用方回退到默认参考。
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Ok(v) = name.parse::<f64>() {
            return Some(Reference::Value(v));
        }
        match name.to_lowercase().as_str() {
            "vbm" => Some(Reference::Vbm),
            "efermi" | "e-fermi" | "ef" => Some(Reference::Fermi),
            _ => None,
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Vbm => write!(f, "vbm"),
            Reference::Fermi => write!(f, "efermi"),
            Reference::Value(v) => write!(f, "{}", v),
        }
    }
}
