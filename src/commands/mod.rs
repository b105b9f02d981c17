//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `models/`, `export/`, `utils/`
//! - 子模块: bands, dos, procar, split

pub mod bands;
pub mod dos;
pub mod procar;
pub mod split;

use crate::cli::Commands;
use crate::error::Result;
use crate::models::Reference;
use crate::utils::output;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Bands(args) => bands::execute(args),
        Commands::Dos(args) => dos::execute(args),
        Commands::Procar(args) => procar::execute(args),
        Commands::Split(args) => split::execute(args),
    }
}

/// 能量零点所属的数据表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReferenceTarget {
    Bands,
    Dos,
}

/// 参考名称需要回退时的提示；可直接使用时返回 `None`
pub(crate) fn reference_warning(name: &str, target: ReferenceTarget) -> Option<String> {
    match (Reference::from_name(name), target) {
        (None, ReferenceTarget::Bands) => Some(format!(
            "Unknown reference '{}', using the valence band maximum instead",
            name
        )),
        (None, ReferenceTarget::Dos) => Some(format!(
            "Unknown reference '{}', using the Fermi energy instead",
            name
        )),
        (Some(Reference::Vbm), ReferenceTarget::Dos) => Some(
            "DOSCAR carries no band edges, using the Fermi energy instead of 'vbm'".to_string(),
        ),
        _ => None,
    }
}

/// 打印参考回退提示
pub(crate) fn warn_reference(name: &str, target: ReferenceTarget) {
    if let Some(msg) = reference_warning(name, target) {
        output::print_warning(&msg);
    }
}
