//! # split 子命令实现
//!
//! 读取 OUTCAR 获得 k 点横轴与能量零点，然后流式拆分 PROCAR，
//! 为每条能带写出一个 `bandNN.dat`。
//!
//! ## 依赖关系
//! - 使用 `cli/split.rs` 定义的参数
//! - 使用 `parsers/outcar.rs`, `parsers/projection.rs`, `parsers/splitter.rs`
//! - 使用 `utils/output.rs`

use super::{warn_reference, ReferenceTarget};
use crate::cli::split::SplitArgs;
use crate::error::Result;
use crate::models::procar::ORBITAL_CLASS_NAMES;
use crate::parsers::outcar::{self, OutcarOptions};
use crate::parsers::splitter::{self, SplitMode, SplitOptions};
use crate::parsers::projection;
use crate::utils::output;

use std::path::PathBuf;

/// 执行 split 命令
pub fn execute(args: SplitArgs) -> Result<()> {
    output::print_header("Splitting PROCAR by Band");

    output::print_info(&format!("Reading '{}'...", args.outcar.display()));
    let options = OutcarOptions {
        kpoints_ignored: args.ignore,
        spin_orbit: args.soc,
    };
    let mut bands = outcar::parse_outcar_file(&args.outcar, &options)?;
    warn_reference(&args.reference, ReferenceTarget::Bands);
    bands.set_reference_name(&args.reference);

    let table = if args.orbitals {
        None
    } else {
        output::print_info(&format!("Reading '{}'...", args.projection.display()));
        Some(projection::parse_projection_file(&args.projection)?)
    };
    let mode = match table {
        Some(ref table) => SplitMode::Materials(table),
        None => SplitMode::Orbitals,
    };

    let columns = match mode {
        SplitMode::Materials(table) => table.materials().join(" "),
        SplitMode::Orbitals => ORBITAL_CLASS_NAMES.join(" "),
    };
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(mode.default_output_dir()));

    output::print_kv("Reference (eV)", &format!("{:.4}", bands.reference()));
    output::print_kv("Marker scale", &args.marker.to_string());
    output::print_kv("Columns", &format!("x E {}", columns));
    output::print_info(&format!("Streaming '{}'...", args.procar.display()));

    let split_options = SplitOptions {
        kpoints_ignored: args.ignore,
        marker: args.marker,
        show_progress: !args.quiet,
        // 只重建默认目录；用户指定的目录中仅替换 bandNN.dat
        recreate_output: args.output_dir.is_none(),
    };
    let summary = splitter::split_procar(&args.procar, mode, &bands, &output_dir, &split_options)?;

    output::print_success(&format!(
        "Wrote {} band files ({} k-points each) to '{}'",
        summary.files.len(),
        summary.n_kpoints,
        summary.output_dir.display()
    ));

    Ok(())
}
