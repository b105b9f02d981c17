//! # vaspirin - VASP 能带、态密度与投影后处理工具
//!
//! 读取 VASP 输出文件，构建能带结构、态密度表和投影权重，并按用户定义的
//! 材料分组汇总。
//!
//! ## 子命令
//! - `bands`  - OUTCAR 能带结构、价带顶与带隙
//! - `dos`    - DOSCAR 态密度，可按材料汇总
//! - `procar` - PROCAR 能带特征（整文件读取）
//! - `split`  - PROCAR 流式拆分为逐能带数据文件
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (OUTCAR / DOSCAR / PROCAR / PROJECTION 解析器)
//!   │     ├── models/    (数据模型)
//!   │     └── export/    (CSV 导出)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod export;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
