//! # VASP DOSCAR 解析器
//!
//! 解析 DOSCAR 文件：固定位置的文件头、能量/总态密度网格以及逐原子的轨道分辨块。
//!
//! ## DOSCAR 格式说明
//! ```text
//! (5 行文件头)
//! Emax Emin NEDOS Efermi 1.00000000     # 第 6 行
//! E  DOS  integrated-DOS                # NEDOS 行
//! Emax Emin NEDOS Efermi 1.00000000     # 原子 1 块头
//! E  s py pz px dxy dyz dz2 dxz dx2      # NEDOS 行
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 使用
//! - 使用 `models/dos.rs`

use super::read_input;
use crate::error::{Result, VaspirinError};
use crate::models::{AtomicDos, DosTable};
use std::path::Path;

/// 原子块之间的分隔（块头行以权重 1.0 结尾）
const ATOM_BLOCK_DIVIDER: &str = " 1.00000000\n";

/// 文件头行数
const HEADER_LINES: usize = 6;

/// 解析 DOSCAR 文件
pub fn parse_doscar_file(path: &Path) -> Result<DosTable> {
    let content = read_input(path)?;
    parse_doscar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 DOSCAR
pub fn parse_doscar_content(content: &str, name: &str) -> Result<DosTable> {
    let lines: Vec<&str> = content.split('\n').collect();

    let (n_edos, e_fermi) = parse_header(&lines, name)?;
    let (energies, states) = parse_grid(&lines, n_edos, name)?;
    let atoms = parse_atomic_blocks(content, n_edos, name)?;

    DosTable::new(n_edos, e_fermi, energies, states, atoms)
}

fn parse_error(name: &str, reason: impl Into<String>) -> VaspirinError {
    VaspirinError::parse("DOSCAR", name, reason)
}

/// 第 6 行：NEDOS 为第 3 列，Fermi 能级为第 4 列
fn parse_header(lines: &[&str], name: &str) -> Result<(usize, f64)> {
    let tokens: Vec<&str> = lines
        .get(HEADER_LINES - 1)
        .map(|l| l.split_whitespace().collect())
        .unwrap_or_default();
    if tokens.len() < 4 {
        return Err(parse_error(name, "header line 6 is incomplete"));
    }

    let n_edos = tokens[2]
        .parse()
        .map_err(|_| parse_error(name, format!("invalid NEDOS '{}'", tokens[2])))?;
    let e_fermi = tokens[3]
        .parse()
        .map_err(|_| parse_error(name, format!("invalid Fermi energy '{}'", tokens[3])))?;

    Ok((n_edos, e_fermi))
}

/// 能量网格和总态密度（每行前两列）
fn parse_grid(lines: &[&str], n_edos: usize, name: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut energies = Vec::with_capacity(n_edos);
    let mut states = Vec::with_capacity(n_edos);

    for k in HEADER_LINES..HEADER_LINES + n_edos {
        let line = lines
            .get(k)
            .ok_or_else(|| parse_error(name, format!("total DOS ends before line {}", k + 1)))?;
        let values = parse_row(line, name)?;
        if values.len() < 2 {
            return Err(parse_error(name, format!("line {} has fewer than 2 columns", k + 1)));
        }
        energies.push(values[0]);
        states.push(values[1]);
    }

    Ok((energies, states))
}

/// 逐原子的轨道分辨块
fn parse_atomic_blocks(content: &str, n_edos: usize, name: &str) -> Result<Vec<AtomicDos>> {
    let body = skip_lines(content, HEADER_LINES);

    // 第一个块是总态密度
    body.split(ATOM_BLOCK_DIVIDER)
        .skip(1)
        .map(|block| {
            let mut lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
            // 分隔符切在下一个块头中间，残留的块头前半行需丢弃
            if lines.len() == n_edos + 1 {
                lines.pop();
            }
            let rows = lines
                .iter()
                .map(|line| parse_row(line, name))
                .collect::<Result<Vec<_>>>()?;
            Ok(AtomicDos::from_rows(n_edos, rows))
        })
        .collect()
}

fn skip_lines(content: &str, n: usize) -> &str {
    let mut rest = content;
    for _ in 0..n {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}

fn parse_row(line: &str, name: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|t| {
            t.parse()
                .map_err(|_| parse_error(name, format!("invalid number '{}'", t)))
        })
        .collect()
}
