//! # VASP OUTCAR 解析器
//!
//! 解析 VASP 计算输出文件 OUTCAR，提取 k 点路径、倒格矢、本征值、Fermi 能级、
//! 电子数和能带数，构建 `BandStructure`。
//!
//! 每个字段都由一对标记子串定位；标记缺失视为解析错误。
//!
//! ## 依赖关系
//! - 被 `commands/bands.rs`, `commands/split.rs` 使用
//! - 使用 `models/band.rs`

use super::{between, read_input};
use crate::error::{Result, VaspirinError};
use crate::models::BandStructure;
use std::path::Path;

const KPOINTS_START: &str = "k-points in reciprocal lattice and weights:";
const KPOINTS_END: &str = "position of ions in fractional coordinates";
const RECIPROCAL_START: &str = "reciprocal lattice vectors";
const RECIPROCAL_END: &str = "length of vectors";
const FERMI_START: &str = "E-fermi :";
const FERMI_END: &str = "XC(G=0):";
const NELECT_START: &str = "NELECT =";
const NELECT_END: &str = "total number of electrons";
const NBANDS_START: &str = "NBANDS=";
const NBANDS_END: &str = "number of dos";
const BAND_TABLE_HEADER: &str = "band No.  band energies     occupation";
const EIGENVALUES_END: &str = "---------------------------";

/// OUTCAR 读取选项
#[derive(Debug, Clone, Copy, Default)]
pub struct OutcarOptions {
    /// 忽略的前导 k 点数（例如混合泛函能带计算中的自洽网格点）
    pub kpoints_ignored: usize,
    /// 自旋轨道耦合：价带索引直接使用电子数
    pub spin_orbit: bool,
}

/// 解析 OUTCAR 文件
pub fn parse_outcar_file(path: &Path, options: &OutcarOptions) -> Result<BandStructure> {
    let content = read_input(path)?;
    parse_outcar_content(&content, options, &path.display().to_string())
}

/// 从字符串内容解析 OUTCAR
pub fn parse_outcar_content(
    content: &str,
    options: &OutcarOptions,
    name: &str,
) -> Result<BandStructure> {
    let path = parse_kpoint_path(content, options.kpoints_ignored, name)?;
    let rec_lattice = parse_reciprocal_lattice(content, name)?;
    let eigenvalues = parse_eigenvalues(content, options.kpoints_ignored, name)?;
    let n_bands = parse_scalar(content, NBANDS_START, NBANDS_END, name)? as usize;
    let e_fermi = parse_scalar(content, FERMI_START, FERMI_END, name)?;
    // NELECT 取整，与价带索引的整数语义一致
    let n_electrons = parse_scalar(content, NELECT_START, NELECT_END, name)?.trunc();

    BandStructure::new(
        path,
        rec_lattice,
        eigenvalues,
        n_bands,
        e_fermi,
        n_electrons,
        options.spin_orbit,
    )
}

fn parse_error(name: &str, reason: impl Into<String>) -> VaspirinError {
    VaspirinError::parse("OUTCAR", name, reason)
}

/// 提取 k 点路径，跳过前 `ignored` 个 k 点
fn parse_kpoint_path(content: &str, ignored: usize, name: &str) -> Result<Vec<[f64; 3]>> {
    let block = between(content, KPOINTS_START, KPOINTS_END)
        .ok_or_else(|| parse_error(name, "k-point list not found"))?;

    let mut points = Vec::new();
    // 第一行是标记所在行的剩余部分
    for line in block.lines().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 {
            continue;
        }
        let mut k = [0.0; 3];
        for (i, token) in tokens.iter().take(3).enumerate() {
            k[i] = parse_f64(token, name)?;
        }
        points.push(k);
    }

    Ok(points.into_iter().skip(ignored).collect())
}

/// 提取倒格矢 [b1, b2, b3]
fn parse_reciprocal_lattice(content: &str, name: &str) -> Result<[[f64; 3]; 3]> {
    let block = between(content, RECIPROCAL_START, RECIPROCAL_END)
        .ok_or_else(|| parse_error(name, "reciprocal lattice vectors not found"))?;
    let lines: Vec<&str> = block.lines().collect();

    let mut lattice = [[0.0; 3]; 3];
    for (i, vector) in lattice.iter_mut().enumerate() {
        let tokens: Vec<&str> = lines
            .get(i + 1)
            .map(|l| l.split_whitespace().collect())
            .unwrap_or_default();
        if tokens.len() < 3 {
            return Err(parse_error(
                name,
                format!("reciprocal lattice vector b{} is incomplete", i + 1),
            ));
        }
        for (j, token) in tokens[tokens.len() - 3..].iter().enumerate() {
            vector[j] = parse_f64(token, name)?;
        }
    }

    Ok(lattice)
}

/// 提取最后一个离子步的本征值 eigenvalues[kpoint][band]
fn parse_eigenvalues(content: &str, ignored: usize, name: &str) -> Result<Vec<Vec<f64>>> {
    let start = content
        .rfind(FERMI_START)
        .ok_or_else(|| parse_error(name, "no 'E-fermi' line before the eigenvalues"))?;
    let block = &content[start + FERMI_START.len()..];
    let block = match block.find(EIGENVALUES_END) {
        Some(end) => &block[..end],
        None => block,
    };

    block
        .split(BAND_TABLE_HEADER)
        .skip(ignored + 1)
        .map(|kpoint| {
            kpoint
                .lines()
                .map(|line| line.split_whitespace().collect::<Vec<_>>())
                .filter(|tokens| tokens.len() == 3)
                .map(|tokens| parse_f64(tokens[1], name))
                .collect()
        })
        .collect()
}

/// 提取两个标记之间的单个数值
fn parse_scalar(content: &str, start: &str, end: &str, name: &str) -> Result<f64> {
    let text = between(content, start, end)
        .ok_or_else(|| parse_error(name, format!("'{}' not found", start.trim())))?;
    text.trim()
        .parse()
        .map_err(|_| parse_error(name, format!("invalid value after '{}'", start.trim())))
}

fn parse_f64(token: &str, name: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| parse_error(name, format!("invalid number '{}'", token)))
}
