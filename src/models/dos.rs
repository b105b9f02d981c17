//! # 态密度数据模型
//!
//! 存储从 DOSCAR 提取的能量网格、总态密度和逐原子的轨道分辨态密度，
//! 并提供按材料汇总的功能。
//!
//! 每个原子块的行格式为 `[energy, s, py, pz, px, dxy, dyz, dz2, dxz, dx2]`。
//!
//! ## 依赖关系
//! - 被 `parsers/doscar.rs` 构造
//! - 被 `commands/dos.rs`, `export/` 使用
//! - 使用 `models/projection.rs`, `models/reference.rs`

use super::projection::ProjectionTable;
use super::reference::Reference;
use crate::error::{Result, VaspirinError};
use serde::Serialize;

/// 参与求和的轨道列数（s, py, pz, px, dxy, dyz, dz2, dxz, dx2）
pub const N_ORBITALS: usize = 9;

/// 投影到单个原子（或一组原子）的态密度
#[derive(Debug, Clone, Default, Serialize)]
pub struct AtomicDos {
    /// 能量点数 (NEDOS)
    pub n_edos: usize,

    /// 每行 `[energy, orbital0, orbital1, ...]`
    pub rows: Vec<Vec<f64>>,

    /// 每个能量点上最后 9 个轨道列之和
    pub total: Vec<f64>,
}

impl AtomicDos {
    /// 创建空的原子态密度
    pub fn new(n_edos: usize) -> Self {
        AtomicDos {
            n_edos,
            rows: Vec::new(),
            total: Vec::new(),
        }
    }

    /// 由数据行创建，并计算总态密度
    pub fn from_rows(n_edos: usize, rows: Vec<Vec<f64>>) -> Self {
        let mut dos = AtomicDos {
            n_edos,
            rows,
            total: Vec::new(),
        };
        dos.sum_total();
        dos
    }

    /// 重新计算每个能量点的总态密度
    pub fn sum_total(&mut self) {
        self.total = self
            .rows
            .iter()
            .map(|row| {
                let start = row.len().saturating_sub(N_ORBITALS).max(1);
                row[start.min(row.len())..].iter().sum()
            })
            .collect();
    }

    /// 按能量点逐项累加另一个原子态密度（能量列保持不变）
    pub fn add(&mut self, other: &AtomicDos) -> Result<()> {
        if self.n_edos != other.n_edos {
            return Err(VaspirinError::InvalidData(format!(
                "cannot sum atomic DOS with {} and {} energy points",
                self.n_edos, other.n_edos
            )));
        }

        if self.rows.is_empty() {
            self.rows = other.rows.clone();
            return Ok(());
        }

        if self.rows.len() != other.rows.len() {
            return Err(VaspirinError::InvalidData(format!(
                "cannot sum atomic DOS blocks of {} and {} rows",
                self.rows.len(),
                other.rows.len()
            )));
        }

        for (row, other_row) in self.rows.iter_mut().zip(other.rows.iter()) {
            for (value, other_value) in row.iter_mut().zip(other_row.iter()).skip(1) {
                *value += other_value;
            }
        }

        Ok(())
    }

    /// 能量列
    pub fn energies(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.first().copied().unwrap_or(0.0))
            .collect()
    }
}

/// DOSCAR 中的全部态密度信息
#[derive(Debug, Clone, Serialize)]
pub struct DosTable {
    /// 能量点数
    pub n_edos: usize,

    /// Fermi 能级 (eV)
    pub e_fermi: f64,

    /// 能量网格 (eV)
    pub energies: Vec<f64>,

    /// 总态密度
    pub states: Vec<f64>,

    /// 逐原子的轨道分辨态密度
    pub atoms: Vec<AtomicDos>,

    /// 所有原子轨道分辨态密度之和
    pub orbital_dos: AtomicDos,

    /// 按材料汇总的态密度（调用 `sum_contributions` 后填充）
    pub material_dos: Vec<AtomicDos>,

    /// 当前能量零点
    reference: f64,
}

impl DosTable {
    /// 构建态密度表并计算所有原子的合计
    pub fn new(
        n_edos: usize,
        e_fermi: f64,
        energies: Vec<f64>,
        states: Vec<f64>,
        atoms: Vec<AtomicDos>,
    ) -> Result<Self> {
        if energies.len() != n_edos || states.len() != n_edos {
            return Err(VaspirinError::InvalidData(format!(
                "expected {} energy points, found {} energies and {} states",
                n_edos,
                energies.len(),
                states.len()
            )));
        }
        if let Some((i, atom)) = atoms
            .iter()
            .enumerate()
            .find(|(_, a)| a.rows.len() != n_edos)
        {
            return Err(VaspirinError::InvalidData(format!(
                "atom {} has {} energy points instead of {}",
                i + 1,
                atom.rows.len(),
                n_edos
            )));
        }

        let mut orbital_dos = AtomicDos::new(n_edos);
        for atom in &atoms {
            orbital_dos.add(atom)?;
        }
        orbital_dos.sum_total();

        Ok(DosTable {
            n_edos,
            e_fermi,
            energies,
            states,
            atoms,
            orbital_dos,
            material_dos: Vec::new(),
            reference: e_fermi,
        })
    }

    /// 原子数
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// 当前能量零点
    pub fn reference(&self) -> f64 {
        self.reference
    }

    /// 设置数值能量零点
    pub fn set_reference(&mut self, reference: f64) {
        self.reference = reference;
    }

    /// 按名称设置能量零点，无法识别的名称（包括 `vbm`）回退到 Fermi 能级
    pub fn set_reference_name(&mut self, name: &str) {
        let reference = match Reference::from_name(name) {
            Some(Reference::Value(v)) => v,
            _ => self.e_fermi,
        };
        self.set_reference(reference);
    }

    /// 将属于同一材料的原子态密度相加
    pub fn sum_contributions(&mut self, projection: &ProjectionTable) -> Result<()> {
        projection.check_ion_count(self.n_atoms(), "DOSCAR")?;

        let labels = projection.ion_labels();
        let mut material_dos = vec![AtomicDos::new(self.n_edos); projection.n_materials()];
        for (atom, label) in self.atoms.iter().zip(labels) {
            let material = projection.material_index(label).ok_or_else(|| {
                VaspirinError::ProjectionError(format!("unknown material '{}'", label))
            })?;
            material_dos[material].add(atom)?;
        }
        for material in material_dos.iter_mut() {
            material.sum_total();
        }

        self.material_dos = material_dos;
        Ok(())
    }
}
