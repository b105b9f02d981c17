//! # 原子分组（PROJECTION）数据模型
//!
//! 将离子按用户定义的"材料"分组，用于把逐原子的权重/DOS 汇总为逐材料的量。
//! 构建后只读，被 PROCAR 和 DOS 的汇总共享引用。
//!
//! ## 依赖关系
//! - 被 `parsers/projection.rs` 构造
//! - 被 `models/dos.rs`, `parsers/procar.rs`, `parsers/splitter.rs` 使用

use crate::error::{Result, VaspirinError};
use serde::Serialize;
use std::collections::HashMap;

/// 一行 PROJECTION 记录
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEntry {
    /// 材料标签
    pub label: String,
    /// 属于该材料的离子（1 起始，按展开顺序）
    pub ions: Vec<usize>,
    /// 可选显示颜色
    pub color: Option<String>,
}

/// 离子-材料对照表
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionTable {
    /// 材料标签，下标即材料索引（文件顺序）
    materials: Vec<String>,

    /// 标签 -> 材料索引
    #[serde(skip)]
    index: HashMap<String, usize>,

    /// 每个离子所属材料的索引，位置 0 对应离子 1
    ions: Vec<usize>,

    /// 每个材料的可选颜色
    colors: Vec<Option<String>>,
}

impl ProjectionTable {
    /// 由 PROJECTION 记录构建对照表
    ///
    /// 离子总数取所有记录引用的离子数之和；`[1, 总数]` 内的每个离子必须恰好被分配一次。
    pub fn from_entries(entries: Vec<MaterialEntry>) -> Result<Self> {
        let n_ions: usize = entries.iter().map(|e| e.ions.len()).sum();

        let mut materials: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut colors: Vec<Option<String>> = Vec::new();
        let mut assigned: Vec<Option<usize>> = vec![None; n_ions];

        for entry in entries {
            // 重复的标签沿用第一次出现时的索引
            let mat = match index.get(&entry.label) {
                Some(&i) => i,
                None => {
                    materials.push(entry.label.clone());
                    colors.push(None);
                    index.insert(entry.label.clone(), materials.len() - 1);
                    materials.len() - 1
                }
            };
            if entry.color.is_some() {
                colors[mat] = entry.color;
            }

            for ion in entry.ions {
                if ion == 0 || ion > n_ions {
                    return Err(VaspirinError::ProjectionError(format!(
                        "ion {} of '{}' is outside 1..{}",
                        ion, entry.label, n_ions
                    )));
                }
                if let Some(prev) = assigned[ion - 1] {
                    return Err(VaspirinError::ProjectionError(format!(
                        "ion {} assigned to both '{}' and '{}'",
                        ion, materials[prev], entry.label
                    )));
                }
                assigned[ion - 1] = Some(mat);
            }
        }

        // 总数等于引用次数且无重复，则不存在遗漏
        let ions = assigned.into_iter().flatten().collect();

        Ok(ProjectionTable {
            materials,
            index,
            ions,
            colors,
        })
    }

    /// 离子总数
    pub fn n_ions(&self) -> usize {
        self.ions.len()
    }

    /// 材料数
    pub fn n_materials(&self) -> usize {
        self.materials.len()
    }

    /// 按索引顺序的材料标签
    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    /// 材料标签 -> 索引
    pub fn material_index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// 离子（0 起始）所属材料的索引
    pub fn material_of(&self, ion: usize) -> usize {
        self.ions[ion]
    }

    /// 每个离子的材料标签，位置 0 对应离子 1
    pub fn ion_labels(&self) -> Vec<&str> {
        self.ions
            .iter()
            .map(|&m| self.materials[m].as_str())
            .collect()
    }

    /// 材料颜色（未指定时为 `None`）
    pub fn color(&self, material: usize) -> Option<&str> {
        self.colors.get(material).and_then(|c| c.as_deref())
    }

    /// 校验对照表覆盖的离子数与数据文件中的离子数一致
    pub fn check_ion_count(&self, n_ions: usize, source: &str) -> Result<()> {
        if self.n_ions() != n_ions {
            return Err(VaspirinError::ProjectionError(format!(
                "{} ions specified but {} has {} ions",
                self.n_ions(),
                source,
                n_ions
            )));
        }
        Ok(())
    }

    /// 按材料分组的离子（0 起始）列表
    pub fn ion_groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_materials()];
        for (ion, &mat) in self.ions.iter().enumerate() {
            groups[mat].push(ion);
        }
        groups
    }

    /// 将逐离子的值汇总为逐材料的值
    pub fn fold(&self, per_ion: &[f64]) -> Vec<f64> {
        let mut per_material = vec![0.0; self.n_materials()];
        for (ion, value) in per_ion.iter().enumerate() {
            per_material[self.material_of(ion)] += value;
        }
        per_material
    }
}
