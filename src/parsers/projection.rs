//! # PROJECTION 分组文件解析器
//!
//! PROJECTION 是用户编写的分组文件，每行定义一个材料：
//!
//! ```text
//! <label> <ions>[ <color>]
//!
//! HfS2 1..3 red
//! ZrS2 4,5,6 blue
//! Mat3 7,9..11
//! ```
//!
//! `<ions>` 为逗号分隔的离子序号（1 起始）或闭区间 `a..b`。颜色列可省略。
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs`, `commands/procar.rs`, `commands/split.rs` 使用
//! - 使用 `models/projection.rs`
//! - 使用 `utils/output.rs` 报告缺省颜色

use super::read_input;
use crate::error::{Result, VaspirinError};
use crate::models::{MaterialEntry, ProjectionTable};
use crate::utils::output;
use regex::Regex;
use std::path::Path;

/// 解析 PROJECTION 文件
pub fn parse_projection_file(path: &Path) -> Result<ProjectionTable> {
    let content = read_input(path)?;
    parse_projection_content(&content)
}

/// 从字符串内容解析 PROJECTION
pub fn parse_projection_content(content: &str) -> Result<ProjectionTable> {
    let separator = Regex::new(r" +").unwrap();
    let range = Regex::new(r"^(\d+)\.\.(\d+)$").unwrap();

    let entries = content
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_line(line, &separator, &range))
        .collect::<Result<Vec<_>>>()?;

    if entries.is_empty() {
        return Err(VaspirinError::ProjectionError(
            "no material defined".to_string(),
        ));
    }

    if entries.iter().any(|e| e.color.is_none()) {
        output::print_warning("Color not specified within PROJECTION file, using defaults");
    }

    ProjectionTable::from_entries(entries)
}

/// 解析单行 `<label> <ions>[ <color>]`
fn parse_line(line: &str, separator: &Regex, range: &Regex) -> Result<MaterialEntry> {
    let fields: Vec<&str> = separator.split(line.trim()).collect();
    if fields.len() < 2 {
        return Err(VaspirinError::ProjectionError(format!(
            "'{}' has no ion list",
            line.trim()
        )));
    }

    Ok(MaterialEntry {
        label: fields[0].to_string(),
        ions: expand_ions(fields[1], range)?,
        color: fields.get(2).map(|c| c.to_string()),
    })
}

/// 展开离子列表，区间按升序展开
fn expand_ions(list: &str, range: &Regex) -> Result<Vec<usize>> {
    let invalid = |item: &str| VaspirinError::ProjectionError(format!("invalid ion '{}'", item));
    let mut ions = Vec::new();

    for item in list.split(',') {
        if let Some(caps) = range.captures(item) {
            let first: usize = caps[1].parse().map_err(|_| invalid(item))?;
            let last: usize = caps[2].parse().map_err(|_| invalid(item))?;
            if last < first {
                return Err(invalid(item));
            }
            ions.extend(first..=last);
        } else {
            ions.push(item.parse().map_err(|_| invalid(item))?);
        }
    }

    Ok(ions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_two_ranges() {
        let table = parse_projection_content("HfS2 1..3\nZrS2 4..6\n").unwrap();

        assert_eq!(table.material_index("HfS2"), Some(0));
        assert_eq!(table.material_index("ZrS2"), Some(1));
        assert_eq!(table.n_materials(), 2);
        assert_eq!(
            table.ion_labels(),
            vec!["HfS2", "HfS2", "HfS2", "ZrS2", "ZrS2", "ZrS2"]
        );
        assert!(table.check_ion_count(6, "PROCAR").is_ok());
    }

    #[test]
    fn test_mixed_lists_and_colors() {
        let content = "Mat1   1,2,9  red\n\n\nMat2 4..6 blue\nMat3 3,7..8 green\n";
        let table = parse_projection_content(content).unwrap();

        assert_eq!(
            table.ion_labels(),
            vec!["Mat1", "Mat1", "Mat3", "Mat2", "Mat2", "Mat2", "Mat3", "Mat3", "Mat1"]
        );
        assert_eq!(table.color(0), Some("red"));
        assert_eq!(table.color(2), Some("green"));
    }

    #[test]
    fn test_every_ion_assigned_once() {
        let table = parse_projection_content("A 2,4\nB 1..3\n");
        // 离子 2 重复
        assert!(table.is_err());

        let table = parse_projection_content("A 2,4\nB 1,3\nC 5..7\n").unwrap();
        let labels = table.ion_labels();
        assert_eq!(labels.len(), 7);
        assert_eq!(labels, vec!["B", "A", "B", "A", "C", "C", "C"]);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            parse_projection_content("HfS2\n"),
            Err(VaspirinError::ProjectionError(_))
        ));
        assert!(parse_projection_content("HfS2 1..x\n").is_err());
        assert!(parse_projection_content("HfS2 3..1\n").is_err());
        assert!(parse_projection_content("HfS2 0\n").is_err());
        assert!(parse_projection_content("\n\n").is_err());
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PROJECTION");
        fs::write(&path, "A 1\nB 2\n").unwrap();

        let table = parse_projection_file(&path).unwrap();
        assert_eq!(table.n_ions(), 2);

        let missing = parse_projection_file(&dir.path().join("nope"));
        assert!(matches!(missing, Err(VaspirinError::FileNotFound { .. })));
    }
}
