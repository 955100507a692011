//! Diagonalization glue generator.
//!
//! Emits one Python module that evaluates each sector's scalar mass matrix
//! numerically, diagonalizes it with `np.linalg.eigh` (eigenvalues
//! ascending, eigenvectors as columns), assembles the block-diagonal
//! eigenvector matrix in declared sector order, applies the permutation
//! matrix, and reads off the named rotation entries and physical masses.
//! Every dimensional check runs before any text is produced; generation is
//! all-or-nothing.

use std::collections::BTreeMap;

use crate::emit::SourceBuilder;

/// One sector's symbolic mass matrix, entries already in target syntax.
#[derive(Clone, Debug, PartialEq)]
pub struct SectorMatrix {
    pub entries: Vec<Vec<String>>,
}

impl SectorMatrix {
    pub fn dim(&self) -> usize {
        self.entries.len()
    }

    fn is_square(&self) -> bool {
        self.entries.iter().all(|row| row.len() == self.entries.len())
    }
}

/// Vector-sector expressions carried into the generated module: local
/// shorthand assignments plus named vector masses squared.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorExpressions {
    pub shorthands: Vec<(String, String)>,
    pub masses: Vec<(String, String)>,
}

/// Split one brace-delimited matrix literal into its entry texts:
/// `{{a, b}, {b, c}}` becomes two rows of two entries. Commas nested inside
/// braces, brackets, or parentheses do not split.
pub fn split_matrix_literal(literal: &str) -> Result<Vec<Vec<String>>, String> {
    let trimmed = literal.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| format!("matrix literal must be brace-delimited: '{}'", trimmed))?;

    let rows = split_top_level(inner)?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let row = row.trim();
        let row_inner = row
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| format!("matrix row must be brace-delimited: '{}'", row))?;
        entries.push(
            split_top_level(row_inner)?
                .into_iter()
                .map(|entry| entry.trim().to_string())
                .collect(),
        );
    }
    Ok(entries)
}

fn split_top_level(text: &str) -> Result<Vec<String>, String> {
    let mut parts = Vec::new();
    let mut buffer = String::new();
    let mut depth: i64 = 0;
    for ch in text.chars() {
        match ch {
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unbalanced brackets in matrix literal: '{}'", text));
                }
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut buffer));
                continue;
            }
            _ => {}
        }
        buffer.push(ch);
    }
    if depth != 0 {
        return Err(format!("unbalanced brackets in matrix literal: '{}'", text));
    }
    parts.push(buffer);
    Ok(parts)
}

/// Validate all declarative inputs against each other. Called before any
/// emission so a bad configuration never leaves a partial artifact set.
fn validate(
    sectors: &[SectorMatrix],
    permutation: &[Vec<String>],
    rotation_map: &BTreeMap<String, [usize; 2]>,
    mass_names: &[String],
) -> Result<(), String> {
    if sectors.is_empty() {
        return Err("diagonalization requires at least one sector matrix".to_string());
    }
    for (idx, sector) in sectors.iter().enumerate() {
        if sector.dim() == 0 || !sector.is_square() {
            return Err(format!(
                "sector matrix {} is not square ({} rows)",
                idx,
                sector.dim()
            ));
        }
    }

    let total_dim: usize = sectors.iter().map(|s| s.dim()).sum();
    if permutation.len() != total_dim
        || permutation.iter().any(|row| row.len() != total_dim)
    {
        return Err(format!(
            "permutation matrix must be {dim}x{dim} to match the block-diagonal eigenvector matrix, got {}x{}",
            permutation.len(),
            permutation.first().map(|row| row.len()).unwrap_or(0),
            dim = total_dim,
        ));
    }

    for (name, [row, col]) in rotation_map {
        if *row >= total_dim || *col >= total_dim {
            return Err(format!(
                "rotation index for '{}' is ({}, {}) but the rotation matrix is {dim}x{dim}",
                name, row, col, dim = total_dim,
            ));
        }
    }

    if mass_names.is_empty() || mass_names.len() % sectors.len() != 0 {
        return Err(format!(
            "{} output mass names cannot be split evenly over {} sectors",
            mass_names.len(),
            sectors.len()
        ));
    }
    let sector_size = mass_names.len() / sectors.len();
    for (idx, sector) in sectors.iter().enumerate() {
        if sector_size > sector.dim() {
            return Err(format!(
                "{} mass names per sector but sector matrix {} is only {}x{}",
                sector_size,
                idx,
                sector.dim(),
                sector.dim()
            ));
        }
    }
    Ok(())
}

/// Emit the diagonalization module (`diagonalize.py`).
pub fn emit_diagonalizer(
    parameters: &[String],
    sectors: &[SectorMatrix],
    permutation: &[Vec<String>],
    rotation_map: &BTreeMap<String, [usize; 2]>,
    mass_names: &[String],
    vectors: &VectorExpressions,
) -> Result<String, String> {
    validate(sectors, permutation, rotation_map, mass_names)?;

    let total_dim: usize = sectors.iter().map(|s| s.dim()).sum();
    let sector_size = mass_names.len() / sectors.len();

    let mut src = SourceBuilder::new();
    src.line("import numpy as np");
    src.blank();
    src.blank();
    src.line("def diagonalize(");
    for parameter in parameters {
        src.line(format!("    {} = 1,", parameter));
    }
    src.line("    ):");

    for (name, expression) in &vectors.shorthands {
        src.line(format!("    {} = {}", name, expression));
    }
    if !vectors.shorthands.is_empty() {
        src.blank();
    }

    for (idx, sector) in sectors.iter().enumerate() {
        src.line(format!("    matrix_{} = np.array([", idx));
        for row in &sector.entries {
            src.line(format!("        [{}],", row.join(", ")));
        }
        src.line("    ])");
        src.line(format!(
            "    eigenvalues_{idx}, eigenvectors_{idx} = np.linalg.eigh(matrix_{idx})",
            idx = idx
        ));
        src.blank();
    }

    // Block-diagonal eigenvector matrix, sectors in declared order
    src.line(format!(
        "    rotation = np.zeros(({}, {}))",
        total_dim, total_dim
    ));
    let mut offset = 0;
    for (idx, sector) in sectors.iter().enumerate() {
        let end = offset + sector.dim();
        src.line(format!(
            "    rotation[{offset}:{end}, {offset}:{end}] = eigenvectors_{idx}",
            offset = offset,
            end = end,
            idx = idx
        ));
        offset = end;
    }
    src.blank();

    src.line("    permutation = np.array([");
    for row in permutation {
        src.line(format!("        [{}],", row.join(", ")));
    }
    src.line("    ])");
    src.line("    rotated = rotation @ permutation");
    src.blank();

    src.line("    values = {}");
    for (name, [row, col]) in rotation_map {
        src.line(format!("    values[\"{}\"] = rotated[{}, {}]", name, row, col));
    }
    for (idx, name) in mass_names.iter().enumerate() {
        let sector = idx / sector_size;
        let position = idx % sector_size;
        src.line(format!(
            "    values[\"{}\"] = eigenvalues_{}[{}]",
            name, sector, position
        ));
    }
    for (name, expression) in &vectors.masses {
        src.line(format!("    values[\"{}\"] = {}", name, expression));
    }
    src.line("    return values");

    Ok(src.render())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector(entries: &[&[&str]]) -> SectorMatrix {
        SectorMatrix {
            entries: entries
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn identity(dim: usize) -> Vec<Vec<String>> {
        (0..dim)
            .map(|i| {
                (0..dim)
                    .map(|j| if i == j { "1" } else { "0" }.to_string())
                    .collect()
            })
            .collect()
    }

    fn params() -> Vec<String> {
        vec!["lam".to_string(), "mu3sq".to_string()]
    }

    #[test]
    fn test_split_matrix_literal() {
        let entries = split_matrix_literal("{{a, b}, {b, c}}").unwrap();
        assert_eq!(entries, vec![vec!["a", "b"], vec!["b", "c"]]);
    }

    #[test]
    fn test_split_matrix_literal_nested_commas() {
        let entries = split_matrix_literal("{{f(a, b), c}, {c, d}}").unwrap();
        assert_eq!(entries[0][0], "f(a, b)");
    }

    #[test]
    fn test_split_matrix_literal_unbalanced() {
        assert!(split_matrix_literal("{{a, b}, {b, c}").is_err());
    }

    #[test]
    fn test_emits_eigh_per_sector_and_block_assembly() {
        let sectors = vec![
            sector(&[&["a", "b"], &["b", "c"]]),
            sector(&[&["d", "e"], &["e", "f"]]),
        ];
        let rotation_map = BTreeMap::new();
        let masses: Vec<String> = ["m1", "m2", "m3", "m4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(4),
            &rotation_map,
            &masses,
            &VectorExpressions::default(),
        )
        .unwrap();
        assert!(out.contains("eigenvalues_0, eigenvectors_0 = np.linalg.eigh(matrix_0)"));
        assert!(out.contains("eigenvalues_1, eigenvectors_1 = np.linalg.eigh(matrix_1)"));
        assert!(out.contains("rotation[0:2, 0:2] = eigenvectors_0"));
        assert!(out.contains("rotation[2:4, 2:4] = eigenvectors_1"));
        assert!(out.contains("rotated = rotation @ permutation"));
    }

    #[test]
    fn test_mass_names_flatten_over_sectors() {
        let sectors = vec![
            sector(&[&["a", "b"], &["b", "c"]]),
            sector(&[&["d", "e"], &["e", "f"]]),
        ];
        let masses: Vec<String> = ["mGp", "mHp", "mG0", "mh"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(4),
            &BTreeMap::new(),
            &masses,
            &VectorExpressions::default(),
        )
        .unwrap();
        assert!(out.contains("values[\"mGp\"] = eigenvalues_0[0]"));
        assert!(out.contains("values[\"mHp\"] = eigenvalues_0[1]"));
        assert!(out.contains("values[\"mG0\"] = eigenvalues_1[0]"));
        assert!(out.contains("values[\"mh\"] = eigenvalues_1[1]"));
    }

    #[test]
    fn test_rotation_entries_read_from_permuted_matrix() {
        let sectors = vec![sector(&[&["a", "b"], &["b", "c"]])];
        let mut rotation_map = BTreeMap::new();
        rotation_map.insert("alpha1".to_string(), [0, 1]);
        let masses = vec!["m1".to_string(), "m2".to_string()];
        let out = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(2),
            &rotation_map,
            &masses,
            &VectorExpressions::default(),
        )
        .unwrap();
        assert!(out.contains("values[\"alpha1\"] = rotated[0, 1]"));
    }

    #[test]
    fn test_vector_expressions_emitted() {
        let sectors = vec![sector(&[&["a"]])];
        let vectors = VectorExpressions {
            shorthands: vec![("gsq".to_string(), "g**2".to_string())],
            masses: vec![("mWsq".to_string(), "gsq*v3**2/4".to_string())],
        };
        let out = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(1),
            &BTreeMap::new(),
            &["m1".to_string()],
            &vectors,
        )
        .unwrap();
        assert!(out.contains("    gsq = g**2"));
        assert!(out.contains("values[\"mWsq\"] = gsq*v3**2/4"));
    }

    #[test]
    fn test_non_square_sector_rejected() {
        let sectors = vec![sector(&[&["a", "b"], &["b"]])];
        let err = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(2),
            &BTreeMap::new(),
            &["m1".to_string(), "m2".to_string()],
            &VectorExpressions::default(),
        )
        .unwrap_err();
        assert!(err.contains("not square"));
    }

    #[test]
    fn test_permutation_shape_mismatch_rejected() {
        let sectors = vec![sector(&[&["a", "b"], &["b", "c"]])];
        let err = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(3),
            &BTreeMap::new(),
            &["m1".to_string(), "m2".to_string()],
            &VectorExpressions::default(),
        )
        .unwrap_err();
        assert!(err.contains("permutation matrix"));
    }

    #[test]
    fn test_rotation_index_out_of_range_rejected() {
        let sectors = vec![sector(&[&["a", "b"], &["b", "c"]])];
        let mut rotation_map = BTreeMap::new();
        rotation_map.insert("alpha1".to_string(), [2, 0]);
        let err = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(2),
            &rotation_map,
            &["m1".to_string(), "m2".to_string()],
            &VectorExpressions::default(),
        )
        .unwrap_err();
        assert!(err.contains("rotation index"));
    }

    #[test]
    fn test_mass_count_not_multiple_rejected() {
        let sectors = vec![
            sector(&[&["a", "b"], &["b", "c"]]),
            sector(&[&["d", "e"], &["e", "f"]]),
        ];
        let err = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(4),
            &BTreeMap::new(),
            &["m1".to_string(), "m2".to_string(), "m3".to_string()],
            &VectorExpressions::default(),
        )
        .unwrap_err();
        assert!(err.contains("split evenly"));
    }

    #[test]
    fn test_sector_size_exceeding_dimension_rejected() {
        let sectors = vec![sector(&[&["a"]]), sector(&[&["b"]])];
        let err = emit_diagonalizer(
            &params(),
            &sectors,
            &identity(2),
            &BTreeMap::new(),
            &["m1".to_string(), "m2".to_string(), "m3".to_string(), "m4".to_string()],
            &VectorExpressions::default(),
        )
        .unwrap_err();
        assert!(err.contains("mass names per sector"));
    }
}
