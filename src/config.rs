//! Generation manifest: one JSON document naming every declarative input,
//! the loop order, and the output locations.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Sentinel file name meaning "no permutation matrix, skip diagonalization".
pub const NO_PERMUTATION: &str = "none";

/// The generation manifest (`veffgen.json`). Relative paths are resolved
/// against the manifest's directory.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateConfig {
    /// Perturbative depth; `>= 2` adds the NNLO evaluator.
    pub loop_order: u32,
    pub lo_file: String,
    pub nlo_file: String,
    #[serde(default)]
    pub nnlo_file: Option<String>,
    pub bounded_conditions_file: String,
    pub beta_functions4_d_file: String,
    pub hard_to_soft_file: String,
    #[serde(rename = "softScaleRGEFile")]
    pub soft_scale_rge_file: String,
    pub soft_to_ultra_soft_file: String,
    pub vector_masses_squared_file: String,
    pub vector_shorthands_file: String,
    pub scalar_mass_matrix_file: String,
    pub scalar_rotation_matrix_file: String,
    /// Brace-literal text rows, or the sentinel `"none"`.
    pub scalar_permutation_matrix_file: String,
    pub all_symbols_file: String,
    pub lagranian_variables_file: String,
    pub scalar_mass_names_file: String,
    /// Directory receiving the generated numeric package.
    pub module_dir: String,
    /// Path of the serialized IR snapshot.
    pub snapshot_file: String,

    #[serde(skip)]
    root: PathBuf,
}

impl GenerateConfig {
    /// Load and validate a manifest from disk.
    pub fn load(manifest_path: &Path) -> Result<GenerateConfig, String> {
        let content = std::fs::read_to_string(manifest_path)
            .map_err(|e| format!("cannot read '{}': {}", manifest_path.display(), e))?;
        let mut config: GenerateConfig = serde_json::from_str(&content)
            .map_err(|e| format!("invalid manifest '{}': {}", manifest_path.display(), e))?;
        config.root = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        if config.loop_order >= 2 && config.nnlo_file.is_none() {
            return Err(format!(
                "loop order {} requires an nnloFile entry",
                config.loop_order
            ));
        }
        Ok(config)
    }

    /// Resolve a manifest-declared path against the manifest directory.
    pub fn path(&self, declared: &str) -> PathBuf {
        self.root.join(declared)
    }

    pub fn has_permutation_matrix(&self) -> bool {
        self.scalar_permutation_matrix_file.to_lowercase() != NO_PERMUTATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn manifest_json(loop_order: u32, nnlo: Option<&str>) -> String {
        let nnlo_entry = match nnlo {
            Some(path) => format!("\"nnloFile\": \"{}\",", path),
            None => String::new(),
        };
        format!(
            r#"{{
                "loopOrder": {loop_order},
                "loFile": "lo.txt",
                "nloFile": "nlo.txt",
                {nnlo_entry}
                "boundedConditionsFile": "bounded.txt",
                "betaFunctions4DFile": "beta4d.txt",
                "hardToSoftFile": "hard_to_soft.txt",
                "softScaleRGEFile": "soft_rge.txt",
                "softToUltraSoftFile": "soft_to_ultrasoft.txt",
                "vectorMassesSquaredFile": "vector_masses.txt",
                "vectorShorthandsFile": "vector_shorthands.txt",
                "scalarMassMatrixFile": "mass_matrices.txt",
                "scalarRotationMatrixFile": "rotation.json",
                "scalarPermutationMatrixFile": "permutation.txt",
                "allSymbolsFile": "all_symbols.json",
                "lagranianVariablesFile": "lagrangian_variables.json",
                "scalarMassNamesFile": "mass_names.json",
                "moduleDir": "Veff",
                "snapshotFile": "out/parsed_expressions.json"
            }}"#
        )
    }

    fn write_manifest(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("veffgen.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_resolves_paths_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), &manifest_json(1, None));
        let config = GenerateConfig::load(&path).unwrap();
        assert_eq!(config.loop_order, 1);
        assert_eq!(config.path(&config.lo_file), dir.path().join("lo.txt"));
        assert!(config.has_permutation_matrix());
    }

    #[test]
    fn test_nnlo_required_for_two_loops() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), &manifest_json(2, None));
        let err = GenerateConfig::load(&path).unwrap_err();
        assert!(err.contains("nnloFile"));

        let path = write_manifest(dir.path(), &manifest_json(2, Some("nnlo.txt")));
        let config = GenerateConfig::load(&path).unwrap();
        assert_eq!(config.nnlo_file.as_deref(), Some("nnlo.txt"));
    }

    #[test]
    fn test_permutation_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let json = manifest_json(1, None)
            .replace("\"permutation.txt\"", "\"none\"");
        let path = write_manifest(dir.path(), &json);
        let config = GenerateConfig::load(&path).unwrap();
        assert!(!config.has_permutation_matrix());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let json = manifest_json(1, None).replace("\"loopOrder\"", "\"typoOrder\"");
        let path = write_manifest(dir.path(), &json);
        assert!(GenerateConfig::load(&path).is_err());
    }
}
