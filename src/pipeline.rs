//! The generation driver: reads every declarative input, translates each
//! expression family, validates the diagonalization tables, and produces the
//! full artifact set plus the serialized IR snapshot.
//!
//! All artifacts are rendered in memory before anything touches disk, so a
//! failing run never leaves a partially written output set.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::algebra;
use crate::config::GenerateConfig;
use crate::convert::{parse_matrix_rows, to_numpy_syntax};
use crate::decompose::decompose;
use crate::diagnostic::render_diagnostics;
use crate::emit::diagonalize::{
    emit_diagonalizer, split_matrix_literal, SectorMatrix, VectorExpressions,
};
use crate::emit::{emit_aggregator, emit_init, emit_order_module, emit_setup};
use crate::ir::{
    ExpressionFamily, LagrangianVariablesTable, MassNamesTable, RotationMapTable, Snapshot,
    SymbolListTable,
};
use crate::notation::{
    remove_suffices, replace_greek_symbols, replace_symbol_constants, SymbolTable,
};
use crate::translate::{translate_all, ParsedExpression, TranslationError, MISSING_IDENTIFIER};

pub struct Pipeline {
    config: GenerateConfig,
    verbose: bool,
}

/// A fully prepared run: every artifact rendered, nothing written yet.
#[derive(Debug)]
pub struct PreparedRun {
    pub snapshot: Snapshot,
    /// Output path and full content of every file this run will write.
    pub artifacts: Vec<(PathBuf, String)>,
}

impl Pipeline {
    pub fn new(config: GenerateConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    /// Validate and render everything without writing.
    pub fn check(&self) -> Result<PreparedRun, String> {
        self.prepare()
    }

    /// Render everything, then write the whole artifact set.
    pub fn run(&self) -> Result<PreparedRun, String> {
        let prepared = self.prepare()?;
        for (path, content) in &prepared.artifacts {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("cannot create '{}': {}", parent.display(), e))?;
            }
            fs::write(path, content)
                .map_err(|e| format!("cannot write '{}': {}", path.display(), e))?;
            if self.verbose {
                eprintln!("wrote {}", path.display());
            }
        }
        Ok(prepared)
    }

    fn prepare(&self) -> Result<PreparedRun, String> {
        let config = &self.config;

        let symbol_names: Vec<String> = read_json(&config.path(&config.all_symbols_file))?;
        let table = build_symbol_table(symbol_names)?;
        let parameters: Vec<String> = table.names().to_vec();

        let nnlo_file = if config.loop_order >= 2 {
            Some(config.nnlo_file.clone().ok_or_else(|| {
                format!("loop order {} requires an nnloFile entry", config.loop_order)
            })?)
        } else {
            None
        };

        // Indexed families: expressions rewritten to params[i] references
        let mut families = BTreeMap::new();
        let indexed: [(&str, &str, &str); 5] = [
            // The bounded family's provenance label is its family name
            ("bounded", &config.bounded_conditions_file, "bounded"),
            (
                "betaFunctions4D",
                &config.beta_functions4_d_file,
                &config.beta_functions4_d_file,
            ),
            (
                "hardToSoft",
                &config.hard_to_soft_file,
                &config.hard_to_soft_file,
            ),
            (
                "softScaleRGE",
                &config.soft_scale_rge_file,
                &config.soft_scale_rge_file,
            ),
            (
                "softToUltraSoft",
                &config.soft_to_ultra_soft_file,
                &config.soft_to_ultra_soft_file,
            ),
        ];
        for (family, declared, provenance) in indexed {
            let lines = read_lines(&config.path(declared))?;
            let expressions = self.translate_family(family, &lines, Some(&table), declared)?;
            families.insert(
                family.to_string(),
                ExpressionFamily {
                    expressions,
                    file_name: provenance.to_string(),
                },
            );
        }

        // Plain families keep symbol names in their expressions
        let vector_mass_lines = read_lines(&config.path(&config.vector_masses_squared_file))?;
        let vector_shorthand_lines = read_lines(&config.path(&config.vector_shorthands_file))?;
        let plain: [(&str, &Vec<String>, &str); 2] = [
            (
                "vectorMassesSquared",
                &vector_mass_lines,
                &config.vector_masses_squared_file,
            ),
            (
                "vectorShorthands",
                &vector_shorthand_lines,
                &config.vector_shorthands_file,
            ),
        ];
        for (family, lines, provenance) in plain {
            let expressions = self.translate_family(family, lines, None, provenance)?;
            families.insert(
                family.to_string(),
                ExpressionFamily {
                    expressions,
                    file_name: provenance.to_string(),
                },
            );
        }

        // The veff family concatenates all per-order expression files
        let mut veff_lines = read_lines(&config.path(&config.lo_file))?;
        veff_lines.extend(read_lines(&config.path(&config.nlo_file))?);
        if let Some(nnlo) = &nnlo_file {
            veff_lines.extend(read_lines(&config.path(nnlo))?);
        }
        let veff_expressions =
            self.translate_family("veff", &veff_lines, None, "Combined Veff files")?;
        families.insert(
            "veff".to_string(),
            ExpressionFamily {
                expressions: veff_expressions,
                file_name: "Combined Veff files".to_string(),
            },
        );

        // Scalar mass matrices: brace literals, entries translated one by one
        let matrix_lines = read_lines(&config.path(&config.scalar_mass_matrix_file))?;
        let (matrix_expressions, sectors) =
            self.translate_mass_matrices(&matrix_lines, &config.scalar_mass_matrix_file)?;
        families.insert(
            "scalarMassMatrices".to_string(),
            ExpressionFamily {
                expressions: matrix_expressions,
                file_name: config.scalar_mass_matrix_file.clone(),
            },
        );

        // Auxiliary tables
        let rotation_map: BTreeMap<String, [usize; 2]> =
            read_json(&config.path(&config.scalar_rotation_matrix_file))?;
        let lagrangian_variables: Vec<String> =
            read_json(&config.path(&config.lagranian_variables_file))?;
        let mass_names: Vec<String> = read_json(&config.path(&config.scalar_mass_names_file))?;
        let permutation_matrix = if config.has_permutation_matrix() {
            parse_matrix_rows(&read_lines(
                &config.path(&config.scalar_permutation_matrix_file),
            )?)
        } else {
            Vec::new()
        };

        // Per-order evaluator modules from the raw expression files
        let module_dir = config.path(&config.module_dir);
        let mut artifacts: Vec<(PathBuf, String)> = Vec::new();

        let mut order_files: Vec<(&str, String)> = vec![
            ("lo", config.lo_file.clone()),
            ("nlo", config.nlo_file.clone()),
        ];
        if let Some(nnlo) = &nnlo_file {
            order_files.push(("nnlo", nnlo.clone()));
        }
        for (order_name, declared) in &order_files {
            if self.verbose {
                eprintln!("generating {} evaluator from '{}'", order_name, declared);
            }
            let expression = read_to_string(&config.path(declared))?;
            let terms = decompose(expression.trim_end())
                .map_err(|e| format!("cannot decompose '{}': {}", declared, e))?;
            artifacts.push((
                module_dir.join(format!("{}.pyx", order_name)),
                emit_order_module(order_name, &parameters, &terms),
            ));
        }

        artifacts.push((
            module_dir.join("veff.py"),
            emit_aggregator(&parameters, config.loop_order),
        ));
        artifacts.push((module_dir.join("__init__.py"), emit_init()));
        artifacts.push((module_dir.join("setup.py"), emit_setup(config.loop_order)));

        if config.has_permutation_matrix() {
            if self.verbose {
                eprintln!("generating diagonalization glue");
            }
            let vectors = VectorExpressions {
                shorthands: vector_pairs(&vector_shorthand_lines, &config.vector_shorthands_file)?,
                masses: vector_pairs(&vector_mass_lines, &config.vector_masses_squared_file)?,
            };
            let source = emit_diagonalizer(
                &parameters,
                &sectors,
                &permutation_matrix,
                &rotation_map,
                &mass_names,
                &vectors,
            )?;
            artifacts.push((module_dir.join("diagonalize.py"), source));
        }

        let snapshot = Snapshot {
            families,
            all_symbols: SymbolListTable {
                all_symbols: parameters.clone(),
                file_name: config.all_symbols_file.clone(),
            },
            rotation_map: RotationMapTable {
                rotation_map,
                file_name: config.scalar_rotation_matrix_file.clone(),
            },
            lagrangian_variables: LagrangianVariablesTable {
                lagrangian_variables,
                file_name: config.lagranian_variables_file.clone(),
            },
            mass_names: MassNamesTable {
                mass_names,
                file_name: config.scalar_mass_names_file.clone(),
            },
            permutation_matrix,
        };

        artifacts.push((config.path(&config.snapshot_file), snapshot.to_json()?));

        Ok(PreparedRun {
            snapshot,
            artifacts,
        })
    }

    fn translate_family(
        &self,
        family: &str,
        lines: &[String],
        table: Option<&SymbolTable>,
        file_label: &str,
    ) -> Result<Vec<ParsedExpression>, String> {
        if self.verbose {
            eprintln!("translating family '{}' from '{}'", family, file_label);
        }
        translate_all(lines, table).map_err(|err| report_translation_failure(file_label, err))
    }

    /// Translate every matrix entry for the snapshot and collect the
    /// numpy-syntax sector matrices for the diagonalizer.
    fn translate_mass_matrices(
        &self,
        lines: &[String],
        file_label: &str,
    ) -> Result<(Vec<ParsedExpression>, Vec<SectorMatrix>), String> {
        let mut expressions = Vec::new();
        let mut sectors = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entries = split_matrix_literal(line)
                .map_err(|e| format!("'{}' line {}: {}", file_label, idx + 1, e))?;

            let mut symbols = BTreeSet::new();
            let mut canonical_rows = Vec::new();
            for row in &entries {
                let mut canonical_entries = Vec::new();
                for entry in row {
                    let prepared = replace_symbol_constants(&replace_greek_symbols(entry));
                    let expr = algebra::parse(&prepared, idx as u32).map_err(|diagnostics| {
                        render_diagnostics(&diagnostics, file_label, entry);
                        format!(
                            "'{}' line {}: malformed matrix entry '{}'",
                            file_label,
                            idx + 1,
                            entry
                        )
                    })?;
                    symbols.extend(expr.free_symbols());
                    canonical_entries.push(expr.canonical());
                }
                canonical_rows.push(format!("[{}]", canonical_entries.join(", ")));
            }

            expressions.push(ParsedExpression {
                identifier: MISSING_IDENTIFIER.to_string(),
                expression: format!("[{}]", canonical_rows.join(", ")),
                symbols: symbols.into_iter().collect(),
            });
            sectors.push(SectorMatrix {
                entries: entries
                    .iter()
                    .map(|row| row.iter().map(|entry| to_numpy_syntax(entry)).collect())
                    .collect(),
            });
        }
        Ok((expressions, sectors))
    }
}

/// Build the positional symbol table from the declared symbol list plus the
/// `missing` sentinel. Shared by the pipeline and the CLI translate command
/// so both resolve identical `params[i]` indices.
pub fn build_symbol_table(mut names: Vec<String>) -> Result<SymbolTable, String> {
    names.push(MISSING_IDENTIFIER.to_string());
    SymbolTable::new(&names)
}

/// Parse `name -> expression` lines into numpy-target assignment pairs.
fn vector_pairs(lines: &[String], file_label: &str) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (lhs, rhs) = line.split_once("->").ok_or_else(|| {
            format!(
                "'{}' line {}: vector expression needs a 'name -> expression' form",
                file_label,
                idx + 1
            )
        })?;
        pairs.push((
            remove_suffices(&replace_greek_symbols(lhs.trim())),
            to_numpy_syntax(rhs.trim()),
        ));
    }
    Ok(pairs)
}

fn report_translation_failure(file_label: &str, err: TranslationError) -> String {
    render_diagnostics(&err.diagnostics, file_label, &err.line);
    format!(
        "translation failed in '{}' at line {}",
        file_label,
        err.line_index + 1
    )
}

fn read_to_string(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))
}

fn read_lines(path: &Path) -> Result<Vec<String>, String> {
    Ok(read_to_string(path)?
        .lines()
        .map(|line| line.to_string())
        .collect())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    serde_json::from_str(&read_to_string(path)?)
        .map_err(|e| format!("invalid JSON in '{}': {}", path.display(), e))
}
