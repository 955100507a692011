//! Serialized IR snapshot: the single structured document handed to the
//! downstream benchmark/optimization collaborator.
//!
//! Key order is deterministic (BTreeMap plus fixed field order) so that
//! regenerating from unchanged inputs is byte-identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::translate::ParsedExpression;

/// A named group of IR records sharing one semantic role, with the
/// originating file name for provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionFamily {
    pub expressions: Vec<ParsedExpression>,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolListTable {
    #[serde(rename = "allSymbols")]
    pub all_symbols: Vec<String>,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationMapTable {
    #[serde(rename = "scalarRotationMatrix")]
    pub rotation_map: BTreeMap<String, [usize; 2]>,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LagrangianVariablesTable {
    #[serde(rename = "lagranianVariables")]
    pub lagrangian_variables: Vec<String>,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MassNamesTable {
    #[serde(rename = "scalarMassNames")]
    pub mass_names: Vec<String>,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// The whole IR snapshot, keyed by expression-family name plus the
/// auxiliary declarative tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub families: BTreeMap<String, ExpressionFamily>,
    #[serde(rename = "allSymbols")]
    pub all_symbols: SymbolListTable,
    #[serde(rename = "scalarRotationMatrix")]
    pub rotation_map: RotationMapTable,
    #[serde(rename = "lagranianVariables")]
    pub lagrangian_variables: LagrangianVariablesTable,
    #[serde(rename = "scalarMassNames")]
    pub mass_names: MassNamesTable,
    #[serde(rename = "scalarPermutationMatrix")]
    pub permutation_matrix: Vec<Vec<String>>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| format!("cannot serialize IR snapshot: {}", e))
    }
}
