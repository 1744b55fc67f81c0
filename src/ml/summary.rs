// ============================================================
// Layer 5 — Architecture Summary
// ============================================================
// Text table of layers, output shapes and trainable parameters:
//
//   Model: dense (input width 10)
//   Layer                    Output shape        Params
//   ──────────────────────────────────────────────────
//   dense (relu)             [batch, 8]              88
//   dense (linear)           [batch, 1]               9
//   ──────────────────────────────────────────────────
//   Total params: 97

use std::fmt;

use crate::domain::architecture::{ArchitecturePlan, LayerRow, ModelKind};

const RULE_WIDTH: usize = 52;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub kind:         ModelKind,
    pub input_width:  usize,
    pub rows:         Vec<LayerRow>,
    pub total_params: usize,
}

impl ModelSummary {
    pub fn from_plan(plan: &ArchitecturePlan) -> Self {
        Self {
            kind:         plan.kind,
            input_width:  plan.input_width,
            rows:         plan.rows.clone(),
            total_params: plan.total_params(),
        }
    }
}

fn shape(dims: &[usize]) -> String {
    let dims: Vec<String> = dims.iter().map(usize::to_string).collect();
    if dims.is_empty() {
        "[batch]".into()
    } else {
        format!("[batch, {}]", dims.join(", "))
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "─".repeat(RULE_WIDTH);
        writeln!(f, "Model: {} (input width {})", self.kind, self.input_width)?;
        writeln!(f, "{:<24} {:<18} {:>8}", "Layer", "Output shape", "Params")?;
        writeln!(f, "{rule}")?;
        for row in &self.rows {
            writeln!(f, "{:<24} {:<18} {:>8}", row.name, shape(&row.output_shape), row.params)?;
        }
        writeln!(f, "{rule}")?;
        write!(f, "Total params: {}", self.total_params)
    }
}
