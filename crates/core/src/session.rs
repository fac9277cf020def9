//! Session context: structured, conversation-scoped memory of sales facts.
//!
//! The context is sparse: every field is optional. Updates are upsert
//! merges, so a patch only overwrites the fields it carries.

use serde::{Deserialize, Serialize};

/// Facts captured about the prospect during a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_monthly: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_total: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectives: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Overwrite `dst` with `src` when `src` is set, recording the field name.
macro_rules! merge_field {
    ($dst:expr, $src:expr, $name:literal, $written:ident) => {
        if let Some(value) = &$src {
            $dst = Some(value.clone());
            $written.push($name);
        }
    };
}

impl SessionContext {
    /// Upsert-merge `patch` into `self`.
    ///
    /// Returns the (wire) names of the fields that were written. Fields
    /// absent from the patch are left untouched.
    pub fn merge(&mut self, patch: &SessionContext) -> Vec<&'static str> {
        let mut written = Vec::new();
        merge_field!(self.brand_name, patch.brand_name, "brandName", written);
        merge_field!(self.brand_url, patch.brand_url, "brandUrl", written);
        merge_field!(self.industry, patch.industry, "industry", written);
        merge_field!(self.budget_monthly, patch.budget_monthly, "budgetMonthly", written);
        merge_field!(self.budget_total, patch.budget_total, "budgetTotal", written);
        merge_field!(self.timeline, patch.timeline, "timeline", written);
        merge_field!(self.target_audience, patch.target_audience, "targetAudience", written);
        merge_field!(self.geography, patch.geography, "geography", written);
        merge_field!(self.objectives, patch.objectives, "objectives", written);
        merge_field!(self.notes, patch.notes, "notes", written);
        written
    }

    /// Whether no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.render_lines().is_empty()
    }

    /// Render non-empty fields, one labeled line each.
    pub fn render(&self) -> String {
        self.render_lines().join("\n")
    }

    fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        push_text(&mut lines, "Brand", &self.brand_name);
        push_text(&mut lines, "Website", &self.brand_url);
        push_text(&mut lines, "Industry", &self.industry);
        if let Some(v) = self.budget_monthly {
            lines.push(format!("- Monthly budget: ${}", format_amount(v)));
        }
        if let Some(v) = self.budget_total {
            lines.push(format!("- Total budget: ${}", format_amount(v)));
        }
        push_text(&mut lines, "Timeline", &self.timeline);
        push_text(&mut lines, "Target audience", &self.target_audience);
        push_text(&mut lines, "Geography", &self.geography);
        if let Some(objectives) = self.objectives.as_ref().filter(|o| !o.is_empty()) {
            lines.push(format!("- Objectives: {}", objectives.join(", ")));
        }
        push_text(&mut lines, "Notes", &self.notes);
        lines
    }
}

fn push_text(lines: &mut Vec<String>, label: &str, value: &Option<String>) {
    if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(format!("- {label}: {v}"));
    }
}

fn format_amount(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}
