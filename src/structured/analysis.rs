//! The meal-analysis object returned in `analysis` mode.

use crate::structured::error::{ValidationError, ValidationReport};
use crate::structured::{completion_content, extract_json};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub calories: f64,
    pub macros: MacroBreakdown,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Health score, 1 to 100.
    pub score: f64,
}

/// Grams per macronutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroBreakdown {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

impl AnalysisResult {
    /// Parse the model's text answer (optionally wrapped in a code fence) and validate it.
    pub fn from_content(content: &str) -> Result<Self> {
        let value = extract_json(content).ok_or_else(|| {
            Error::validation(
                "analysis content is not JSON",
                vec![ValidationError::without_path("no JSON object found in content")],
            )
        })?;
        Self::from_value(value)
    }

    /// Pull the analysis out of a full chat-completion body.
    pub fn from_completion(body: &Value) -> Result<Self> {
        let content = completion_content(body).ok_or_else(|| {
            Error::validation(
                "completion has no message content",
                vec![ValidationError::with_path(
                    "missing or not a string",
                    "choices[0].message.content".to_string(),
                )],
            )
        })?;
        Self::from_content(content)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let parsed: Self = serde_json::from_value(value).map_err(|e| {
            Error::validation(
                "analysis does not match the expected shape",
                vec![ValidationError::without_path(e.to_string())],
            )
        })?;
        parsed
            .validate()
            .into_result()
            .map_err(|errors| Error::validation("analysis failed validation", errors))?;
        Ok(parsed)
    }

    /// Range checks that the type system cannot express.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        if self.name.trim().is_empty() {
            report.push("name", "must not be empty");
        }
        check_amount(&mut report, "calories", self.calories);
        check_amount(&mut report, "macros.protein", self.macros.protein);
        check_amount(&mut report, "macros.carbs", self.macros.carbs);
        check_amount(&mut report, "macros.fat", self.macros.fat);
        check_amount(&mut report, "macros.fiber", self.macros.fiber);
        if !(1.0..=100.0).contains(&self.score) {
            report.push("score", "must be between 1 and 100");
        }
        report
    }
}

fn check_amount(report: &mut ValidationReport, path: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        report.push(path, "must be a non-negative number");
    }
}
