//! The audit report data model. The analyzing and summarizing phases must
//! produce JSON that deserializes into these shapes; a parse failure is a
//! schema-validation failure subject to the per-phase retry policy.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub lighthouse_score: Option<u8>,
    #[serde(default)]
    pub core_web_vitals: HashMap<String, Value>,
    /// Seconds.
    #[serde(default)]
    pub ttfb: Option<f64>,
    #[serde(default)]
    pub fcp: Option<f64>,
    #[serde(default)]
    pub lcp: Option<f64>,
    #[serde(default)]
    pub cls: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub name: String,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAssessment {
    #[serde(default = "default_risk_level")]
    pub risk_level: String,
    #[serde(default)]
    pub https_enabled: bool,
    #[serde(default)]
    pub security_headers: HashMap<String, bool>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

fn default_risk_level() -> String {
    "unknown".to_string()
}

impl Default for SecurityAssessment {
    fn default() -> Self {
        Self {
            risk_level: default_risk_level(),
            https_enabled: false,
            security_headers: HashMap::new(),
            vulnerabilities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
}

/// Output of the analyzing phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalReport {
    #[serde(default)]
    pub performance: PerformanceMetrics,
    #[serde(default)]
    pub security: SecurityAssessment,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// 0-100.
    #[serde(default)]
    pub overall_score: Option<u8>,
    #[serde(default)]
    pub technical_details: Value,
}

/// Output of the summarizing phase, written for a non-technical audience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    #[serde(default)]
    pub business_impact: String,
    #[serde(default)]
    pub investment_priority: String,
    #[serde(default)]
    pub roi_estimate: String,
    #[serde(default)]
    pub action_timeline: String,
    #[serde(default)]
    pub key_risks: Vec<String>,
}

impl ExecutiveSummary {
    /// Placeholder used when the summarizing phase exhausts its retry
    /// budget. The audit still succeeds with this marker in place.
    pub fn unavailable() -> Self {
        Self {
            business_impact: "unavailable".to_string(),
            investment_priority: "unavailable".to_string(),
            roi_estimate: "unavailable".to_string(),
            action_timeline: "unavailable".to_string(),
            key_risks: Vec::new(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.business_impact == "unavailable"
    }
}

/// The terminal artifact of one audit. Immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedReport {
    pub audit_id: String,
    pub url: String,
    pub status: String,
    pub timestamp: String,
    pub performance: PerformanceMetrics,
    pub security: SecurityAssessment,
    pub recommendations: Vec<Recommendation>,
    pub overall_score: Option<u8>,
    pub executive_summary: ExecutiveSummary,
    #[serde(default)]
    pub technical_details: Value,
}

impl CombinedReport {
    pub fn assemble(url: &str, report: TechnicalReport, summary: ExecutiveSummary) -> Self {
        Self {
            audit_id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            status: "completed".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            performance: report.performance,
            security: report.security,
            recommendations: report.recommendations,
            overall_score: report.overall_score,
            executive_summary: summary,
            technical_details: report.technical_details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_technical_report_parses_model_output() {
        let raw = r#"{
            "performance": {
                "lighthouse_score": 78,
                "lcp": 2.9,
                "cls": 0.12,
                "core_web_vitals": {"inp": 210}
            },
            "security": {
                "risk_level": "medium",
                "https_enabled": true,
                "security_headers": {"csp": false, "hsts": true},
                "vulnerabilities": [
                    {"name": "Content Security Policy Missing", "severity": "medium",
                     "description": "No CSP header or meta tag found."}
                ]
            },
            "recommendations": [
                {"title": "Add a CSP header", "priority": "high",
                 "description": "Mitigates XSS."}
            ],
            "overall_score": 74
        }"#;
        let report: TechnicalReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.performance.lighthouse_score, Some(78));
        assert_eq!(report.security.risk_level, "medium");
        assert_eq!(report.security.vulnerabilities[0].severity, Severity::Medium);
        assert_eq!(report.recommendations[0].priority, Priority::High);
        assert_eq!(report.overall_score, Some(74));
    }

    #[test]
    fn test_technical_report_missing_sections_default() {
        let report: TechnicalReport = serde_json::from_str("{}").unwrap();
        assert!(report.performance.lighthouse_score.is_none());
        assert_eq!(report.security.risk_level, "unknown");
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_invalid_severity_is_rejected() {
        let raw = r#"{
            "security": {
                "vulnerabilities": [{"name": "x", "severity": "catastrophic"}]
            }
        }"#;
        assert!(serde_json::from_str::<TechnicalReport>(raw).is_err());
    }

    #[test]
    fn test_executive_summary_unavailable_marker() {
        let summary = ExecutiveSummary::unavailable();
        assert!(summary.is_unavailable());
        assert_eq!(summary.investment_priority, "unavailable");
        assert!(summary.key_risks.is_empty());
    }

    #[test]
    fn test_assemble_combined_report() {
        let report = TechnicalReport {
            performance: PerformanceMetrics::default(),
            security: SecurityAssessment::default(),
            recommendations: vec![],
            overall_score: Some(90),
            technical_details: json!({"notes": "clean"}),
        };
        let combined = CombinedReport::assemble(
            "https://example.com",
            report,
            ExecutiveSummary::unavailable(),
        );
        assert_eq!(combined.url, "https://example.com");
        assert_eq!(combined.status, "completed");
        assert_eq!(combined.overall_score, Some(90));
        assert!(!combined.audit_id.is_empty());
        assert!(combined.timestamp.contains('T'));
    }

    #[test]
    fn test_combined_report_serializes_executive_block() {
        let combined = CombinedReport::assemble(
            "https://example.com",
            serde_json::from_str("{}").unwrap(),
            ExecutiveSummary {
                business_impact: "Slow pages are costing conversions.".to_string(),
                investment_priority: "quarterly".to_string(),
                roi_estimate: "10-15% within two quarters".to_string(),
                action_timeline: "Phase 1 in 30 days".to_string(),
                key_risks: vec!["Missing CSP".to_string()],
            },
        );
        let val = serde_json::to_value(&combined).unwrap();
        assert_eq!(val["executive_summary"]["investment_priority"], "quarterly");
        assert_eq!(val["executive_summary"]["key_risks"][0], "Missing CSP");
    }
}
