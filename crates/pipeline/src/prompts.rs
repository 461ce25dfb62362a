//! Prompt builders for the three model calls in the audit pipeline.

use crate::orchestrator::InvocationRecord;
use crate::report::TechnicalReport;

/// System prompt establishing the audit persona for the selection call.
pub fn web_audit_expert() -> &'static str {
    "You are a Senior Web Performance & Security Audit Expert with 10+ years experience.\n\
     \n\
     EXPERTISE AREAS:\n\
     - Core Web Vitals optimization (LCP, FID, CLS, INP)\n\
     - OWASP Top 10 security assessment\n\
     - Performance bottleneck identification\n\
     - Mobile-first optimization strategies\n\
     \n\
     TOOL USAGE PRINCIPLES:\n\
     - Always start with navigate_page to establish context\n\
     - Use performance_start_trace / performance_stop_trace for Core Web Vitals\n\
     - Execute evaluate_script for security analysis (HTTPS, headers, mixed content)\n\
     - Document findings with take_screenshot\n\
     \n\
     QUALITY REQUIREMENTS:\n\
     - Capture all Core Web Vitals metrics\n\
     - Validate security headers (CSP, HSTS, X-Frame-Options)\n\
     - Check HTTPS implementation\n\
     - Provide actionable recommendations with business impact"
}

/// User prompt for the tool-selection call.
pub fn tool_selection(url: &str) -> String {
    format!(
        "Perform a comprehensive web audit of: {url}\n\
         \n\
         REQUIRED WORKFLOW (execute in this order):\n\
         \n\
         Phase 1 - Foundation: navigate_page(url=\"{url}\"), then take_snapshot()\n\
         Phase 2 - Performance: performance_start_trace(reload=true, autoStop=true),\n\
         performance_stop_trace(), list_network_requests()\n\
         Phase 3 - Security: evaluate_script() checking HTTPS, security headers and\n\
         mixed content, then list_console_messages()\n\
         Phase 4 - Documentation: take_screenshot(fullPage=true)\n\
         \n\
         Select every tool the audit needs, in the order it should run.\n\
         Focus on actionable insights."
    )
}

/// User prompt for the analyzing call. Raw results, including recorded
/// errors, are embedded verbatim so partial data still informs the report.
pub fn analysis(url: &str, raw_results: &[InvocationRecord]) -> String {
    let results = serde_json::to_string_pretty(
        &raw_results.iter().map(InvocationRecord::to_value).collect::<Vec<_>>(),
    )
    .unwrap_or_else(|_| "[]".to_string());

    format!(
        "Senior Web Audit Expert: generate a comprehensive audit report.\n\
         \n\
         URL: {url}\n\
         Tool results (entries with an \"error\" field failed; analyze what succeeded):\n\
         {results}\n\
         \n\
         ANALYSIS MAPPING:\n\
         - Extract LCP, FID, CLS from the performance trace results\n\
         - Derive lighthouse_score and overall_score (0-100) from the data\n\
         - Extract HTTPS status and security headers (csp, hsts, x-frame-options)\n\
         - Each vulnerability: name, severity (low|medium|high|critical), description\n\
         - risk_level is the highest severity found (or \"low\" if none)\n\
         - Recommendations: title, priority (high|medium|low), description\n\
         \n\
         Return ONLY a JSON object with this exact shape, no prose:\n\
         {{\n\
           \"performance\": {{\"lighthouse_score\": int, \"core_web_vitals\": {{}},\n\
             \"ttfb\": float, \"fcp\": float, \"lcp\": float, \"cls\": float}},\n\
           \"security\": {{\"risk_level\": str, \"https_enabled\": bool,\n\
             \"security_headers\": {{str: bool}},\n\
             \"vulnerabilities\": [{{\"name\": str, \"severity\": str, \"description\": str}}]}},\n\
           \"recommendations\": [{{\"title\": str, \"priority\": str, \"description\": str}}],\n\
           \"overall_score\": int,\n\
           \"technical_details\": {{}}\n\
         }}"
    )
}

/// User prompt for the summarizing call.
pub fn executive_summary(report: &TechnicalReport) -> String {
    let audit_data =
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());

    format!(
        "As a Senior Digital Strategy Consultant, create an executive summary for\n\
         C-suite leadership from this audit data:\n\
         {audit_data}\n\
         \n\
         FOCUS: customer experience impact, security risk to operations, performance\n\
         impact on conversion rates, competitive implications.\n\
         \n\
         Return ONLY a JSON object, no prose:\n\
         {{\n\
           \"business_impact\": \"2-3 sentences on business implications\",\n\
           \"investment_priority\": \"immediate\" | \"quarterly\" | \"annual\",\n\
           \"roi_estimate\": \"expected return timeframe and percentage\",\n\
           \"action_timeline\": \"implementation phases with resource needs\",\n\
           \"key_risks\": [\"top 3 risks in business terms\"]\n\
         }}"
    )
}

/// Appended to a prompt when the previous response failed schema validation.
pub const SCHEMA_REMINDER: &str = "\n\nYour previous response was not valid JSON matching the \
     required shape. Respond again with ONLY the JSON object, no markdown fences, no commentary.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_selection_embeds_url() {
        let prompt = tool_selection("https://example.com");
        assert!(prompt.contains("https://example.com"));
        assert!(prompt.contains("navigate_page"));
    }

    #[test]
    fn test_analysis_embeds_results_and_schema() {
        let records = vec![InvocationRecord {
            name: "navigate_page".to_string(),
            args: serde_json::json!({"url": "https://example.com"}),
            outcome: Err("Timeout: 'tools/call' (id 3) exceeded 30s".to_string()),
            duration_ms: 30_000,
        }];
        let prompt = analysis("https://example.com", &records);
        assert!(prompt.contains("navigate_page"));
        assert!(prompt.contains("Timeout"));
        assert!(prompt.contains("\"risk_level\""));
    }
}
