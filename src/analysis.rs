use serde::{Deserialize, Serialize};

/// Coarse classification attached to a clause or an assistant reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Safe,
    Warning,
    Risk,
    Neutral,
}

impl RiskCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Safe => "SAFE",
            RiskCategory::Warning => "WARNING",
            RiskCategory::Risk => "RISK",
            RiskCategory::Neutral => "NEUTRAL",
        }
    }

    /// Legend entries shown next to the Q&A chat.
    pub fn legend() -> [(RiskCategory, &'static str, &'static str); 4] {
        [
            (RiskCategory::Safe, "Safe", "Low risk information"),
            (RiskCategory::Warning, "Attention", "Requires attention"),
            (RiskCategory::Risk, "High Risk", "Needs legal counsel"),
            (RiskCategory::Neutral, "Neutral", "General information"),
        ]
    }
}

/// Document-level risk aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    pub text: String,
    pub category: RiskCategory,
    pub explanation: String,
    pub law_reference: Option<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: String,
    pub overall_risk: RiskLevel,
    pub clauses: Vec<Clause>,
    pub next_steps: Vec<String>,
    pub negotiation_points: Vec<String>,
    pub human_review_required: bool,
}

/// Progress lines shown while a document is being analyzed.
pub const ANALYZING_STAGES: [&str; 4] = [
    "Extracting text and clauses",
    "Analyzing legal implications",
    "Assessing risk factors",
    "Generating recommendations",
];

/// The canned rental-agreement analysis returned for every document.
pub fn sample_report() -> AnalysisReport {
    AnalysisReport {
        summary: "This is a rental agreement with standard terms. Several clauses require \
                  attention, particularly regarding security deposit and termination conditions. \
                  Some risk factors have been identified that may require negotiation or legal \
                  review."
            .to_string(),
        overall_risk: RiskLevel::Medium,
        clauses: vec![
            Clause {
                id: "1".to_string(),
                text: "The tenant shall pay a security deposit equivalent to 3 months' rent upon \
                       signing this agreement."
                    .to_string(),
                category: RiskCategory::Safe,
                explanation: "This is a standard security deposit clause commonly found in Indian \
                              rental agreements. The amount is reasonable and within legal limits."
                    .to_string(),
                law_reference: Some(
                    "The Rent Control Act allows landlords to collect security deposit up to 10 \
                     months' rent in most states."
                        .to_string(),
                ),
                recommendations: vec![
                    "Ensure deposit refund conditions are clearly mentioned".to_string(),
                    "Get receipt for security deposit payment".to_string(),
                ],
            },
            Clause {
                id: "2".to_string(),
                text: "The landlord reserves the right to terminate this agreement with 15 days \
                       notice for any reason."
                    .to_string(),
                category: RiskCategory::Warning,
                explanation: "This clause gives significant power to the landlord and may not \
                              provide adequate protection to the tenant."
                    .to_string(),
                law_reference: Some(
                    "Most state rent control laws require 30-90 days notice period for \
                     termination without cause."
                        .to_string(),
                ),
                recommendations: vec![
                    "Negotiate for longer notice period".to_string(),
                    "Add conditions for valid reasons for termination".to_string(),
                    "Seek legal advice if disputed".to_string(),
                ],
            },
            Clause {
                id: "3".to_string(),
                text: "Any damage to the property, regardless of cause, shall be fully \
                       compensated by the tenant including natural wear and tear."
                    .to_string(),
                category: RiskCategory::Risk,
                explanation: "This clause is potentially unfair and may not be legally \
                              enforceable. Normal wear and tear should not be tenant's \
                              responsibility."
                    .to_string(),
                law_reference: Some(
                    "Indian Contract Act and various state tenancy laws protect tenants from \
                     liability for normal wear and tear."
                        .to_string(),
                ),
                recommendations: vec![
                    "Strongly negotiate to remove this clause".to_string(),
                    "Demand property condition documentation".to_string(),
                    "Consider legal consultation".to_string(),
                ],
            },
            Clause {
                id: "4".to_string(),
                text: "The monthly rent is ₹25,000 and shall be paid by the 5th of each month."
                    .to_string(),
                category: RiskCategory::Neutral,
                explanation: "Standard rent payment clause with clear amount and due date \
                              specified."
                    .to_string(),
                law_reference: Some(
                    "Payment terms should be clearly defined as per Indian Contract Act."
                        .to_string(),
                ),
                recommendations: vec![
                    "Ensure you understand late payment penalties".to_string(),
                    "Keep payment records".to_string(),
                ],
            },
        ],
        next_steps: vec![
            "Review and negotiate the termination clause for better tenant protection".to_string(),
            "Demand removal or modification of the unfair damage liability clause".to_string(),
            "Ensure all utility and maintenance responsibilities are clearly defined".to_string(),
            "Get legal review before signing, especially for high-risk clauses".to_string(),
            "Document property condition with photos before moving in".to_string(),
        ],
        negotiation_points: vec![
            "Extend notice period for termination from 15 to 30+ days".to_string(),
            "Limit damage liability to exclude normal wear and tear".to_string(),
            "Add clause for landlord's maintenance responsibilities".to_string(),
            "Include rent escalation limits and conditions".to_string(),
            "Specify conditions for security deposit refund".to_string(),
        ],
        human_review_required: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_report_covers_every_category() {
        let report = sample_report();
        assert_eq!(report.clauses.len(), 4);
        assert_eq!(report.overall_risk, RiskLevel::Medium);
        assert!(report.human_review_required);
        assert_eq!(report.next_steps.len(), 5);
        assert_eq!(report.negotiation_points.len(), 5);

        for category in [
            RiskCategory::Safe,
            RiskCategory::Warning,
            RiskCategory::Risk,
            RiskCategory::Neutral,
        ] {
            assert!(
                report.clauses.iter().any(|c| c.category == category),
                "missing a {:?} clause",
                category
            );
        }
        for clause in &report.clauses {
            assert!(clause.law_reference.is_some());
            assert!(!clause.recommendations.is_empty());
        }
    }

    #[test]
    fn risk_enums_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&RiskCategory::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"medium\"");
        let parsed: RiskCategory = serde_json::from_str("\"risk\"").unwrap();
        assert_eq!(parsed, RiskCategory::Risk);
    }
}
