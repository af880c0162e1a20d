//! API request and response types

use crate::resolver::ClientAction;
use serde::{Deserialize, Serialize};

/// Liveness payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Request to ask a question
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Opaque caller identifier
    pub user_id: String,
    pub question: String,
}

/// Answer to a question
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub llm_answer: String,
    /// `null` unless the client should act, e.g. `call_investment_options`
    pub action_to_perform: Option<ClientAction>,
}

/// One purchasable plan
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvestmentOption {
    pub plan_name: &'static str,
    pub duration_months: u32,
    pub min_investment: f64,
    pub description: &'static str,
}

/// Plan catalog plus the ordered steps to buy one
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvestmentSteps {
    pub options: Vec<InvestmentOption>,
    pub purchase_steps: Vec<&'static str>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
