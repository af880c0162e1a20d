//! Static investment catalog served to clients after an accepted nudge

use super::types::{InvestmentOption, InvestmentSteps};

const PLANS: [InvestmentOption; 3] = [
    InvestmentOption {
        plan_name: "Gold Starter Pack",
        duration_months: 6,
        min_investment: 500.00,
        description: "A perfect plan for beginners.",
    },
    InvestmentOption {
        plan_name: "Steady Saver",
        duration_months: 12,
        min_investment: 1000.00,
        description: "Systematically invest every month for a year.",
    },
    InvestmentOption {
        plan_name: "Wealth Builder",
        duration_months: 24,
        min_investment: 2500.00,
        description: "A long-term plan for serious investors.",
    },
];

const PURCHASE_STEPS: [&str; 4] = [
    "1. Select a plan.",
    "2. Complete KYC.",
    "3. Make payment.",
    "4. Gold is credited!",
];

pub fn investment_catalog() -> InvestmentSteps {
    InvestmentSteps {
        options: PLANS.to_vec(),
        purchase_steps: PURCHASE_STEPS.to_vec(),
    }
}
