//! Placeholder data sources.
//!
//! Stand-ins for the client spreadsheet, target location list and census
//! tables the agents would read in production.

use serde::Serialize;

/// A client whose policy renews soon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenewalClient {
    pub id: &'static str,
    pub name: &'static str,
    pub email: &'static str,
    pub renewal_date: &'static str,
    pub policy_type: &'static str,
}

/// A market that gets its own landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub name: &'static str,
    pub zip: &'static str,
    pub state_code: &'static str,
}

/// Census summary for one ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    pub zip: &'static str,
    pub median_income: u32,
    pub avg_household_size: f32,
    pub median_age: u32,
}

pub fn renewal_clients() -> Vec<RenewalClient> {
    vec![
        RenewalClient {
            id: "C123",
            name: "John Doe",
            email: "john.doe@example.com",
            renewal_date: "2025-09-01",
            policy_type: "Term Life",
        },
        RenewalClient {
            id: "C456",
            name: "Jane Smith",
            email: "jane.smith@example.com",
            renewal_date: "2025-09-15",
            policy_type: "Whole Life",
        },
    ]
}

pub fn locations() -> Vec<Location> {
    vec![
        Location {
            name: "New Jersey",
            zip: "07302",
            state_code: "NJ",
        },
        Location {
            name: "New York",
            zip: "10001",
            state_code: "NY",
        },
    ]
}

pub fn demographics() -> Vec<Demographics> {
    vec![
        Demographics {
            zip: "07302",
            median_income: 150_000,
            avg_household_size: 2.1,
            median_age: 34,
        },
        Demographics {
            zip: "07030",
            median_income: 120_000,
            avg_household_size: 2.5,
            median_age: 38,
        },
        Demographics {
            zip: "07307",
            median_income: 90_000,
            avg_household_size: 3.1,
            median_age: 42,
        },
    ]
}
