use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub tenant_header: String,
    pub tenants: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantEntry {
    pub tenant: String,
    pub upstream: String,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        tenant_header: state.tenants.tenant_header().to_string(),
        tenants: state.tenants.table().len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn get_tenants(State(state): State<AdminState>) -> Json<Vec<TenantEntry>> {
    let entries = state
        .tenants
        .table()
        .entries()
        .into_iter()
        .map(|(tenant, upstream)| TenantEntry {
            tenant: tenant.to_string(),
            upstream: upstream.to_string(),
        })
        .collect();
    Json(entries)
}
