//! Test suites, their test cases and their runs.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, Query, State};
use serde_json::Value;

use crate::gateway::auth::AuthenticatedUser;
use crate::gateway::handlers::creator_stamps;
use crate::gateway::pagination::{PageRequest, Paginated};
use crate::gateway::schemas::{
    CREATE_TEST, CREATE_TEST_SUITE, START_RUN, UPDATE_RUN, UPDATE_TEST, UPDATE_TEST_SUITE,
};
use crate::gateway::server::GatewayState;
use crate::gateway::types::*;
use crate::vapi::{Stamped, StartRunParams, TestCaseParams, TestSuiteParams, UpdateRunParams};

fn missing_suite(id: &str) -> impl FnOnce() -> String + '_ {
    move || format!("Suite de tests avec l'ID {id} non trouvée")
}

fn missing_test<'a>(suite_id: &'a str, test_id: &'a str) -> impl FnOnce() -> String + 'a {
    move || format!("Test avec l'ID {test_id} non trouvé dans la suite {suite_id}")
}

fn missing_run<'a>(suite_id: &'a str, run_id: &'a str) -> impl FnOnce() -> String + 'a {
    move || format!("Exécution avec l'ID {run_id} non trouvée dans la suite {suite_id}")
}

// --- Suites ---

pub async fn test_suites_list_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    let request = PageRequest::from_query(&query);
    let page = state.vapi.list_test_suites(request.list_params()).await?;
    listed(page, request)
}

pub async fn test_suites_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Value>> {
    let suite = state
        .vapi
        .get_test_suite(&id)
        .await
        .map_err(not_found_as(missing_suite(&id)))?;
    ok(suite)
}

pub async fn test_suites_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: TestSuiteParams = CREATE_TEST_SUITE.parse(&body)?;
    params.stamp(&creator_stamps(&user));
    created(state.vapi.create_test_suite(&params).await?)
}

pub async fn test_suites_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let params: TestSuiteParams = UPDATE_TEST_SUITE.parse(&body)?;
    let suite = state
        .vapi
        .update_test_suite(&id, &params)
        .await
        .map_err(not_found_as(missing_suite(&id)))?;
    ok(suite)
}

pub async fn test_suites_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .delete_test_suite(&id)
        .await
        .map_err(not_found_as(missing_suite(&id)))?;
    deleted(id)
}

// --- Tests ---

pub async fn tests_list_handler(
    State(state): State<Arc<GatewayState>>,
    Path(suite_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    let request = PageRequest::from_query(&query);
    let page = state
        .vapi
        .list_tests(&suite_id, request.list_params())
        .await
        .map_err(not_found_as(missing_suite(&suite_id)))?;
    listed(page, request)
}

pub async fn tests_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path((suite_id, test_id)): Path<(String, String)>,
) -> ApiResult<Data<Value>> {
    let test = state
        .vapi
        .get_test(&suite_id, &test_id)
        .await
        .map_err(not_found_as(missing_test(&suite_id, &test_id)))?;
    ok(test)
}

pub async fn tests_create_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(suite_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: TestCaseParams = CREATE_TEST.parse(&body)?;
    params.stamp(&creator_stamps(&user));
    let test = state
        .vapi
        .create_test(&suite_id, &params)
        .await
        .map_err(not_found_as(missing_suite(&suite_id)))?;
    created(test)
}

pub async fn tests_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path((suite_id, test_id)): Path<(String, String)>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let params: TestCaseParams = UPDATE_TEST.parse(&body)?;
    let test = state
        .vapi
        .update_test(&suite_id, &test_id, &params)
        .await
        .map_err(not_found_as(missing_test(&suite_id, &test_id)))?;
    ok(test)
}

pub async fn tests_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path((suite_id, test_id)): Path<(String, String)>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .delete_test(&suite_id, &test_id)
        .await
        .map_err(not_found_as(missing_test(&suite_id, &test_id)))?;
    deleted(test_id)
}

// --- Runs ---

pub async fn runs_list_handler(
    State(state): State<Arc<GatewayState>>,
    Path(suite_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Paginated<Value>> {
    let request = PageRequest::from_query(&query);
    let page = state
        .vapi
        .list_runs(&suite_id, request.list_params())
        .await
        .map_err(not_found_as(missing_suite(&suite_id)))?;
    listed(page, request)
}

pub async fn runs_get_handler(
    State(state): State<Arc<GatewayState>>,
    Path((suite_id, run_id)): Path<(String, String)>,
) -> ApiResult<Data<Value>> {
    let run = state
        .vapi
        .get_run(&suite_id, &run_id)
        .await
        .map_err(not_found_as(missing_run(&suite_id, &run_id)))?;
    ok(run)
}

pub async fn runs_start_handler(
    State(state): State<Arc<GatewayState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(suite_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let mut params: StartRunParams = START_RUN.parse(&body)?;
    params.stamp(&creator_stamps(&user));
    let run = state
        .vapi
        .start_run(&suite_id, &params)
        .await
        .map_err(not_found_as(missing_suite(&suite_id)))?;
    tracing::info!(suite_id = %suite_id, user_id = %user.id, "Test suite run started");
    created(run)
}

pub async fn runs_update_handler(
    State(state): State<Arc<GatewayState>>,
    Path((suite_id, run_id)): Path<(String, String)>,
    JsonBody(body): JsonBody,
) -> ApiResult<Data<Value>> {
    let params: UpdateRunParams = UPDATE_RUN.parse(&body)?;
    let run = state
        .vapi
        .update_run(&suite_id, &run_id, &params)
        .await
        .map_err(not_found_as(missing_run(&suite_id, &run_id)))?;
    ok(run)
}

pub async fn runs_delete_handler(
    State(state): State<Arc<GatewayState>>,
    Path((suite_id, run_id)): Path<(String, String)>,
) -> ApiResult<Data<Deleted>> {
    state
        .vapi
        .delete_run(&suite_id, &run_id)
        .await
        .map_err(not_found_as(missing_run(&suite_id, &run_id)))?;
    deleted(run_id)
}
