//! Health endpoint and model listing

use serde_json::json;
use std::sync::Arc;

use super::Context;
use crate::common::Result;
use crate::testing::check::{self, JsonType};
use crate::testing::{CheckResult, Registry};

const CATEGORY: &str = "connectivity";

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("health_endpoint", CATEGORY, health_endpoint)?;
    registry.register("health_method_not_allowed", CATEGORY, health_method_not_allowed)?;
    registry.register("models_list", CATEGORY, models_list)?;
    registry.register("models_structure", CATEGORY, models_structure)?;
    registry.register("models_expected", CATEGORY, models_expected)?;
    Ok(())
}

async fn health_endpoint(ctx: Arc<Context>) -> CheckResult {
    let response = ctx.http.get("/health").await?;
    check::status_code_equals(&response, 200, "Health endpoint should return 200")?;
    let body = response.json()?;
    check::equal(&body["status"], &json!("ok"), "Status should be 'ok'")
}

async fn health_method_not_allowed(ctx: Arc<Context>) -> CheckResult {
    let response = ctx.http.post("/health").await?;
    check::status_code_equals(&response, 405, "POST /health should return 405")
}

async fn models_list(ctx: Arc<Context>) -> CheckResult {
    let models = ctx.chat.list_models().await?;
    check::greater(&models.len(), &0, "Should have at least one model")
}

async fn models_structure(ctx: Arc<Context>) -> CheckResult {
    let models = ctx.chat.list_models().await?;
    for model in &models {
        check::has_field(model, "id", "Model should have 'id'")?;
        check::has_field(model, "object", "Model should have 'object'")?;
        check::has_field(model, "created", "Model should have 'created'")?;
        check::has_field(model, "owned_by", "Model should have 'owned_by'")?;
        check::of_type(&model["id"], JsonType::String, "Model id should be a string")?;
        check::equal(&model["object"], &json!("model"), "Model object should be 'model'")?;
    }
    Ok(())
}

async fn models_expected(ctx: Arc<Context>) -> CheckResult {
    let models = ctx.chat.list_models().await?;
    let ids: Vec<String> = models
        .iter()
        .filter_map(|m| m["id"].as_str())
        .map(str::to_string)
        .collect();

    for expected in ctx.provider().expected_models {
        check::member_of(
            &expected.to_string(),
            &ids,
            &format!("Expected model '{}' in list", expected),
        )?;
    }
    Ok(())
}
