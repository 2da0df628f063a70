use anyhow::anyhow;
use visamap_api_models::{
    AckResponse, AuthRequest, DeleteResponse, PolicyKeyRequest, PolicyListQuery,
    PolicyUpsertRequest, PolicyView,
};

use crate::cli::{KeyArgs, ListArgs, OutputFormat, SetArgs};
use crate::client::{
    AppContext, CliError, CliResult, HEADER_ADMIN_PASSWORD, classify_problem, require_key,
};
use crate::output::{render_policy, render_policy_list};

const POLICIES_PATH: &str = "/api/admin/visa-policies";

pub(crate) async fn handle_login(ctx: &AppContext) -> CliResult<()> {
    let password = ctx.require_password()?;
    let url = ctx.endpoint("/api/admin/auth")?;

    let response = ctx
        .client
        .post(url)
        .json(&AuthRequest {
            password: password.to_string(),
        })
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/admin/auth failed: {err}")))?;

    if response.status().is_success() {
        let ack = response
            .json::<AckResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse response: {err}")))?;
        if ack.ok {
            println!("Admin password accepted.");
        }
        Ok(())
    } else {
        Err(classify_problem(response).await)
    }
}

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: ListArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let url = ctx.endpoint(POLICIES_PATH)?;
    let query = PolicyListQuery {
        origin: args.origin,
        destination: args.destination,
    };

    let response = ctx
        .client
        .get(url)
        .query(&query)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to {POLICIES_PATH} failed: {err}")))?;

    if response.status().is_success() {
        let entries = response
            .json::<Vec<PolicyView>>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse policy list: {err}")))?;
        render_policy_list(&entries, format)
    } else {
        Err(classify_problem(response).await)
    }
}

pub(crate) async fn handle_set(
    ctx: &AppContext,
    args: SetArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let SetArgs {
        origin,
        destination,
        policy,
        duration,
    } = args;
    let password = ctx.require_password()?;
    let request = PolicyUpsertRequest {
        origin: require_key("origin", &origin)?,
        destination: require_key("destination", &destination)?,
        policy_code: Some(i64::from(policy)),
        duration_days: Some(i64::from(duration.unwrap_or(0))),
    };
    let url = ctx.endpoint(POLICIES_PATH)?;

    let response = ctx
        .client
        .put(url)
        .header(HEADER_ADMIN_PASSWORD, password)
        .json(&request)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to {POLICIES_PATH} failed: {err}")))?;

    if response.status().is_success() {
        let stored = response
            .json::<PolicyView>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse stored entry: {err}")))?;
        render_policy(&stored, format)
    } else {
        Err(classify_problem(response).await)
    }
}

pub(crate) async fn handle_delete(ctx: &AppContext, args: KeyArgs) -> CliResult<()> {
    let KeyArgs {
        origin,
        destination,
    } = args;
    let password = ctx.require_password()?;
    let request = PolicyKeyRequest {
        origin: require_key("origin", &origin)?,
        destination: require_key("destination", &destination)?,
    };
    let url = ctx.endpoint(POLICIES_PATH)?;

    let response = ctx
        .client
        .delete(url)
        .header(HEADER_ADMIN_PASSWORD, password)
        .json(&request)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to {POLICIES_PATH} failed: {err}")))?;

    if response.status().is_success() {
        let ack = response
            .json::<DeleteResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse response: {err}")))?;
        if ack.removed {
            println!("Removed {} -> {}.", request.origin, request.destination);
        } else {
            println!(
                "No entry for {} -> {}; nothing removed.",
                request.origin, request.destination
            );
        }
        Ok(())
    } else {
        Err(classify_problem(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn context_with(server: &MockServer, password: Option<&str>) -> Result<AppContext> {
        Ok(AppContext {
            client: Client::new(),
            base_url: server
                .base_url()
                .parse()
                .map_err(|_| anyhow!("valid URL"))?,
            password: password.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn login_posts_password_body() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/admin/auth")
                .json_body(json!({"password": "hunter2"}));
            then.status(200).json_body(json!({"ok": true}));
        });

        handle_login(&context_with(&server, Some("hunter2"))?).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn login_rejection_is_a_validation_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/admin/auth");
            then.status(401).json_body(json!({
                "type": "https://visamap.dev/problems/unauthorized",
                "title": "authentication required",
                "status": 401,
                "detail": "admin password rejected"
            }));
        });

        let err = handle_login(&context_with(&server, Some("wrong"))?)
            .await
            .expect_err("rejected");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "admin password rejected");
        Ok(())
    }

    #[tokio::test]
    async fn list_forwards_filters() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(POLICIES_PATH)
                .query_param("origin", "Germany");
            then.status(200).json_body(json!([
                {"origin": "Germany", "destination": "Canada", "policyCode": 8, "durationDays": 180}
            ]));
        });

        let args = ListArgs {
            origin: Some("Germany".to_string()),
            destination: None,
        };
        handle_list(&context_with(&server, None)?, args, OutputFormat::Table).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn set_sends_header_and_body() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path(POLICIES_PATH)
                .header(HEADER_ADMIN_PASSWORD, "hunter2")
                .json_body(json!({
                    "origin": "Germany",
                    "destination": "Canada",
                    "policyCode": 7,
                    "durationDays": 180
                }));
            then.status(200).json_body(json!({
                "origin": "Germany",
                "destination": "Canada",
                "policyCode": 7,
                "durationDays": 180
            }));
        });

        let args = SetArgs {
            origin: " Germany".to_string(),
            destination: "Canada ".to_string(),
            policy: 7,
            duration: Some(180),
        };
        handle_set(&context_with(&server, Some("hunter2"))?, args, OutputFormat::Json).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn set_without_password_fails_locally() -> Result<()> {
        let server = MockServer::start_async().await;
        let args = SetArgs {
            origin: "Germany".to_string(),
            destination: "Canada".to_string(),
            policy: 7,
            duration: None,
        };
        let err = handle_set(&context_with(&server, None)?, args, OutputFormat::Table)
            .await
            .expect_err("password required");
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn delete_sends_key_body() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path(POLICIES_PATH)
                .header(HEADER_ADMIN_PASSWORD, "hunter2")
                .json_body(json!({"origin": "Germany", "destination": "Canada"}));
            then.status(200).json_body(json!({"ok": true, "removed": true}));
        });

        let args = KeyArgs {
            origin: "Germany".to_string(),
            destination: "Canada".to_string(),
        };
        handle_delete(&context_with(&server, Some("hunter2"))?, args).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_are_operational_failures() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path(POLICIES_PATH);
            then.status(500).json_body(json!({
                "type": "https://visamap.dev/problems/internal",
                "title": "internal server error",
                "status": 500,
                "detail": "policy store unavailable"
            }));
        });

        let args = KeyArgs {
            origin: "Germany".to_string(),
            destination: "Canada".to_string(),
        };
        let err = handle_delete(&context_with(&server, Some("hunter2"))?, args)
            .await
            .expect_err("store down");
        assert_eq!(err.exit_code(), 3);
        Ok(())
    }
}
