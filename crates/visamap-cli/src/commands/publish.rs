use anyhow::anyhow;
use visamap_api_models::{LookupQuery, LookupResponse, PublishResponse};

use crate::cli::{KeyArgs, OutputFormat};
use crate::client::{
    AppContext, CliError, CliResult, HEADER_ADMIN_PASSWORD, classify_problem, require_key,
};
use crate::output::{render_lookup, render_publish};

pub(crate) async fn handle_publish(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let password = ctx.require_password()?;
    let url = ctx.endpoint("/api/admin/publish")?;

    let response = ctx
        .client
        .post(url)
        .header(HEADER_ADMIN_PASSWORD, password)
        .send()
        .await
        .map_err(|err| {
            CliError::failure(anyhow!("request to /api/admin/publish failed: {err}"))
        })?;

    if response.status().is_success() {
        let report = response
            .json::<PublishResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse publish report: {err}")))?;
        render_publish(&report, format)
    } else {
        Err(classify_problem(response).await)
    }
}

pub(crate) async fn handle_lookup(
    ctx: &AppContext,
    args: KeyArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let KeyArgs {
        origin,
        destination,
    } = args;
    let query = LookupQuery {
        origin: require_key("origin", &origin)?,
        destination: require_key("destination", &destination)?,
    };
    let url = ctx.endpoint("/api/lookup")?;

    let response = ctx
        .client
        .get(url)
        .query(&query)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to /api/lookup failed: {err}")))?;

    if response.status().is_success() {
        let found = response
            .json::<LookupResponse>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse lookup: {err}")))?;
        render_lookup(&found, format)
    } else {
        Err(classify_problem(response).await)
    }
}
