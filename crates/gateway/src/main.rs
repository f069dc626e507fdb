use anyhow::Context;

use mkdi_gateway::config::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    mkdi_observability::init(config.log_format);

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    if config.oidc.is_none() {
        tracing::warn!("OIDC_TOKEN_URL not set; session refresh and sign-in redirects are disabled");
    }

    let app = mkdi_gateway::app::build_app(&config).context("failed to build route policy")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
