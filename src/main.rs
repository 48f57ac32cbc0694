use kube::Client;
use tokio::signal;
use tracing::info;

use solr_operator::{run_controller, ControllerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("solr_operator=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .init();

    info!("Starting solr-operator");

    // Process-level settings come from the environment and are passed into
    // the controller explicitly
    let config = ControllerConfig {
        use_zookeeper_crd: std::env::var("USE_ZOOKEEPER_CRD")
            .map(|value| value != "false")
            .unwrap_or(true),
        ingress_base_domain: std::env::var("INGRESS_BASE_DOMAIN").unwrap_or_default(),
    };
    info!(
        use_zookeeper_crd = config.use_zookeeper_crd,
        ingress_base_domain = %config.ingress_base_domain,
        "Loaded controller configuration"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Watching SolrCluster resources (apiVersion: solr.example.com/v1beta1)");

    tokio::select! {
        _ = run_controller(client, config) => {
            // The controller stream only ends on unrecoverable watch errors
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, shutting down");
        }
    }

    info!("Operator stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
