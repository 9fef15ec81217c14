use kube::{config::{KubeConfigOptions, Kubeconfig}, Client};
use log::info;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;

/// Build a Kubernetes client from the configured kubeconfig/context, or infer one
/// (KUBECONFIG, ~/.kube/config, then in-cluster service account).
pub async fn create_client(config: &Config) -> Result<Client> {
    let mut kube_config = if config.kubeconfig.is_some() || config.context.is_some() {
        let kubeconfig = match &config.kubeconfig {
            Some(path) => Kubeconfig::read_from(path)?,
            None => Kubeconfig::read()?,
        };
        match &config.context {
            Some(ctx) => info!("Using kube context: {}", ctx),
            None => info!("Using current kube context"),
        }
        kube::Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: config.context.clone(),
                ..Default::default()
            },
        )
        .await?
    } else {
        kube::Config::infer().await?
    };

    // Set reasonable timeouts so a stalled API server doesn't hold a poll cycle forever
    kube_config.connect_timeout = Some(Duration::from_secs(10));
    kube_config.read_timeout = Some(Duration::from_secs(30));
    kube_config.write_timeout = Some(Duration::from_secs(30));

    Ok(Client::try_from(kube_config)?)
}
