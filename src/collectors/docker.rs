//! Docker Container Metrics Collector
//!
//! # Metrics Produced
//! - `unraid_docker_service_running` - 1 if the Docker service is up
//! - `unraid_container_state` - Container state (value is always 1)
//!   - Labels: container, image, state
//! - `unraid_container_running` - 1 if the container is running
//!   - Labels: container
//! - `unraid_containers` - Container count
//!   - Labels: state

use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::error::Result;
use crate::metrics::bool_value;
use crate::unraid::types::{Container, ContainerState};
use crate::unraid::UnraidClient;

/// Whether Docker is up, and its containers when it is.
async fn query_docker(client: &UnraidClient) -> Result<(bool, Vec<Container>)> {
    let running = client.docker().is_running().await?;
    if !running {
        return Ok((false, Vec::new()));
    }
    Ok((true, client.docker().list_containers().await?))
}

/// Collects Docker service and container metrics from Unraid
///
/// Series for removed containers are dropped on every successful run.
pub async fn collect_docker_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("docker", query_docker(ctx.client), |(running, containers)| {
        let m = ctx.metrics;
        m.docker_service_running.set(bool_value(running));

        m.container_state.reset();
        m.container_running.reset();
        for container in &containers {
            m.container_state
                .with_label_values(&[
                    container.name.as_str(),
                    container.image.as_str(),
                    container.state.as_str(),
                ])
                .set(1);
            m.container_running
                .with_label_values(&[&container.name])
                .set(bool_value(container.state == ContainerState::Running));
        }

        for state in ContainerState::ALL {
            let count = containers.iter().filter(|c| c.state == state).count();
            m.containers
                .with_label_values(&[state.as_str()])
                .set(count as f64);
        }
    })
    .await
}
