use k8s_openapi::api::core::v1::{Endpoints, ObjectReference};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use log::debug;

use super::Describer;
use crate::error::Result;
use crate::models::{DescribeEndpointRow, EndpointSource, NOT_SET};

const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

fn format_port(port: Option<i32>, protocol: Option<&str>) -> Option<String> {
    port.map(|p| format!("{}/{}", p, protocol.unwrap_or("TCP")))
}

fn format_target(target: Option<&ObjectReference>) -> String {
    match target {
        Some(t) => format!(
            "{}/{}",
            t.kind.as_deref().unwrap_or_default(),
            t.name.as_deref().unwrap_or_default()
        ),
        None => String::new(),
    }
}

/// Ports of an endpoint group; a group without any becomes a single `not set`.
fn or_not_set(ports: Vec<String>) -> Vec<String> {
    if ports.is_empty() {
        vec![NOT_SET.to_string()]
    } else {
        ports
    }
}

fn slice_rows(slices: &[EndpointSlice]) -> Vec<DescribeEndpointRow> {
    let mut rows = Vec::new();
    for slice in slices {
        let ports = or_not_set(
            slice
                .ports
                .iter()
                .flatten()
                .filter_map(|p| format_port(p.port, p.protocol.as_deref()))
                .collect(),
        );
        for endpoint in &slice.endpoints {
            let node = endpoint.node_name.clone().unwrap_or_default();
            let target = format_target(endpoint.target_ref.as_ref());
            for address in &endpoint.addresses {
                for port in &ports {
                    rows.push(DescribeEndpointRow {
                        address: address.clone(),
                        node: node.clone(),
                        target: target.clone(),
                        port: port.clone(),
                        source: EndpointSource::EndpointSlice,
                    });
                }
            }
        }
    }
    rows
}

fn legacy_rows(endpoints: &Endpoints) -> Vec<DescribeEndpointRow> {
    let mut rows = Vec::new();
    for subset in endpoints.subsets.iter().flatten() {
        let ports = or_not_set(
            subset
                .ports
                .iter()
                .flatten()
                .filter_map(|p| format_port(Some(p.port), p.protocol.as_deref()))
                .collect(),
        );
        for address in subset.addresses.iter().flatten() {
            for port in &ports {
                rows.push(DescribeEndpointRow {
                    address: address.ip.clone(),
                    node: address.node_name.clone().unwrap_or_default(),
                    target: format_target(address.target_ref.as_ref()),
                    port: port.clone(),
                    source: EndpointSource::Endpoints,
                });
            }
        }
    }
    rows
}

impl Describer {
    /// Backends of a service, one row per address and port.
    ///
    /// Endpoint slices are preferred. If listing them fails or yields no rows the
    /// legacy `Endpoints` object is read instead.
    pub async fn service_endpoints(&self, namespace: &str, service: &str) -> Result<Vec<DescribeEndpointRow>> {
        let selector = format!("{}={}", SERVICE_NAME_LABEL, service);
        match self.reader.list_endpoint_slices(namespace, &selector).await {
            Ok(slices) => {
                let rows = slice_rows(&slices);
                if !rows.is_empty() {
                    return Ok(rows);
                }
            }
            Err(e) => debug!("EndpointSlice list for {}/{} failed, using Endpoints: {}", namespace, service, e),
        }

        Ok(self
            .reader
            .get_endpoints(namespace, service)
            .await?
            .map(|ep| legacy_rows(&ep))
            .unwrap_or_default())
    }
}
