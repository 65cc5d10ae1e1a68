//! Configuration validation logic.

use std::collections::HashSet;
use std::net::IpAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a ProxyConfig for semantic correctness.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 1. Cluster shape: names unique, at least one node, known scheme,
    //    addresses well-formed, interval sane
    let mut cluster_names = HashSet::new();
    for cluster in &config.clusters {
        if !cluster_names.insert(cluster.name.as_str()) {
            errors.push(ValidationError(format!(
                "duplicate cluster name '{}'",
                cluster.name
            )));
        }
        if cluster.nodes.is_empty() {
            errors.push(ValidationError(format!(
                "cluster '{}' must have at least one node",
                cluster.name
            )));
        }
        if cluster.scheme != "http" && cluster.scheme != "https" {
            errors.push(ValidationError(format!(
                "cluster '{}' has unsupported scheme '{}'",
                cluster.name, cluster.scheme
            )));
        }
        for node in &cluster.nodes {
            if Url::parse(&format!("{}://{}", cluster.scheme, node)).is_err() {
                errors.push(ValidationError(format!(
                    "cluster '{}' has invalid node address '{}'",
                    cluster.name, node
                )));
            }
        }
        if cluster.heartbeat_interval_secs == 0 {
            errors.push(ValidationError(format!(
                "cluster '{}': heartbeat_interval_secs must be > 0",
                cluster.name
            )));
        }

        let mut user_names = HashSet::new();
        for user in &cluster.users {
            if !user_names.insert(user.name.as_str()) {
                errors.push(ValidationError(format!(
                    "cluster '{}' has duplicate user '{}'",
                    cluster.name, user.name
                )));
            }
        }
    }

    // 2. Proxy users: names unique, redirect targets exist, networks parse
    let mut seen_users = HashSet::new();
    for user in &config.users {
        if !seen_users.insert(user.name.as_str()) {
            errors.push(ValidationError(format!(
                "duplicate user name '{}'",
                user.name
            )));
        }
        if user.deny_http && user.deny_https {
            errors.push(ValidationError(format!(
                "user '{}' denies both HTTP and HTTPS",
                user.name
            )));
        }
        if let Some(to_cluster) = &user.to_cluster {
            match config.clusters.iter().find(|c| &c.name == to_cluster) {
                None => errors.push(ValidationError(format!(
                    "user '{}' references unknown cluster '{}'",
                    user.name, to_cluster
                ))),
                Some(cluster) => {
                    if let Some(to_user) = &user.to_user {
                        if !cluster.users.iter().any(|cu| &cu.name == to_user) {
                            errors.push(ValidationError(format!(
                                "user '{}' references unknown user '{}' in cluster '{}'",
                                user.name, to_user, to_cluster
                            )));
                        }
                    }
                }
            }
        }
        for network in &user.allowed_networks {
            if !is_valid_network(network) {
                errors.push(ValidationError(format!(
                    "user '{}' has invalid allowed network '{}'",
                    user.name, network
                )));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A network is either a bare IP or an "ip/prefix" block.
fn is_valid_network(network: &str) -> bool {
    match network.split_once('/') {
        Some((ip, prefix)) => {
            let Ok(ip) = ip.parse::<IpAddr>() else {
                return false;
            };
            let Ok(bits) = prefix.parse::<u8>() else {
                return false;
            };
            bits <= if ip.is_ipv4() { 32 } else { 128 }
        }
        None => network.parse::<IpAddr>().is_ok(),
    }
}
