//! Lookups for asserting on written kubeconfigs

use crate::kubeconfig::{KubeConfig, NamedItem};
use serde_yaml_ng::Value as Yaml;

pub trait KubeConfigLookup {
    fn find_context(&self, name: &str) -> Option<&NamedItem>;
    fn find_cluster(&self, name: &str) -> Option<&NamedItem>;
    fn find_user(&self, name: &str) -> Option<&NamedItem>;
}

impl KubeConfigLookup for KubeConfig {
    fn find_context(&self, name: &str) -> Option<&NamedItem> {
        self.contexts.iter().find(|c| c.name == name)
    }

    fn find_cluster(&self, name: &str) -> Option<&NamedItem> {
        self.clusters.iter().find(|c| c.name == name)
    }

    fn find_user(&self, name: &str) -> Option<&NamedItem> {
        self.users.iter().find(|u| u.name == name)
    }
}

/// `cluster.server` of a cluster entry
pub fn server_url(rest: &Yaml) -> Option<String> {
    match rest.get("cluster")?.get("server")? {
        Yaml::String(s) => Some(s.clone()),
        _ => None,
    }
}
