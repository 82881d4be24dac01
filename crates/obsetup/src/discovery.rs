//! Physical NIC discovery and role assignment

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use orangebox_common::{SetupError, SetupResult, SystemEnvironment};

use crate::types::InterfaceSet;

/// Where the kernel lists network interfaces.
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// Physical ethernet NICs carry udev `en*` names (enp1s0, enx0013..., eno1).
/// Virtual interfaces (lo, docker0, br0) never match.
static NIC_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^en").expect("Invalid regex pattern"));

/// Whether an interface name belongs to a physical NIC.
pub fn is_physical_nic(name: &str) -> bool {
    NIC_NAME_RE.is_match(name)
}

/// Assigns roles to the discovered NICs.
///
/// Expects exactly three names in discovery (lexicographic) order. The
/// first is the external uplink; of the remaining two, the LAST discovered
/// NIC backs `br0` and the middle one backs `br1`. The swap matches how the
/// rack's internal switches are cabled and is not configurable.
pub fn assign_roles(discovered: &[String]) -> SetupResult<InterfaceSet> {
    let [external, second, third] = discovered else {
        return Err(SetupError::invalid_topology(format!(
            "expected exactly 3 physical NICs, found {}: [{}]",
            discovered.len(),
            discovered.join(", ")
        )));
    };

    Ok(InterfaceSet {
        external: external.clone(),
        internal1: third.clone(),
        internal2: second.clone(),
    })
}

/// Scans the live interfaces and maps them to roles.
pub async fn discover_interfaces(env: &dyn SystemEnvironment) -> SetupResult<InterfaceSet> {
    let mut names: Vec<String> = env
        .list_dir(Path::new(SYS_CLASS_NET))
        .await?
        .into_iter()
        .filter(|name| is_physical_nic(name))
        .collect();
    names.sort();

    tracing::debug!(nics = ?names, "Discovered physical NICs");
    assign_roles(&names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_physical_nic() {
        assert!(is_physical_nic("enp1s0"));
        assert!(is_physical_nic("enx00e04c680001"));
        assert!(is_physical_nic("eno1"));
        assert!(is_physical_nic("ens160"));

        assert!(!is_physical_nic("lo"));
        assert!(!is_physical_nic("docker0"));
        assert!(!is_physical_nic("br0"));
        assert!(!is_physical_nic("eth0"));
        assert!(!is_physical_nic("wlan0"));
    }

    #[test]
    fn test_assign_roles_swaps_second_and_third() {
        let ifaces = assign_roles(&names(&["enp1s0", "enp2s0", "enp3s0"])).unwrap();
        assert_eq!(ifaces.external, "enp1s0");
        assert_eq!(ifaces.internal1, "enp3s0");
        assert_eq!(ifaces.internal2, "enp2s0");
    }

    #[test]
    fn test_assign_roles_requires_exactly_three() {
        let err = assign_roles(&names(&["enp1s0", "enp2s0"])).unwrap_err();
        assert!(err.to_string().contains("found 2"));

        let err = assign_roles(&names(&["a", "b", "c", "d"])).unwrap_err();
        assert!(err.to_string().contains("found 4"));

        assert!(assign_roles(&[]).is_err());
    }

    #[tokio::test]
    async fn test_discover_filters_and_orders() {
        let env = orangebox_test::MockSystem::new();
        env.add_dir(
            SYS_CLASS_NET,
            ["lo", "enp3s0", "docker0", "enp1s0", "enp2s0", "veth01ab"],
        );

        let ifaces = discover_interfaces(&env).await.unwrap();
        assert_eq!(ifaces.external, "enp1s0");
        assert_eq!(ifaces.internal1, "enp3s0");
        assert_eq!(ifaces.internal2, "enp2s0");
    }

    #[tokio::test]
    async fn test_discover_mixed_udev_names() {
        let env = orangebox_test::MockSystem::new();
        env.add_dir(
            SYS_CLASS_NET,
            ["lo", "enp5s0", "enx00e04c680001", "enx00e04c680002"],
        );

        // Lexicographic order puts enp* before enx*.
        let ifaces = discover_interfaces(&env).await.unwrap();
        assert_eq!(ifaces.external, "enp5s0");
        assert_eq!(ifaces.internal1, "enx00e04c680002");
        assert_eq!(ifaces.internal2, "enx00e04c680001");
    }
}
