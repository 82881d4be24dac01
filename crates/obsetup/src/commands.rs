//! Shell command builders for provisioning operations

use std::net::Ipv4Addr;

use orangebox_common::shell::{
    shellquote, DPKG_CMD, IFDOWN_CMD, IFUP_CMD, IP_CMD, PING_CMD, SYSCTL_CMD, SYSTEMCTL_CMD,
};

/// The network-manager service that would fight over the interfaces.
pub const NETWORK_MANAGER_SERVICE: &str = "NetworkManager";

/// The resolver service restarted after its configuration changes.
pub const RESOLVED_SERVICE: &str = "systemd-resolved";

/// Build address flush command for an interface.
pub fn build_flush_addresses_cmd(dev: &str) -> String {
    format!("{} address flush dev {}", IP_CMD, shellquote(dev))
}

/// Build static address assignment command.
pub fn build_assign_address_cmd(dev: &str, address: Ipv4Addr, prefix_len: u8) -> String {
    format!(
        "{} address add {}/{} dev {}",
        IP_CMD,
        address,
        prefix_len,
        shellquote(dev)
    )
}

/// Build interface bring-down command. `--force` keeps ifdown from
/// complaining about interfaces it never brought up.
pub fn build_ifdown_cmd(dev: &str) -> String {
    format!("{} --force {}", IFDOWN_CMD, shellquote(dev))
}

/// Build interface bring-up command.
pub fn build_ifup_cmd(dev: &str) -> String {
    format!("{} --force {}", IFUP_CMD, shellquote(dev))
}

/// Build service stop command.
pub fn build_stop_service_cmd(service: &str) -> String {
    format!("{} stop {}", SYSTEMCTL_CMD, shellquote(service))
}

/// Build service disable command.
pub fn build_disable_service_cmd(service: &str) -> String {
    format!("{} disable {}", SYSTEMCTL_CMD, shellquote(service))
}

/// Build service restart command.
pub fn build_restart_service_cmd(service: &str) -> String {
    format!("{} restart {}", SYSTEMCTL_CMD, shellquote(service))
}

/// Build a single ICMP echo probe with a 2 second reply deadline.
pub fn build_ping_cmd(target: &str) -> String {
    format!("{} -c1 -W2 {}", PING_CMD, shellquote(target))
}

/// Build the staged-package install command.
pub fn build_install_packages_cmd(packages: &[String]) -> String {
    let quoted: Vec<String> = packages.iter().map(|p| shellquote(p)).collect();
    format!("{} -i {}", DPKG_CMD, quoted.join(" "))
}

/// Build the kernel-parameter reload command.
pub fn build_sysctl_reload_cmd() -> String {
    format!("{} -p", SYSCTL_CMD)
}
