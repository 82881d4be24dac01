//! Test fixtures for common provisioning scenarios.

use crate::mock::MockSystem;

/// Interface names of the reference three-NIC rack, as discovery sees them.
pub const TEST_NICS: [&str; 3] = ["enp1s0", "enp2s0", "enp3s0"];

/// Path of the interface listing the fixtures seed.
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// A rack host with three `en*` NICs, the usual virtual interfaces, and a
/// persisted rack number. This is the baseline for pipeline tests.
pub fn three_nic_host(rack_number: u16) -> MockSystem {
    let env = MockSystem::new().with_hostname(format!("OrangeBox{rack_number}"));

    let mut entries: Vec<String> = TEST_NICS.iter().map(|s| s.to_string()).collect();
    entries.extend(["lo".to_string(), "docker0".to_string()]);
    env.add_dir(SYS_CLASS_NET, entries);

    env.add_file(
        "/etc/orange-box.conf",
        format!("orangebox_number={rack_number}\n"),
    );
    env.add_file(
        "/etc/systemd/resolved.conf",
        "[Resolve]\n#DNS=\n#FallbackDNS=\n",
    );
    env.add_file("/etc/sysctl.conf", "# sysctl settings\n");

    env
}

/// A host whose only rack-number source is its hostname.
pub fn unconfigured_host(hostname: &str, nics: &[&str]) -> MockSystem {
    let env = MockSystem::new().with_hostname(hostname);

    let mut entries: Vec<String> = nics.iter().map(|s| s.to_string()).collect();
    entries.push("lo".to_string());
    env.add_dir(SYS_CLASS_NET, entries);

    env
}
