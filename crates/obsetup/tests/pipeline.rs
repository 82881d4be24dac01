//! End-to-end pipeline tests against a mock host.

use std::path::Path;

use orangebox_common::SetupError;
use orangebox_setup::conf::{INTERFACES_PATH, RACK_CONF_PATH, RESOLVED_CONF_PATH, SYSCTL_CONF_PATH};
use orangebox_setup::pipeline::{preview, provision, SetupOptions};
use orangebox_test::{three_nic_host, unconfigured_host, MockSystem};

fn index_of(commands: &[String], needle: &str) -> usize {
    commands
        .iter()
        .position(|c| c.contains(needle))
        .unwrap_or_else(|| panic!("no command containing '{needle}' in {commands:?}"))
}

#[tokio::test]
async fn provisions_a_three_nic_rack() {
    let env = three_nic_host(28);
    provision(&env, &SetupOptions::default()).await.unwrap();

    // Interface definitions land at the fixed path with the derived plan.
    let rendered = env.file(INTERFACES_PATH).unwrap();
    assert!(rendered.contains("auto br0"));
    assert!(rendered.contains("address 172.27.28.1"));
    assert!(rendered.contains("gateway 172.27.29.254"));
    assert!(rendered.contains("bridge_ports enp3s0"));
    assert!(rendered.contains("address 172.27.30.1"));
    assert!(rendered.contains("bridge_ports enp2s0"));

    // Resolver points at the rack's router, fallbacks are public.
    let resolved = env.file(RESOLVED_CONF_PATH).unwrap();
    assert!(resolved.contains("DNS=172.27.31.254 8.8.8.8"));
    assert!(resolved.contains("FallbackDNS=8.8.8.8 8.8.4.4"));

    // Kernel forwards between the bridged segments.
    let sysctl = env.file(SYSCTL_CONF_PATH).unwrap();
    assert!(sysctl.contains("net.ipv4.ip_forward=1"));

    // The identity file survives the run.
    assert_eq!(env.file(RACK_CONF_PATH).unwrap(), "orangebox_number=28\n");
}

#[tokio::test]
async fn stage_ordering_is_stable() {
    let env = three_nic_host(28);
    provision(&env, &SetupOptions::default()).await.unwrap();

    let commands = env.commands();
    let resolver_restart = index_of(&commands, "restart \"systemd-resolved\"");
    let stop_nm = index_of(&commands, "stop \"NetworkManager\"");
    let flush = index_of(&commands, "address flush");
    let first_down = index_of(&commands, "ifdown");
    let first_up = index_of(&commands, "ifup");
    let net_probe = index_of(&commands, "8.8.8.8");
    let dns_probe = index_of(&commands, "launchpad.net");

    assert!(resolver_restart < stop_nm);
    assert!(stop_nm < flush);
    assert!(flush < first_down);
    assert!(first_down < first_up);
    assert!(first_up < net_probe);
    assert!(net_probe < dns_probe);
}

#[tokio::test]
async fn reruns_are_idempotent() {
    let env = three_nic_host(28);
    provision(&env, &SetupOptions::default()).await.unwrap();

    let interfaces_first = env.file(INTERFACES_PATH).unwrap();
    let resolved_first = env.file(RESOLVED_CONF_PATH).unwrap();
    let sysctl_first = env.file(SYSCTL_CONF_PATH).unwrap();

    provision(&env, &SetupOptions::default()).await.unwrap();

    assert_eq!(env.file(INTERFACES_PATH).unwrap(), interfaces_first);
    assert_eq!(env.file(RESOLVED_CONF_PATH).unwrap(), resolved_first);
    assert_eq!(env.file(SYSCTL_CONF_PATH).unwrap(), sysctl_first);
}

#[tokio::test]
async fn hostname_is_the_identifier_of_last_resort() {
    let env = unconfigured_host("OrangeBox32", &["enp1s0", "enp2s0", "enp3s0"]);
    provision(&env, &SetupOptions::default()).await.unwrap();

    assert_eq!(env.file(RACK_CONF_PATH).unwrap(), "orangebox_number=32\n");
    let rendered = env.file(INTERFACES_PATH).unwrap();
    assert!(rendered.contains("address 172.27.32.1"));
    assert!(rendered.contains("gateway 172.27.33.254"));
}

#[tokio::test]
async fn requires_root() {
    let env = three_nic_host(28).without_root();
    let err = provision(&env, &SetupOptions::default()).await.unwrap_err();
    assert!(matches!(err, SetupError::Privilege));
    assert_eq!(err.exit_code(), 77);
    assert!(env.commands().is_empty());
}

#[tokio::test]
async fn rejects_an_invalid_rack_number() {
    let env = three_nic_host(28);
    let opts = SetupOptions {
        rack_number: Some(2),
        ..SetupOptions::default()
    };
    let err = provision(&env, &opts).await.unwrap_err();
    assert!(matches!(err, SetupError::InvalidTopology { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn fails_without_exactly_three_nics() {
    let env = unconfigured_host("OrangeBox28", &["enp1s0", "enp2s0"]);
    let err = provision(&env, &SetupOptions::default()).await.unwrap_err();
    assert!(matches!(err, SetupError::InvalidTopology { .. }));
    // Discovery failure precedes any interface mutation.
    assert_eq!(env.command_count_matching("ifdown"), 0);
}

#[tokio::test]
async fn unreachable_network_exits_1_after_three_probes() {
    let env = three_nic_host(28);
    env.fail_commands_matching("8.8.8.8", 3);

    let err = provision(&env, &SetupOptions::default()).await.unwrap_err();
    assert!(matches!(err, SetupError::NetworkUnreachable { .. }));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(env.command_count_matching("8.8.8.8"), 3);
    // The DNS probe never runs.
    assert_eq!(env.command_count_matching("launchpad.net"), 0);
}

#[tokio::test]
async fn unreachable_dns_exits_2() {
    let env = three_nic_host(28);
    env.fail_commands_matching("launchpad.net", 3);

    let err = provision(&env, &SetupOptions::default()).await.unwrap_err();
    assert!(matches!(err, SetupError::DnsUnreachable { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn one_probe_reply_is_success() {
    let env = three_nic_host(28);
    env.fail_commands_matching("8.8.8.8", 2);
    env.fail_commands_matching("launchpad.net", 2);

    provision(&env, &SetupOptions::default()).await.unwrap();
    assert_eq!(env.command_count_matching("8.8.8.8"), 3);
    assert_eq!(env.command_count_matching("launchpad.net"), 3);
}

#[tokio::test]
async fn staged_packages_install_before_interface_work() {
    let env = three_nic_host(28);
    env.add_dir("/var/lib/orange-box/debs", ["bridge-utils.deb"]);
    let opts = SetupOptions {
        deb_dir: "/var/lib/orange-box/debs".into(),
        ..SetupOptions::default()
    };

    provision(&env, &opts).await.unwrap();

    let commands = env.commands();
    let dpkg = index_of(&commands, "dpkg -i");
    let flush = index_of(&commands, "address flush");
    assert!(dpkg < flush);
    assert!(commands[dpkg].contains("/var/lib/orange-box/debs/bridge-utils.deb"));
}

#[tokio::test]
async fn dry_run_preview_touches_nothing() {
    let env = three_nic_host(28);
    let preview = preview(&env, None).await.unwrap();

    assert_eq!(preview.rack_number.get(), 28);
    assert_eq!(preview.interfaces.external, "enp1s0");
    assert_eq!(preview.interfaces.internal1, "enp3s0");
    assert_eq!(preview.interfaces.internal2, "enp2s0");
    assert_eq!(preview.plan.internal1.to_string(), "172.27.28.1");
    assert_eq!(preview.plan.gateway2.to_string(), "172.27.31.254");
    assert!(preview.rendered.contains("auto br0"));

    // No commands ran, no files were written.
    assert!(env.commands().is_empty());
    assert!(env.file(Path::new(INTERFACES_PATH)).is_none());
}

#[tokio::test]
async fn preview_serializes_without_the_rendered_file() {
    let env = three_nic_host(28);
    let preview = preview(&env, None).await.unwrap();

    let json = serde_json::to_string(&preview).unwrap();
    assert!(json.contains("\"rack_number\":28"));
    assert!(json.contains("\"internal1\":\"enp3s0\""));
    assert!(json.contains("\"gateway1\":\"172.27.29.254\""));
    assert!(!json.contains("auto br0"));
}
