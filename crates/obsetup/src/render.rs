//! Interface-definitions file rendering
//!
//! Pure function of the interface set and the topology plan. The output is
//! regenerated and overwritten wholesale on every run; it is never diffed
//! or merged with what is already on disk, so rendering must be byte-stable
//! for a given input.

use crate::types::{InterfaceSet, TopologyPlan, BRIDGE0, BRIDGE1};

/// Renders the complete interface-definitions file.
///
/// Layout: loopback, the three raw NICs in discovered order (manual,
/// unconfigured), then `br0` over the primary internal NIC with gateway and
/// nameservers, and `br1` over the secondary internal NIC without a
/// gateway.
pub fn render_interfaces(ifaces: &InterfaceSet, plan: &TopologyPlan) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str("# Generated by the orange-box network provisioner. Overwritten on every run.\n");
    out.push_str("\nauto lo\niface lo inet loopback\n");

    for name in ifaces.discovered_order() {
        out.push_str(&format!("\nauto {name}\niface {name} inet manual\n"));
    }

    out.push_str(&format!(
        "\nauto {BRIDGE0}\niface {BRIDGE0} inet static\n"
    ));
    out.push_str(&format!("  address {}\n", plan.internal1));
    out.push_str(&format!("  netmask {}\n", TopologyPlan::NETMASK));
    out.push_str(&format!("  gateway {}\n", plan.gateway1));
    out.push_str(&format!(
        "  dns-nameservers {} {}\n",
        plan.internal1, plan.gateway1
    ));
    out.push_str(&format!("  bridge_ports {}\n", ifaces.internal1));
    out.push_str("  bridge_stp off\n  bridge_fd 0\n  bridge_maxwait 0\n");

    out.push_str(&format!(
        "\nauto {BRIDGE1}\niface {BRIDGE1} inet static\n"
    ));
    out.push_str(&format!("  address {}\n", plan.internal2));
    out.push_str(&format!("  netmask {}\n", TopologyPlan::NETMASK));
    out.push_str(&format!("  bridge_ports {}\n", ifaces.internal2));
    out.push_str("  bridge_stp off\n  bridge_fd 0\n  bridge_maxwait 0\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::plan_topology;
    use crate::types::RackNumber;
    use pretty_assertions::assert_eq;

    fn fixture() -> (InterfaceSet, TopologyPlan) {
        let ifaces = InterfaceSet {
            external: "enp1s0".to_string(),
            internal1: "enp3s0".to_string(),
            internal2: "enp2s0".to_string(),
        };
        let plan = plan_topology(RackNumber::new(28).unwrap());
        (ifaces, plan)
    }

    #[test]
    fn test_render_golden() {
        let (ifaces, plan) = fixture();
        let expected = "\
# Generated by the orange-box network provisioner. Overwritten on every run.

auto lo
iface lo inet loopback

auto enp1s0
iface enp1s0 inet manual

auto enp2s0
iface enp2s0 inet manual

auto enp3s0
iface enp3s0 inet manual

auto br0
iface br0 inet static
  address 172.27.28.1
  netmask 255.255.254.0
  gateway 172.27.29.254
  dns-nameservers 172.27.28.1 172.27.29.254
  bridge_ports enp3s0
  bridge_stp off
  bridge_fd 0
  bridge_maxwait 0

auto br1
iface br1 inet static
  address 172.27.30.1
  netmask 255.255.254.0
  bridge_ports enp2s0
  bridge_stp off
  bridge_fd 0
  bridge_maxwait 0
";
        assert_eq!(render_interfaces(&ifaces, &plan), expected);
    }

    #[test]
    fn test_render_is_byte_stable() {
        let (ifaces, plan) = fixture();
        assert_eq!(
            render_interfaces(&ifaces, &plan),
            render_interfaces(&ifaces, &plan)
        );
    }

    #[test]
    fn test_secondary_bridge_has_no_gateway() {
        let (ifaces, plan) = fixture();
        let rendered = render_interfaces(&ifaces, &plan);
        let br1 = rendered.split("auto br1").nth(1).unwrap();
        assert!(!br1.contains("gateway"));
        assert!(!br1.contains("dns-nameservers"));
    }
}
