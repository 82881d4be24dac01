//! Host configuration file contracts
//!
//! String-level logic for the files the provisioner reads and rewrites:
//! the rack identity file, the resolver configuration, and the kernel
//! sysctl configuration. Mutation is key-upsert, never append: replacing
//! the first `key=` (or commented `#key=`) line and dropping duplicates
//! keeps re-runs byte-stable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::TopologyPlan;

/// The rack identity file. Fixed contract: other tooling reads it.
pub const RACK_CONF_PATH: &str = "/etc/orange-box.conf";

/// Key holding the rack number inside [`RACK_CONF_PATH`].
pub const RACK_NUMBER_KEY: &str = "orangebox_number";

/// The interface-definitions file consumed by ifup/ifdown.
pub const INTERFACES_PATH: &str = "/etc/network/interfaces";

/// systemd-resolved configuration.
pub const RESOLVED_CONF_PATH: &str = "/etc/systemd/resolved.conf";

/// Kernel parameter configuration.
pub const SYSCTL_CONF_PATH: &str = "/etc/sysctl.conf";

/// Public resolver appended after the rack's own router.
const PUBLIC_DNS: &str = "8.8.8.8";

/// Resolvers of last resort.
const FALLBACK_DNS: &str = "8.8.8.8 8.8.4.4";

/// Trailing decimal digits of a hostname like `OrangeBox28`.
static HOSTNAME_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("Invalid regex pattern"));

/// Extracts the key of a `key=value` line, tolerating leading whitespace
/// and a comment marker (`#DNS=` counts as key `DNS`).
fn line_key(line: &str) -> Option<&str> {
    let s = line.trim_start();
    let s = s.strip_prefix('#').map(str::trim_start).unwrap_or(s);
    let (key, _) = s.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Sets `key=value`, replacing the first existing assignment (commented or
/// not), dropping later duplicates, and appending when the key is absent.
/// Applying the same upsert twice yields identical output.
pub fn upsert_key(contents: &str, key: &str, value: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;

    for line in contents.lines() {
        if line_key(line) == Some(key) {
            if !replaced {
                lines.push(format!("{key}={value}"));
                replaced = true;
            }
            continue;
        }
        lines.push(line.to_string());
    }

    if !replaced {
        lines.push(format!("{key}={value}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Parses the rack number out of the identity file, if present.
pub fn parse_rack_conf(contents: &str) -> Option<u16> {
    contents.lines().find_map(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        if key.trim() == RACK_NUMBER_KEY {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Renders the identity file content for a rack number.
pub fn format_rack_conf(rack_number: u16) -> String {
    format!("{RACK_NUMBER_KEY}={rack_number}\n")
}

/// Parses a rack number from trailing hostname digits (`OrangeBox28` → 28).
pub fn rack_number_from_hostname(hostname: &str) -> Option<u16> {
    HOSTNAME_NUMBER_RE
        .captures(hostname.trim())?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Applies the resolver settings for a plan: the rack's router first, a
/// public resolver second, and public fallbacks.
pub fn resolver_conf(contents: &str, plan: &TopologyPlan) -> String {
    let dns = format!("{} {}", plan.gateway2, PUBLIC_DNS);
    let contents = upsert_key(contents, "DNS", &dns);
    upsert_key(&contents, "FallbackDNS", FALLBACK_DNS)
}

/// Applies the kernel parameters the rack needs: forwarding between the
/// bridged segments.
pub fn sysctl_conf(contents: &str) -> String {
    upsert_key(contents, "net.ipv4.ip_forward", "1")
}
