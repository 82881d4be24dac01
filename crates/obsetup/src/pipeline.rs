//! The provisioning pipeline
//!
//! One linear pass: resolve the rack number, install staged bootstrap
//! packages, configure resolver and kernel parameters, persist the rack
//! identity, discover the NICs, derive the plan, apply it, verify. Every
//! stage either completes or aborts the whole run; re-running the binary is
//! the recovery path and re-derives the same result.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use orangebox_common::{SetupError, SetupResult, SystemEnvironment};

use crate::apply::InterfaceApplier;
use crate::commands::{
    build_install_packages_cmd, build_restart_service_cmd, build_sysctl_reload_cmd,
    RESOLVED_SERVICE,
};
use crate::conf;
use crate::discovery::discover_interfaces;
use crate::render::render_interfaces;
use crate::topology::plan_topology;
use crate::types::{InterfaceSet, RackNumber, TopologyPlan};

/// Options from the command line.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Rack number override; otherwise the identity file, then the hostname.
    pub rack_number: Option<u16>,
    /// Directory holding staged bootstrap `.deb` packages.
    pub deb_dir: PathBuf,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            rack_number: None,
            deb_dir: PathBuf::from("."),
        }
    }
}

/// Everything `--dry-run` reports: the derivation without the application.
#[derive(Debug, Serialize)]
pub struct ProvisionPreview {
    pub rack_number: RackNumber,
    pub interfaces: InterfaceSet,
    pub plan: TopologyPlan,
    /// The interface-definitions file that a real run would write.
    #[serde(skip)]
    pub rendered: String,
}

/// Resolves the rack number from its sources, in priority order:
/// explicit override, the identity file, trailing hostname digits.
pub async fn resolve_rack_number(
    env: &dyn SystemEnvironment,
    rack_override: Option<u16>,
) -> SetupResult<RackNumber> {
    if let Some(n) = rack_override {
        return RackNumber::new(n);
    }

    if let Some(contents) = env
        .read_file_if_exists(Path::new(conf::RACK_CONF_PATH))
        .await?
    {
        if let Some(n) = conf::parse_rack_conf(&contents) {
            debug!(rack_number = n, source = conf::RACK_CONF_PATH, "rack number");
            return RackNumber::new(n);
        }
    }

    let hostname = env.hostname()?;
    if let Some(n) = conf::rack_number_from_hostname(&hostname) {
        debug!(rack_number = n, source = %hostname, "rack number from hostname");
        return RackNumber::new(n);
    }

    Err(SetupError::invalid_topology(format!(
        "no rack number found: pass --rack-number, set {key}=<n> in {path}, or \
         name the host with a trailing number (e.g. OrangeBox28); hostname is \
         '{hostname}'",
        key = conf::RACK_NUMBER_KEY,
        path = conf::RACK_CONF_PATH,
    )))
}

/// Installs staged bootstrap packages with dpkg. The networking tooling
/// itself cannot be apt-installed before networking exists, so it ships as
/// local `.deb` files. Nothing staged means nothing to do; a failed install
/// is fatal.
pub async fn install_bootstrap_packages(
    env: &dyn SystemEnvironment,
    deb_dir: &Path,
) -> SetupResult<()> {
    let Ok(entries) = env.list_dir(deb_dir).await else {
        debug!(dir = %deb_dir.display(), "no package staging directory");
        return Ok(());
    };

    let packages: Vec<String> = entries
        .into_iter()
        .filter(|name| name.ends_with(".deb"))
        .map(|name| deb_dir.join(name).display().to_string())
        .collect();

    if packages.is_empty() {
        debug!(dir = %deb_dir.display(), "no staged packages");
        return Ok(());
    }

    info!(count = packages.len(), "installing staged bootstrap packages");
    env.run_checked(&build_install_packages_cmd(&packages))
        .await?;
    Ok(())
}

/// Rewrites the resolver configuration for the plan and bounces the
/// resolver. The restart is best-effort: resolution is verified end-to-end
/// at the end of the pipeline anyway.
pub async fn configure_resolver(
    env: &dyn SystemEnvironment,
    plan: &TopologyPlan,
) -> SetupResult<()> {
    let path = Path::new(conf::RESOLVED_CONF_PATH);
    let current = env
        .read_file_if_exists(path)
        .await?
        .unwrap_or_else(|| "[Resolve]\n".to_string());
    env.write_file(path, &conf::resolver_conf(&current, plan))
        .await?;

    let restart = build_restart_service_cmd(RESOLVED_SERVICE);
    if !env.run(&restart).await?.success() {
        debug!("resolver restart failed; relying on end-to-end DNS verification");
    }
    Ok(())
}

/// Upserts the kernel parameters and reloads them. The reload is
/// best-effort; the parameters also take effect on next boot.
pub async fn configure_sysctl(env: &dyn SystemEnvironment) -> SetupResult<()> {
    let path = Path::new(conf::SYSCTL_CONF_PATH);
    let current = env.read_file_if_exists(path).await?.unwrap_or_default();
    env.write_file(path, &conf::sysctl_conf(&current)).await?;

    if !env.run(&build_sysctl_reload_cmd()).await?.success() {
        debug!("sysctl reload failed; parameters apply on next boot");
    }
    Ok(())
}

/// Persists the rack number so later runs (and other tooling) can read it.
pub async fn persist_rack_number(
    env: &dyn SystemEnvironment,
    rack: RackNumber,
) -> SetupResult<()> {
    env.write_file(
        Path::new(conf::RACK_CONF_PATH),
        &conf::format_rack_conf(rack.get()),
    )
    .await
}

/// Derives everything a run would apply, without touching the host.
/// Needs no privileges; used by `--dry-run`.
pub async fn preview(
    env: &dyn SystemEnvironment,
    rack_override: Option<u16>,
) -> SetupResult<ProvisionPreview> {
    let rack_number = resolve_rack_number(env, rack_override).await?;
    let interfaces = discover_interfaces(env).await?;
    let plan = plan_topology(rack_number);
    let rendered = render_interfaces(&interfaces, &plan);
    Ok(ProvisionPreview {
        rack_number,
        interfaces,
        plan,
        rendered,
    })
}

/// Runs the whole provisioning pass against the host.
pub async fn provision(env: &dyn SystemEnvironment, opts: &SetupOptions) -> SetupResult<()> {
    if !env.is_root() {
        return Err(SetupError::Privilege);
    }

    let rack = resolve_rack_number(env, opts.rack_number).await?;
    info!(rack_number = %rack, aligned = rack.is_aligned(), "provisioning rack");

    install_bootstrap_packages(env, &opts.deb_dir).await?;

    let plan = plan_topology(rack);
    configure_resolver(env, &plan).await?;
    configure_sysctl(env).await?;
    persist_rack_number(env, rack).await?;

    let ifaces = discover_interfaces(env).await?;
    info!(
        external = %ifaces.external,
        internal1 = %ifaces.internal1,
        internal2 = %ifaces.internal2,
        "assigned interface roles"
    );

    let mut applier = InterfaceApplier::new(env);
    applier.apply(&ifaces, &plan).await?;

    info!("rack networking is up and verified");
    Ok(())
}
