//! Interface application
//!
//! Turns a topology plan and role mapping into live host state:
//! `Unconfigured → Flushed → Rendered → TornDown → Applied → Verified`,
//! or `Failed` on the first fatal step. There are no retries inside a run;
//! recovery is re-running the whole provisioner, which re-derives and
//! re-applies the same plan.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use orangebox_common::{SetupError, SetupResult, SystemEnvironment};

use crate::commands::{
    build_assign_address_cmd, build_disable_service_cmd, build_flush_addresses_cmd,
    build_ifdown_cmd, build_ifup_cmd, build_ping_cmd, build_stop_service_cmd,
    NETWORK_MANAGER_SERVICE,
};
use crate::conf::INTERFACES_PATH;
use crate::render::render_interfaces;
use crate::types::{ApplyState, InterfaceSet, TopologyPlan};

/// Fixed probe address for external IPv4 reachability.
pub const CONNECTIVITY_PROBE: &str = "8.8.8.8";

/// Fixed probe hostname for DNS resolution.
pub const DNS_PROBE: &str = "launchpad.net";

/// Echo probes per verification before giving up.
pub const PROBE_ATTEMPTS: u32 = 3;

const PROBE_PAUSE: Duration = Duration::from_secs(1);

/// Applies a topology plan to the host and verifies the result.
pub struct InterfaceApplier<'a> {
    env: &'a dyn SystemEnvironment,
    state: ApplyState,
}

impl<'a> InterfaceApplier<'a> {
    pub fn new(env: &'a dyn SystemEnvironment) -> Self {
        Self {
            env,
            state: ApplyState::Unconfigured,
        }
    }

    /// The stage the applier last completed (or `Failed`).
    pub fn state(&self) -> ApplyState {
        self.state
    }

    fn advance(&mut self, next: ApplyState) {
        debug!(from = self.state.as_str(), to = next.as_str(), "stage complete");
        self.state = next;
    }

    /// Runs the full application sequence.
    pub async fn apply(
        &mut self,
        ifaces: &InterfaceSet,
        plan: &TopologyPlan,
    ) -> SetupResult<()> {
        match self.run_stages(ifaces, plan).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = ApplyState::Failed;
                Err(e)
            }
        }
    }

    async fn run_stages(
        &mut self,
        ifaces: &InterfaceSet,
        plan: &TopologyPlan,
    ) -> SetupResult<()> {
        self.disable_network_manager().await?;
        self.flush_and_assign(ifaces, plan).await?;
        self.write_interfaces_file(ifaces, plan).await?;
        self.teardown(ifaces).await?;
        self.bring_up(ifaces).await?;
        self.verify_connectivity().await?;
        self.verify_dns().await?;
        self.advance(ApplyState::Verified);
        Ok(())
    }

    /// Stops and disables the network manager so it cannot reclaim the
    /// interfaces. Best-effort: the service may not be installed at all.
    async fn disable_network_manager(&self) -> SetupResult<()> {
        for cmd in [
            build_stop_service_cmd(NETWORK_MANAGER_SERVICE),
            build_disable_service_cmd(NETWORK_MANAGER_SERVICE),
        ] {
            let result = self.env.run(&cmd).await?;
            if !result.success() {
                debug!(command = %cmd, "network manager not present or already stopped");
            }
        }
        Ok(())
    }

    /// Clears stale addresses from the primary internal NIC and gives it an
    /// interim direct address, so the host is reachable on the internal
    /// segment before the bridge takes the address over.
    async fn flush_and_assign(
        &mut self,
        ifaces: &InterfaceSet,
        plan: &TopologyPlan,
    ) -> SetupResult<()> {
        self.env
            .run_checked(&build_flush_addresses_cmd(&ifaces.internal1))
            .await?;
        self.env
            .run_checked(&build_assign_address_cmd(
                &ifaces.internal1,
                plan.internal1,
                TopologyPlan::PREFIX_LEN,
            ))
            .await?;
        self.advance(ApplyState::Flushed);
        Ok(())
    }

    /// Renders and overwrites the interface-definitions file.
    async fn write_interfaces_file(
        &mut self,
        ifaces: &InterfaceSet,
        plan: &TopologyPlan,
    ) -> SetupResult<()> {
        let rendered = render_interfaces(ifaces, plan);
        self.env
            .write_file(Path::new(INTERFACES_PATH), &rendered)
            .await?;
        info!(path = INTERFACES_PATH, "wrote interface definitions");
        self.advance(ApplyState::Rendered);
        Ok(())
    }

    /// Brings everything down. Best-effort: an interface that was never up
    /// (or does not exist yet, like the bridges on first run) is fine.
    async fn teardown(&mut self, ifaces: &InterfaceSet) -> SetupResult<()> {
        for dev in ifaces.teardown_order() {
            let cmd = build_ifdown_cmd(dev);
            let result = self.env.run(&cmd).await?;
            if !result.success() {
                debug!(dev, "ifdown failed (interface probably absent)");
            }
        }
        self.advance(ApplyState::TornDown);
        Ok(())
    }

    /// Brings up the internal NICs and both bridges, in order. The external
    /// uplink stays down. Any failure here is fatal: the rest of the
    /// pipeline depends on the bridges being up.
    async fn bring_up(&mut self, ifaces: &InterfaceSet) -> SetupResult<()> {
        for dev in ifaces.bringup_order() {
            self.env.run_checked(&build_ifup_cmd(dev)).await?;
        }
        self.advance(ApplyState::Applied);
        Ok(())
    }

    async fn probe(&self, target: &str) -> SetupResult<bool> {
        for attempt in 1..=PROBE_ATTEMPTS {
            let result = self.env.run(&build_ping_cmd(target)).await?;
            if result.success() {
                return Ok(true);
            }
            info!(target, attempt, "still waiting for a reply");
            if attempt < PROBE_ATTEMPTS {
                tokio::time::sleep(PROBE_PAUSE).await;
            }
        }
        Ok(false)
    }

    /// Confirms external IPv4 reachability through the new bridges.
    async fn verify_connectivity(&mut self) -> SetupResult<()> {
        info!(probe = CONNECTIVITY_PROBE, "waiting for the network to come up");
        if self.probe(CONNECTIVITY_PROBE).await? {
            Ok(())
        } else {
            warn!(probe = CONNECTIVITY_PROBE, "no reply after {PROBE_ATTEMPTS} probes");
            Err(SetupError::NetworkUnreachable {
                probe: CONNECTIVITY_PROBE.to_string(),
            })
        }
    }

    /// Confirms name resolution works.
    async fn verify_dns(&mut self) -> SetupResult<()> {
        info!(probe = DNS_PROBE, "waiting for DNS to come up");
        if self.probe(DNS_PROBE).await? {
            Ok(())
        } else {
            warn!(probe = DNS_PROBE, "no reply after {PROBE_ATTEMPTS} probes");
            Err(SetupError::DnsUnreachable {
                probe: DNS_PROBE.to_string(),
            })
        }
    }
}
