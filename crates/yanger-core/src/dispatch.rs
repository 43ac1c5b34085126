// ── Model dispatch ──
//
// Maps a YANG module name to the collector that produces it.

use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use crate::collectors::routing::{bfd, ospf, rip};
use crate::collectors::{
    containers, dhcp, firewall, hardware, interfaces, lldp, ntp, routing, system,
};
use crate::context::Context;
use crate::error::CoreError;

/// YANG modules with a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum Model {
    #[strum(serialize = "ietf-interfaces")]
    Interfaces,
    #[strum(serialize = "ietf-routing")]
    Routing,
    #[strum(serialize = "ietf-ospf")]
    Ospf,
    #[strum(serialize = "ietf-rip")]
    Rip,
    #[strum(serialize = "ietf-bfd-ip-sh")]
    Bfd,
    #[strum(serialize = "ietf-hardware")]
    Hardware,
    #[strum(serialize = "ietf-system")]
    System,
    #[strum(serialize = "ietf-ntp")]
    Ntp,
    #[strum(serialize = "ieee802-dot1ab-lldp")]
    Lldp,
    #[strum(serialize = "infix-containers")]
    Containers,
    #[strum(serialize = "infix-dhcp-server")]
    DhcpServer,
    #[strum(serialize = "infix-firewall")]
    Firewall,
}

impl Model {
    /// Resolve a module name given on the command line.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        name.parse().map_err(|_| CoreError::UnknownModel {
            name: name.to_owned(),
        })
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Names of every supported module.
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(Self::name).collect()
    }

    /// Whether the collector takes a parameter (`-p`).
    pub fn takes_param(self) -> bool {
        matches!(self, Self::Interfaces)
    }
}

fn tree<T: Serialize>(data: &T) -> Result<Value, CoreError> {
    let value = serde_json::to_value(data)?;
    if !value.is_object() {
        return Err(CoreError::Internal {
            message: format!("collector produced a non-object root: {value}"),
        });
    }
    Ok(value)
}

/// Run the collector of `model`. `param` narrows the result where the
/// model supports it (an interface name for `ietf-interfaces`).
pub fn collect(ctx: &Context<'_>, model: Model, param: Option<&str>) -> Result<Value, CoreError> {
    debug!(model = model.name(), ?param, "collecting");
    match model {
        Model::Interfaces => tree(&interfaces::operational(ctx, param)),
        Model::Routing => tree(&routing::operational(ctx)),
        Model::Ospf => tree(&ospf::operational(ctx)),
        Model::Rip => tree(&rip::operational(ctx)),
        Model::Bfd => tree(&bfd::operational(ctx)),
        Model::Hardware => tree(&hardware::operational(ctx)),
        Model::System => tree(&system::operational(ctx)),
        Model::Ntp => tree(&ntp::operational(ctx)),
        Model::Lldp => tree(&lldp::operational(ctx)),
        Model::Containers => tree(&containers::operational(ctx)),
        Model::DhcpServer => tree(&dhcp::operational(ctx)),
        Model::Firewall => tree(&firewall::operational(ctx)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    #[test]
    fn names_round_trip() {
        let names = Model::names();
        assert_eq!(names.len(), 12);
        for name in names {
            assert_eq!(Model::from_name(name).unwrap().to_string(), name);
        }
        assert_eq!(Model::from_name("ietf-bfd-ip-sh").unwrap(), Model::Bfd);
    }

    #[test]
    fn unknown_model() {
        assert!(matches!(
            Model::from_name("ietf-foo"),
            Err(CoreError::UnknownModel { ref name }) if name == "ietf-foo"
        ));
    }

    #[test]
    fn every_model_tolerates_an_empty_host() {
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);
        for model in Model::iter() {
            let value = collect(&ctx, model, None).unwrap();
            assert!(value.is_object(), "{model} did not produce an object");
        }
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(matches!(tree(&42), Err(CoreError::Internal { .. })));
    }

    #[test]
    fn firewall_without_firewalld_is_empty() {
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);
        assert_eq!(collect(&ctx, Model::Firewall, None).unwrap(), json!({}));
    }
}
