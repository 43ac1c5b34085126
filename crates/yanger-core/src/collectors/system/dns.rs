// ── DNS resolver state ──

use serde::Serialize;

use crate::context::Context;

const STATIC_HEAD: &str = "/etc/resolv.conf.head";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Server {
    pub address: String,
    pub origin: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndots: Option<u32>,
}

impl Options {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// `infix-system:dns-resolver`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolver {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub server: Vec<Server>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search: Vec<String>,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

impl Resolver {
    pub fn is_empty(&self) -> bool {
        self.server.is_empty() && self.search.is_empty() && self.options.is_empty()
    }
}

/// Fold one resolv.conf text into `resolver`. Servers get `origin`; a
/// trailing `# ifname` comment names the interface that learned them.
pub fn parse_into(resolver: &mut Resolver, text: &str, origin: &'static str) {
    for line in text.lines().map(str::trim) {
        let (body, comment) = match line.split_once('#') {
            Some((body, comment)) => (body.trim(), Some(comment.trim())),
            None => (line, None),
        };
        let mut words = body.split_whitespace();
        match words.next() {
            Some("nameserver") => {
                let Some(address) = words.next() else {
                    continue;
                };
                resolver.server.push(Server {
                    address: address.to_owned(),
                    origin,
                    interface: comment
                        .filter(|c| !c.is_empty() && !c.contains(' '))
                        .map(str::to_owned),
                });
            }
            Some("search" | "domain") => {
                for domain in words {
                    if !resolver.search.iter().any(|d| d == domain) {
                        resolver.search.push(domain.to_owned());
                    }
                }
            }
            Some("options") => {
                for option in words {
                    let Some((key, value)) = option.split_once(':') else {
                        continue;
                    };
                    let value = value.parse().ok();
                    match key {
                        "timeout" => resolver.options.timeout = value,
                        "attempts" => resolver.options.attempts = value,
                        "ndots" => resolver.options.ndots = value,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

/// Static entries from the head file plus servers learned via DHCP.
pub fn resolver(ctx: &Context<'_>) -> Resolver {
    let mut resolver = Resolver::default();
    if let Some(head) = ctx.host().read(STATIC_HEAD) {
        parse_into(&mut resolver, &head, "static");
    }
    let learned = ctx.host().run(&["resolvconf", "-l"]).unwrap_or_default();
    let mut dynamic = Resolver::default();
    parse_into(&mut dynamic, &learned, "dhcp");
    resolver.server.extend(dynamic.server);
    resolver
}
