//! Port Resolution Contract Tests
//!
//! These pin the cascade ordering and the all-hosts rule with a scripted
//! probe, so they hold regardless of what is listening on the test machine.

use std::collections::HashSet;
use std::sync::Mutex;

use portseek::{GetPortOptions, HostSpec, PortError, PortResolver, SocketProbe, WaitOptions};

/// Probe that binds only the scripted (port, host) pairs and records every
/// attempt
struct ScriptedProbe {
    free: HashSet<(u16, Option<String>)>,
    ephemeral: Option<u16>,
    attempts: Mutex<Vec<(u16, Option<String>)>>,
}

impl ScriptedProbe {
    fn new() -> Self {
        ScriptedProbe {
            free: HashSet::new(),
            ephemeral: None,
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn free_on(mut self, port: u16, host: &str) -> Self {
        self.free.insert((port, Some(host.to_string())));
        self
    }

    fn ephemeral(mut self, port: u16) -> Self {
        self.ephemeral = Some(port);
        self
    }

    fn attempts(&self) -> Vec<(u16, Option<String>)> {
        self.attempts.lock().unwrap().clone()
    }

    fn attempted_ports(&self) -> Vec<u16> {
        self.attempts().into_iter().map(|(port, _)| port).collect()
    }
}

impl SocketProbe for ScriptedProbe {
    async fn try_port(&self, port: u16, host: Option<&str>) -> Option<u16> {
        let host = host.map(String::from);
        self.attempts.lock().unwrap().push((port, host.clone()));

        if port == 0 {
            return self.ephemeral;
        }
        self.free.contains(&(port, host)).then_some(port)
    }
}

const LOCAL: &str = "127.0.0.1";

fn local_options() -> GetPortOptions {
    GetPortOptions::new().host(LOCAL)
}

/// WHY: Stages run in fixed order: port, ports, range, alternative, random
/// REASON: Callers rely on getting their preferred port whenever it is free
/// BREAKS: Reordering hands out fallback ports while the preferred one is free
#[tokio::test]
async fn cascade_probes_in_precedence_order() {
    let probe = ScriptedProbe::new().ephemeral(50123);
    let resolver = PortResolver::with_probe(probe);

    let port = resolver
        .get_port(
            local_options()
                .port(4000)
                .ports([4100, 4101])
                .port_range(4200, 4201)
                .alternative_port_range(4300, 4301),
        )
        .await
        .unwrap();

    assert_eq!(port, 50123);
    assert_eq!(
        resolver.probe().attempted_ports(),
        vec![4000, 4100, 4101, 4200, 4201, 4300, 4301, 0]
    );
}

/// WHY: The first free candidate wins and nothing after it is probed
/// REASON: Every probe is a real bind; extra binds only add contention
#[tokio::test]
async fn first_free_candidate_short_circuits() {
    let probe = ScriptedProbe::new().free_on(4101, LOCAL).free_on(4200, LOCAL);
    let resolver = PortResolver::with_probe(probe);

    let port = resolver
        .get_port(local_options().port(4000).ports([4100, 4101]).port_range(4200, 4210))
        .await
        .unwrap();

    assert_eq!(port, 4101);
    assert_eq!(resolver.probe().attempted_ports(), vec![4000, 4100, 4101]);
}

/// WHY: An occupied requested port falls through to the alternative range
/// REASON: Launchers prefer a nearby port over a hard failure
/// BREAKS: Dev servers fail to start when their usual port is busy
#[tokio::test]
async fn occupied_port_uses_alternative_range() {
    let probe = ScriptedProbe::new().free_on(5000, LOCAL);
    let resolver = PortResolver::with_probe(probe);

    let port = resolver
        .get_port(local_options().port(4321).alternative_port_range(5000, 5002))
        .await
        .unwrap();

    assert_eq!(port, 5000);
    assert_eq!(resolver.probe().attempted_ports(), vec![4321, 5000]);
}

/// WHY: A port must bind on every host in the set
/// REASON: A port free on one interface only fails later when the server
///         binds the others
#[tokio::test]
async fn port_must_bind_on_every_host() {
    let probe = ScriptedProbe::new()
        .free_on(4000, "127.0.0.1")
        .free_on(4001, "127.0.0.1")
        .free_on(4001, "::1");
    let resolver = PortResolver::with_probe(probe);
    let hosts = HostSpec::List(vec!["127.0.0.1".into(), "::1".into()]);

    assert_eq!(resolver.find_port(&[4000, 4001], &hosts).await, Some(4001));
    assert_eq!(resolver.check_port(4000, &hosts, false).await, None);
}

/// WHY: Port 0 against several hosts validates one concrete port everywhere
/// REASON: Independent assignment would give each interface a different port
#[tokio::test]
async fn ephemeral_port_is_pinned_across_hosts() {
    let probe = ScriptedProbe::new()
        .ephemeral(51515)
        .free_on(51515, "::1");
    let resolver = PortResolver::with_probe(probe);
    let hosts = HostSpec::List(vec!["127.0.0.1".into(), "::1".into()]);

    assert_eq!(resolver.check_port(0, &hosts, false).await, Some(51515));
    assert_eq!(
        resolver.probe().attempts(),
        vec![(0, Some("127.0.0.1".to_string())), (51515, Some("::1".to_string()))]
    );
}

/// WHY: Pinned port with ephemeral port free on only the first host fails
/// REASON: Never report a port bindable on a subset of hosts
#[tokio::test]
async fn ephemeral_port_unbindable_on_second_host_fails() {
    let probe = ScriptedProbe::new().ephemeral(51515);
    let resolver = PortResolver::with_probe(probe);
    let hosts = HostSpec::List(vec!["127.0.0.1".into(), "::1".into()]);

    assert_eq!(resolver.check_port(0, &hosts, false).await, None);
}

/// WHY: Random fallback runs unless random is explicitly false
/// REASON: Leaving `random` unset keeps the lenient default
#[tokio::test]
async fn random_fallback_enabled_unless_disabled() {
    let resolver = PortResolver::with_probe(ScriptedProbe::new().ephemeral(52000));
    assert_eq!(resolver.get_port(local_options().port(4000)).await.unwrap(), 52000);

    let resolver = PortResolver::with_probe(ScriptedProbe::new().ephemeral(52000));
    let err = resolver
        .get_port(local_options().port(4000).random(false))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Exhausted(_)));
    assert!(!resolver.probe().attempted_ports().contains(&0));
}

/// WHY: Exhaustion lists everything that was tried
/// REASON: "No ports available" must be debuggable from the message alone
#[tokio::test]
async fn exhaustion_message_lists_attempts() {
    let resolver = PortResolver::with_probe(ScriptedProbe::new());
    let err = resolver
        .get_port(
            local_options()
                .port(4321)
                .port_range(4400, 4410)
                .alternative_port_range(5000, 5002),
        )
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Unable to find an available port"));
    assert!(message.contains("on host \"127.0.0.1\""));
    assert!(message.contains("4321"));
    assert!(message.contains("4400-4410"));
    assert!(message.contains("5000-5002"));
}

/// WHY: 0 and unsafe ports inside explicit lists never reach the probe
/// REASON: 0 is only meaningful as the single random probe
#[tokio::test]
async fn zero_and_unsafe_candidates_are_dropped() {
    let probe = ScriptedProbe::new().free_on(4000, LOCAL);
    let resolver = PortResolver::with_probe(probe);

    let port = resolver
        .get_port(local_options().port(22).ports([0, 6667, 4000]))
        .await
        .unwrap();

    assert_eq!(port, 4000);
    assert_eq!(resolver.probe().attempted_ports(), vec![4000]);
}

/// WHY: A free port ends the wait for nothing; a taken port ends it at once
/// REASON: wait_for_port waits for a server to start listening
#[tokio::test]
async fn wait_counts_free_probes_as_retries() {
    let resolver = PortResolver::with_probe(ScriptedProbe::new().free_on(4000, LOCAL));
    let options = WaitOptions::default().delay_ms(5).retries(3).host(LOCAL);

    let err = resolver.wait_for_port(4000, &options).await.unwrap_err();
    assert!(matches!(err, PortError::WaitTimeout(_)));
    assert_eq!(resolver.probe().attempted_ports(), vec![4000, 4000, 4000]);

    let resolver = PortResolver::with_probe(ScriptedProbe::new());
    resolver.wait_for_port(4000, &options).await.unwrap();
    assert_eq!(resolver.probe().attempted_ports(), vec![4000]);
}

/// WHY: Each wait tick checks every address in the host set
/// REASON: A server counts as up once any address refuses the bind
/// BREAKS: Waits on a host list would only watch the unspecified address
#[tokio::test]
async fn wait_checks_every_host_each_tick() {
    let probe = ScriptedProbe::new().free_on(4000, "127.0.0.1").free_on(4000, "::1");
    let resolver = PortResolver::with_probe(probe);
    let hosts = HostSpec::List(vec!["127.0.0.1".into(), "::1".into()]);
    let options = WaitOptions::default().delay_ms(5).retries(2).hosts(hosts);

    let err = resolver.wait_for_port(4000, &options).await.unwrap_err();
    assert!(matches!(err, PortError::WaitTimeout(_)));

    let local = Some("127.0.0.1".to_string());
    let v6 = Some("::1".to_string());
    assert_eq!(
        resolver.probe().attempts(),
        vec![(4000, local.clone()), (4000, v6.clone()), (4000, local), (4000, v6)]
    );
}
