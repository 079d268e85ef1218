//! Browser/OS blocked ports
//!
//! Browsers refuse to connect to these ports (the Fetch "bad port" list), so a
//! dev server handed one of them is unreachable even though the bind succeeds.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Ports never handed out by the resolver
pub const UNSAFE_PORTS: &[u16] = &[
    1,    // tcpmux
    7,    // echo
    9,    // discard
    11,   // systat
    13,   // daytime
    15,   // netstat
    17,   // qotd
    19,   // chargen
    20,   // ftp-data
    21,   // ftp
    22,   // ssh
    23,   // telnet
    25,   // smtp
    37,   // time
    42,   // name
    43,   // nicname
    53,   // domain
    69,   // tftp
    77,   // priv-rjs
    79,   // finger
    87,   // ttylink
    95,   // supdup
    101,  // hostname
    102,  // iso-tsap
    103,  // gppitnp
    104,  // acr-nema
    109,  // pop2
    110,  // pop3
    111,  // sunrpc
    113,  // auth
    115,  // sftp
    117,  // uucp-path
    119,  // nntp
    123,  // ntp
    135,  // loc-srv / epmap
    137,  // netbios-ns
    139,  // netbios-ssn
    143,  // imap2
    161,  // snmp
    179,  // bgp
    389,  // ldap
    427,  // slp
    465,  // smtp+ssl
    512,  // exec
    513,  // login
    514,  // shell
    515,  // printer
    526,  // tempo
    530,  // courier
    531,  // chat
    532,  // netnews
    540,  // uucp
    548,  // afp
    554,  // rtsp
    556,  // remotefs
    563,  // nntp+ssl
    587,  // smtp submission
    601,  // syslog-conn
    636,  // ldap+ssl
    989,  // ftps-data
    990,  // ftps
    993,  // imap+ssl
    995,  // pop3+ssl
    1719, // h323gatestat
    1720, // h323hostcall
    1723, // pptp
    2049, // nfs
    3659, // apple-sasl
    4045, // lockd
    4190, // sieve
    5060, // sip
    5061, // sips
    6000, // x11
    6566, // sane-port
    6665, // irc (alternate)
    6666, // irc (alternate)
    6667, // irc (default)
    6668, // irc (alternate)
    6669, // irc (alternate)
    6679, // osaut
    6697, // irc+tls
    10080, // amanda
];

static UNSAFE_PORT_SET: Lazy<HashSet<u16>> = Lazy::new(|| UNSAFE_PORTS.iter().copied().collect());

/// True when `port` is on the blocked list
pub fn is_unsafe_port(port: u16) -> bool {
    UNSAFE_PORT_SET.contains(&port)
}

/// True when `port` may be probed. Port 0 is the ephemeral-port sentinel and
/// always passes.
pub fn is_safe_port(port: u16) -> bool {
    !is_unsafe_port(port)
}
