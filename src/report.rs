//! Console formatting for per-packet lines and the final summary.

use std::fmt::Write;

use crate::packet::icmpv4::icmp_type_name;
use crate::packet::Icmpv4Packet;
use crate::target::Target;

pub fn address_line(target: &Target) -> String {
    format!("Pinging {} [{}]", target.hostname, target.addr)
}

pub fn echo_line(packet: &Icmpv4Packet, rtt: f64) -> String {
    format!(
        "{} bytes from {}: icmp_seq={} ttl={} time={:.1} ms",
        packet.size, packet.source, packet.sequence, packet.ttl, rtt
    )
}

pub fn other_line(packet: &Icmpv4Packet) -> String {
    format!(
        "Received ICMP {} message (Type: {}, Code: {}) from {}",
        icmp_type_name(packet.icmp_type),
        packet.icmp_type.0,
        packet.icmp_code.0,
        packet.source
    )
}

pub fn header_dump(packet: &Icmpv4Packet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "IP Header:");
    let _ = writeln!(
        out,
        "  Version: {}, IHL: {}, TOS: {}",
        packet.version,
        packet.header_length / 4,
        packet.tos
    );
    let _ = writeln!(
        out,
        "  Total Length: {}, ID: {}",
        packet.total_length, packet.ip_id
    );
    let _ = writeln!(out, "  TTL: {}, Protocol: {}", packet.ttl, packet.protocol);
    let _ = writeln!(out, "ICMP Header:");
    let _ = writeln!(
        out,
        "  Type: {} ({}), Code: {}",
        packet.icmp_type.0,
        icmp_type_name(packet.icmp_type),
        packet.icmp_code.0
    );
    let _ = write!(out, "  Checksum: 0x{:04x}", packet.checksum);
    out
}

pub fn summary_block(target: &Target) -> String {
    let mut out = format!("\nStatistics for {}:\n--- Ping statistics ---", target.hostname);
    let summary = match target.stats.summary() {
        Some(summary) => summary,
        None => {
            out.push_str("\nno packets transmitted");
            return out;
        }
    };
    let _ = write!(
        out,
        "\n{} packets transmitted, {} received, {:.1}% packet loss",
        summary.sent, summary.received, summary.loss
    );
    match summary.rtt {
        Some(rtt) => {
            let _ = write!(
                out,
                "\nrtt min/avg/max/jitter = {:.3}/{:.3}/{:.3}/{:.3} ms",
                rtt.min, rtt.mean, rtt.max, rtt.jitter
            );
        }
        None => out.push_str("\nrtt min/avg/max/jitter = n/a"),
    }
    out
}
