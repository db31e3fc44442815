use crate::unraid::types::InterfaceCounters;

/// Parse `/proc/net/dev`.
///
/// ```text
/// Inter-|   Receive                            |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes ...
///   eth0: 123456   789    0    0    0     0          0         0    654321 ...
/// ```
pub fn parse_proc_net_dev(output: &str) -> Vec<InterfaceCounters> {
    output
        .lines()
        .filter_map(|line| {
            let (name, counters) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() || name.contains('|') {
                return None;
            }
            let fields: Vec<u64> = counters
                .split_whitespace()
                .map(|f| f.parse().ok())
                .collect::<Option<_>>()?;
            if fields.len() < 16 {
                return None;
            }
            Some(InterfaceCounters {
                name: name.to_string(),
                rx_bytes: fields[0],
                rx_packets: fields[1],
                rx_errors: fields[2],
                rx_dropped: fields[3],
                tx_bytes: fields[8],
                tx_packets: fields[9],
                tx_errors: fields[10],
                tx_dropped: fields[11],
            })
        })
        .collect()
}

/// Physical and bonded interfaces; bridges, veths and docker links are skipped.
pub fn is_monitored_interface(name: &str) -> bool {
    name.starts_with("eth") || name.starts_with("bond")
}
