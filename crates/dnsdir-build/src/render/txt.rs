//! Plain-text lists: a comment header, then one address per line.

use crate::classify::ClassifyPolicy;
use crate::stats::region_name;
use dnsdir_core::{layout, GlobalList, GroupKey, IpVersion, ResolverRecord};

/// Human-readable title of a group, as shown in its TXT header
#[must_use]
pub fn title(key: &GroupKey, members: &[&ResolverRecord], policy: &ClassifyPolicy) -> String {
    match key {
        GroupKey::Global { list, version } => {
            global_title(*list, *version, policy.high_uptime_threshold)
        }
        GroupKey::Country { code, version } => {
            let name = region_name(members, |r| r.country.as_deref())
                .unwrap_or_else(|| code.to_string());
            match version {
                IpVersion::V4 => format!("{name} ({code})"),
                IpVersion::V6 => format!("{name} ({code}) - IPv6"),
            }
        }
        GroupKey::Continent(continent) => {
            let name = region_name(members, |r| r.continent.as_deref())
                .unwrap_or_else(|| continent.name().to_string());
            format!("{name} ({})", continent.code())
        }
    }
}

fn global_title(list: GlobalList, version: IpVersion, threshold: f64) -> String {
    let family = version.label();
    match list {
        GlobalList::All => format!("All {family}"),
        GlobalList::Trusted => format!("Trusted Providers ({family})"),
        GlobalList::Dnssec => format!("DNSSEC Validating ({family})"),
        GlobalList::AdBlocking => format!("Ad Blocking ({family})"),
        GlobalList::MalwareBlocking => format!("Malware Blocking ({family})"),
        GlobalList::FamilySafe => format!("Family Safe / Adult Blocking ({family})"),
        GlobalList::HighUptime => format!("High Uptime >={threshold}% ({family})"),
    }
}

/// Render one list. `members` must already be in address order.
#[must_use]
pub fn render(title: &str, members: &[&ResolverRecord], timestamp: &str) -> String {
    let mut out = format!(
        "# Public DNS Servers - {title}\n\
         # Source: {}\n\
         # Updated: {timestamp}\n\
         # Total: {} servers\n\
         #\n",
        layout::SOURCE_URL,
        members.len(),
    );
    for record in members {
        out.push_str(&record.ip.to_string());
        out.push('\n');
    }
    out
}
