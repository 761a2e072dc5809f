use std::net::IpAddr;

/// Database used when the request host carries no subdomain.
pub const DEFAULT_DATABASE: &str = "default";

/// Pick the logical database a host-routed pipeline call targets.
///
/// `d1.localhost:8080` routes to `d1`. Hosts without a dot, IP literals and missing hosts
/// route to [`DEFAULT_DATABASE`].
#[must_use]
pub fn database_from_host(host: Option<&str>) -> String {
    let Some(host) = host.map(str::trim).filter(|host| !host.is_empty()) else {
        return DEFAULT_DATABASE.to_string();
    };

    // [::1]:8080
    if host.starts_with('[') {
        return DEFAULT_DATABASE.to_string();
    }
    let hostname = host.rsplit_once(':').map_or(host, |(name, _port)| name);
    if hostname.parse::<IpAddr>().is_ok() {
        return DEFAULT_DATABASE.to_string();
    }

    match hostname.split_once('.') {
        Some((label, _)) if !label.is_empty() => label.to_string(),
        _ => DEFAULT_DATABASE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_label_names_the_database() {
        assert_eq!(database_from_host(Some("d1.localhost:8080")), "d1");
        assert_eq!(database_from_host(Some("orders.db.example.com")), "orders");
    }

    #[test]
    fn plain_hosts_use_the_default_database() {
        for host in [
            None,
            Some(""),
            Some("localhost"),
            Some("localhost:8080"),
            Some("127.0.0.1:8080"),
            Some("[::1]:8080"),
            Some(".localhost"),
        ] {
            assert_eq!(database_from_host(host), DEFAULT_DATABASE, "{host:?}");
        }
    }
}
