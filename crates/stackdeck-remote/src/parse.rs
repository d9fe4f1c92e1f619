//! Best-effort reader for the plain-text `docker-compose ps` table.

use regex::Regex;
use stackdeck_core::container::ContainerInfo;
use std::sync::OnceLock;

const UNKNOWN_STATUS: &str = "Unknown";

/// Rows after the `Name / Command / State` header, split on tabs or runs
/// of two or more spaces. Anything before the header (ansible's
/// `host | CHANGED` banner) is ignored, rows with fewer than three columns
/// are dropped.
pub fn parse_compose_ps(text: &str) -> Vec<ContainerInfo> {
    let mut containers = Vec::new();
    let mut in_table = false;

    for line in text.lines() {
        if line.contains("Name") && line.contains("Command") && line.contains("State") {
            in_table = true;
            continue;
        }
        if !in_table || line.starts_with("---") || line.trim().is_empty() {
            continue;
        }
        let columns = split_columns(line);
        if columns.len() < 3 {
            continue;
        }
        containers.push(ContainerInfo::new(
            columns[0],
            columns[1],
            columns[2],
            UNKNOWN_STATUS,
            columns.get(3).copied().unwrap_or(""),
        ));
    }
    containers
}

fn column_gap() -> &'static Regex {
    static COLUMN_GAP: OnceLock<Regex> = OnceLock::new();
    COLUMN_GAP.get_or_init(|| Regex::new(r"\s{2,}|\t").expect("column gap pattern must be valid"))
}

fn split_columns(line: &str) -> Vec<&str> {
    column_gap().split(line.trim()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSIBLE_OUTPUT: &str = "\
local | CHANGED | rc=0 >>
      Name                     Command               State           Ports
--------------------------------------------------------------------------------
zeus_web     nginx -g daemon off;   Up      0.0.0.0:80->80/tcp
zeus_db      docker-entrypoint.sh postgres   Up      5432/tcp

zeus_job     run.sh   Exit 1
broken-row
";

    #[test]
    fn reads_rows_after_the_header() {
        let containers = parse_compose_ps(ANSIBLE_OUTPUT);
        assert_eq!(containers.len(), 3);

        assert_eq!(containers[0].name, "zeus_web");
        assert_eq!(containers[0].command, "nginx -g daemon off;");
        assert_eq!(containers[0].state, "Up");
        assert_eq!(containers[0].ports, "0.0.0.0:80->80/tcp");
        assert_eq!(containers[0].status, "Unknown");

        assert_eq!(containers[2].state, "Exit 1");
        assert_eq!(containers[2].ports, "");
        assert!(!containers[2].is_up());
    }

    #[test]
    fn no_header_means_no_rows() {
        assert!(parse_compose_ps("zeus_web   nginx   Up\n").is_empty());
        assert!(parse_compose_ps("").is_empty());
    }

    #[test]
    fn single_spaces_stay_inside_a_column() {
        assert_eq!(split_columns("  a b   c  d e "), ["a b", "c", "d e"]);
    }

    #[test]
    fn tabs_separate_columns() {
        assert_eq!(split_columns("zeus_web\tnginx -g\t \tUp"), ["zeus_web", "nginx -g", "Up"]);

        let containers = parse_compose_ps("Name\tCommand\tState\tPorts\nzeus_db\tpostgres\tUp\t5432/tcp\n");
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].command, "postgres");
        assert_eq!(containers[0].ports, "5432/tcp");
    }
}
