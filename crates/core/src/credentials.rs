//! Client flag builders for `mysql`/`mysqldump` and `s3cmd`.

use crate::config::{DatabaseConfig, StorageConfig};

/// Login flags for the database clients; each only if configured.
pub fn mysql_login_args(db: &DatabaseConfig) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(user) = &db.user {
        args.push(format!("--user={user}"));
    }
    if let Some(password) = &db.password {
        args.push(format!("--password={password}"));
    }
    if let Some(host) = &db.host {
        args.push(format!("--host={host}"));
    }
    if let Some(port) = db.port {
        args.push(format!("--port={port}"));
    }
    args
}

/// Login and TLS flags for the storage client.
///
/// The endpoint flags are always present. With TLS disabled only `--no-ssl`
/// is emitted; the certificate and hostname checks are meaningless then.
pub fn s3_login_args(storage: &StorageConfig) -> Vec<String> {
    let mut args = vec![
        format!("--access_key={}", storage.access_key),
        format!("--secret_key={}", storage.secret_key),
        format!("--host={}", storage.host),
        format!("--host-bucket={}", storage.host_bucket),
        format!("--region={}", storage.region),
    ];

    let ssl = &storage.ssl;
    if !ssl.enabled {
        args.push("--no-ssl".to_string());
        return args;
    }

    args.push("--ssl".to_string());
    args.push(toggle(ssl.check_certificate, "check-certificate"));
    args.push(toggle(ssl.check_hostname, "check-hostname"));
    args
}

fn toggle(on: bool, flag: &str) -> String {
    if on {
        format!("--{flag}")
    } else {
        format!("--no-{flag}")
    }
}

/// `--ignore-table=<database>.<table>` for every configured table.
pub fn ignore_table_args(db: &DatabaseConfig, database: &str) -> Vec<String> {
    db.ignore_tables
        .iter()
        .map(|table| format!("--ignore-table={database}.{table}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SslConfig;

    fn storage(ssl: SslConfig) -> StorageConfig {
        StorageConfig {
            access_key: "AK".to_string(),
            secret_key: "SK".to_string(),
            host: "s3.example.com".to_string(),
            host_bucket: "%(bucket)s.s3.example.com".to_string(),
            region: "eu-1".to_string(),
            ssl,
            container: "dumps".to_string(),
        }
    }

    #[test]
    fn mysql_login_empty_when_nothing_configured() {
        assert!(mysql_login_args(&DatabaseConfig::default()).is_empty());
    }

    #[test]
    fn mysql_login_includes_only_configured_flags() {
        let db = DatabaseConfig {
            user: Some("root".to_string()),
            port: Some(3306),
            ..DatabaseConfig::default()
        };
        assert_eq!(mysql_login_args(&db), vec!["--user=root", "--port=3306"]);

        let db = DatabaseConfig {
            user: Some("root".to_string()),
            password: Some("pw".to_string()),
            host: Some("db".to_string()),
            port: Some(3307),
            ..DatabaseConfig::default()
        };
        assert_eq!(
            mysql_login_args(&db),
            vec!["--user=root", "--password=pw", "--host=db", "--port=3307"]
        );
    }

    #[test]
    fn s3_login_defaults_to_full_tls() {
        assert_eq!(
            s3_login_args(&storage(SslConfig::default())),
            vec![
                "--access_key=AK",
                "--secret_key=SK",
                "--host=s3.example.com",
                "--host-bucket=%(bucket)s.s3.example.com",
                "--region=eu-1",
                "--ssl",
                "--check-certificate",
                "--check-hostname",
            ]
        );
    }

    #[test]
    fn s3_login_without_tls_omits_check_flags() {
        let args = s3_login_args(&storage(SslConfig {
            enabled: false,
            check_certificate: false,
            check_hostname: true,
        }));
        assert_eq!(args.last().map(String::as_str), Some("--no-ssl"));
        assert!(!args.iter().any(|a| a.contains("check")));
        assert!(!args.contains(&"--ssl".to_string()));
    }

    #[test]
    fn s3_login_individual_checks_can_be_disabled() {
        let args = s3_login_args(&storage(SslConfig {
            enabled: true,
            check_certificate: false,
            check_hostname: false,
        }));
        assert_eq!(
            &args[5..],
            ["--ssl", "--no-check-certificate", "--no-check-hostname"]
        );
    }

    #[test]
    fn s3_login_always_has_endpoint_flags() {
        let args = s3_login_args(&StorageConfig::default());
        assert_eq!(
            &args[..5],
            [
                "--access_key=",
                "--secret_key=",
                "--host=",
                "--host-bucket=",
                "--region=",
            ]
        );
    }

    #[test]
    fn ignore_tables_are_prefixed_with_database() {
        let db = DatabaseConfig {
            ignore_tables: vec!["sessions".to_string(), "cache".to_string()],
            ..DatabaseConfig::default()
        };
        assert_eq!(
            ignore_table_args(&db, "shop"),
            vec!["--ignore-table=shop.sessions", "--ignore-table=shop.cache"]
        );
        assert!(ignore_table_args(&DatabaseConfig::default(), "shop").is_empty());
    }
}
