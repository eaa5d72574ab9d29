use serde::{Deserialize, Serialize};

/// Connection profile for one queue manager.
///
/// Credentials are not part of the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub channel: String,
    pub queue_manager: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub ssl_enabled: bool,
}

impl ConnectionConfig {
    /// Create a connection config
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        channel: impl Into<String>,
        queue_manager: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            channel: channel.into(),
            queue_manager: queue_manager.into(),
            username: None,
            ssl_enabled: false,
        }
    }

    /// Profile name, or `queueManager@host` when unnamed
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{}@{}", self.queue_manager, self.host)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let named = ConnectionConfig::new("Prod QM", "mq1", 1414, "DEV.APP.SVRCONN", "QM1");
        assert_eq!(named.display_name(), "Prod QM");

        let unnamed = ConnectionConfig::new("", "mq1", 1414, "DEV.APP.SVRCONN", "QM1");
        assert_eq!(unnamed.display_name(), "QM1@mq1");
    }

    #[test]
    fn test_password_in_document_is_ignored() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{"name":"a","host":"h","port":1414,"queueManager":"QM1","password":"secret"}"#,
        )
        .unwrap();
        assert_eq!(config.port, 1414);
        assert!(!serde_json::to_string(&config).unwrap().contains("secret"));
    }
}
