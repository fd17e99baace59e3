//! Named connections resolved by name or by default.

use crate::error::{OrmError, OrmResult};

/// Holds named clients; the default is used when no name is given.
///
/// ```ignore
/// let mut registry = ConnectionRegistry::new();
/// registry.register("main", main_client, true);
/// registry.register("reporting", replica_client, false);
///
/// let rows = qb::table("orders").get(registry.resolve(None)?).await?;
/// let rows = qb::table("orders").get(registry.get("reporting")?).await?;
/// ```
#[derive(Debug)]
pub struct ConnectionRegistry<C> {
    entries: Vec<(String, C)>,
    default: Option<String>,
}

impl<C> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            default: None,
        }
    }
}

impl<C> ConnectionRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a client under `name`.
    pub fn register(&mut self, name: impl Into<String>, client: C, is_default: bool) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = client,
            None => self.entries.push((name.clone(), client)),
        }
        if is_default {
            self.default = Some(name);
        }
    }

    pub fn get(&self, name: &str) -> OrmResult<&C> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| OrmError::connection(format!("unknown connection '{name}'")))
    }

    /// The client flagged as default, else the first registered one.
    pub fn default_client(&self) -> OrmResult<&C> {
        match &self.default {
            Some(name) => self.get(name),
            None => self
                .entries
                .first()
                .map(|(_, c)| c)
                .ok_or_else(|| OrmError::connection("no connections registered")),
        }
    }

    /// Look up `name`, or the default when `None`.
    pub fn resolve(&self, name: Option<&str>) -> OrmResult<&C> {
        match name {
            Some(name) => self.get(name),
            None => self.default_client(),
        }
    }

    /// Remove a client, returning it so the caller can close it.
    pub fn remove(&mut self, name: &str) -> Option<C> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        if self.default.as_deref() == Some(name) {
            self.default = None;
        }
        Some(self.entries.remove(index).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default
            .as_deref()
            .or_else(|| self.entries.first().map(|(n, _)| n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(feature = "mysql")]
impl ConnectionRegistry<crate::mysql::MySqlClient> {
    /// Open a pool for every configured connection.
    pub async fn connect_all(config: &crate::config::DatabaseConfig) -> OrmResult<Self> {
        let default = config.default_name();
        let mut registry = Self::new();
        for (name, conn) in &config.connections {
            let client = crate::mysql::MySqlClient::connect(conn).await?;
            registry.register(name.clone(), client, Some(name.as_str()) == default);
        }
        tracing::info!(
            target: "myorm",
            connections = registry.len(),
            default = ?registry.default_name(),
            "connection registry ready"
        );
        Ok(registry)
    }

    /// Close and drop every pool.
    pub async fn close_all(&mut self) {
        for (_, client) in self.entries.drain(..) {
            client.close().await;
        }
        self.default = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registered_is_default_without_flag() {
        let mut registry = ConnectionRegistry::new();
        registry.register("a", 1, false);
        registry.register("b", 2, false);
        assert_eq!(*registry.default_client().unwrap(), 1);
        assert_eq!(*registry.resolve(Some("b")).unwrap(), 2);
    }

    #[test]
    fn explicit_default_wins() {
        let mut registry = ConnectionRegistry::new();
        registry.register("a", 1, false);
        registry.register("b", 2, true);
        assert_eq!(*registry.resolve(None).unwrap(), 2);
        assert_eq!(registry.default_name(), Some("b"));
    }

    #[test]
    fn register_replaces_existing_name() {
        let mut registry = ConnectionRegistry::new();
        registry.register("a", 1, false);
        registry.register("a", 5, false);
        assert_eq!(registry.len(), 1);
        assert_eq!(*registry.get("a").unwrap(), 5);
    }

    #[test]
    fn unknown_name_is_a_connection_error() {
        let registry: ConnectionRegistry<i32> = ConnectionRegistry::new();
        assert!(matches!(registry.get("x"), Err(OrmError::Connection(_))));
        assert!(matches!(registry.resolve(None), Err(OrmError::Connection(_))));
    }

    #[test]
    fn remove_clears_default() {
        let mut registry = ConnectionRegistry::new();
        registry.register("a", 1, false);
        registry.register("b", 2, true);
        assert_eq!(registry.remove("b"), Some(2));
        assert_eq!(registry.remove("b"), None);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(*registry.resolve(None).unwrap(), 1);
    }
}
