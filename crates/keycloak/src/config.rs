use std::sync::Arc;

#[derive(Default)]
pub struct ConfigBuilder<'a> {
    prefix: Option<&'a str>,
}

impl<'a> ConfigBuilder<'a> {
    pub fn with_prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn build(self) -> envy::Result<Config> {
        let mut cfg: Config = envy::prefixed(self.prefix.unwrap_or("KEYCLOAK_")).from_env()?;
        if cfg.username.is_none() {
            cfg.username = Some("admin".into());
        }
        if cfg.password.is_none() {
            cfg.password = Some("admin".into());
        }
        if cfg.login_realm.is_none() {
            cfg.login_realm = Some("master".into());
        }
        if cfg.client_id.is_none() {
            cfg.client_id = Some("admin-cli".into());
        }
        if cfg.address.is_none() {
            let host = cfg.host.as_deref().unwrap_or("127.0.0.1");
            let port = cfg.port.unwrap_or(8080);
            cfg.address = Some(Arc::from(format!("http://{}:{}", host, port)));
        }
        cfg.address = cfg
            .address
            .map(|address| Arc::from(address.trim_end_matches('/')));
        Ok(cfg)
    }
}

/// Connection settings of the Keycloak admin API.
#[derive(Clone, serde::Deserialize, Debug)]
pub struct Config {
    address: Option<Arc<str>>,
    host: Option<Arc<str>>,
    port: Option<u16>,
    username: Option<Arc<str>>,
    password: Option<Arc<str>>,
    login_realm: Option<Arc<str>>,
    client_id: Option<Arc<str>>,
    refresh_margin_secs: Option<u64>,
}

impl Config {
    pub fn new() -> envy::Result<Self> {
        ConfigBuilder::default().build()
    }

    pub fn builder<'a>() -> ConfigBuilder<'a> {
        ConfigBuilder::default()
    }

    /// Builds a configuration without consulting the environment.
    pub fn from_parts(address: &str, username: &str, password: &str) -> Self {
        Self {
            address: Some(Arc::from(address.trim_end_matches('/'))),
            host: None,
            port: None,
            username: Some(Arc::from(username)),
            password: Some(Arc::from(password)),
            login_realm: None,
            client_id: None,
            refresh_margin_secs: None,
        }
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or("http://127.0.0.1:8080")
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("admin")
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("admin")
    }

    pub fn login_realm(&self) -> &str {
        self.login_realm.as_deref().unwrap_or("master")
    }

    pub fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or("admin-cli")
    }

    pub fn refresh_margin_secs(&self) -> u64 {
        self.refresh_margin_secs.unwrap_or(30)
    }
}
