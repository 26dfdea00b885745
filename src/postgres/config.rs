use crate::config::ConnectionParams;

impl ConnectionParams {
    /// Build the `tokio-postgres` configuration for these parameters.
    ///
    /// The session always uses UTF-8 as client encoding. An empty password is left unset.
    #[must_use]
    pub fn to_tokio_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.dbname)
            .options("--client_encoding=UTF8")
            .application_name("pgwrap");
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}
