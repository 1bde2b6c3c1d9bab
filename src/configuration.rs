pub trait Configuration: Clone + Send + Sync + 'static {
    fn website_title(&self) -> String;
    fn port(&self) -> String;
    /// No database URL means schedulings are kept in memory only.
    fn database_url(&self) -> Option<String>;
}
