pub mod service {
    pub const NAMESPACE: &str = "Wsrelay";

    pub const CONSUMER: &str = "Consumer";
}

pub mod trace {
    use opentelemetry::Key;

    pub const EVENT_TYPE: Key = Key::from_static_str("ws.event.type");
    pub const CONNECTION_ID: Key = Key::from_static_str("ws.connection.id");
    pub const USER_ID: Key = Key::from_static_str("ws.user.id");
}
