/// Envelope `type` strings used on the wire (magic strings layer)
pub mod event_types {
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const CONNECTION_ACK: &str = "connection.ack";
    pub const MESSAGE_CREATED: &str = "message.created";
    pub const MESSAGE_UPDATED: &str = "message.updated";
    pub const MESSAGE_DELETED: &str = "message.deleted";
    pub const USER_STATUS_CHANGED: &str = "user.status.changed";
}

/// Channel path segments below `/ws/`
pub mod channel_paths {
    pub const CHAT: &str = "chat";
    pub const USER_STATUS: &str = "user-status";
}

/// Query parameter carrying the access token
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Path segment stripped from the REST base when deriving the socket host
pub const API_PATH_SEGMENT: &str = "api";

/// Default heartbeat interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 30_000;

/// Default base delay for the first reconnect attempt (milliseconds)
pub const BASE_RECONNECT_DELAY: u64 = 1_000;

/// Upper bound for any single reconnect delay (milliseconds)
pub const MAX_RECONNECT_DELAY: u64 = 30_000;

/// Exponential backoff multiplier
pub const RECONNECT_MULTIPLIER: u32 = 2;

/// Default number of automatic reconnect attempts before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
pub const WS_CLOSE_GOING_AWAY: u16 = 1001;
pub const WS_CLOSE_ABNORMAL: u16 = 1006;
