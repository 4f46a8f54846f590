//! Broker configuration.

use hermes_models::secret_from_env;

/// RabbitMQ connection and topology settings.
#[derive(Clone)]
pub struct QueueConfig {
    /// Full AMQP URL; overrides the individual connection fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
    /// Topic exchange shared by tasks and completions
    pub exchange: String,
    /// Queue the worker consumes tasks from
    pub task_queue: String,
    /// Binding pattern for the task queue
    pub task_routing_key: String,
    /// Queue downstream consumers read completions from
    pub completion_queue: String,
    /// Binding pattern for the completion queue
    pub completion_routing_key: String,
    /// Unacknowledged deliveries allowed per consumer
    pub prefetch: u16,
    /// Declare queues as quorum queues
    pub quorum: bool,
    /// Messages a quorum queue keeps in memory
    pub max_in_memory_length: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5672,
            user: "guest".to_string(),
            password: "guest".to_string(),
            vhost: "/".to_string(),
            exchange: "video/processing".to_string(),
            task_queue: "video/tasks".to_string(),
            task_routing_key: "video.task.*".to_string(),
            completion_queue: "video/completions".to_string(),
            completion_routing_key: "video.completion.#".to_string(),
            prefetch: 3,
            quorum: true,
            max_in_memory_length: 100,
        }
    }
}

// Password stays out of logs.
impl std::fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("vhost", &self.vhost)
            .field("exchange", &self.exchange)
            .field("task_queue", &self.task_queue)
            .field("task_routing_key", &self.task_routing_key)
            .field("completion_queue", &self.completion_queue)
            .field("completion_routing_key", &self.completion_routing_key)
            .field("prefetch", &self.prefetch)
            .field("quorum", &self.quorum)
            .finish()
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("RABBITMQ_URL").ok().filter(|s| !s.is_empty()),
            host: std::env::var("RABBITMQ_HOST").unwrap_or(defaults.host),
            port: std::env::var("RABBITMQ_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            user: std::env::var("RABBITMQ_USER").unwrap_or(defaults.user),
            password: secret_from_env("RABBITMQ_PASSWORD").unwrap_or(defaults.password),
            vhost: std::env::var("RABBITMQ_VHOST").unwrap_or(defaults.vhost),
            exchange: std::env::var("RABBITMQ_EXCHANGE").unwrap_or(defaults.exchange),
            task_queue: std::env::var("RABBITMQ_TASK_QUEUE").unwrap_or(defaults.task_queue),
            task_routing_key: std::env::var("RABBITMQ_TASK_ROUTING_KEY")
                .unwrap_or(defaults.task_routing_key),
            completion_queue: std::env::var("RABBITMQ_COMPLETION_QUEUE")
                .unwrap_or(defaults.completion_queue),
            completion_routing_key: std::env::var("RABBITMQ_COMPLETION_ROUTING_KEY")
                .unwrap_or(defaults.completion_routing_key),
            prefetch: std::env::var("RABBITMQ_PREFETCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.prefetch),
            quorum: std::env::var("RABBITMQ_QUORUM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.quorum),
            max_in_memory_length: defaults.max_in_memory_length,
        }
    }

    /// AMQP URL to connect with.
    pub fn amqp_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "amqp://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            urlencoding::encode(&self.vhost)
        )
    }
}
