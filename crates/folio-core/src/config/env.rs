use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_memory();
        self.apply_env_overrides_gateway();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("FOLIO_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid FOLIO_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FOLIO_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("FOLIO_LLM_MODEL") {
            self.llm.model = Some(v);
        }
        if let Ok(v) = std::env::var("FOLIO_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = Some(v);
        }
        if let Ok(v) = std::env::var("FOLIO_LLM_TEMPERATURE")
            && let Ok(t) = v.parse::<f32>()
        {
            self.llm.temperature = t;
        }
        if let Ok(v) = std::env::var("FOLIO_GITHUB_API_URL") {
            self.github.api_url = v;
        }
        if let Ok(v) = std::env::var("FOLIO_GITHUB_USER") {
            self.github.user = Some(v);
        }
        if let Ok(v) = std::env::var("FOLIO_TIMEOUT_LLM")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.llm_seconds = secs;
        }
        if let Ok(v) = std::env::var("FOLIO_TIMEOUT_EMBEDDING")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.embedding_seconds = secs;
        }
    }

    fn apply_env_overrides_memory(&mut self) {
        if let Ok(v) = std::env::var("FOLIO_MEMORY_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.memory.backend = backend;
            } else {
                tracing::warn!("ignoring invalid FOLIO_MEMORY_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("FOLIO_QDRANT_URL") {
            self.memory.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("FOLIO_MEMORY_BATCH_SIZE")
            && let Ok(size) = v.parse::<usize>()
        {
            self.memory.batch_size = size;
        }
        if let Ok(v) = std::env::var("FOLIO_MEMORY_BATCH_DELAY_MS")
            && let Ok(ms) = v.parse::<u64>()
        {
            self.memory.batch_delay_ms = ms;
        }
        if let Ok(v) = std::env::var("FOLIO_MEMORY_TOP_K")
            && let Ok(k) = v.parse::<u64>()
        {
            self.memory.top_k = k;
        }
    }

    fn apply_env_overrides_gateway(&mut self) {
        if let Ok(v) = std::env::var("FOLIO_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("FOLIO_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
        if let Ok(v) = std::env::var("FOLIO_GATEWAY_RATE_LIMIT")
            && let Ok(limit) = v.parse::<u32>()
        {
            self.gateway.rate_limit = limit;
        }
    }
}
