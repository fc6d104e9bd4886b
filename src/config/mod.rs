use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub firebase: FirebaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub dev: DevConfig,
    pub chatbot: ChatbotConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Firebase credential sources and project settings.
///
/// Only one credential source is needed. When several are present the first
/// usable one in `credentials_path`, `credentials_b64`, `credentials_json`
/// order wins. None of them is validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub credentials_path: Option<String>,
    pub credentials_b64: Option<String>,
    pub credentials_json: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    /// Require an admin caller for hospitality create/update/delete
    pub hospitality_admin_only: bool,
}

/// Local development shortcut: skip token verification and act as a fixed user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    pub use_dummy_user: bool,
    pub dummy_user_uid: String,
    pub dummy_user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotConfig {
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub system_prompt_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Firebase overrides
        self.firebase.credentials_path = non_empty_var("FIREBASE_CREDENTIALS");
        self.firebase.credentials_b64 = non_empty_var("FIREBASE_CREDENTIALS_B64");
        self.firebase.credentials_json = non_empty_var("FIREBASE_CREDENTIALS_JSON");
        self.firebase.project_id = non_empty_var("FIREBASE_PROJECT_ID");
        self.firebase.storage_bucket = non_empty_var("FIREBASE_STORAGE_BUCKET");

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("HOSPITALITY_ADMIN_ONLY") {
            self.security.hospitality_admin_only = v.parse().unwrap_or(self.security.hospitality_admin_only);
        }

        // Dev overrides
        if let Ok(v) = env::var("DEV_USE_DUMMY_USER") {
            self.dev.use_dummy_user = v.parse().unwrap_or(self.dev.use_dummy_user);
        }
        if let Some(v) = non_empty_var("DEV_DUMMY_USER_UID") {
            self.dev.dummy_user_uid = v;
        }
        if let Some(v) = non_empty_var("DEV_DUMMY_USER_EMAIL") {
            self.dev.dummy_user_email = v;
        }

        // Chatbot overrides
        self.chatbot.google_api_key = non_empty_var("GOOGLE_API_KEY");
        if let Some(v) = non_empty_var("GEMINI_MODEL") {
            self.chatbot.gemini_model = v;
        }
        if let Some(v) = non_empty_var("CHATBOT_SYSTEM_PROMPT_PATH") {
            self.chatbot.system_prompt_path = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            firebase: FirebaseConfig::default(),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 20 * 1024 * 1024, // 20MB
            },
            security: SecurityConfig {
                enable_cors: true,
                hospitality_admin_only: false,
            },
            dev: DevConfig::default(),
            chatbot: ChatbotConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                hospitality_admin_only: true,
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                hospitality_admin_only: true,
            },
            ..Self::development()
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            use_dummy_user: false,
            dummy_user_uid: "dev-user".to_string(),
            dummy_user_email: "dev@example.com".to_string(),
        }
    }
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            system_prompt_path: "system_prompt.txt".to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
