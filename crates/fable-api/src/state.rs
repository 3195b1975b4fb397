use std::sync::Arc;

use anyhow::{Context, Result};
use axum::response::Html;
use handlebars::Handlebars;

use fable_ai::AiClient;
use fable_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub ai: AiClient,
    pub session_secret: String,
    templates: Handlebars<'static>,
}

impl AppStateInner {
    pub fn new(db: Database, ai: AiClient, session_secret: String) -> Result<Self> {
        let mut templates = Handlebars::new();
        for (name, source) in [
            ("home", include_str!("../templates/home.hbs")),
            ("discover", include_str!("../templates/discover.hbs")),
            ("auth", include_str!("../templates/auth.hbs")),
            ("dashboard", include_str!("../templates/dashboard.hbs")),
            ("editor", include_str!("../templates/editor.hbs")),
            ("player", include_str!("../templates/player.hbs")),
        ] {
            templates
                .register_template_string(name, source)
                .with_context(|| format!("template '{name}' failed to parse"))?;
        }
        Ok(Self {
            db,
            ai,
            session_secret,
            templates,
        })
    }

    pub fn render(&self, name: &str, data: &serde_json::Value) -> Result<Html<String>, ApiError> {
        let html = self
            .templates
            .render(name, data)
            .with_context(|| format!("rendering '{name}'"))?;
        Ok(Html(html))
    }
}
