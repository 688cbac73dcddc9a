use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse template {name}: {message}")]
    Parse { name: String, message: String },

    #[error("Failed to render template {name}: {message}")]
    Render { name: String, message: String },
}

/// Templates compiled into the binary, used when the template directory
/// does not provide an override.
fn builtin_template(name: &str) -> Option<&'static str> {
    match name {
        "_header.html.liquid" => Some(include_str!("../templates/_header.html.liquid")),
        "_footer.html.liquid" => Some(include_str!("../templates/_footer.html.liquid")),
        "index.html.liquid" => Some(include_str!("../templates/index.html.liquid")),
        "gallery.html.liquid" => Some(include_str!("../templates/gallery.html.liquid")),
        _ => None,
    }
}

pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, name: &str) -> Result<String, TemplateError> {
        let template_path = self.template_dir.join(name);

        let modified = match tokio::fs::metadata(&template_path).await {
            Ok(metadata) => metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            Err(_) => {
                return builtin_template(name)
                    .map(str::to_string)
                    .ok_or_else(|| TemplateError::NotFound(name.to_string()));
            }
        };

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(name)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", name);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", name);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|source| TemplateError::Io {
                name: name.to_string(),
                source,
            })?;

        cache.insert(
            name.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    /// Renders `template_name` with `globals`, adding the shared `header`
    /// and `footer` fragments.
    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, TemplateError> {
        let header_content = self
            .load_template("_header.html.liquid")
            .await
            .unwrap_or_else(|e| {
                error!("Failed to load header: {}", e);
                String::new()
            });

        let footer_content = self
            .load_template("_footer.html.liquid")
            .await
            .unwrap_or_else(|e| {
                error!("Failed to load footer: {}", e);
                String::new()
            });

        let template_content = self.load_template(template_name).await?;

        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| TemplateError::Parse {
                name: template_name.to_string(),
                message: e.to_string(),
            })?;

        let header = parser
            .parse(&header_content)
            .and_then(|t| t.render(&globals))
            .unwrap_or_else(|e| {
                error!("Failed to render header: {}", e);
                String::new()
            });

        let template = parser
            .parse(&template_content)
            .map_err(|e| TemplateError::Parse {
                name: template_name.to_string(),
                message: e.to_string(),
            })?;

        let mut full_globals = globals;
        full_globals.insert(
            "header".into(),
            liquid::model::Value::Scalar(header.into()),
        );
        full_globals.insert(
            "footer".into(),
            liquid::model::Value::Scalar(footer_content.into()),
        );

        template
            .render(&full_globals)
            .map_err(|e| TemplateError::Render {
                name: template_name.to_string(),
                message: e.to_string(),
            })
    }
}
