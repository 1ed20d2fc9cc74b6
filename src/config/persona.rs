use std::fs;
use std::sync::Arc;
use log::info;
use thiserror::Error;

/// System instruction sent ahead of every visitor message.
pub const DEFAULT_PERSONA: &str = "You are a helpful assistant that answers questions about Ananya Dabas, \
the owner of this portfolio site.

Professional background:
- She is a software developer with a passion for creating innovative web solutions.
- Her favorite tech stack: React.js, Three.js and TailwindCSS on the frontend, Node.js and \
Express.js on the backend, MongoDB for data, Git and VS Code as tools.
- She built this 3D portfolio website with React and Three.js.

Hobbies and interests:
- She is a huge Harry Potter fan and loves discussing theories about the wizarding world.
- She plays basketball to stay active and competitive.
- She takes part in local tech meetups and developer communities.

Fun facts:
- She has memorized the entire periodic table, all 118 elements.
- She enjoys combining her love for science with her technical skills.

Answer questions in a friendly and conversational tone.";

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Failed to read persona file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Persona file '{0}' is empty")]
    Empty(String),
}

/// Persona text from `path`, or the built-in persona when no path is given.
pub fn load_persona(path: Option<&str>) -> Result<Arc<str>, PersonaError> {
    let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
        return Ok(Arc::from(DEFAULT_PERSONA));
    };

    let content = fs::read_to_string(path).map_err(|source| PersonaError::Io {
        path: path.to_string(),
        source,
    })?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(PersonaError::Empty(path.to_string()));
    }

    info!("Loaded persona instruction from '{}' ({} chars)", path, trimmed.len());
    Ok(Arc::from(trimmed))
}
