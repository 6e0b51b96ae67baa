//! Crate-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::dropfile::DropFileError;
use crate::core::geometry::ProbeError;
use crate::core::idle::IdleError;
use crate::ui::input::InputError;
use crate::ui::renderer::RenderError;

#[derive(Error, Debug)]
pub enum DoorError {
    #[error(transparent)]
    DropFile(#[from] DropFileError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Idle(#[from] IdleError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DoorError {
    /// True when the session ended because the caller went idle
    pub fn is_idle_timeout(&self) -> bool {
        matches!(
            self,
            DoorError::Idle(IdleError::Expired) | DoorError::Input(InputError::IdleTimeout)
        )
    }
}

pub type Result<T> = std::result::Result<T, DoorError>;
